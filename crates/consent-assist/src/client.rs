//! Async client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, html::strip_html, names::parse_software_names};

/// Policy text beyond this many characters is not sent to the model.
const MAX_POLICY_CHARS: usize = 20_000;
/// Below this many characters a fetched page is treated as unreadable.
const MIN_POLICY_CHARS: usize = 100;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
   AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const EXTRACT_PROMPT: &str = "\
This document is review material from a Korean elementary school's governing \
committee. Software titles appear inside table cells or boxes, separated by \
commas (for example \"클래스팅, 패들렛, 구글 클래스룸, e학습터\").

Extract every educational software, app or service name:
- split comma-separated entries into individual names
- omit numbering, descriptions, conditions and company names
- look in tables, lists and boxes alike
- list each name once

Reply with JSON only, no markdown:
{\"softwares\":[{\"name\":\"...\"}]}
If nothing is found reply {\"softwares\":[]}";

const SUMMARY_PROMPT: &str = "\
You are a privacy specialist for educational technology. The text below is a \
service's privacy policy. Summarise what a guardian needs to decide on \
consent, readable in thirty seconds, with no filler.

Answer in Korean using exactly these three lines:
- 목적: (purpose of collection and use)
- 항목: (personal data items collected)
- 보유 기간: (retention and destruction)

Policy text:
";

// ─── Config ──────────────────────────────────────────────────────────────────

/// Connection settings for the generative-language service.
#[derive(Debug, Clone)]
pub struct AssistConfig {
  pub api_key:  String,
  pub model:    String,
  /// Root of the REST API, without the `/models/...` suffix.
  pub base_url: String,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
  contents:          [Content<'a>; 1],
  #[serde(rename = "generationConfig")]
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
  parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
  Text { text: &'a str },
  Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
  mime_type: &'a str,
  data:      String,
}

#[derive(Serialize)]
struct GenerationConfig {
  temperature:       f32,
  #[serde(rename = "maxOutputTokens")]
  max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

impl GenerateResponse {
  fn first_text(self) -> Option<String> {
    self
      .candidates
      .into_iter()
      .next()?
      .content?
      .parts
      .into_iter()
      .next()?
      .text
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty())
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the generative-language API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  client: Client,
  config: AssistConfig,
}

impl GeminiClient {
  pub fn new(config: AssistConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    )
  }

  async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String> {
    let resp = self
      .client
      .post(self.url())
      .query(&[("key", &self.config.api_key)])
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::warn!(status = status.as_u16(), "assistant request failed");
      return Err(Error::Upstream { status: status.as_u16(), body });
    }

    let parsed: GenerateResponse = resp.json().await?;
    parsed.first_text().ok_or(Error::EmptyResponse)
  }

  /// Read software titles off a scanned document (PDF or image).
  ///
  /// `mime_type` is the type the uploader declared, if any; when it is
  /// missing or generic the type is guessed from `file_name`.
  pub async fn extract_software_names(
    &self,
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
  ) -> Result<Vec<String>> {
    let mime = guess_mime(file_name, mime_type);
    let request = GenerateRequest {
      contents:          [Content {
        parts: vec![
          Part::Inline {
            inline_data: InlineData { mime_type: mime, data: STANDARD.encode(bytes) },
          },
          Part::Text { text: EXTRACT_PROMPT },
        ],
      }],
      generation_config: GenerationConfig {
        temperature:       0.1,
        max_output_tokens: 8192,
      },
    };

    let text = self.generate(&request).await?;
    let names = parse_software_names(&text);
    tracing::debug!(file_name, count = names.len(), "extracted software names");
    Ok(names)
  }

  /// Fetch the policy at `url` and summarise it for guardians.
  pub async fn summarize_privacy_policy(&self, url: &str) -> Result<String> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
      return Err(Error::InvalidUrl(url.to_owned()));
    }

    let resp = self
      .client
      .get(url)
      .header(reqwest::header::USER_AGENT, BROWSER_UA)
      .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
      .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en;q=0.7")
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(Error::PageStatus(resp.status().as_u16()));
    }

    let page = policy_text(&resp.text().await?);
    let chars = page.chars().count();
    if chars < MIN_POLICY_CHARS {
      return Err(Error::PageTooShort(chars));
    }

    let prompt = format!("{SUMMARY_PROMPT}{page}");
    let request = GenerateRequest {
      contents:          [Content { parts: vec![Part::Text { text: &prompt }] }],
      generation_config: GenerationConfig {
        temperature:       0.2,
        max_output_tokens: 600,
      },
    };
    self.generate(&request).await
  }
}

/// Plain text of a policy page, cut to [`MAX_POLICY_CHARS`].
fn policy_text(html: &str) -> String {
  strip_html(html).chars().take(MAX_POLICY_CHARS).collect()
}

fn guess_mime<'a>(file_name: &str, declared: Option<&'a str>) -> &'a str {
  match declared {
    Some(m) if !m.is_empty() && m != "application/octet-stream" => m,
    _ => {
      let lower = file_name.to_ascii_lowercase();
      if lower.ends_with(".pdf") {
        "application/pdf"
      } else if lower.ends_with(".png") {
        "image/png"
      } else {
        "image/jpeg"
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::net::SocketAddr;

  use axum::{Json, Router, extract::Query, routing::get, routing::post};
  use serde_json::{Value, json};

  use super::*;

  /// Serve `app` on an ephemeral local port.
  async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
  }

  fn client(addr: SocketAddr) -> GeminiClient {
    GeminiClient::new(AssistConfig {
      api_key:  "test-key".into(),
      model:    "test-model".into(),
      base_url: format!("http://{addr}/v1beta"),
    })
    .unwrap()
  }

  fn reply(text: &str) -> Json<Value> {
    Json(json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }))
  }

  #[test]
  fn mime_guess_prefers_declared_type() {
    assert_eq!(guess_mime("a.pdf", Some("image/png")), "image/png");
    assert_eq!(guess_mime("a.PDF", Some("application/octet-stream")), "application/pdf");
    assert_eq!(guess_mime("scan.png", None), "image/png");
    assert_eq!(guess_mime("scan.heic", Some("")), "image/jpeg");
  }

  #[test]
  fn policy_text_is_capped() {
    let html = format!("<p>{}</p>", "가".repeat(MAX_POLICY_CHARS + 50));
    assert_eq!(policy_text(&html).chars().count(), MAX_POLICY_CHARS);
  }

  #[tokio::test]
  async fn extract_sends_inline_document_and_parses_reply() {
    let app = Router::new().route(
      "/v1beta/models/{call}",
      post(|Query(q): Query<Vec<(String, String)>>, Json(body): Json<Value>| async move {
        assert!(q.contains(&("key".into(), "test-key".into())));
        let inline = &body["contents"][0]["parts"][0]["inline_data"];
        assert_eq!(inline["mime_type"], "application/pdf");
        assert_eq!(inline["data"], STANDARD.encode(b"%PDF"));
        reply("```json\n{\"softwares\":[{\"name\":\"클래스팅\"},{\"name\":\"Padlet\"}]}\n```")
      }),
    );
    let addr = serve(app).await;

    let names = client(addr)
      .extract_software_names(b"%PDF", "minutes.pdf", None)
      .await
      .unwrap();
    assert_eq!(names, ["클래스팅", "Padlet"]);
  }

  #[tokio::test]
  async fn upstream_failure_is_reported() {
    let app = Router::new().route(
      "/v1beta/models/{call}",
      post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "quota") }),
    );
    let addr = serve(app).await;

    let err = client(addr)
      .extract_software_names(b"x", "a.png", None)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 429, ref body } if body == "quota"));
  }

  #[tokio::test]
  async fn summary_fetches_page_and_returns_text() {
    let policy = format!("<html><nav>menu</nav><p>{}</p></html>", "개인정보 수집 항목 ".repeat(20));
    let app = Router::new()
      .route("/policy", get(move || async move { axum::response::Html(policy) }))
      .route(
        "/v1beta/models/{call}",
        post(|Json(body): Json<Value>| async move {
          let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
          assert!(prompt.contains("개인정보 수집 항목"));
          assert!(!prompt.contains("menu"));
          assert_eq!(body["generationConfig"]["maxOutputTokens"], 600);
          reply("- 목적: 서비스 제공\n- 항목: 이름\n- 보유 기간: 탈퇴 시")
        }),
      );
    let addr = serve(app).await;

    let summary = client(addr)
      .summarize_privacy_policy(&format!("http://{addr}/policy"))
      .await
      .unwrap();
    assert!(summary.starts_with("- 목적"));
  }

  #[tokio::test]
  async fn short_or_blocked_pages_are_errors() {
    let app = Router::new()
      .route("/tiny", get(|| async { "<p>short</p>" }))
      .route("/blocked", get(|| async { axum::http::StatusCode::FORBIDDEN }));
    let addr = serve(app).await;
    let c = client(addr);

    let err = c
      .summarize_privacy_policy(&format!("http://{addr}/tiny"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::PageTooShort(5)));

    let err = c
      .summarize_privacy_policy(&format!("http://{addr}/blocked"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::PageStatus(403)));

    let err = c.summarize_privacy_policy("ftp://x").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
  }
}
