//! Reducing a fetched policy page to plain text.

use std::sync::LazyLock;

use regex::Regex;

/// Whole `script`, `style`, `head`, `nav` and `footer` elements. Matching
/// ignores case; an unterminated element runs to the end of the input.
static NOISE_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  ["script", "style", "head", "nav", "footer"]
    .iter()
    .map(|tag| {
      Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?(?:</{tag}\s*>|\z)"))
        .expect("invalid noise block pattern")
    })
    .collect()
});

static TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag pattern"));

static WHITESPACE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Strip markup from `html`: drop script, style, head, nav and footer blocks,
/// replace every remaining tag with a space and collapse whitespace.
pub fn strip_html(html: &str) -> String {
  let mut text = html.to_owned();
  for block in NOISE_BLOCKS.iter() {
    text = block.replace_all(&text, "").into_owned();
  }
  let text = TAG.replace_all(&text, " ");
  WHITESPACE.replace_all(&text, " ").trim().to_owned()
}
