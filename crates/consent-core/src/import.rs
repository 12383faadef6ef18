//! Software-list import from spreadsheet exports (CSV).
//!
//! Columns are located by keyword rather than position, so the same importer
//! accepts the Korean template and ad-hoc English sheets. A header is a
//! match when it contains one of the keywords; the first matching header wins.

use crate::{Error, Result, class::SoftwareItem};

// ─── Tokenizer ───────────────────────────────────────────────────────────────

/// Split `text` into records of fields. Handles quoted fields with embedded
/// separators, newlines and doubled quotes, and both LF and CRLF endings.
/// Blank lines are dropped.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
  let mut records = Vec::new();
  let mut record = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut chars = text.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          field.push('"');
          chars.next();
        }
        '"' => in_quotes = false,
        _ => field.push(c),
      }
      continue;
    }
    match c {
      '"' => in_quotes = true,
      ',' => record.push(std::mem::take(&mut field)),
      '\r' => {}
      '\n' => {
        record.push(std::mem::take(&mut field));
        push_record(&mut records, std::mem::take(&mut record));
      }
      _ => field.push(c),
    }
  }
  if !field.is_empty() || !record.is_empty() {
    record.push(field);
    push_record(&mut records, record);
  }
  records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
  if record.iter().any(|f| !f.trim().is_empty()) {
    records.push(record);
  }
}

fn clean_header(h: &str) -> String {
  h.trim()
    .trim_start_matches('\u{feff}')
    .replace(['\r', '\n'], "")
    .trim()
    .to_owned()
}

// ─── Column detection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
  name:           usize,
  age:            Option<usize>,
  url:            Option<usize>,
  privacy:        Option<usize>,
  collection_use: Option<usize>,
  third_party:    Option<usize>,
}

fn find(headers: &[String], pred: impl Fn(&str, &str) -> bool) -> Option<usize> {
  headers
    .iter()
    .position(|h| pred(h, &h.to_lowercase()))
}

impl Columns {
  fn detect(headers: &[String]) -> Result<Self> {
    let name = find(headers, |h, l| h.contains('명') || l.contains("name"))
      .ok_or_else(|| Error::Csv("no software-name column in header".into()))?;
    let privacy = find(headers, |h, l| {
      h.contains("약관") || h.contains("방침") || l.contains("privacy")
    });
    let url = headers.iter().enumerate().position(|(i, h)| {
      Some(i) != privacy && (h.contains("주소") || h.to_lowercase().contains("url"))
    });

    Ok(Self {
      name,
      age: find(headers, |h, l| h.contains("연령") || l.contains("age")),
      url,
      privacy,
      collection_use: find(headers, |h, _| {
        (h.contains("수집") && h.contains("이용")) || h.contains("수집이용")
      }),
      third_party: find(headers, |h, _| {
        (h.contains("제3자") && h.contains("제공")) || h.contains("제3자제공")
      }),
    })
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Build software items from a CSV export. Rows without a name are skipped;
/// an export with no usable rows is an error.
pub fn import_softwares(text: &str) -> Result<Vec<SoftwareItem>> {
  let mut records = parse_records(text).into_iter();
  let headers: Vec<String> = records
    .next()
    .ok_or_else(|| Error::Csv("file is empty".into()))?
    .iter()
    .map(|h| clean_header(h))
    .collect();
  let cols = Columns::detect(&headers)?;

  let cell = |row: &[String], idx: Option<usize>| -> String {
    idx
      .and_then(|i| row.get(i))
      .map(|v| v.trim().to_owned())
      .unwrap_or_default()
  };
  let optional = |v: String| if v.is_empty() { None } else { Some(v) };

  let items: Vec<SoftwareItem> = records
    .filter_map(|row| {
      let name = cell(&row, Some(cols.name));
      if name.is_empty() {
        return None;
      }
      Some(SoftwareItem {
        age_range: cell(&row, cols.age),
        url: cell(&row, cols.url),
        privacy_url: cell(&row, cols.privacy),
        collection_use_consent: optional(cell(&row, cols.collection_use)),
        third_party_consent: optional(cell(&row, cols.third_party)),
        ..SoftwareItem::new(name)
      })
    })
    .collect();

  if items.is_empty() {
    return Err(Error::Csv("no software rows found".into()));
  }
  Ok(items)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenizer_handles_quotes_and_crlf() {
    let recs = parse_records("a,\"b,c\",\"say \"\"hi\"\"\"\r\n\r\n1,\"multi\nline\",3\r\n");
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0], ["a", "b,c", "say \"hi\""]);
    assert_eq!(recs[1], ["1", "multi\nline", "3"]);
  }

  #[test]
  fn tokenizer_keeps_last_line_without_newline() {
    let recs = parse_records("x,y\n1,");
    assert_eq!(recs[1], ["1", ""]);
  }

  #[test]
  fn korean_template_columns() {
    let csv = "\u{feff}에듀테크명,사용연령,사이트 주소,개인정보처리방침,수집·이용 동의 내용,제3자 제공 동의 내용\n\
               클래스팅,8세 이상,https://classting.com,https://classting.com/privacy,이름 수집,제공 없음\n\
               ,,,,,\n\
               패들렛,13세 이상,https://padlet.com,,,\n";
    let items = import_softwares(csv).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "클래스팅");
    assert_eq!(items[0].age_range, "8세 이상");
    assert_eq!(items[0].url, "https://classting.com");
    assert_eq!(items[0].privacy_url, "https://classting.com/privacy");
    assert_eq!(items[0].collection_use_consent.as_deref(), Some("이름 수집"));
    assert_eq!(items[0].third_party_consent.as_deref(), Some("제공 없음"));
    assert_eq!(items[1].privacy_url, "");
    assert_eq!(items[1].collection_use_consent, None);
    assert_ne!(items[0].id, items[1].id);
  }

  #[test]
  fn english_headers_and_privacy_url_column() {
    let csv = "Software Name,Age,Privacy URL,URL\nPadlet,13+,https://p/privacy,https://p\n";
    let items = import_softwares(csv).unwrap();
    assert_eq!(items[0].privacy_url, "https://p/privacy");
    assert_eq!(items[0].url, "https://p");
  }

  #[test]
  fn missing_name_column_is_an_error() {
    assert!(matches!(import_softwares("a,b\n1,2\n"), Err(Error::Csv(_))));
    assert!(matches!(import_softwares(""), Err(Error::Csv(_))));
    assert!(matches!(import_softwares("name\n \n"), Err(Error::Csv(_))));
  }
}
