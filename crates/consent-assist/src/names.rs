//! Reading software names out of a model reply.
//!
//! The model is asked for `{"softwares":[{"name":"..."}]}` but may wrap it in
//! prose or markdown, or return JSON that does not parse. The outermost braces
//! are tried as JSON first; failing that, every `"name": "..."` pair is
//! scanned for directly.

use serde_json::Value;

/// Names listed in `text`, trimmed, blanks dropped, in reply order.
pub fn parse_software_names(text: &str) -> Vec<String> {
  let object = match (text.find('{'), text.rfind('}')) {
    (Some(start), Some(end)) if start < end => &text[start..=end],
    _ => return Vec::new(),
  };

  match serde_json::from_str::<Value>(object) {
    Ok(value) => from_json(&value),
    Err(_) => scan_name_pairs(text),
  }
}

fn from_json(value: &Value) -> Vec<String> {
  value
    .get("softwares")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .filter_map(|entry| entry.get("name").and_then(Value::as_str))
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(str::to_owned)
    .collect()
}

fn scan_name_pairs(text: &str) -> Vec<String> {
  const KEY: &str = "\"name\"";

  let mut names = Vec::new();
  let mut rest = text;
  while let Some(i) = rest.find(KEY) {
    rest = &rest[i + KEY.len()..];
    let Some(after) = rest.trim_start().strip_prefix(':') else {
      continue;
    };
    let Some(value) = after.trim_start().strip_prefix('"') else {
      continue;
    };
    let Some(end) = value.find('"') else {
      break;
    };
    let name = value[..end].trim();
    if !name.is_empty() {
      names.push(name.to_owned());
    }
    rest = &value[end + 1..];
  }
  names
}
