//! Name masking for dashboards.

/// Hide the interior of a name, counting characters rather than bytes.
///
/// Names shorter than two characters are returned as-is; two-character names
/// keep their first character; longer names keep the first and last.
pub fn mask_name(name: &str) -> String {
  let chars: Vec<char> = name.chars().collect();
  match chars.len() {
    0 | 1 => name.to_owned(),
    2 => format!("{}*", chars[0]),
    n => {
      let mut out = String::with_capacity(name.len());
      out.push(chars[0]);
      out.extend(std::iter::repeat_n('*', n - 2));
      out.push(chars[n - 1]);
      out
    }
  }
}

#[cfg(test)]
mod tests {
  use super::mask_name;

  #[test]
  fn short_names_are_unchanged() {
    assert_eq!(mask_name(""), "");
    assert_eq!(mask_name("K"), "K");
    assert_eq!(mask_name("김"), "김");
  }

  #[test]
  fn two_characters_keep_the_first() {
    assert_eq!(mask_name("Jo"), "J*");
    assert_eq!(mask_name("이준"), "이*");
  }

  #[test]
  fn longer_names_keep_both_ends() {
    assert_eq!(mask_name("홍길동"), "홍*동");
    assert_eq!(mask_name("Alexandra"), "A*******a");
    for name in ["abc", "남궁민수", "Jean-Luc"] {
      let masked: Vec<char> = mask_name(name).chars().collect();
      let original: Vec<char> = name.chars().collect();
      assert_eq!(masked.len(), original.len());
      assert_eq!(masked[0], original[0]);
      assert_eq!(masked[masked.len() - 1], original[original.len() - 1]);
      assert!(masked[1..masked.len() - 1].iter().all(|c| *c == '*'));
    }
  }
}
