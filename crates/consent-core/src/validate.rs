//! Input validation for login forms. Failures are reported to the caller and
//! never persisted.

use crate::{Error, Result};

/// Length of every PIN, teacher or guardian.
pub const PIN_LEN: usize = 4;

/// A PIN is exactly [`PIN_LEN`] ASCII digits.
pub fn validate_pin(pin: &str) -> Result<()> {
  if pin.len() == PIN_LEN && pin.bytes().all(|b| b.is_ascii_digit()) {
    Ok(())
  } else {
    Err(Error::InvalidPin)
  }
}

/// Trim `value` and reject it when nothing is left.
pub fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(Error::MissingField(field))
  } else {
    Ok(trimmed)
  }
}

/// Year, section and student number are small positive integers.
pub fn positive<T: Into<u64> + Copy>(value: T, field: &'static str) -> Result<T> {
  if value.into() == 0 {
    Err(Error::NotPositive { field })
  } else {
    Ok(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pin_must_be_four_digits() {
    assert!(validate_pin("0123").is_ok());
    for bad in ["", "123", "12345", "12a4", "１２３４", " 123"] {
      assert!(matches!(validate_pin(bad), Err(Error::InvalidPin)), "{bad:?}");
    }
  }

  #[test]
  fn required_trims() {
    assert_eq!(required("  Kim ", "name").unwrap(), "Kim");
    assert!(matches!(required(" \t", "name"), Err(Error::MissingField("name"))));
  }

  #[test]
  fn positive_rejects_zero() {
    assert_eq!(positive(3u8, "year").unwrap(), 3);
    assert!(matches!(positive(0u32, "student_number"), Err(Error::NotPositive { .. })));
  }
}
