//! Short human-readable codes (confirmation codes, school access codes).

use rand_core::RngCore;

/// Upper-case letters and digits without the look-alikes `0 O 1 I`.
/// Exactly 32 symbols, so `next_u32() % 32` is unbiased.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of the confirmation code shown to a guardian after submitting.
pub const CONFIRMATION_CODE_LEN: usize = 3;

/// Length of a school access code.
pub const ACCESS_CODE_LEN: usize = 6;

/// Draw `len` symbols from [`CODE_ALPHABET`].
pub fn random_code<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> String {
  (0..len)
    .map(|_| {
      let idx = (rng.next_u32() % CODE_ALPHABET.len() as u32) as usize;
      CODE_ALPHABET[idx] as char
    })
    .collect()
}

pub fn confirmation_code<R: RngCore + ?Sized>(rng: &mut R) -> String {
  random_code(rng, CONFIRMATION_CODE_LEN)
}

pub fn access_code<R: RngCore + ?Sized>(rng: &mut R) -> String {
  random_code(rng, ACCESS_CODE_LEN)
}

#[cfg(test)]
mod tests {
  use rand_core::OsRng;

  use super::*;

  #[test]
  fn confirmation_code_uses_unambiguous_alphabet() {
    for _ in 0..200 {
      let code = confirmation_code(&mut OsRng);
      assert_eq!(code.len(), CONFIRMATION_CODE_LEN);
      assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)), "{code}");
      assert!(!code.contains(['0', 'O', '1', 'I']));
    }
  }

  #[test]
  fn access_code_length() {
    assert_eq!(access_code(&mut OsRng).len(), ACCESS_CODE_LEN);
  }
}
