//! Printable consent letter for guardians, produced as a `.docx` file.
//!
//! The letter follows a fixed template: a header with the class and teacher,
//! the consent notice, the QR code pointing at the online consent form, and a
//! tear-off reply slip for guardians who answer on paper.

mod docx;

pub mod error;

pub use docx::{LetterInput, letter_file_name, render_letter};
pub use error::{Error, Result};
