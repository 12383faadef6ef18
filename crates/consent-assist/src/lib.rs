//! Client for the generative-language service used by administrators and
//! teachers: reading software names off scanned committee documents, and
//! summarising privacy policies for guardians.
//!
//! Every call is optional from the caller's point of view; nothing in the
//! consent flow depends on the service being reachable.

mod client;
mod html;
mod names;

pub mod error;

pub use client::{AssistConfig, GeminiClient};
pub use error::{Error, Result};
pub use html::strip_html;
pub use names::parse_software_names;
