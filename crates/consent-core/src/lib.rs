//! Core types, consent reconciliation rules and the store trait for the
//! school software consent service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod approval;
pub mod class;
pub mod code;
pub mod consent;
pub mod error;
pub mod identity;
pub mod import;
pub mod mask;
pub mod school;
pub mod session;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
