//! Shared domain types for the photobooth strip composer.

pub mod config;
pub mod frame;
pub mod session;

mod errors;

pub use errors::{PhotoboothError, Result};
