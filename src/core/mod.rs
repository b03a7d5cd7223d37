//! Core utilities and common types for contact-fl.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
