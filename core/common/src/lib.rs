//! Common utilities and types shared across peoplesync modules.
//!
//! This module provides the error type used by every crate in the workspace
//! and the validated value types that make up a contact.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{display_or, Address, ContactName, Email, Phone, RemoteId, SensitiveString, Tag};
