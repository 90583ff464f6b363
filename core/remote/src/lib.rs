//! Remote contact directory abstraction for peoplesync.
//!
//! This module provides a trait-based interface to a People-style contact
//! directory, the session object that guards access to it, and a registry
//! for resolving directory backends by name.
//!
//! # Design Principles
//! - Directory isolation: no backend-specific logic in the sync engine
//! - Async operations: every directory call is an awaited round-trip
//! - Wire shape: `RemoteContact` serializes like a People API `Person`

pub mod contact;
pub mod directory;
pub mod file;
pub mod mask;
pub mod memory;
pub mod registry;
pub mod session;

pub use contact::{EmailAddress, Name, PersonMetadata, PhoneNumber, PostalAddress, RemoteContact, Source};
pub use directory::RemoteDirectory;
pub use file::FileDirectory;
pub use mask::{PersonField, UpdateMask};
pub use memory::{DirectoryCalls, DirectoryOp, MemoryDirectory};
pub use registry::{create_default_registry, DirectoryFactory, DirectoryRegistry};
pub use session::{RemoteSession, SessionHandle, SessionState, StoredCredentials, AUTHENTICATE_FIRST};
