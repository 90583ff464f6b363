//! Local contact model and store abstraction for peoplesync.
//!
//! This module provides:
//! - `LocalContact`, the record owned by the on-device address book
//! - `Meeting`, a value object carried on contacts
//! - The `ContactStore` trait with in-memory and JSON-file backends
//!
//! Records are replaced wholesale; stores never hand out mutable references
//! to the contacts they hold.

pub mod contact;
pub mod file;
pub mod meeting;
pub mod memory;
pub mod store;

pub use contact::LocalContact;
pub use file::JsonFileStore;
pub use meeting::Meeting;
pub use memory::MemoryStore;
pub use store::ContactStore;
