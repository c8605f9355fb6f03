//! Storage for imported application state.
//!
//! The store is the collaborator that gives imported entities their real
//! identifiers and reconnects the references between them.

mod memory;

pub use memory::{ImportReport, MemoryStore};
