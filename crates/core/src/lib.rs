//! applyhub_core - the functional core of applyhub.
//!
//! Everything in this crate is free of I/O: entity models and their key
//! scheme, validation rules, the contract of the single-table key-value store,
//! the object-storage capability and the repository error taxonomy. Backends
//! and repositories live in the `applyhub` crate.

pub mod files;
pub mod models;
pub mod storage;
pub mod store;
