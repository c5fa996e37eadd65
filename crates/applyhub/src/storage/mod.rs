//! Store backend implementations.
//!
//! This module provides concrete implementations of the
//! [`KeyValueStore`](applyhub_core::store::KeyValueStore) contract defined in
//! `applyhub_core::store`. Backends are selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process emulation of the table, its indexes,
//!   conditions, batches and transactions
//! - `dynamodb`: AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! Both backends may be compiled in at once; the binary prefers DynamoDB when
//! it is available.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p applyhub --features dynamodb
//! ```

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No store backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p applyhub --features dynamodb"
);

#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(any(test, feature = "inmemory"))]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
