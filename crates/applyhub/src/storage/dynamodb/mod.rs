//! DynamoDB store backend.
//!
//! Implements the single-table store contract using `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod expressions;
mod store;

pub use store::DynamoDbStore;
