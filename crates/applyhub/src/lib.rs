//! Single-table repositories and workflows for applications and posts.

pub mod config;
pub mod files;
pub mod repository;
pub mod storage;
pub mod telemetry;
pub mod workflows;
