//! Shared database repository test infrastructure
//!
//! The same test logic runs against both SQLite and PostgreSQL:
//!
//! - **Unit tests (SQLite)**: Fast, in-memory tests that run with every `cargo test`
//! - **Integration tests (PostgreSQL)**: Slower tests using testcontainers, run with `cargo test -- --ignored`
//!
//! Each repository has a test module containing shared async test functions
//! that take `&dyn XxxRepo`, instantiated per backend by the `sqlite_test!`
//! and `postgres_test!` macros.

pub mod harness;
