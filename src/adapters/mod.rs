//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-memory implementations for tests and fixtures
//! - `postgres` - PostgreSQL implementations backed by sqlx

pub mod memory;
pub mod postgres;
