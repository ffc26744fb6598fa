//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, events, errors)
//! - `period` - Calendar windows (monthly, quarterly, yearly) and their lock state
//! - `scoring` - Event aggregation, rule caps, scores and rankings

pub mod foundation;
pub mod period;
pub mod scoring;
