//! HR Scoring - period scores, rule caps and rankings for HR performance
//! tracking.
//!
//! Approved performance events are aggregated per user and period, capped
//! per rule, compared against the previous period and ranked within a
//! department or company-wide.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
