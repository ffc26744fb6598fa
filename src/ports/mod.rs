//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the scoring domain and the outside world. Adapters implement these ports.
//!
//! ## Read Ports
//!
//! - `PerformanceEventSource` - Approved and pending events per user
//! - `RuleSource` - Scoring rules and their pack windows
//! - `EmployeeDirectory` - Users, departments and active flags
//!
//! ## Write Ports
//!
//! - `PeriodRepository` - Get-or-create periods and lock state
//! - `ScoreRepository` - Cached scores and rankings
//! - `AuditSink` - Audit trail of computations

mod audit_sink;
mod employee_directory;
mod performance_event_source;
mod period_repository;
mod rule_source;
mod score_repository;

pub use audit_sink::AuditSink;
pub use employee_directory::{Employee, EmployeeDirectory};
pub use performance_event_source::PerformanceEventSource;
pub use period_repository::PeriodRepository;
pub use rule_source::RuleSource;
pub use score_repository::ScoreRepository;
