//! Period handlers.

mod lock;
mod resolver;

pub use lock::PeriodLockHandler;
pub use resolver::PeriodResolver;
