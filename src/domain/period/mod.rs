//! Period module - calendar windows that scores are computed against.

mod key;
#[allow(clippy::module_inception)]
mod period;

pub use key::{PeriodKey, PeriodType};
pub use period::{Period, PeriodDraft};
