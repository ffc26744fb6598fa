//! Scoring handlers.

mod department_summary;
mod orchestrator;
mod ranking;
mod recorder;

pub use department_summary::DepartmentSummaryHandler;
pub use orchestrator::{BatchOutcome, ScoringOrchestrator, ScoringPorts};
pub use ranking::RankingService;
pub use recorder::{RecordedScore, ScoreRecorder};
