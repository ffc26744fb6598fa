use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use hr_scoring::adapters::memory::TracingAuditSink;
use hr_scoring::adapters::postgres::{
    self, PostgresAuditSink, PostgresEmployeeDirectory, PostgresEventSource, PostgresPeriodRepository,
    PostgresRuleSource, PostgresScoreRepository,
};
use hr_scoring::application::{
    DepartmentSummaryHandler, PeriodLockHandler, ScoringOrchestrator, ScoringPorts,
};
use hr_scoring::config::{AppConfig, ConfigError};
use hr_scoring::domain::foundation::{DepartmentId, DomainError, UserId};
use hr_scoring::domain::period::PeriodKey;
use hr_scoring::domain::scoring::ScoringError;
use hr_scoring::ports::AuditSink;
use hr_scoring::telemetry::{self, TelemetryError};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("database error: {0}")]
    Database(#[from] DomainError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "hr-scoring",
    about = "Compute, rank and lock HR performance scores",
    version
)]
struct Cli {
    /// Where audit events go
    #[arg(long, value_enum, default_value_t = AuditTarget::Postgres, global = true)]
    audit: AuditTarget,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AuditTarget {
    /// The audit_logs table
    Postgres,
    /// Structured log lines on the `audit` target
    Log,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute one user's score for a month, or any period with --period
    ComputeUser(ComputeUserArgs),
    /// Compute and rank every active member of a department
    ComputeDepartment(DepartmentArgs),
    /// Compute and rank every active user
    ComputeCompany(MonthArgs),
    /// Force recomputation of a month and re-rank
    Recalculate(RecalculateArgs),
    /// Lock a period against recomputation
    Lock(LockArgs),
    /// Unlock a period
    Unlock(LockArgs),
    /// Flag every score of a period for recomputation
    MarkStale(PeriodArgs),
    /// Summarize a department's stored scores
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct MonthArgs {
    #[arg(long)]
    year: i32,
    #[arg(long)]
    month: u32,
    /// Recompute even when a cached score exists
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct ComputeUserArgs {
    #[arg(long)]
    user: i64,
    /// Period key: YYYY-MM, YYYY-Qn or YYYY
    #[arg(long)]
    period: PeriodKey,
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct DepartmentArgs {
    #[arg(long)]
    department: i64,
    #[command(flatten)]
    month: MonthArgs,
}

#[derive(Args, Debug)]
struct RecalculateArgs {
    #[arg(long)]
    year: i32,
    #[arg(long)]
    month: u32,
    /// Restrict to one department; ranks company-wide when omitted
    #[arg(long)]
    department: Option<i64>,
}

#[derive(Args, Debug)]
struct PeriodArgs {
    /// Period key: YYYY-MM, YYYY-Qn or YYYY
    #[arg(long)]
    period: PeriodKey,
}

#[derive(Args, Debug)]
struct LockArgs {
    #[arg(long)]
    period: PeriodKey,
    /// User performing the change
    #[arg(long)]
    actor: i64,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[arg(long)]
    department: i64,
    #[arg(long)]
    period: PeriodKey,
}

pub(crate) async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;
    telemetry::init(&config.logging)?;

    let pool = postgres::connect(&config.database).await?;
    if config.database.run_migrations {
        postgres::run_migrations(&pool).await?;
        info!("Migrations applied");
    }

    let audit: Arc<dyn AuditSink> = match cli.audit {
        AuditTarget::Postgres => Arc::new(PostgresAuditSink::new(pool.clone())),
        AuditTarget::Log => Arc::new(TracingAuditSink),
    };
    let ports = ScoringPorts {
        events: Arc::new(PostgresEventSource::new(pool.clone())),
        rules: Arc::new(PostgresRuleSource::new(pool.clone())),
        directory: Arc::new(PostgresEmployeeDirectory::new(pool.clone())),
        periods: Arc::new(PostgresPeriodRepository::new(pool.clone())),
        scores: Arc::new(PostgresScoreRepository::new(pool)),
        audit,
    };

    match cli.command {
        Command::ComputeUser(args) => {
            let orchestrator = ScoringOrchestrator::new(ports, config.scoring);
            let score = orchestrator
                .compute_for(UserId::new(args.user), args.period, args.force)
                .await?;
            print_json(&score)
        }
        Command::ComputeDepartment(args) => {
            let orchestrator = ScoringOrchestrator::new(ports, config.scoring);
            let outcome = orchestrator
                .compute_department(
                    DepartmentId::new(args.department),
                    args.month.year,
                    args.month.month,
                    args.month.force,
                )
                .await?;
            print_json(&outcome)
        }
        Command::ComputeCompany(args) => {
            let orchestrator = ScoringOrchestrator::new(ports, config.scoring);
            let outcome = orchestrator
                .compute_company(args.year, args.month, args.force)
                .await?;
            print_json(&outcome)
        }
        Command::Recalculate(args) => {
            let orchestrator = ScoringOrchestrator::new(ports, config.scoring);
            let summary = orchestrator
                .recalculate_period(args.year, args.month, args.department.map(DepartmentId::new))
                .await?;
            print_json(&summary)
        }
        Command::Lock(args) => {
            let period = lock_handler(ports)
                .lock_period(args.period, UserId::new(args.actor))
                .await?;
            print_json(&period)
        }
        Command::Unlock(args) => {
            let period = lock_handler(ports)
                .unlock_period(args.period, UserId::new(args.actor))
                .await?;
            print_json(&period)
        }
        Command::MarkStale(args) => {
            let flagged = lock_handler(ports).mark_period_stale(args.period).await?;
            print_json(&serde_json::json!({ "period": args.period, "flagged": flagged }))
        }
        Command::Summary(args) => {
            let summary = DepartmentSummaryHandler::new(ports.periods, ports.scores)
                .handle(DepartmentId::new(args.department), args.period)
                .await?;
            print_json(&summary)
        }
    }
}

fn lock_handler(ports: ScoringPorts) -> PeriodLockHandler {
    PeriodLockHandler::new(ports.periods, ports.scores, ports.audit)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
