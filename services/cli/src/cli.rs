use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use placement_core::config::{AppConfig, NotificationConfig};
use placement_core::error::AppError;
use placement_core::placement::{
    ChannelNotifier, Clock, DriveId, DriveLifecycleManager, EligibilityService,
    ExpectedCompanyRegistry, InMemoryOutbox, PlacementRequest, StatisticsAggregator, StudentId,
    SystemClock, VisitFilter, VisitStatus,
};
use placement_core::telemetry;

use crate::demo::run_demo;
use crate::infra::{
    parse_date, parse_decimal, parse_visit_status, print_json, RosterSources, Workspace,
};

#[derive(Parser, Debug)]
#[command(
    name = "placement",
    about = "Check drive eligibility, manage drives and report placement statistics",
    version
)]
struct Cli {
    /// Student roster CSV (defaults to PLACEMENT_STUDENTS_CSV, then the sample roster)
    #[arg(long, global = true)]
    students: Option<PathBuf>,
    /// Placement drive CSV (defaults to PLACEMENT_DRIVES_CSV, then the sample drives)
    #[arg(long, global = true)]
    drives: Option<PathBuf>,
    /// Application CSV (defaults to PLACEMENT_APPLICATIONS_CSV, then the sample applications)
    #[arg(long, global = true)]
    applications: Option<PathBuf>,
    /// Expected visits CSV (defaults to PLACEMENT_EXPECTED_COMPANIES_CSV, then the samples)
    #[arg(long, global = true)]
    expected_companies: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List open drives the student may apply to
    Eligible {
        #[arg(long)]
        student: String,
    },
    /// Evaluate every criterion of one drive for one student
    Check {
        #[arg(long)]
        student: String,
        #[arg(long)]
        drive: u64,
    },
    /// Print placement statistics as JSON
    Stats(StatsArgs),
    /// Print application counts for a single drive
    DriveStats {
        #[arg(long)]
        drive: u64,
    },
    /// Record a placement and print the updated overall statistics
    Place(PlaceArgs),
    /// Cancel a drive and print the notifications sent to its applicants
    Cancel {
        #[arg(long)]
        drive: u64,
    },
    /// List companies expected to visit
    Expected(ExpectedArgs),
    /// Run a seeded end-to-end walk-through without input files
    Demo,
}

#[derive(Args, Debug)]
struct ExpectedArgs {
    /// Expected visit year (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,
    /// Only visits in this state: confirmed, expected or cancelled
    #[arg(long, value_parser = parse_visit_status)]
    status: Option<VisitStatus>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Which breakdown to print
    #[arg(long, value_enum, default_value_t = StatsView::Overall)]
    by: StatsView,
    /// Visit year for `--by companies` (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StatsView {
    Overall,
    Department,
    Year,
    Companies,
}

#[derive(Args, Debug)]
struct PlaceArgs {
    #[arg(long)]
    student: String,
    #[arg(long)]
    company: String,
    /// Package in lakhs per annum, e.g. 12.50
    #[arg(long, value_parser = parse_decimal)]
    package: Decimal,
    #[arg(long)]
    role: String,
    /// Placement date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, "placement tooling ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    if let Command::Demo = cli.command {
        return run_demo(config.notifications, clock).await;
    }

    let sources = RosterSources {
        students: cli.students,
        drives: cli.drives,
        applications: cli.applications,
        expected_companies: cli.expected_companies,
    }
    .or_config(&config.data);
    let workspace = Workspace::load(sources, clock)?;

    match cli.command {
        Command::Eligible { student } => {
            let service = EligibilityService::new(workspace.stores.clone(), workspace.clock);
            print_json(&service.eligible_drives(&StudentId(student))?)
        }
        Command::Check { student, drive } => {
            let service = EligibilityService::new(workspace.stores.clone(), workspace.clock);
            let verdict = service.check_eligibility(&StudentId(student), DriveId(drive))?;
            println!("{}", verdict.summary());
            print_json(&verdict)
        }
        Command::Stats(args) => run_stats(&workspace, args),
        Command::DriveStats { drive } => {
            let statistics = StatisticsAggregator::new(workspace.stores.clone(), workspace.clock);
            print_json(&statistics.drive_statistics(DriveId(drive))?)
        }
        Command::Place(args) => run_place(&workspace, args),
        Command::Cancel { drive } => {
            run_cancel(&workspace, DriveId(drive), config.notifications).await
        }
        Command::Expected(args) => run_expected(&workspace, args),
        Command::Demo => Ok(()),
    }
}

fn run_stats(workspace: &Workspace, args: StatsArgs) -> Result<(), AppError> {
    let statistics = StatisticsAggregator::new(workspace.stores.clone(), workspace.clock.clone());
    match args.by {
        StatsView::Overall => print_json(&statistics.overall()?),
        StatsView::Department => print_json(&statistics.by_department()?),
        StatsView::Year => print_json(&statistics.by_year()?),
        StatsView::Companies => {
            let year = args.year.unwrap_or_else(|| workspace.clock.current_year());
            print_json(&statistics.top_companies(year)?)
        }
    }
}

fn run_place(workspace: &Workspace, args: PlaceArgs) -> Result<(), AppError> {
    let statistics = StatisticsAggregator::new(workspace.stores.clone(), workspace.clock.clone());
    let receipt = statistics.record_placement(PlacementRequest {
        student_id: StudentId(args.student),
        company_name: args.company,
        package_lpa: args.package,
        role: args.role,
        placement_date: args
            .date
            .unwrap_or_else(|| workspace.clock.now().date_naive()),
    })?;
    let overall = statistics.overall()?;
    print_json(&json!({ "placement": receipt, "overall": overall }))
}

fn run_expected(workspace: &Workspace, args: ExpectedArgs) -> Result<(), AppError> {
    let registry = ExpectedCompanyRegistry::new(workspace.stores.clone(), workspace.clock.clone());
    let year = args.year.unwrap_or_else(|| workspace.clock.current_year());
    let companies = registry.list(&VisitFilter {
        year: Some(year),
        status: args.status,
    })?;
    let planned = companies
        .iter()
        .filter(|company| company.status.is_planned())
        .count();
    print_json(&json!({ "year": year, "planned": planned, "companies": companies }))
}

async fn run_cancel(
    workspace: &Workspace,
    drive_id: DriveId,
    notifications: NotificationConfig,
) -> Result<(), AppError> {
    let outbox = Arc::new(InMemoryOutbox::default());
    let (notifier, worker) = ChannelNotifier::spawn(notifications, outbox.clone());
    let lifecycle = DriveLifecycleManager::new(
        workspace.stores.clone(),
        Arc::new(notifier),
        workspace.clock.clone(),
    );

    let cancelled = lifecycle.cancel(drive_id);
    drop(lifecycle);
    if let Err(err) = worker.await {
        warn!(error = %err, "notification worker stopped abnormally");
    }

    let drive = cancelled?;
    print_json(&json!({ "drive": drive, "notifications": outbox.delivered() }))
}
