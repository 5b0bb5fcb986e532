use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use log::info;

use jobflow::db::job::StatePoint;
use jobflow::db::SqliteStore;
use jobflow::project::CommandProject;
use jobflow::report::{Reporter, StatusOptions};
use jobflow::scheduler::Scheduler;
use jobflow::script::mpirun;
use jobflow::slurm::Slurm;
use jobflow::submit::{SubmitOptions, Submitter, DEFAULT_WALLTIME_HRS};
use jobflow::WorkingDirectory;

#[derive(Parser, Debug)]
#[command(author, version, about = "Submit workflow operations to SLURM and track their status")]
struct Cli {
    /// Project root holding the job database, bundle files and job scripts
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
    /// Project name, used to name bundle files
    #[arg(long, default_value = "project")]
    project: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a job from a JSON state-point, printing its id
    Add { statepoint: String },
    /// Submit eligible operations to the scheduler
    Submit(SubmitArgs),
    /// Print the project's status
    Status(StatusArgs),
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Ids of the jobs to submit, omit to select all eligible jobs
    jobid: Vec<String>,
    /// Operation to submit
    #[arg(short = 'j', long = "job-operation", default_value = "run")]
    operation: String,
    /// Command template, `{job}` and `{operation}` are filled in
    #[arg(short, long, default_value = "python scripts/run.py {operation} {job}")]
    command: String,
    /// Processors per operation
    #[arg(long, default_value_t = 1)]
    np: u32,
    /// Wrap multi-processor commands with mpirun
    #[arg(long)]
    mpi: bool,
    /// Wallclock time in hours [default: 12]
    #[arg(short, long, value_parser = parse_walltime)]
    walltime: Option<Duration>,
    /// Don't submit, print the job script instead
    #[arg(long)]
    pretend: bool,
    /// Limit the number of operations submitted at once
    #[arg(short, long)]
    num: Option<usize>,
    /// Don't check job status or eligibility, just submit
    #[arg(long)]
    force: bool,
    /// JSON filter on state-point values
    #[arg(short, long)]
    filter: Option<String>,
    /// Run after completion of these colon-separated scheduler ids
    #[arg(long)]
    after: Option<String>,
    /// Run submissions one after another
    #[arg(short, long)]
    serial: bool,
    /// Operations per submission; without a value all eligible operations are bundled
    #[arg(long, num_args = 0..=1, default_missing_value = "0")]
    bundle: Option<usize>,
    /// Submit with a user hold applied
    #[arg(long)]
    hold: bool,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Operation reported as next for every job
    #[arg(short = 'j', long = "job-operation", default_value = "run")]
    operation: String,
    /// JSON filter on state-point values
    #[arg(short, long)]
    filter: Option<String>,
    /// Show one row per job
    #[arg(short, long)]
    detailed: bool,
    /// State-point parameters to show in the detailed view
    #[arg(short, long, num_args = 1..)]
    parameters: Vec<String>,
    /// Only show jobs that are not active
    #[arg(long)]
    skip_active: bool,
    /// Don't query the scheduler before reporting
    #[arg(long)]
    no_update: bool,
    /// Print status records as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    info!("starting up");

    let cli = Cli::parse();
    let wd = WorkingDirectory { path: cli.root.clone() };
    let store = SqliteStore::open(&wd)
        .with_context(|| format!("Can't open job database in {}", wd.path.display()))?;
    let slurm = match std::env::var("USER") {
        Ok(user) => Slurm::new(&wd.path).with_user(&user),
        Err(_) => Slurm::new(&wd.path),
    };

    match cli.command {
        Commands::Add { statepoint } => {
            let statepoint = parse_object(&statepoint)?;
            let job = store.insert_job(statepoint)?;
            println!("{job}");
        }
        Commands::Submit(args) => {
            let mut project = CommandProject::new(&cli.project, &wd.path, &args.operation, &args.command)
                .with_processors(args.np);
            if args.mpi {
                project = project.with_mpi(Box::new(mpirun));
            }
            let filter = args.filter.as_deref().map(parse_object).transpose()?;
            let options = SubmitOptions {
                walltime: Some(args.walltime.unwrap_or_else(|| Duration::hours(DEFAULT_WALLTIME_HRS))),
                bundle: args.bundle,
                serial: args.serial,
                after: args.after,
                num: args.num,
                pretend: args.pretend,
                force: args.force,
                hold: args.hold,
            };
            let job_ids = match args.jobid.is_empty() {
                true => None,
                false => Some(args.jobid.as_slice()),
            };

            let submitter = Submitter::new(&project, &store, &slurm);
            let summary = submitter
                .submit(job_ids, None, filter.as_ref(), &options)
                .context("Submission aborted")?;
            info!("Scheduler ids: {}", summary.scheduler_ids.join(", "));
        }
        Commands::Status(args) => {
            let project = CommandProject::new(&cli.project, &wd.path, &args.operation, "");
            let options = StatusOptions {
                filter: args.filter.as_deref().map(parse_object).transpose()?,
                detailed: args.detailed,
                parameters: args.parameters,
                skip_active: args.skip_active,
            };
            let scheduler: Option<&dyn Scheduler> = match args.no_update {
                true => None,
                false => Some(&slurm),
            };

            let reporter = Reporter::new(&project, &store);
            let stati = reporter.print_status(scheduler, &options, &mut io::stdout(), &mut io::stderr())?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stati)?);
            }
        }
    }

    Ok(())
}

fn parse_object(json: &str) -> Result<StatePoint> {
    serde_json::from_str::<StatePoint>(json).with_context(|| format!("Not a JSON object: {json}"))
}

/// Longest walltime accepted, in hours
const MAX_WALLTIME_HRS: f64 = 1_000_000.0;

/// Hours, possibly fractional, rounded to whole seconds
fn parse_walltime(hours: &str) -> std::result::Result<Duration, String> {
    let hours: f64 = hours.trim().parse().map_err(|_| format!("{hours:?} is not a number of hours"))?;
    if !hours.is_finite() || hours > MAX_WALLTIME_HRS {
        return Err(format!("walltime must be at most {MAX_WALLTIME_HRS} hours"));
    }
    let seconds = (hours * 3600.0).round() as i64;
    match seconds > 0 {
        true => Ok(Duration::seconds(seconds)),
        false => Err("walltime must be at least one second".to_string()),
    }
}
