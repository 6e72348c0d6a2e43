use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use provost_core::config::ProvostConfig;
use provost_core::queue::JobQueue;
use provost_core::scheduler::Scheduler;
use provost_core::store::CourseStore;

#[derive(Parser)]
#[command(
    name = "provost",
    about = "Course-provisioning orchestration engine — durable steps, idempotent resume",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true, env = "PROVOST_CONFIG", default_value = "provost.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the management API and the provisioning worker
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// List courses
    Courses,

    /// Show per-step provisioning status for a course
    Status { course_id: Uuid },

    /// Queue the initial provisioning run for a pending course
    Provision { course_id: Uuid },

    /// Reset failed steps and queue a retry for a failed course
    Retry { course_id: Uuid },

    /// Validate the configuration and print warnings
    Config,
}

fn open_store(config: &ProvostConfig) -> anyhow::Result<Arc<CourseStore>> {
    Ok(Arc::new(CourseStore::open(&config.database_path)?))
}

fn open_queue(config: &ProvostConfig) -> anyhow::Result<Arc<JobQueue>> {
    Ok(Arc::new(JobQueue::open(
        &config.queue_path,
        config.queue.clone(),
    )?))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ProvostConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            tokio::runtime::Runtime::new()?.block_on(provost_server::serve(config))?;
        }

        Commands::Courses => {
            let store = open_store(&config)?;
            let courses = store.courses()?;
            println!("{}", serde_json::to_string_pretty(&courses)?);
        }

        Commands::Status { course_id } => {
            let store = open_store(&config)?;
            let course = store.course(course_id)?;
            let steps = store.step_records(course_id)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "course_id": course_id,
                    "course_status": course.status,
                    "steps": steps,
                }))?
            );
        }

        Commands::Provision { course_id } => {
            let store = open_store(&config)?;
            let queue = open_queue(&config)?;
            let job = Scheduler::new(store, queue).start(course_id)?;
            println!("queued {} (attempt {})", job.key, job.attempt);
        }

        Commands::Retry { course_id } => {
            let store = open_store(&config)?;
            let queue = open_queue(&config)?;
            let job = Scheduler::new(store, queue).retry(course_id)?;
            println!("queued {} (attempt {})", job.key, job.attempt);
        }

        Commands::Config => {
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("config ok");
            } else {
                for w in &warnings {
                    println!("{:?}: {}", w.level, w.message);
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = tracing::Level::INFO;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
