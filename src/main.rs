use std::process::ExitCode;

use clap::{Parser, Subcommand};
use deliveryflow::{build_pipeline, AppConfig, Pipeline, PipelineError};
use delivery_core::{RunStatus, SagaError, WorkflowRun};
use log::{error, info};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deliveryflow")]
#[command(version, about = "Campaign delivery pipeline with saga compensation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a run (or return the existing one with the same id)
    Run {
        /// Run id; a random one is generated when omitted
        #[arg(long)]
        run_id: Option<String>,
        /// Request payload as JSON, e.g. '{"client":"Acme","goal":"launch"}'
        #[arg(long)]
        payload: String,
    },
    /// Print the stored state of a run
    Status {
        #[arg(long)]
        run_id: String,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
                                          .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                                          .try_init();
}

fn print_run(run: &WorkflowRun) -> ExitCode {
    match serde_json::to_string_pretty(run) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("cannot render run {}: {e}", run.run_id);
            return ExitCode::FAILURE;
        }
    }
    if run.status == RunStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(pipeline: &Pipeline, run_id: Option<String>, payload: &str) -> ExitCode {
    let payload: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            error!("payload is not valid JSON: {e}");
            return ExitCode::from(2);
        }
    };
    let run_id = run_id.unwrap_or_else(|| format!("run-{}", uuid::Uuid::new_v4()));
    match pipeline.execute(&run_id, &payload) {
        Ok(run) => {
            info!("run {} finished as {}", run.run_id, run.status);
            print_run(&run)
        }
        Err(SagaError::RunLeftInconsistent { run }) => {
            error!("run {} left inconsistent: {:?} {:?}",
                   run.run_id,
                   run.compensation_failures(),
                   run.failure_detail.as_ref().and_then(|d| d.run_store_error.as_deref()));
            print_run(&run);
            ExitCode::from(3)
        }
        Err(e) => {
            error!("run {run_id}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn status(pipeline: &Pipeline, run_id: &str) -> ExitCode {
    match pipeline.get_run(run_id) {
        Ok(Some(run)) => print_run(&run),
        Ok(None) => {
            error!("run {run_id} not found");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("run {run_id}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let pipeline = match AppConfig::from_env().map_err(PipelineError::from).and_then(|cfg| build_pipeline(&cfg)) {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Run { run_id, payload } => run(&pipeline, run_id, &payload),
        Commands::Status { run_id } => status(&pipeline, &run_id),
    }
}
