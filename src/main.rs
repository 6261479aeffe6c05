use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracefold_config::{ConfigOverrides, TracefoldConfig};
use tracefold_event::ExecutionEvent;
use tracefold_source::{EventSource, FileEventSource, HttpEventSource, HttpSourceConfig, RunRef};
use tracefold_trace::{TraceReport, reconstruct_with_stats};

/// Tracefold - rebuilds reviewable execution traces from workflow run histories
#[derive(Parser)]
#[command(name = "tracefold")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.tracefold)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Reconstruct a trace from a file of node executions
  Reconstruct {
    /// Path to the records file (JSON array or `{ "data": [...] }`, newest-first)
    events_file: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
  },

  /// Fetch a run's node executions from the workflow service and reconstruct its trace
  Fetch {
    /// Application that owns the run
    #[arg(long)]
    app_id: String,

    /// Workflow run to load
    #[arg(long)]
    run_id: String,

    /// Workflow service API root
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the workflow service
    #[arg(long)]
    api_key: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(flatten)]
    output: OutputArgs,
  },
}

#[derive(Args)]
struct OutputArgs {
  /// Print a report with run status and citation sources instead of the bare trace
  #[arg(long)]
  report: bool,

  /// Title of the node whose `outputs.json` holds citation sources
  #[arg(long)]
  citation_title: Option<String>,
}

fn main() -> Result<()> {
  init_tracing();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".tracefold"),
  };
  let config = TracefoldConfig::load(&data_dir).context("failed to load configuration")?;

  match cli.command {
    Some(Commands::Reconstruct {
      events_file,
      output,
    }) => {
      let config = config.merge(ConfigOverrides {
        citation_title: output.citation_title,
        ..Default::default()
      });
      let source = FileEventSource::new(events_file);
      run(&source, &config, output.report)?;
    }
    Some(Commands::Fetch {
      app_id,
      run_id,
      base_url,
      api_key,
      timeout_ms,
      output,
    }) => {
      let config = config.merge(ConfigOverrides {
        base_url,
        api_key,
        timeout_ms,
        citation_title: output.citation_title,
      });
      let source_config = HttpSourceConfig {
        base_url: config.require_base_url()?.to_string(),
        api_key: config.api_key.clone(),
        timeout: Duration::from_millis(config.timeout_ms),
      };
      let run_ref = RunRef {
        app_id,
        workflow_run_id: run_id,
      };
      let source = HttpEventSource::new(&source_config, &run_ref)
        .context("failed to create workflow service client")?;
      run(&source, &config, output.report)?;
    }
    None => {
      println!("tracefold - use --help to see available commands");
    }
  }

  Ok(())
}

/// Log to stderr so stdout carries only the trace JSON.
fn init_tracing() {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracefold=info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn run(source: &dyn EventSource, config: &TracefoldConfig, report: bool) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  let events = rt
    .block_on(source.fetch())
    .context("failed to load node executions")?;

  println!("{}", render(&events, config, report)?);
  Ok(())
}

fn render(events: &[ExecutionEvent], config: &TracefoldConfig, report: bool) -> Result<String> {
  let (trace, stats) = reconstruct_with_stats(events);

  info!(
    records = stats.events,
    nodes = trace.len(),
    superseded = stats.superseded,
    "trace reconstructed"
  );
  if stats.dropped() > 0 {
    info!(
      orphaned_children = stats.orphaned_children,
      orphaned_retries = stats.orphaned_retries,
      mode_conflicts = stats.mode_conflicts,
      "dropped records with no place in the trace"
    );
  }

  if !report {
    return Ok(serde_json::to_string_pretty(&trace)?);
  }

  match TraceReport::build(trace, config.citation_title.as_deref()) {
    Some(report) => Ok(serde_json::to_string_pretty(&report)?),
    None => {
      info!("run has no node executions");
      Ok("null".to_string())
    }
  }
}
