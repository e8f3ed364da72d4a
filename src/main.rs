use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use contentgen::app::App;
use contentgen::config::Config;
use contentgen::generation::{
    GenerationBrief, GenerationRecord, Pacing, ProgressDriver, RecordStatus, SimulatedExecutor,
};
use contentgen::logging;
use contentgen::navigation::{ChannelNavigator, Route};
use contentgen::notifications::{NotificationService, ToastQueue};
use contentgen::state::State;
use contentgen::steps::{content_plan_pipeline, StepStatus};
use contentgen::store::{Run, RunStore};
use contentgen::ui::{install_panic_hook, CompletionLatch};

#[derive(Parser)]
#[command(name = "contentgen")]
#[command(about = "AI content plan generation with live progress")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a content plan without the TUI, printing each update
    Generate {
        /// Company name
        #[arg(long)]
        company: String,

        /// Primary keyword (repeatable)
        #[arg(short, long = "keyword", required = true)]
        keywords: Vec<String>,

        #[arg(long)]
        industry: Option<String>,

        /// Target audience
        #[arg(long)]
        audience: Option<String>,

        /// Brand voice (defaults to the configured tone)
        #[arg(long)]
        voice: Option<String>,

        /// Content goals
        #[arg(long)]
        goals: Option<String>,

        /// Additional notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List previous runs
    History {
        /// Show every recorded run
        #[arg(short, long)]
        all: bool,
    },

    /// Print the pipeline template as JSON
    Pipeline,

    /// Write the effective configuration to .contentgen/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Generate {
            company,
            keywords,
            industry,
            audience,
            voice,
            goals,
            notes,
        }) => {
            let mut brief = GenerationBrief {
                company_name: company,
                industry: industry.unwrap_or_default(),
                target_audience: audience.unwrap_or_default(),
                brand_voice: voice.unwrap_or_default(),
                content_goals: goals.unwrap_or_default(),
                additional_notes: notes.unwrap_or_default(),
                ..Default::default()
            };
            for keyword in &keywords {
                brief.add_primary_keyword(keyword);
            }
            cmd_generate(&config, brief).await?;
        }
        Some(Commands::History { all }) => {
            cmd_history(&config, all)?;
        }
        Some(Commands::Pipeline) => {
            println!("{}", serde_json::to_string_pretty(&content_plan_pipeline())?);
        }
        Some(Commands::Init { force }) => {
            let path = Config::local_config_path();
            if path.exists() && !force {
                eprintln!("{} already exists (use --force to overwrite)", path.display());
                std::process::exit(1);
            }
            config.save()?;
            println!("Wrote {}", path.display());
        }
        None => {
            run_tui(config, logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    if let Some(ref path) = log_file_path {
        tracing::info!(log_file = %path.display(), "Starting contentgen TUI");
    }

    install_panic_hook();

    let mut app = App::new(config)?;
    let result = app.run().await;

    if let Some(path) = log_file_path {
        eprintln!("Logs: {}", path.display());
    }
    result
}

/// One line describing the newest change in `run`
fn describe(run: &Run) -> String {
    let progress = run.progress();
    if !run.active {
        let outcome = if run.has_error() {
            "failed"
        } else if run.all_completed() {
            "finished"
        } else {
            "stopped"
        };
        return format!("[{progress:>3}%] run {outcome}");
    }

    let Some(step) = run
        .steps
        .iter()
        .rev()
        .find(|s| s.status != StepStatus::Pending)
    else {
        return format!("[{progress:>3}%] started {} steps", run.steps.len());
    };

    let substep = step
        .substeps
        .iter()
        .rev()
        .find(|s| s.status != StepStatus::Pending);
    match substep {
        Some(sub) if step.status == StepStatus::InProgress => format!(
            "[{progress:>3}%] {} › {} ({})",
            step.title, sub.title, sub.status
        ),
        _ => format!("[{progress:>3}%] {} ({})", step.title, step.status),
    }
}

async fn cmd_generate(config: &Config, brief: GenerationBrief) -> Result<()> {
    let request = match brief.to_request(&config.defaults) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Missing Information: {}", e);
            std::process::exit(2);
        }
    };

    let store = RunStore::new();
    let notifications = Arc::new(NotificationService::from_config(config, ToastQueue::new()));
    let driver = ProgressDriver::new(
        store.clone(),
        Arc::new(SimulatedExecutor::from_config(&config.generation)),
        notifications,
        Pacing::from_config(&config.generation),
    );

    let _printer = store.subscribe(|run| println!("{}", describe(run)));
    let (navigator, mut nav_rx) = ChannelNavigator::new();
    let latch = Arc::new(CompletionLatch::new(Arc::new(navigator)));
    let _latch = latch.attach(&store);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    println!(
        "Generating content plan {} for {} ({})",
        request.id,
        request.company,
        request.topics.join(", ")
    );
    let result = driver.run_with_cancel(&request, cancel).await;

    if let Ok(Route::Results) = nav_rx.try_recv() {
        println!("Content Generation Complete! Your content plan is ready for review.");
    }

    let mut state = State::load(config)?;
    match result {
        Ok(record) => {
            println!("Finished in {}s", record.elapsed_secs());
            state.record(record)?;
            Ok(())
        }
        Err(e) => {
            let record = GenerationRecord::from_run(
                &request,
                &store.current(),
                Some(e.to_string()),
            );
            state.record(record)?;
            eprintln!("Generation Failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_history(config: &Config, all: bool) -> Result<()> {
    let state = State::load(config)?;

    if state.history.is_empty() {
        println!("No content plans generated yet");
        return Ok(());
    }

    let limit = if all {
        state.history.len()
    } else {
        config.ui.history_limit
    };

    println!("Content plans ({} recorded)", state.history.len());
    println!("{}", "─".repeat(60));

    for record in state.recent(limit) {
        let glyph = match record.status {
            RecordStatus::Completed => "✓",
            RecordStatus::Failed => "✗",
            _ => "…",
        };
        println!(
            "{} {} {:<24} {:>3}% {}",
            glyph,
            record.finished_at.format("%Y-%m-%d %H:%M"),
            record.company,
            record.progress,
            record.topics.join(", ")
        );
        if let Some(error) = &record.error {
            println!("    {}", error);
        }
    }

    if !all && state.history.len() > limit {
        println!(
            "... and {} more (use --all to see all)",
            state.history.len() - limit
        );
    }

    Ok(())
}
