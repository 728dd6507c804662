use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use sf_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, run_service, study_service,
};
use sf_study::OutputMode;
use sf_sweep::CaseEvent;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "SweepFlow CLI - Parametric sweeps over process simulation cases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Header first, one flushed row per case
    Streaming,
    /// All rows written when the sweep ends
    Buffered,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Streaming => OutputMode::Streaming,
            ModeArg::Buffered => OutputMode::Buffered,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case of a study and write the CSV
    Run {
        /// Path to the study YAML file
        study_path: PathBuf,
        /// Output CSV path (overrides the study)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output mode (overrides the study)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Skip the run manifest
        #[arg(long)]
        no_manifest: bool,
    },
    /// Validate study file syntax and structure
    Validate {
        /// Path to the study YAML file
        study_path: PathBuf,
    },
    /// List every case of a study in run order
    Plan {
        /// Path to the study YAML file
        study_path: PathBuf,
    },
    /// Write the default screening study
    Init {
        /// Where to write the study YAML file
        study_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            study_path,
            output,
            mode,
            no_manifest,
        } => cmd_run(
            &study_path,
            RunOptions {
                output,
                mode: mode.map(OutputMode::from),
                no_manifest,
            },
        ),
        Commands::Validate { study_path } => cmd_validate(&study_path),
        Commands::Plan { study_path } => cmd_plan(&study_path),
        Commands::Init { study_path } => cmd_init(&study_path),
    }
}

fn cmd_run(study_path: &Path, options: RunOptions) -> AppResult<()> {
    println!("Running study: {}", study_path.display());

    let request = RunRequest {
        study_path,
        options,
    };
    let response = run_service::run_study(&request, Some(&mut |event| render_progress(&event)))?;

    println!("\n{}", "=".repeat(60));
    println!("Results written to {}", response.output_path.display());
    println!("  Total cases: {}", response.summary.total);
    println!("  Successful:  {}", response.summary.succeeded);
    println!("  Failed:      {}", response.summary.failed);
    println!("  Elapsed:     {:.2}s", response.summary.elapsed_s);
    if let Some(path) = &response.manifest_path {
        println!("  Manifest:    {}", path.display());
    }
    Ok(())
}

fn render_progress(event: &RunProgressEvent) {
    let Some(case) = &event.case else {
        if !matches!(event.stage, RunStage::Sweeping | RunStage::Completed) {
            tracing::debug!(stage = event.stage.label(), "Run stage");
        }
        return;
    };

    match &case.event {
        CaseEvent::Started => {
            println!(
                "\n[{}/{}] {} {}",
                case.index + 1,
                case.total,
                case.kind,
                case.label
            );
        }
        CaseEvent::Succeeded { headline } => println!("  ✓ Success - {}", headline),
        CaseEvent::Failed { stage, message } => {
            println!("  ✗ Failed - {} ({})", message, stage)
        }
    }
}

fn cmd_validate(study_path: &Path) -> AppResult<()> {
    println!("Validating study: {}", study_path.display());
    let study = study_service::load_study(study_path)?;
    let summary = study_service::summarize_study(&study)?;
    println!("✓ Study is valid");
    println!("  Name: {}", summary.name);
    for sweep in &summary.sweeps {
        let axes = sweep
            .axes
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join(" x ");
        println!("  {} sweep: {} -> {} cases", sweep.kind, axes, sweep.cases);
        for (name, value) in &sweep.fixed {
            println!("    fixed {} = {}", name, value);
        }
    }
    println!("  Total cases: {}", summary.total_cases);
    Ok(())
}

fn cmd_plan(study_path: &Path) -> AppResult<()> {
    let study = study_service::load_study(study_path)?;
    let cases = study_service::plan_cases(&study)?;

    if cases.is_empty() {
        println!("No cases in study");
    } else {
        println!("Cases in study '{}':", study.name);
        for case in cases {
            println!("  {:>4}  {:<6}  {}", case.index, case.kind.to_string(), case.label);
        }
    }
    Ok(())
}

fn cmd_init(study_path: &Path) -> AppResult<()> {
    let study = study_service::init_study(study_path)?;
    println!("✓ Wrote study '{}' to {}", study.name, study_path.display());
    Ok(())
}
