use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::error;

use figpipe::{Pipeline, RunConfig, Switches};

#[derive(Parser, Debug)]
#[command(name = "figpipe", version)]
struct Cli {
    /// Run root containing the figure directories and switch file.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Optional JSON run config overriding the stock layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Switch file path, overriding the configured location.
    #[arg(long)]
    switches: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full pipeline: process, animate, composite, deliver.
    Run(RunArgs),
    /// Only the single-model animations over the raw figure directory.
    Animate,
    /// Only the delivery stage (copy + rename into the delivery directory).
    Deliver,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Purge the crop directory (logo excepted) before processing.
    #[arg(long)]
    clear: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let switches = load_switches(&cli, &cfg)?;

    match cli.cmd {
        Command::Run(args) => {
            let report = Pipeline::run(&cli.root, cfg, switches, args.clear)?;
            if !report.is_success() {
                for failure in &report.failures {
                    error!("{failure}");
                }
                std::process::exit(1);
            }
        }
        Command::Animate => {
            let _lock = figpipe::RunLock::acquire(&cli.root)?;
            let pipeline = Pipeline::new(&cli.root, cfg, switches)?;
            let mut report = figpipe::RunReport::default();
            let figs = pipeline.figs_dir().to_path_buf();
            pipeline.model_animations(&figs, &mut report)?;
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Deliver => {
            let _lock = figpipe::RunLock::acquire(&cli.root)?;
            let pipeline = Pipeline::new(&cli.root, cfg, switches)?;
            pipeline.deliver()?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    Ok(match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    })
}

fn load_switches(cli: &Cli, cfg: &RunConfig) -> anyhow::Result<Switches> {
    let path: PathBuf = match &cli.switches {
        Some(p) => p.clone(),
        None => cfg.switch_file(Path::new(&cli.root)),
    };
    Ok(Switches::load(&path)?)
}
