use std::{path::PathBuf, rc::Rc};

use breath_pacer_core::{AppConfig, ManualTimer, SessionController, TechniqueCatalog};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod console;
mod repl;

use console::{ConsoleAudio, ConsoleSurface};

fn main() -> breath_pacer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Techniques { config } => run_techniques(config.as_ref()),
        Commands::Simulate {
            config,
            technique,
            cycles,
            muted,
        } => run_simulate(config.as_ref(), technique.as_deref(), cycles, muted),
        Commands::Run { config, technique } => run_live(config.as_ref(), technique.as_deref()),
    }
}

fn load_config(path: Option<&PathBuf>) -> breath_pacer_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn run_techniques(config: Option<&PathBuf>) -> breath_pacer_core::Result<()> {
    let config = load_config(config)?;
    let catalog = TechniqueCatalog::from_config(&config)?;

    for technique in catalog.techniques() {
        let phases: Vec<String> = technique
            .phases
            .iter()
            .enumerate()
            .map(|(index, ms)| {
                let label = catalog.label_for(technique.phase_count(), index);
                format!("{label} {:.1}s", *ms as f64 / 1000.0)
            })
            .collect();
        let marker = if technique.id == catalog.default_id() { "*" } else { " " };
        println!(
            "{marker} {:<10} {:>5.1}s  {}",
            technique.id,
            technique.cycle_length().as_secs_f64(),
            phases.join(", ")
        );
    }
    Ok(())
}

fn run_simulate(
    config: Option<&PathBuf>,
    technique: Option<&str>,
    cycles: u32,
    muted: bool,
) -> breath_pacer_core::Result<()> {
    let config = load_config(config)?;
    let mut controller = SessionController::new(
        &config,
        ManualTimer::new(),
        Rc::new(ConsoleAudio),
        Rc::new(ConsoleSurface::default()),
    )?;
    if let Some(id) = technique {
        controller.on_technique_changed(id);
    }
    controller.toggle_mute(muted)?;

    tracing::info!(technique = %controller.scheduler().technique().id, cycles, "simulating");
    controller.on_start_clicked();
    print_entry(0.0, &controller);

    let steps = cycles as usize * controller.scheduler().technique().phase_count();
    for _ in 0..steps {
        match controller.fire_next() {
            Some(now) => print_entry(now.as_secs_f64(), &controller),
            None => break,
        }
    }

    controller.on_stop_clicked();
    Ok(())
}

fn print_entry(seconds: f64, controller: &SessionController<ManualTimer>) {
    println!(
        "{seconds:>8.3}s  phase {}  {}",
        controller.displayed_phase(),
        controller.displayed_label()
    );
}

fn run_live(config: Option<&PathBuf>, technique: Option<&str>) -> breath_pacer_core::Result<()> {
    let config = load_config(config)?;
    tracing::info!("type `start`, `stop`, `technique <id>` or `quit`");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    runtime.block_on(repl::run_interactive(&config, technique))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Guided breathing exercises", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured techniques and their phases.
    Techniques {
        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a session on a virtual clock and print every phase change.
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Technique id; unknown ids fall back to the default technique.
        #[arg(short, long)]
        technique: Option<String>,
        /// Number of full breathing cycles to simulate.
        #[arg(long, default_value_t = 2)]
        cycles: u32,
        /// Silence the cue sounds.
        #[arg(long)]
        muted: bool,
    },
    /// Start an interactive session driven by commands on stdin.
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        technique: Option<String>,
    },
}
