use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use smart_key_sender::actuator::{Actuator, DryRunActuator};
use smart_key_sender::config::{format_duration, parse_tick_period, Config};
use smart_key_sender::keys::key_name;
use smart_key_sender::{
    HotkeyCommand, HotkeyManager, InputKind, PreviewGenerator, Profile, SchedulerEvent,
    SimulationMode, TickScheduler,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sks", version, about = "Weighted, cooldown-aware key automation")]
struct Cli {
    /// Configuration file (built-in profiles are used if it does not exist)
    #[arg(short, long, global = true, default_value = "sks-config.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a profile, toggled by the start/stop hotkeys
    Run(RunArgs),
    /// Print the key sequence smart mode would produce
    Preview(PreviewArgs),
    /// List configured profiles
    Profiles,
    /// Write a configuration file with the built-in profiles
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Profile name or index (defaults to the config's current profile)
    #[arg(short, long)]
    profile: Option<String>,

    /// Override the configured mode (smart or classic)
    #[arg(long)]
    mode: Option<SimulationMode>,

    /// Override the tick period, e.g. 50ms
    #[arg(long, value_parser = parse_tick)]
    tick: Option<Duration>,

    /// Log inputs instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Start immediately instead of waiting for the start hotkey
    #[arg(long)]
    now: bool,

    /// Seed for reproducible choices
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PreviewArgs {
    /// Profile name or index (defaults to the config's current profile)
    #[arg(short, long)]
    profile: Option<String>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 50)]
    steps: usize,

    #[arg(long)]
    seed: Option<u64>,
}

fn parse_tick(value: &str) -> std::result::Result<Duration, String> {
    parse_tick_period(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Run(args) => run(config, args).await,
        Command::Preview(args) => preview(&config, args),
        Command::Profiles => {
            list_profiles(&config);
            Ok(())
        }
        Command::Init { force } => init(&cli.config, force),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let path_str = path.to_str().context("config path is not valid UTF-8")?;
    let config = Config::from_file(path_str)?;
    config.validate()?;
    Ok(config)
}

fn pick_profile<'a>(config: &'a Config, selector: Option<&str>) -> Result<&'a Profile> {
    match selector {
        Some(selector) => Ok(config.profile(selector)?),
        None => config.current().context("no profiles configured"),
    }
}

fn build_actuator(dry_run: bool) -> Result<Arc<dyn Actuator>> {
    if dry_run {
        return Ok(Arc::new(DryRunActuator));
    }
    platform_actuator()
}

#[cfg(windows)]
fn platform_actuator() -> Result<Arc<dyn Actuator>> {
    Ok(Arc::new(smart_key_sender::SendInputActuator))
}

#[cfg(not(windows))]
fn platform_actuator() -> Result<Arc<dyn Actuator>> {
    Err(smart_key_sender::SksError::unsupported_platform(
        "input injection is only implemented for Windows, use --dry-run",
    )
    .into())
}

async fn run(config: Config, args: RunArgs) -> Result<()> {
    let profile = pick_profile(&config, args.profile.as_deref())?.clone();
    if !profile.is_runnable() {
        bail!("Profile '{}' is disabled or has no actions configured", profile.name);
    }

    let mut options = config.scheduler_options();
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(tick) = args.tick {
        options.tick_period = tick;
    }
    if options.mode == SimulationMode::Smart && !profile.has_smart_candidates() {
        warn!(profile = %profile.name, "No enabled keyboard actions, smart mode will idle");
    }

    let actuator = build_actuator(args.dry_run)?;
    let scheduler = Arc::new(match args.seed {
        Some(seed) => TickScheduler::seeded(actuator, options, seed),
        None => TickScheduler::new(actuator, options),
    });

    let mut events = scheduler.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SchedulerEvent::Started { profile } => {
                    println!("{} {}", "▶ Simulation running:".green().bold(), profile)
                }
                SchedulerEvent::Stopped => println!("{}", "⏹ Simulation stopped".red().bold()),
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = scheduler.spawn_ticker(shutdown_rx);

    let hotkeys = match register_hotkeys(&config) {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!("Global hotkeys unavailable: {:#}", e);
            None
        }
    };
    let mut commands: Option<mpsc::UnboundedReceiver<HotkeyCommand>> =
        hotkeys.as_ref().map(HotkeyManager::listen);

    println!(
        "{} {} ({} mode, tick {})",
        "Profile:".cyan().bold(),
        profile.name,
        options.mode,
        format_duration(options.tick_period)
    );
    match &hotkeys {
        Some(_) => println!(
            "Press {} to start, {} to stop, Ctrl+C to quit",
            config.start_hotkey.yellow(),
            config.stop_hotkey.yellow()
        ),
        None => println!("Press Ctrl+C to quit"),
    }

    if args.now || hotkeys.is_none() {
        scheduler.start(profile.clone());
    }

    loop {
        let command = async {
            match commands.as_mut() {
                Some(receiver) => receiver.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            command = command => match command {
                Some(HotkeyCommand::Start) => scheduler.start(profile.clone()),
                Some(HotkeyCommand::Stop) => scheduler.stop(),
                None => {
                    warn!("Hotkey listener ended");
                    commands = None;
                }
            },
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl+C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    ticker.await.context("ticker task panicked")?;
    drop(hotkeys);
    Ok(())
}

fn register_hotkeys(config: &Config) -> Result<HotkeyManager> {
    let mut manager = HotkeyManager::new()?;
    manager.register(&config.start_hotkey, HotkeyCommand::Start)?;
    manager.register(&config.stop_hotkey, HotkeyCommand::Stop)?;
    Ok(manager)
}

fn preview(config: &Config, args: PreviewArgs) -> Result<()> {
    let profile = pick_profile(config, args.profile.as_deref())?;
    let generator = PreviewGenerator::new(config.tick_period);
    let preview = match args.seed {
        Some(seed) => generator.generate_seeded(profile, args.steps, seed),
        None => generator.generate(profile, args.steps, &mut rand::thread_rng()),
    };

    println!("{} {}", "Preview:".cyan().bold(), profile.name);
    match preview.sequence() {
        Some(sequence) => println!("{}", sequence),
        None => println!("{}", preview.to_string().yellow()),
    }
    Ok(())
}

fn list_profiles(config: &Config) {
    for (index, profile) in config.profiles.iter().enumerate() {
        let marker = if index == config.current_profile { "*" } else { " " };
        let name = if profile.enabled {
            profile.name.bold()
        } else {
            profile.name.dimmed()
        };
        println!("{} [{}] {}", marker, index, name);

        for action in &profile.actions {
            let label = match action.kind {
                InputKind::Keyboard => format!("key {:<6}", key_name(action.code)),
                InputKind::MouseLeft => "left click".to_string(),
                InputKind::MouseRight => "right click".to_string(),
            };
            let line = format!(
                "      {}  weight {:>3}  cooldown {}ms  every {}ms",
                label, action.weight, action.min_interval, action.interval
            );
            if action.enabled {
                println!("{}", line);
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let path_str = path.to_str().context("config path is not valid UTF-8")?;
    Config::default().save_to_file(path_str)?;
    println!("{} {}", "Wrote".green().bold(), path.display());
    Ok(())
}
