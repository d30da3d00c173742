mod host;
mod loader;
mod share;

use std::{path::PathBuf, time::Duration};

use anchorfield_core::{
    initialize, AnchorFieldError, AppConfig, FrameScheduler, HeadlessRenderer, InputEvent, Session,
};
use clap::{Args, Parser, Subcommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::MissedTickBehavior,
};
use tracing_subscriber::EnvFilter;

use host::{SimulatedEnvironment, SimulatedTracker};
use loader::FileAssetLoader;
use share::DirectoryShareSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anchorfield_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Config { config } => print_config(config.as_ref()),
    }
}

async fn run(args: RunArgs) -> anchorfield_core::Result<()> {
    let config = load_config(args.config.as_ref())?;
    tracing::info!(config = ?args.config, "starting session");

    let mut env = SimulatedEnvironment::new(!args.unsupported, !args.deny_permission);
    let grant = match initialize(&mut env) {
        Ok(grant) => grant,
        Err(AnchorFieldError::PermissionDenied) => {
            // The experience is over, but the process exits cleanly.
            tracing::warn!("session ended without camera access");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let session = Session::new(&config, Box::new(FileAssetLoader::new(&args.asset_root)));
    let renderer = HeadlessRenderer::from_config(&config.render);
    let mut scheduler = FrameScheduler::new(grant, &config, session, renderer, SimulatedTracker::new())?
        .with_share_sink(Box::new(DirectoryShareSink::new(args.snapshot_dir.clone())));

    let fps = args.fps.unwrap_or(config.schedule.target_fps).max(1);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let frame = scheduler.frame();
                if args.place_after == Some(frame) {
                    scheduler.handle_input(InputEvent::ConfirmPlacement)?;
                }
                if args.capture_at == Some(frame) {
                    scheduler.handle_input(InputEvent::Capture)?;
                }

                let report = scheduler.tick()?;
                if report.frame % u64::from(fps) == 0 {
                    let stats = scheduler.renderer().stats();
                    tracing::info!(
                        frame = report.frame,
                        state = ?report.state,
                        points = stats.points_drawn,
                        model = stats.model_drawn,
                        "frame"
                    );
                }

                if args.frames.is_some_and(|limit| scheduler.frame() >= limit) {
                    break;
                }
            }
            line = commands.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match parse_command(&line) {
                        Some(Command::Input(event)) => scheduler.handle_input(event)?,
                        Some(Command::Quit) => break,
                        None => tracing::warn!(command = %line.trim(), "unknown command; try place, capture or quit"),
                    },
                    None => stdin_open = false,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let failures = scheduler.session().assets().failures().len();
    tracing::info!(frames = scheduler.frame(), asset_failures = failures, "session finished");
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anchorfield_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn print_config(path: Option<&PathBuf>) -> anchorfield_core::Result<()> {
    let config = load_config(path)?;
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Input(InputEvent),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "place" | "p" => Some(Command::Input(InputEvent::ConfirmPlacement)),
        "capture" | "c" => Some(Command::Input(InputEvent::Capture)),
        "quit" | "q" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Instant-placement AR particle experience", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a session against the simulated tracker and headless renderer.
    Run(RunArgs),
    /// Print the effective configuration as JSON.
    Config {
        /// Optional config file to merge over the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory asset paths are resolved against.
    #[arg(long, default_value = ".")]
    asset_root: PathBuf,
    /// Where shared snapshots are written.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Frame rate of the host loop; defaults to the configured target.
    #[arg(long)]
    fps: Option<u32>,
    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,
    /// Confirm placement automatically before this frame.
    #[arg(long)]
    place_after: Option<u64>,
    /// Take a snapshot before this frame.
    #[arg(long)]
    capture_at: Option<u64>,
    /// Answer the permission prompt with "deny".
    #[arg(long)]
    deny_permission: bool,
    /// Pretend the host lacks camera support.
    #[arg(long)]
    unsupported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stdin_commands() {
        assert_eq!(
            parse_command(" Place \n"),
            Some(Command::Input(InputEvent::ConfirmPlacement))
        );
        assert_eq!(parse_command("c"), Some(Command::Input(InputEvent::Capture)));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("dance"), None);
    }

    #[test]
    fn cli_accepts_scripted_runs() {
        let cli = Cli::try_parse_from([
            "anchorfield",
            "run",
            "--frames",
            "120",
            "--place-after",
            "30",
            "--deny-permission",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.frames, Some(120));
                assert_eq!(args.place_after, Some(30));
                assert!(args.deny_permission);
                assert!(!args.unsupported);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
