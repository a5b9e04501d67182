//! motionlock CLI - drives the movement lock service against a simulated device
//!
//! Usage:
//!   motionlock                                  # Interactive mode
//!   motionlock --script events.txt              # Replay a script
//!   motionlock --config motionlock.toml         # Load configuration
//!   motionlock --script events.txt --json       # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use motionlock::config::MotionLockConfig;
use motionlock::core::{Collaborators, MovementLockService, ScriptEvent, ScriptParser, ServiceHandle, SimulatedDevice};
use motionlock::types::{DisabledOutput, RegistrationState, SampleVerdict, StatusOutput, VerdictRecord};
use motionlock::{DEFAULT_USER, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "motionlock",
    version = VERSION,
    about = "Movement based lock gesture - simulator",
    long_about = "Runs the movement lock service against a simulated device.\n\n\
                  A linear acceleration sample whose magnitude exceeds the threshold\n\
                  locks the device, provided the gesture is enabled for the active\n\
                  user, the screen is unlocked and the device is interactive.\n\n\
                  Events:\n  \
                  sample X Y Z        deliver a sample\n  \
                  user ID             switch foreground user\n  \
                  enable ID           enable the gesture for a user\n  \
                  disable ID          disable the gesture for a user\n  \
                  screen locked|unlocked\n  \
                  power on|off\n  \
                  fail screen|power|lock|sensor\n  \
                  heal                clear injected failures\n  \
                  status"
)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay events from a file, one per line
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Interactive mode - read events from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Override the magnitude threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Start with the feature flag off
    #[arg(long)]
    disable_feature: bool,

    /// Initial foreground user
    #[arg(short, long, default_value_t = DEFAULT_USER)]
    user: i32,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    if args.no_color {
        colored::control::set_override(false);
    }
    init_tracing(&config, &args);

    let device = Arc::new(SimulatedDevice::new(args.user));
    let startup = MovementLockService::start(&config, Collaborators::from_device(device.clone()));
    let Some(handle) = startup.into_handle() else {
        if args.json {
            print_disabled_json();
        } else {
            println!("{}", "Movement based lock is disabled by configuration.".dimmed());
        }
        return;
    };

    print_header(&handle, &args);

    let result = match args.script {
        Some(ref path) if !args.interactive => run_script(path, &device, &handle, &args).await,
        _ => {
            run_interactive(&device, &handle, &args).await;
            Ok(())
        }
    };

    handle.shutdown().await;

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<MotionLockConfig, motionlock::types::ConfigError> {
    let mut config = MotionLockConfig::load(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if args.disable_feature {
        config.feature_enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &MotionLockConfig, args: &Args) {
    let level = if args.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .with_ansi(!args.no_color)
        .without_time()
        .init();
}

/// Replay a script file
async fn run_script(
    path: &Path,
    device: &SimulatedDevice,
    handle: &ServiceHandle,
    args: &Args,
) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let events = ScriptParser::new()
        .parse_script(&text)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    let mut verdicts = handle.subscribe_verdicts();
    for event in &events {
        apply_event(event, device, handle, &mut verdicts, args).await;
    }

    if !args.json {
        println!();
        println!("Script finished. Events: {}", events.len());
    }
    Ok(())
}

/// Run interactive mode
async fn run_interactive(device: &SimulatedDevice, handle: &ServiceHandle, args: &Args) {
    let parser = ScriptParser::new();
    let mut verdicts = handle.subscribe_verdicts();

    println!("Type events and press Enter. Type 'quit' to exit.");
    println!("Example: enable {}  then  sample 30 30 30", handle.active_user().unwrap_or(DEFAULT_USER));
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(handle, args.no_color));
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended. Samples: {}", handle.stats().samples_seen);
            break;
        }

        match parser.parse_line(line) {
            Ok(Some(event)) => apply_event(&event, device, handle, &mut verdicts, args).await,
            Ok(None) => continue,
            Err(e) => println!("{}", format!("⚠ {}", e).yellow()),
        }
    }
}

/// Apply one event, wait for reconciliation, print what happened
async fn apply_event(
    event: &ScriptEvent,
    device: &SimulatedDevice,
    handle: &ServiceHandle,
    verdicts: &mut broadcast::Receiver<VerdictRecord>,
    args: &Args,
) {
    let reached = event.apply(device);
    handle.settle().await;

    let mut records = Vec::new();
    loop {
        match verdicts.try_recv() {
            Ok(record) => records.push(record),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    let status = handle.status();

    if args.json {
        print_json(event, &records, &status);
        return;
    }

    if matches!(event, ScriptEvent::Sample { .. }) && reached == 0 {
        println!("{}", "  └─ not delivered (no listener)".dimmed());
    }
    for record in &records {
        print_verdict(record, args.no_color);
    }
    if args.no_color {
        println!("{}", status.to_parseable_string());
    } else {
        println!("{}", status.to_terminal_string());
    }
}

/// Print header
fn print_header(handle: &ServiceHandle, args: &Args) {
    if args.json {
        return;
    }
    println!("{}", "========================================".bold());
    println!("{}", format!("  motionlock v{} - threshold {:.2}", VERSION, handle.threshold()).bold());
    println!("{}", "========================================".bold());
    println!();
}

/// Format prompt
fn format_prompt(handle: &ServiceHandle, no_color: bool) -> String {
    let state = handle.registration();
    let user = handle
        .active_user()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "-".to_string());
    if no_color {
        format!("[{} | user {}] > ", state, user)
    } else {
        format!(
            "{}{} [{} | user {}]{} > ",
            state.color_code(),
            state.emoji(),
            state,
            user,
            RegistrationState::color_reset()
        )
    }
}

fn print_verdict(record: &VerdictRecord, no_color: bool) {
    if no_color {
        println!("  {}", record.to_parseable_string());
        return;
    }
    let line = format!(
        "  magnitude={:.3} | {}",
        record.magnitude,
        record.verdict
    );
    let line = match record.verdict {
        SampleVerdict::Locked => line.green().bold(),
        SampleVerdict::LockFailed => line.red(),
        SampleVerdict::BelowThreshold => line.normal(),
        _ => line.dimmed(),
    };
    println!("{}", line);
}

fn print_json(event: &ScriptEvent, records: &[VerdictRecord], status: &StatusOutput) {
    #[derive(serde::Serialize)]
    struct EventOutput<'a> {
        event: &'a ScriptEvent,
        verdicts: &'a [VerdictRecord],
        status: &'a StatusOutput,
    }

    let out = EventOutput { event, verdicts: records, status };
    match serde_json::to_string(&out) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn print_disabled_json() {
    match serde_json::to_string(&DisabledOutput::default()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}
