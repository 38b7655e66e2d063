/// Chime Reminder - spoken medicine reminders
use anyhow::Context;
use chime_audio_desktop::CpalBackend;
use chime_core::{SlotLabel, SourceRef, WallClock};
use chime_reminder::{capability, ReminderApp, ReminderConfig, SystemClock};
use chrono::{Datelike, Timelike, Weekday};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long `sounds` waits for each sound to finish loading
const SOUND_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "chime-reminder")]
#[command(about = "Spoken medicine reminder at 06:00, 12:00 and 18:00", long_about = None)]
struct Cli {
    /// Configuration file path (default: chime.toml if present)
    #[arg(short, long, global = true, env = "CHIME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder; type `test` or press Enter to hear a test
    Run,
    /// Play one test announcement now and exit
    Test {
        /// Day to announce (default: today)
        #[arg(long)]
        day: Option<Weekday>,
        /// Time of day to announce: morning, noon or evening (default: now)
        #[arg(long)]
        slot: Option<SlotLabel>,
    },
    /// Validate configuration and report missing sounds
    Check {
        /// Print the effective configuration as TOML
        #[arg(long)]
        print: bool,
    },
    /// Load every sound and list its state
    Sounds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chime_reminder=info,chime_playback=info,chime_audio_desktop=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ReminderConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run(&config).await?,
        Commands::Test { day, slot } => test(&config, day, slot).await?,
        Commands::Check { print } => check(&config, print)?,
        Commands::Sounds => sounds(&config).await?,
    }

    Ok(())
}

fn build_app(config: &ReminderConfig) -> anyhow::Result<ReminderApp> {
    let app = ReminderApp::build(
        config,
        Arc::new(CpalBackend::new()),
        Arc::new(SystemClock),
        capability::detect_device_class(),
    )?;
    Ok(app)
}

async fn run(config: &ReminderConfig) -> anyhow::Result<()> {
    let app = Arc::new(build_app(config)?);
    if config.logging.events_json {
        app.spawn_event_printer();
    }
    app.preload();

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(tx);

    let requests = {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                app.request_test();
            }
        })
    };

    tracing::info!("Chime reminder running (Ctrl-C to stop)");
    app.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await;

    requests.abort();
    tracing::info!("Chime reminder stopped");
    Ok(())
}

/// Forward `test` and empty lines from stdin as test requests
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<()>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = line.trim();
            if command.is_empty() || command.eq_ignore_ascii_case("test") {
                if tx.send(()).is_err() {
                    break;
                }
            } else {
                tracing::info!(command, "Unknown command, type `test` or press Enter");
            }
        }
    });
}

async fn test(
    config: &ReminderConfig,
    day: Option<Weekday>,
    slot: Option<SlotLabel>,
) -> anyhow::Result<()> {
    let app = build_app(config)?;
    app.preload();

    let now = SystemClock.now();
    let day = day.unwrap_or_else(|| now.weekday());
    let slot = slot.unwrap_or_else(|| SlotLabel::for_hour(now.hour()));

    println!("Playing test for {day} {slot}");
    let report = app.play_test_now(day, slot).await;
    for attempt in &report.attempts {
        println!(
            "  {:<16} {:<10} {:>6}ms  retries={}{}",
            attempt.sound.as_str(),
            attempt.outcome.as_str(),
            attempt.elapsed.as_millis(),
            attempt.retry_index,
            attempt
                .error
                .as_deref()
                .map(|e| format!("  ({e})"))
                .unwrap_or_default()
        );
    }
    println!(
        "{} of {} clips completed",
        report.completed(),
        report.attempts.len()
    );

    if report.completed() == 0 {
        anyhow::bail!("No clip played; check your output device and volume");
    }
    Ok(())
}

fn check(config: &ReminderConfig, print: bool) -> anyhow::Result<()> {
    config.validate()?;

    if print {
        let rendered =
            toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("{rendered}");
    }

    let app = build_app(config)?;
    let missing = app.registry().missing_sounds();
    let absent_files: Vec<_> = app
        .registry()
        .resources()
        .into_iter()
        .filter(|r| matches!(r.source(), SourceRef::File { path } if !path.exists()))
        .collect();

    for name in &missing {
        println!("not registered: {name}");
    }
    for resource in &absent_files {
        println!("file not found: {} -> {}", resource.name(), resource.source());
    }

    if missing.is_empty() && absent_files.is_empty() {
        println!(
            "Configuration OK: {} sounds, profile {:?}",
            app.registry().len(),
            config.playback.profile
        );
        Ok(())
    } else {
        anyhow::bail!(
            "{} sounds not registered, {} files not found",
            missing.len(),
            absent_files.len()
        )
    }
}

async fn sounds(config: &ReminderConfig) -> anyhow::Result<()> {
    let app = build_app(config)?;
    for status in app.sound_report(SOUND_LOAD_TIMEOUT).await {
        println!(
            "{:<16} {:<10} {}",
            status.name.as_str(),
            status.state.as_str(),
            status.source
        );
    }
    Ok(())
}
