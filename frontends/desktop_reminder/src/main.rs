use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reminder_core::{App, Cadence, ConfigStore, EditOutcome, LocalClock, RunOutcome};
use tokio::sync::watch;
use tracing::{error, info};

mod form;
mod presenter;
#[cfg(windows)]
mod single_instance;

use presenter::DesktopPresenter;

#[derive(Parser, Debug)]
#[command(name = "desktop_reminder", version)]
struct Args {
    /// Settings file (JSON). Created with defaults if missing.
    #[arg(long, default_value = reminder_core::store::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Open the settings form once and exit without starting reminders.
    #[arg(long, default_value_t = false)]
    edit_settings: bool,

    /// Poll every N seconds instead of just after each minute boundary.
    ///
    /// Handy for trying out the dialogs; reminders still only fire on aligned minutes.
    #[arg(long)]
    tick_seconds: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desktop_reminder=info,reminder_core=info".into()),
        )
        .init();

    let args = Args::parse();

    // Two copies would each pop their own reminder.
    #[cfg(windows)]
    let _instance = match single_instance::acquire() {
        Ok(g) => g,
        Err(e) => {
            info!("desktop_reminder already running; exit ({e})");
            return Ok(());
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));
    // A dialog may still be open on the blocking pool; don't wait for it.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cadence = match args.tick_seconds {
        Some(secs) => Cadence::Every(Duration::from_secs(secs.max(1))),
        None => Cadence::MinuteBoundary,
    };
    let app = App::bootstrap(
        ConfigStore::new(&args.config),
        DesktopPresenter::new(),
        LocalClock,
        cadence,
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(shutdown_signal(stop_tx));

    if args.edit_settings {
        match app.edit_settings_once(stop_rx).await? {
            EditOutcome::Interrupted => info!("settings editor interrupted"),
            outcome => info!("settings editor closed ({outcome:?})"),
        }
        return Ok(());
    }

    match app.run(stop_rx).await? {
        RunOutcome::Shutdown => info!("stopped"),
        RunOutcome::ExitedDuringSetup => info!("exited before settings were saved"),
    }
    Ok(())
}

async fn shutdown_signal(stop: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for Ctrl-C: {e}");
        // Dropping the sender would read as a shutdown request.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
    let _ = stop.send(true);
}
