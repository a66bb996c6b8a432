//! Line-oriented console host.
//!
//! Simulates a handful of connected actors in memory and drives the
//! coordination runtime from stdin. Notices are printed as they arrive.
mod app;
mod command;
mod render;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use app::{ConsoleApp, Flow};
use command::ConsoleCommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use waystone_bootstrap::{HostBuilder, HostConfig};
use waystone_runtime::{ActorId, Event, InMemoryDirectory, RuntimeHandle, Topic};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = HostConfig::from_env()?;
    let _guard = setup_logging(config.log_dir.as_deref())?;

    let setup = HostBuilder::new(config).build().await?;
    let mut app = ConsoleApp::new(&setup);
    let printer = spawn_notice_printer(
        setup.runtime.handle(),
        Arc::clone(&setup.directory),
        setup.config.coord.tick_rate,
    );

    println!("waystone console ready. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(command::ParseError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match app.execute(command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => println!("{err}"),
        }
    }

    printer.abort();
    setup.runtime.shutdown().await?;
    Ok(())
}

fn spawn_notice_printer(
    handle: RuntimeHandle,
    directory: Arc<InMemoryDirectory>,
    tick_rate: u32,
) -> JoinHandle<()> {
    let mut notices = handle.subscribe(Topic::Notice);
    tokio::spawn(async move {
        let name = |actor: ActorId| {
            directory
                .name_of(actor)
                .unwrap_or_else(|| actor.to_string())
        };
        loop {
            match notices.recv().await {
                Ok(Event::Notice { actor, notice }) => {
                    println!(
                        "[{}] {}",
                        name(actor),
                        render::notice(&notice, tick_rate, name)
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Logs to stderr, or to `<dir>/console.log` when a log directory is set.
///
/// The returned guard must live as long as logging is needed.
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let Some(dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, "console.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .init();

    tracing::info!("Log file: {}/console.log", dir.display());
    Ok(Some(guard))
}
