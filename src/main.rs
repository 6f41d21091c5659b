//! Binary entrypoint: a terminal host for the portfolio view controller.
//!
//! Reads `click <element-id>` / `key <name>` lines from stdin and prints every
//! view update.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rust_portfolio_viewer::carousel::{MediaItem, SourceReset};
use rust_portfolio_viewer::config::{Configuration, Sourcing};
use rust_portfolio_viewer::events::{Key, UiEvent, ViewUpdate};
use rust_portfolio_viewer::probe::{ExistenceProber, Prober, SharedProber};
use rust_portfolio_viewer::session::ScanAuthority;
use rust_portfolio_viewer::tasks::{self, scanner::ScanContext, view::ViewController};

#[derive(Debug, Parser)]
#[command(
    name = "portfolio-viewer",
    version,
    about = "headless portfolio album viewer"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Scan one album's folder, print what was discovered and exit
    #[arg(long = "scan-dry-run", value_name = "ALBUM")]
    scan_dry_run: Option<String>,
    /// Probe a single locator and exit
    #[arg(long = "probe", value_name = "LOCATOR")]
    probe: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let Args {
        config,
        scan_dry_run,
        probe,
    } = Args::parse();

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let prober: Arc<dyn Prober> = Arc::new(SharedProber::new(ExistenceProber::new()?));

    if let Some(locator) = probe {
        let found = prober.probe(&locator, cfg.probe_timeout).await;
        println!("{locator}: {}", if found { "exists" } else { "missing" });
        return Ok(());
    }

    if let Some(album) = scan_dry_run {
        run_scan_dry_run(&cfg, prober, &album).await?;
        return Ok(());
    }

    // Channels (small/bounded)
    let (input_tx, input_rx) = mpsc::channel::<UiEvent>(32); // Host -> View
    let (render_tx, render_rx) = mpsc::channel::<ViewUpdate>(64); // View -> Render

    let cancel = CancellationToken::new();

    // stdin lines drive the view; EOF or `quit` shuts down
    {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!("stdin read failed: {err}");
                        break;
                    }
                };
                match parse_command(&line) {
                    Some(Command::Event(event)) => {
                        if input_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Some(Command::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(%line, "unrecognised command"),
                }
            }
            tracing::info!("stdin closed; initiating shutdown");
            cancel.cancel();
        });
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // View controller
    tasks.spawn({
        let controller = ViewController::new(Arc::new(cfg), SourceReset);
        let prober = Arc::clone(&prober);
        let cancel = cancel.clone();
        async move {
            tasks::view::run(controller, prober, input_rx, render_tx, cancel)
                .await
                .context("view task failed")
        }
    });

    // Render sink
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::render::run(render_rx, cancel)
                .await
                .context("render task failed")
        }
    });

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
        cancel.cancel();
    }

    Ok(())
}

enum Command {
    Event(UiEvent),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next();
    match (verb, arg) {
        ("quit" | "exit", None) => Some(Command::Quit),
        ("click", Some(element)) => Some(Command::Event(UiEvent::Click {
            element: element.to_string(),
        })),
        ("key", Some(name)) => Some(Command::Event(UiEvent::Key(Key::from_name(name)))),
        ("next", None) => Some(Command::Event(UiEvent::Key(Key::ArrowRight))),
        ("prev", None) => Some(Command::Event(UiEvent::Key(Key::ArrowLeft))),
        _ => None,
    }
}

async fn run_scan_dry_run(cfg: &Configuration, prober: Arc<dyn Prober>, key: &str) -> Result<()> {
    let album = cfg
        .album(key)
        .ok_or_else(|| anyhow!("no album named '{key}' in configuration"))?;

    println!(
        "# scan dry run\n# album: {}\n# kind: {}\n# root: {}\n# max-index: {}\n# probe-timeout: {}\n",
        album.key,
        album.kind,
        cfg.asset_root,
        cfg.scan_max_index,
        humantime::format_duration(cfg.probe_timeout)
    );

    match album.sourcing() {
        Sourcing::Declared(items) => {
            println!("# declared items (no scan):");
            for (idx, item) in items.iter().enumerate() {
                let resolved = match MediaItem::from_locator(item.locator(), album.kind) {
                    MediaItem::Embedded { id, .. } => format!("embedded {id}"),
                    MediaItem::Direct { locator, .. } => format!("direct {locator}"),
                };
                println!("  {:>3}: {resolved}", idx + 1);
            }
        }
        Sourcing::Scan(folder) => {
            let authority = ScanAuthority::new();
            let token = authority.bump();
            let ctx = ScanContext::from_config(cfg, prober, authority);
            let found =
                tasks::scanner::scan_sequential(&ctx, album.kind, folder, 1, token).await;
            println!("# discovered in '{folder}':");
            if found.is_empty() {
                println!("(nothing at position 1; album shows as coming soon)");
            }
            for (idx, locator) in found.iter().enumerate() {
                println!("  {:>3}: {locator}", idx + 1);
            }
        }
        Sourcing::Empty => println!("(album has neither items nor a folder)"),
    }

    Ok(())
}
