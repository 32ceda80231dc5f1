use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use punch_reminder_core::{FileConfigSource, MonitorService};

use super::SideFiles;
use crate::adapters;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    files: SideFiles,
    /// Exit after the first status event
    #[arg(long)]
    once: bool,
}

pub fn run(source: FileConfigSource, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (fix_file, marker) = args.files.resolve(&source);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(monitor(source, fix_file, marker, args.once))
}

async fn monitor(
    source: FileConfigSource,
    fix_file: PathBuf,
    marker: PathBuf,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        config = %source.path().display(),
        fix_file = %fix_file.display(),
        marker = %marker.display(),
        "starting monitor"
    );

    let deps = adapters::desktop(fix_file, marker);
    let service = Arc::new(MonitorService::new(Arc::new(source), deps));
    let mut sub = service.subscribe();
    service.start_session()?;

    #[cfg(unix)]
    let hangup = reload_on_hangup(service.clone())?;

    loop {
        tokio::select! {
            event = sub.events.recv() => {
                let Some(event) = event else { break };
                println!("{}", serde_json::to_string(&event)?);
                if once {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, stopping");
                break;
            }
        }
    }

    #[cfg(unix)]
    hangup.abort();
    service.stop_session();
    Ok(())
}

/// Re-read the config file on SIGHUP.
#[cfg(unix)]
fn reload_on_hangup(service: Arc<MonitorService>) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading config");
            if let Err(e) = service.reload_config() {
                tracing::warn!(error = %e, "config reload rejected");
            }
        }
    }))
}
