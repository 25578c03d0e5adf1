pub mod analysis;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod models;
pub mod monitor;
pub mod session;
pub mod timers;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use backend::BackendClient;
use cli::Cli;
use commands::{CommandHost, HostEvent, SessionCommand};
use config::ProctorConfig;
use db::Database;
use diagnostics::WebcamSignals;
use models::InterviewConfig;
use monitor::ScreenpipeClient;
use session::{Collaborators, InterviewController};

pub async fn run(cli: Cli) -> Result<()> {
    utils::logging::init();
    info!("Shortlist proctor starting up...");

    let mut config = ProctorConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let webcam = WebcamSignals::new();
    let (collaborators, interview_id) = build_collaborators(&cli, &config, &webcam).await?;

    let controller = InterviewController::load(&interview_id, collaborators, &config).await?;
    let host = CommandHost::new(controller.clone(), webcam);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<HostEvent>();
    let writer = tokio::spawn(write_events(event_rx));

    let mut status_rx = controller.monitor().subscribe();
    let status_tx = event_tx.clone();
    let forwarder = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = *status_rx.borrow_and_update();
            if status_tx.send(HostEvent::monitor_status(status)).is_err() {
                break;
            }
        }
    });

    controller.mount();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read command")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match SessionCommand::parse_line(&line) {
            Ok(command) => host.dispatch(command).await,
            Err(err) => {
                warn!("{err:#}");
                HostEvent::Error {
                    message: format!("{err:#}"),
                }
            }
        };
        let unmounted = matches!(event, HostEvent::Unmounted);
        if event_tx.send(event).is_err() {
            break;
        }
        if unmounted {
            break;
        }
    }

    host.controller().unmount();
    host.controller().wait_for_analysis().await;

    forwarder.abort();
    drop(event_tx);
    if let Err(err) = writer.await {
        error!("Event writer failed to join: {err}");
    }

    info!("Shortlist proctor stopped");
    Ok(())
}

async fn build_collaborators(
    cli: &Cli,
    config: &ProctorConfig,
    webcam: &WebcamSignals,
) -> Result<(Collaborators, String)> {
    let timeout = config.timing.request_timeout();
    let screen = Arc::new(ScreenpipeClient::new(&config.screenpipe_url, timeout)?);
    let webcam = Arc::new(webcam.clone());

    if let Some(backend_url) = &config.backend_url {
        let interview_id = cli
            .interview_id
            .clone()
            .context("--interview-id is required when a backend URL is configured")?;
        let client = Arc::new(BackendClient::new(backend_url, timeout)?);
        info!("Using interview backend at {backend_url}");

        let collaborators = Collaborators {
            store: client.clone(),
            sink: client.clone(),
            analysis: client,
            screen,
            webcam,
        };
        return Ok((collaborators, interview_id));
    }

    let database = Database::new(cli.db.clone())?;
    let interview_id = cli
        .interview_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if database.find_interview(&interview_id).await?.is_none() {
        let interview =
            InterviewConfig::new(interview_id.clone(), cli.topic.clone(), cli.require_monitoring);
        database.create_interview(&interview).await?;
        info!("Created local interview {interview_id}");
    }

    let database = Arc::new(database);
    let collaborators = Collaborators {
        store: database.clone(),
        sink: database.clone(),
        analysis: database,
        screen,
        webcam,
    };
    Ok((collaborators, interview_id))
}

async fn write_events(mut events: mpsc::UnboundedReceiver<HostEvent>) {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = events.recv().await {
        let line = match event.to_line() {
            Ok(line) => line,
            Err(err) => {
                error!("{err:#}");
                continue;
            }
        };
        if let Err(err) = stdout.write_all(format!("{line}\n").as_bytes()).await {
            error!("Failed to write event: {err}");
            break;
        }
        if let Err(err) = stdout.flush().await {
            error!("Failed to flush stdout: {err}");
            break;
        }
    }
}
