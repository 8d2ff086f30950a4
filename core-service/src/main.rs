//! AISE Safety Engine - Main Entry Point
//!
//! Wires the device link, fatigue model and alert broker together and runs
//! the engine loop until the link closes or the process is told to stop.
//! Any startup failure is fatal.

mod logic;
pub mod constants;

use std::process::ExitCode;

use anyhow::Context;

use logic::cloud_sync::{CloudPublisher, MqttTransport};
use logic::config::EngineConfig;
use logic::device::SerialLink;
use logic::engine::SafetyEngine;
use logic::model::{FatigueClassifier, OnnxFatigueModel};
use logic::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    config.validate().context("invalid configuration")?;

    let model = OnnxFatigueModel::load(&config.model.path)
        .with_context(|| format!("failed to load fatigue model {}", config.model.path.display()))?;
    let classifier = FatigueClassifier::new(Box::new(model)).context("incompatible fatigue model")?;

    let link = SerialLink::open(&config.link).context("failed to open device link")?;

    let transport = MqttTransport::new(&config.publisher).context("invalid broker configuration")?;
    let mut publisher = CloudPublisher::new(transport, &config.publisher, config.retry.clone());
    publisher
        .connect_initial()
        .await
        .with_context(|| {
            format!(
                "failed to connect to broker {}:{}",
                config.publisher.endpoint, config.publisher.port
            )
        })?;
    log::info!("Publishing alerts to topic '{}'", publisher.topic());

    let journal = telemetry::open(&config.journal);

    let mut engine = SafetyEngine::new(
        Box::new(link),
        classifier,
        config.thresholds.clone(),
        publisher,
        journal,
    );

    engine.run(shutdown_signal()).await.context("engine stopped")?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
