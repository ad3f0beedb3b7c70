//! Process lifecycle: wiring the device, server, and timestamper
//! together, then tearing them down on signal-driven shutdown.

use std::{io, path::PathBuf, sync::Arc, time::Duration};

use snafu::{ResultExt, Snafu};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::{Config, LISTEN_BACKLOG},
    device::{Device, FileMirror},
    server::{Server, ServerError},
    signal,
    timestamp::Timestamper,
};

/// Fatal application error.
#[derive(Debug, Snafu)]
pub enum AppError {
    /// The configured data file could not be opened.
    #[snafu(display("failed to open data file {}: {source}", path.display()))]
    OpenDataFile {
        /// Configured data file path.
        path: PathBuf,
        /// Underlying open error.
        source: io::Error,
    },

    /// The server failed to start or run.
    #[snafu(display("server failed: {source}"))]
    Server {
        /// Underlying server error.
        source: ServerError,
    },

    /// OS signal handlers could not be installed.
    #[snafu(display("failed to install signal handlers: {source}"))]
    Signals {
        /// Underlying error.
        source: io::Error,
    },

    /// The server task panicked.
    #[snafu(display("server task panicked: {source}"))]
    ServerJoin {
        /// Join error carrying the panic.
        source: tokio::task::JoinError,
    },
}

/// The assembled application.
#[derive(Debug)]
pub struct Application {
    config: Config,
}

impl Application {
    /// Builds an application from a finalized configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs until SIGINT or SIGTERM, then drains workers, stops the
    /// timestamper, and removes the data file.
    pub async fn run(self) -> Result<(), AppError> {
        let device = Arc::new(match &self.config.data_file {
            Some(path) => {
                let mirror = FileMirror::open(path).context(OpenDataFileSnafu { path })?;
                info!(message = "Mirroring accepted bytes.", path = %path.display());
                Device::with_mirror(mirror)
            }
            None => Device::new(),
        });

        let shutdown = CancellationToken::new();
        let server = Server::bind(
            Arc::clone(&device),
            self.config.address,
            LISTEN_BACKLOG,
            self.config.recv_buffer_size,
        )
        .context(ServerSnafu)?;
        let mut server_task = tokio::spawn(server.run(shutdown.clone()));

        let timestamper = self.config.data_file.is_some().then(|| {
            let period = Duration::from_secs(self.config.timestamp_interval_secs);
            tokio::spawn(Timestamper::new(Arc::clone(&device), period).run(shutdown.clone()))
        });

        tokio::select! {
            joined = &mut server_task => {
                // The server only returns early when something went badly
                // wrong; shut everything else down and surface it.
                shutdown.cancel();
                stop_timestamper(timestamper).await;
                return match joined {
                    Ok(result) => result.context(ServerSnafu),
                    Err(source) => Err(AppError::ServerJoin { source }),
                };
            }
            result = signal::shutdown() => {
                result.context(SignalsSnafu)?;
                shutdown.cancel();
            }
        }

        match server_task.await {
            Ok(result) => result.context(ServerSnafu)?,
            Err(source) => return Err(AppError::ServerJoin { source }),
        }
        stop_timestamper(timestamper).await;

        match device.remove_mirror() {
            Ok(Some(path)) => info!(message = "Removed data file.", path = %path.display()),
            Ok(None) => {}
            Err(error) => warn!(message = "Failed to remove data file.", %error),
        }

        info!(message = "Shutdown complete.");
        Ok(())
    }
}

async fn stop_timestamper(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        if let Err(error) = task.await {
            error!(message = "Timestamper task panicked.", %error);
        }
    }
}
