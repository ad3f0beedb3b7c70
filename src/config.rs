//! Runtime configuration, from defaults, an optional TOML file, and CLI
//! overrides, in ascending precedence.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use snafu::{ResultExt, Snafu, ensure};

use crate::cli::Opts;

/// Default TCP listen port.
pub const DEFAULT_PORT: u16 = 9000;

/// Listen backlog for the accepting socket.
pub const LISTEN_BACKLOG: u32 = 10;

/// Default per-connection receive buffer size in bytes.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

/// Default seconds between timestamp records when a data file is
/// configured.
pub const DEFAULT_TIMESTAMP_INTERVAL_SECS: u64 = 10;

/// Error loading the configuration file.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The file could not be read.
    #[snafu(display("failed to read config file {}: {source}", path.display()))]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying read error.
        source: io::Error,
    },

    /// The file contents were not valid configuration.
    #[snafu(display("failed to parse config file {}: {source}", path.display()))]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// `recv_buffer_size` was set to zero, which would make every
    /// connection read end-of-stream immediately.
    #[snafu(display("recv_buffer_size must be at least 1 byte"))]
    ZeroRecvBufferSize,
}

/// Complete server configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Address the TCP server listens on.
    pub address: SocketAddr,

    /// Size of each connection's receive buffer. Must be at least 1.
    pub recv_buffer_size: usize,

    /// When set, every accepted byte is mirrored into this file, a
    /// periodic timestamp record is appended, and the file is removed on
    /// clean shutdown.
    pub data_file: Option<PathBuf>,

    /// Seconds between timestamp records. Only meaningful with
    /// `data_file`.
    pub timestamp_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            data_file: None,
            timestamp_interval_secs: DEFAULT_TIMESTAMP_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Loads the file at `path`, or the defaults when no path is given.
    /// Values outside their valid ranges are rejected here rather than at
    /// first use.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let contents = std::fs::read_to_string(path).context(ReadSnafu { path })?;
                toml::from_str(&contents).context(ParseSnafu { path })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(self.recv_buffer_size > 0, ZeroRecvBufferSizeSnafu);
        Ok(())
    }

    /// Applies CLI overrides on top of whatever was loaded.
    pub fn apply_cli(&mut self, opts: &Opts) {
        if let Some(address) = opts.address {
            self.address = address;
        }
        if let Some(data_file) = &opts.data_file {
            self.data_file = Some(data_file.clone());
        }
    }
}
