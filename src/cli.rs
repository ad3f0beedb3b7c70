//! Command-line interface.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// A bounded log of newline-delimited commands served over TCP.
#[derive(Debug, Parser)]
#[command(name = "ringline", version, about)]
pub struct Opts {
    /// Detach from the terminal and run in the background.
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// Address to listen on.
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "RINGLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror accepted bytes into this file and timestamp it
    /// periodically; the file is removed on clean shutdown.
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Log filter directives, e.g. `info` or `ringline=debug`.
    #[arg(long, env = "RINGLINE_LOG", default_value = "info")]
    pub log_level: String,
}
