use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Vocalis speech gateway
#[derive(Debug, Parser)]
#[command(name = "vocalis", about = "Synthesis-on-demand text-to-speech gateway")]
pub struct Args {
    /// Path to configuration file; built-in defaults are used when omitted
    #[arg(short, long, env = "VOCALIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "VOCALIS_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive (e.g. "info" or "tts=debug,info")
    #[arg(long, default_value = "info", env = "VOCALIS_LOG")]
    pub log_filter: String,
}
