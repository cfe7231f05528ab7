// CLI module for textlens
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// textlens - Text analysis service with cached results and rate limiting
#[derive(Parser, Debug)]
#[command(name = "textlens", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.textlens/config.toml)
    #[arg(short, long, env = "TEXTLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Use the in-process store instead of the configured one
    #[arg(long)]
    pub memory_store: bool,
}
