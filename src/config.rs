//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "gongy")]
#[command(about = "A meditation timer daemon with gong cues and mindful-minute tracking")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the mindful-minutes counter [default: ~/.config/gongy]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory containing the gong recordings
    #[arg(long, default_value = "sounds")]
    pub sounds_dir: PathBuf,

    /// Audio player command; the sound file path is appended
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Session tick interval in milliseconds
    #[arg(long, default_value = "250", value_parser = clap::value_parser!(u64).range(50..=1000))]
    pub tick_ms: u64,

    /// Do not keep the screen awake while a session runs
    #[arg(long)]
    pub no_wake_lock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Directory for persisted data, `~/.config/gongy` unless overridden
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("gongy")
        })
    }
}
