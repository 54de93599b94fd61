//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Clone, Parser)]
#[command(name = "cuedeck")]
#[command(about = "Carousel autoplay and toast queue scheduler with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Autoplay interval between carousel advances, in milliseconds
    #[arg(short, long, default_value = "5000")]
    pub interval_ms: u64,

    /// Number of slides in the carousel
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    pub slides: u32,

    /// Default toast display duration in milliseconds
    #[arg(long, default_value = "3000")]
    pub toast_ms: u64,

    /// Exit transition length of a hidden toast in milliseconds
    #[arg(long, default_value = "250")]
    pub fade_ms: u64,

    /// Start with the autoplay gate closed
    #[arg(long)]
    pub no_autoplay: bool,

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

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}
