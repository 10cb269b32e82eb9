//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "shorts-shield")]
#[command(about = "Popup controller for a short-form video blocker")]
#[command(version)]
pub struct Config {
    /// Port the popup view layer listens on
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the extension's local storage
    #[arg(short, long, default_value = "shorts-shield.json")]
    pub store: PathBuf,

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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_locally() {
        let config = Config::try_parse_from(["shorts-shield"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.store, PathBuf::from("shorts-shield.json"));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn verbose_switches_to_debug() {
        let config =
            Config::try_parse_from(["shorts-shield", "-v", "--store", "/tmp/popup.json", "-p", "9000"])
                .unwrap();
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.port, 9000);
        assert_eq!(config.store, PathBuf::from("/tmp/popup.json"));
    }
}
