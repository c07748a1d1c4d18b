//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::state::duration_config::{DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomodoro-server")]
#[command(about = "A Pomodoro work/break timer served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20525")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work phase length in minutes
    #[arg(short, long, default_value_t = DEFAULT_WORK_MINUTES,
          value_parser = clap::value_parser!(u32).range(1..=999))]
    pub work: u32,

    /// Break phase length in minutes
    #[arg(short = 'b', long = "break", default_value_t = DEFAULT_BREAK_MINUTES,
          value_parser = clap::value_parser!(u32).range(1..=999))]
    pub break_minutes: u32,

    /// Countdown tick period in milliseconds
    #[arg(long, default_value = "1000",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Where sessions, marker positions and theme are saved
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Keep all state in memory
    #[arg(long, conflicts_with = "state_file")]
    pub no_persist: bool,

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

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Resolve the state file, defaulting to the user's data directory.
    ///
    /// `None` means persistence is disabled.
    pub fn state_path(&self) -> Option<PathBuf> {
        if self.no_persist {
            return None;
        }
        self.state_file.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join("pomodoro-server").join("state.json"))
        })
    }
}
