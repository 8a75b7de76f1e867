//! Tracing subscriber setup.
//!
//! Output is chosen by a single string: `0`/`off`, `1`/`stdout`,
//! `2`/`stderr`, or anything else as a file path (appended, no ANSI).
//! `RUST_LOG` takes precedence over the configured level.

use anyhow::Result;
use std::fs::OpenOptions;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Off,
    Stdout,
    Stderr,
    File(String),
}

impl LogOutput {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "0" | "off" => LogOutput::Off,
            "1" | "stdout" => LogOutput::Stdout,
            "" | "2" | "stderr" => LogOutput::Stderr,
            path => LogOutput::File(path.to_string()),
        }
    }
}

/// Build the filter: `RUST_LOG` if set, else `debug` when verbose, else `level`.
fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { level };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
pub fn init_logging(output: &LogOutput, level: &str, verbose: bool) -> Result<()> {
    match output {
        LogOutput::Off => {}
        LogOutput::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(build_filter(level, verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogOutput::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(build_filter(level, verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogOutput::File(filename) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(build_filter(level, verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output() {
        assert_eq!(LogOutput::parse("0"), LogOutput::Off);
        assert_eq!(LogOutput::parse("off"), LogOutput::Off);
        assert_eq!(LogOutput::parse("1"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse("2"), LogOutput::Stderr);
        assert_eq!(LogOutput::parse("stderr"), LogOutput::Stderr);
        assert_eq!(
            LogOutput::parse("kanban.log"),
            LogOutput::File("kanban.log".to_string())
        );
    }
}
