// src/config.rs
// =============================================================================
// Runtime settings, resolved once from the parsed command line.
//
// Everything is configured through flags (or their environment variable
// fallbacks, see cli.rs); there is no config file.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::Result;
use crate::fetch::FetchConfig;
use crate::store::CapabilityStore;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub subject: Option<String>,
    pub json: bool,
    pub rate_limit: Duration,
    pub concurrency: usize,
    pub fetch: FetchConfig,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Settings {
            data_dir: cli.data_dir.clone(),
            subject: cli.subject.clone(),
            json: cli.json,
            rate_limit: Duration::from_millis(cli.rate_limit_ms),
            concurrency: cli.concurrency.max(1),
            fetch: FetchConfig {
                timeout: Duration::from_secs(cli.timeout_secs),
                ..FetchConfig::default()
            },
        }
    }

    /// The subjects to operate on: the one named by --subject, or every
    /// subject with a capability record.
    pub fn subjects(&self, store: &CapabilityStore) -> Result<Vec<String>> {
        match &self.subject {
            Some(subject) => Ok(vec![subject.clone()]),
            None => store.subjects(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli() {
        let cli = Cli::parse_from([
            "citation-guardian",
            "--data-dir",
            "/tmp/data",
            "--rate-limit-ms",
            "250",
            "--timeout-secs",
            "3",
            "--concurrency",
            "0",
        ]);
        let settings = Settings::from_cli(&cli);

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(settings.rate_limit, Duration::from_millis(250));
        assert_eq!(settings.fetch.timeout, Duration::from_secs(3));
        assert_eq!(settings.concurrency, 1);
        assert!(settings.fetch.user_agent.starts_with("citation-guardian/"));
    }

    #[test]
    fn test_explicit_subject_wins() {
        let cli = Cli::parse_from(["citation-guardian", "--subject", "aider", "report"]);
        let settings = Settings::from_cli(&cli);
        let store = CapabilityStore::new("/definitely/not/here");
        assert_eq!(settings.subjects(&store).unwrap(), vec!["aider"]);
    }
}
