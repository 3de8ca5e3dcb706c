//! Run configuration: built-in defaults, then an optional RON file, then
//! command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use ncleg_core::{parse_bill_numbers, HarvestPlan};
use ncleg_engine::{FetchSettings, HarvestSettings};
use ncleg_logging::{LogDestination, DEFAULT_LOG_FILE};
use ron::extensions::Extensions;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings file contents. Every field is optional and falls back to the
/// built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub chamber: Option<String>,
    pub session: Option<String>,
    pub numbers: Option<String>,
    pub output: Option<PathBuf>,
    pub log: Option<String>,
    pub log_file: Option<PathBuf>,

    pub lookup_url: Option<String>,
    pub modern_session: Option<String>,
    pub explicit_concurrency: Option<usize>,
    pub max_consecutive_failures: Option<u32>,

    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
    pub max_retries: Option<u32>,
    pub base_backoff_ms: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Options may be written bare (`session: "2015"`) or as `Some(..)`.
    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
    }

    fn apply_harvest(&self, settings: &mut HarvestSettings) {
        if let Some(url) = &self.lookup_url {
            settings.lookup_url = url.clone();
        }
        if let Some(session) = &self.modern_session {
            settings.modern_session = session.clone();
        }
        if let Some(concurrency) = self.explicit_concurrency {
            settings.explicit_concurrency = concurrency;
        }
        if let Some(budget) = self.max_consecutive_failures {
            settings.max_consecutive_failures = budget;
        }
    }

    fn apply_fetch(&self, settings: &mut FetchSettings) {
        let millis = |value: Option<u64>, target: &mut Duration| {
            if let Some(ms) = value {
                *target = Duration::from_millis(ms);
            }
        };
        millis(self.connect_timeout_ms, &mut settings.connect_timeout);
        millis(self.request_timeout_ms, &mut settings.request_timeout);
        millis(self.base_backoff_ms, &mut settings.base_backoff);
        millis(self.request_delay_ms, &mut settings.request_delay);
        if let Some(limit) = self.redirect_limit {
            settings.redirect_limit = limit;
        }
        if let Some(max_bytes) = self.max_bytes {
            settings.max_bytes = max_bytes;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(agent) = &self.user_agent {
            settings.user_agent = agent.clone();
        }
    }
}

/// Everything a run needs, fully resolved.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub plan: HarvestPlan,
    pub harvest: HarvestSettings,
    pub fetch: FetchSettings,
    pub output: Option<PathBuf>,
    pub log: LogDestination,
    pub log_file: PathBuf,
    pub level: LevelFilter,
}

impl RunConfig {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let mut harvest = HarvestSettings::default();
        file.apply_harvest(&mut harvest);
        if let Some(url) = &cli.base_url {
            harvest.lookup_url = url.clone();
        }
        if harvest.explicit_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "explicit_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if harvest.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid {
                field: "max_consecutive_failures",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Err(err) = harvest.check_lookup_url() {
            return Err(ConfigError::Invalid {
                field: "lookup_url",
                reason: err.to_string(),
            });
        }

        let mut fetch = FetchSettings::default();
        file.apply_fetch(&mut fetch);

        let log = match (cli.log, &file.log) {
            (Some(destination), _) => destination,
            (None, Some(raw)) => LogDestination::parse(raw).ok_or(ConfigError::Invalid {
                field: "log",
                reason: format!("unknown destination {raw:?}"),
            })?,
            (None, None) => LogDestination::default(),
        };

        let selector = cli.chamber.clone().or(file.chamber).unwrap_or_default();
        let session = cli
            .session
            .clone()
            .or(file.session)
            .unwrap_or_else(|| harvest.modern_session.clone());
        let numbers = cli
            .number
            .as_deref()
            .or(file.numbers.as_deref())
            .and_then(parse_bill_numbers);

        Ok(Self {
            plan: HarvestPlan::new(&selector, session, numbers),
            harvest,
            fetch,
            output: cli.output.clone().or(file.output),
            log,
            log_file: cli
                .log_file
                .clone()
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            level: match cli.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ncleg_core::Chamber;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ncleg"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_harvest_both_chambers_of_modern_session() {
        let run = RunConfig::resolve(&cli(&[]), FileConfig::default()).unwrap();
        assert_eq!(run.plan.chambers, vec![Chamber::House, Chamber::Senate]);
        assert_eq!(run.plan.session, "2017");
        assert_eq!(run.plan.numbers, None);
        assert_eq!(run.harvest, HarvestSettings::default());
        assert_eq!(run.log, LogDestination::Terminal);
        assert_eq!(run.level, LevelFilter::Info);
        assert_eq!(run.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn parses_ron_with_bare_and_wrapped_options() {
        let config = FileConfig::parse(
            r#"(
                session: "2015",
                chamber: Some("S"),
                numbers: "4, 5",
                explicit_concurrency: 2,
                request_timeout_ms: 1500,
                log: "file",
            )"#,
        )
        .unwrap();
        assert_eq!(config.session.as_deref(), Some("2015"));
        assert_eq!(config.chamber.as_deref(), Some("S"));
        assert_eq!(config.explicit_concurrency, Some(2));

        let run = RunConfig::resolve(&cli(&[]), config).unwrap();
        assert_eq!(run.plan.chambers, vec![Chamber::Senate]);
        assert_eq!(run.plan.numbers, Some(vec!["4".to_string(), "5".to_string()]));
        assert_eq!(run.harvest.explicit_concurrency, 2);
        assert_eq!(run.fetch.request_timeout, Duration::from_millis(1500));
        assert_eq!(run.fetch.max_retries, FetchSettings::default().max_retries);
        assert_eq!(run.log, LogDestination::File);
    }

    #[test]
    fn command_line_overrides_file() {
        let file = FileConfig {
            session: Some("2015".to_string()),
            chamber: Some("S".to_string()),
            lookup_url: Some("http://file.example/lookup".to_string()),
            log: Some("file".to_string()),
            ..FileConfig::default()
        };
        let run = RunConfig::resolve(
            &cli(&[
                "--session",
                "2017",
                "--chamber",
                "H",
                "--base-url",
                "http://cli.example/lookup",
                "--log",
                "terminal",
                "-v",
            ]),
            file,
        )
        .unwrap();
        assert_eq!(run.plan.session, "2017");
        assert_eq!(run.plan.chambers, vec![Chamber::House]);
        assert_eq!(run.harvest.lookup_url, "http://cli.example/lookup");
        assert_eq!(run.log, LogDestination::Terminal);
        assert_eq!(run.level, LevelFilter::Debug);
    }

    #[test]
    fn session_defaults_to_configured_modern_session() {
        let file = FileConfig {
            modern_session: Some("2019".to_string()),
            ..FileConfig::default()
        };
        let run = RunConfig::resolve(&cli(&[]), file.clone()).unwrap();
        assert_eq!(run.harvest.modern_session, "2019");
        assert_eq!(run.plan.session, "2019");

        let run = RunConfig::resolve(&cli(&["--session", "2015"]), file).unwrap();
        assert_eq!(run.plan.session, "2015");
        assert_eq!(run.harvest.modern_session, "2019");
    }

    #[test]
    fn blank_number_list_means_unbounded() {
        let run = RunConfig::resolve(&cli(&["--number", "  "]), FileConfig::default()).unwrap();
        assert_eq!(run.plan.numbers, None);
    }

    #[test]
    fn rejects_bad_values() {
        let zero = FileConfig {
            explicit_concurrency: Some(0),
            ..FileConfig::default()
        };
        assert!(matches!(
            RunConfig::resolve(&cli(&[]), zero),
            Err(ConfigError::Invalid { field: "explicit_concurrency", .. })
        ));

        let log = FileConfig {
            log: Some("syslog".to_string()),
            ..FileConfig::default()
        };
        assert!(matches!(
            RunConfig::resolve(&cli(&[]), log),
            Err(ConfigError::Invalid { field: "log", .. })
        ));

        assert!(matches!(
            RunConfig::resolve(&cli(&["--base-url", "not a url"]), FileConfig::default()),
            Err(ConfigError::Invalid { field: "lookup_url", .. })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(FileConfig::parse("(sesion: \"2015\")").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = FileConfig::load(&temp.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let path = temp.path().join("ncleg.ron");
        fs::write(&path, "(max_retries: 1, base_backoff_ms: 10)").unwrap();
        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.max_retries, Some(1));
        assert_eq!(config.base_backoff_ms, Some(10));
    }
}
