use serde_derive::Deserialize;
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Environment filter overriding the configured level, e.g. `TASKLIST_LOG=tasklist=debug`.
pub const LOG_ENV: &str = "TASKLIST_LOG";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum LogType {
    Stdout,
    Stderr,
}

impl Default for LogType {
    fn default() -> Self {
        LogType::Stdout
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Log {
    pub level: String,
    #[serde(default)]
    pub structured: bool,
    #[serde(default)]
    pub backend: LogType,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
            backend: LogType::Stdout,
        }
    }
}

/// setup log from an optional environment filter and the config file
///
/// if the environment filter is present, the configured level is not used
pub fn setup(
    env_filter: Result<EnvFilter, tracing_subscriber::filter::FromEnvError>,
    config: Option<&Log>,
) -> anyhow::Result<()> {
    let default_log = Log::default();
    let config = config.unwrap_or(&default_log);
    let env_filter = match env_filter {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let sbuilder = Subscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc3339())
        .with_level(true)
        .with_env_filter(env_filter);

    // each combination is its own subscriber type
    match (config.structured, config.backend) {
        (true, LogType::Stdout) => {
            tracing::subscriber::set_global_default(sbuilder.json().finish())?
        }
        (true, LogType::Stderr) => tracing::subscriber::set_global_default(
            sbuilder.json().with_writer(std::io::stderr).finish(),
        )?,
        (false, LogType::Stdout) => {
            tracing::subscriber::set_global_default(sbuilder.with_ansi(true).finish())?
        }
        (false, LogType::Stderr) => tracing::subscriber::set_global_default(
            sbuilder
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .finish(),
        )?,
    };
    Ok(())
}
