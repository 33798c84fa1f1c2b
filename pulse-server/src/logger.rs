//! Logging setup
//!
//! Console output by default, optional JSON lines, optional daily rolling file
//! under `LOG_DIR`. `RUST_LOG` wins over `LOG_LEVEL` when set.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

pub fn init_logger(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pulse_server={level},shared={level},tower_http=info,security={level}",
            level = config.level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    let file_dir = config.dir.as_deref().filter(|dir| Path::new(dir).exists());

    match (file_dir, config.json) {
        (Some(dir), true) => {
            let appender = tracing_appender::rolling::daily(dir, "pulse-server");
            builder
                .json()
                .with_writer(appender)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        (Some(dir), false) => {
            let appender = tracing_appender::rolling::daily(dir, "pulse-server");
            builder
                .with_ansi(false)
                .with_writer(appender)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        (None, true) => builder.json().try_init().map_err(|e| anyhow::anyhow!(e))?,
        (None, false) => builder.try_init().map_err(|e| anyhow::anyhow!(e))?,
    }

    if let Some(dir) = config.dir.as_deref()
        && file_dir.is_none()
    {
        tracing::warn!(dir, "LOG_DIR does not exist, logging to console only");
    }

    Ok(())
}
