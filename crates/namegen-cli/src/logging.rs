use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use crate::CliError;
use crate::settings::{LogFormat, LogSettings};

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine readable.
pub fn init_logging(settings: &LogSettings) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|err| CliError::Logging(err.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(io::stderr),
            )
            .try_init(),
    };
    result.map_err(|err| CliError::Logging(err.to_string()))
}
