use std::sync::Arc;

use namegen_sequence::{FileSequenceStore, MemorySequenceStore, PgSequenceStore, SequenceStore};
use tracing::info;

use crate::CliError;
use crate::redaction::redact_connection_string;
use crate::settings::StoreSettings;

pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn SequenceStore>, CliError> {
    let store: Arc<dyn SequenceStore> = match settings {
        StoreSettings::Memory => Arc::new(MemorySequenceStore::new()),
        StoreSettings::File { path } => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Arc::new(FileSequenceStore::open(path)?)
        }
        StoreSettings::Postgres { url } => {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(CliError::InvalidConfig(format!(
                    "unsupported store url: {}",
                    redact_connection_string(url)
                )));
            }
            Arc::new(PgSequenceStore::connect(url, redact_connection_string(url))?)
        }
    };
    info!(store = %store.describe(), "sequence store opened");
    Ok(store)
}
