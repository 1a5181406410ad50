//! Channel bindings stored in the `channels` key of the config file.

use std::path::{Path, PathBuf};

use relay_models::ChannelBinding;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::{PersistenceError, Result};

/// Key holding the bindings inside the config object.
pub const CHANNELS_KEY: &str = "channels";

/// Reads and writes channel bindings in a shared JSON config file.
///
/// The file holds other settings too; saving only replaces `channels`:
/// ```text
/// {
///   "telegramToken": "...",
///   "pollInterval": 10000,
///   "channels": [ { "channelId": "...", "boardId": "...", ... } ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelStore {
    path: PathBuf,
}

impl ChannelStore {
    /// Creates a store backed by the given config file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved bindings.
    ///
    /// A missing file or missing key yields an empty list. Entries that
    /// don't parse are logged and skipped.
    pub fn load_channels(&self) -> Result<Vec<ChannelBinding>> {
        let Some(mut root) = self.read_root()? else {
            debug!(path = %self.path.display(), "config file not found, no channels");
            return Ok(Vec::new());
        };

        let entries = match root.remove(CHANNELS_KEY) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(self.invalid(format!(
                    "`{}` must be an array, found {}",
                    CHANNELS_KEY,
                    json_kind(&other)
                )))
            }
        };

        let mut bindings = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<ChannelBinding>(entry) {
                Ok(binding) => bindings.push(binding),
                Err(e) => warn!(
                    path = %self.path.display(),
                    index,
                    error = %e,
                    "skipping malformed channel entry"
                ),
            }
        }

        debug!(count = bindings.len(), "loaded channel bindings");
        Ok(bindings)
    }

    /// Replaces the `channels` key, keeping every other key of the file.
    pub fn save_channels(&self, bindings: &[ChannelBinding]) -> Result<()> {
        let mut root = self.read_root()?.unwrap_or_default();
        root.insert(CHANNELS_KEY.to_string(), serde_json::to_value(bindings)?);

        atomic_write_json(&self.path, &Value::Object(root))?;
        debug!(
            path = %self.path.display(),
            count = bindings.len(),
            "saved channel bindings"
        );
        Ok(())
    }

    fn read_root(&self) -> Result<Option<Map<String, Value>>> {
        match read_json_optional::<Value>(&self.path)? {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(self.invalid(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn invalid(&self, reason: String) -> PersistenceError {
        PersistenceError::InvalidData {
            path: self.path.clone(),
            reason,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
