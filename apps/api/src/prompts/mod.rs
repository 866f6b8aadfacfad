//! Prompt resolution: remote NocoDB table first, then the local JSON file.
//!
//! Each source returns `Result<Option<_>>`; an error or an empty source moves
//! on to the next one. When a character has no matching entry a random entry
//! from the whole source is used instead. Unfiltered lookups take a random
//! entry straight away.

pub mod handlers;
pub mod models;

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::nocodb::{NocoDbClient, NocoDbError};

pub use models::PromptRecord;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid prompts file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Record store error: {0}")]
    Remote(#[from] NocoDbError),
}

#[derive(Debug, Deserialize)]
struct LocalPromptFile {
    #[serde(default)]
    prompts: Vec<Value>,
}

#[derive(Clone)]
struct RemoteTable {
    client: NocoDbClient,
    table_id: String,
}

/// Ordered prompt sources for character lookups.
#[derive(Clone)]
pub struct PromptStore {
    remote: Option<RemoteTable>,
    local_path: PathBuf,
}

impl PromptStore {
    pub fn new(remote: Option<(NocoDbClient, String)>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.map(|(client, table_id)| RemoteTable { client, table_id }),
            local_path: local_path.into(),
        }
    }

    /// Enables the remote source only when NocoDB and a table id are configured.
    pub fn from_config(config: &Config) -> Self {
        let remote = match (config.nocodb(), &config.nocodb_table_id) {
            (Some(settings), Some(table_id)) => match NocoDbClient::new(&settings) {
                Ok(client) => {
                    info!("Remote prompt table enabled ({table_id})");
                    Some((client, table_id.clone()))
                }
                Err(e) => {
                    warn!("NocoDB client unavailable, using local prompts only: {e}");
                    None
                }
            },
            _ => {
                info!("Remote prompt table not configured, using local prompts only");
                None
            }
        };
        Self::new(remote, config.prompts_path.clone())
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Returns a prompt for `character`, or `None` when no source has any.
    pub async fn get_prompt(&self, character: &str) -> Option<PromptRecord> {
        self.lookup(Some(character)).await
    }

    /// Returns a random prompt regardless of character.
    pub async fn random_prompt(&self) -> Option<PromptRecord> {
        self.lookup(None).await
    }

    async fn lookup(&self, character: Option<&str>) -> Option<PromptRecord> {
        match self.from_remote(character).await {
            Ok(Some(record)) => return Some(record),
            Ok(None) => {}
            Err(e) => warn!("Remote prompt lookup failed, trying local file: {e}"),
        }

        match self.from_local(character).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Local prompt lookup failed: {e}");
                None
            }
        }
    }

    async fn from_remote(
        &self,
        character: Option<&str>,
    ) -> Result<Option<PromptRecord>, PromptError> {
        let Some(remote) = &self.remote else {
            return Ok(None);
        };

        let rows = remote.client.list_records(&remote.table_id).await?;
        let payloads: Vec<Value> = rows.iter().filter_map(record_payload).collect();
        debug!(
            "Remote prompt table returned {} rows ({} usable)",
            rows.len(),
            payloads.len()
        );

        Ok(select_prompt(&payloads, character, &mut rand::thread_rng()))
    }

    async fn from_local(
        &self,
        character: Option<&str>,
    ) -> Result<Option<PromptRecord>, PromptError> {
        let raw = tokio::fs::read_to_string(&self.local_path)
            .await
            .map_err(|source| PromptError::Read {
                path: self.local_path.clone(),
                source,
            })?;
        let file: LocalPromptFile = serde_json::from_str(&raw)?;
        let entries: Vec<Value> = file.prompts.into_iter().filter(Value::is_object).collect();

        Ok(select_prompt(&entries, character, &mut rand::thread_rng()))
    }
}

/// Extracts the prompt object from a remote row.
///
/// Rows may carry their fields directly or nested under a `Prompts` column,
/// which is either an object or a JSON-encoded string.
fn record_payload(row: &Value) -> Option<Value> {
    match row.get("Prompts") {
        Some(Value::Object(map)) => Some(Value::Object(map.clone())),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(Value::is_object)
            .or_else(|| row.is_object().then(|| row.clone())),
        _ => row.is_object().then(|| row.clone()),
    }
}

/// Picks a random entry whose `character` matches, else a random entry overall.
///
/// With no `character` every entry is a candidate.
pub fn select_prompt<R: Rng + ?Sized>(
    entries: &[Value],
    character: Option<&str>,
    rng: &mut R,
) -> Option<PromptRecord> {
    let matching: Vec<&Value> = match character {
        Some(c) => entries
            .iter()
            .filter(|e| e.get("character").and_then(Value::as_str) == Some(c))
            .collect(),
        None => Vec::new(),
    };

    let chosen = if matching.is_empty() {
        if let Some(c) = character {
            debug!("No prompt for character '{c}', picking from all entries");
        }
        entries.choose(rng)?
    } else {
        *matching.choose(rng)?
    };

    Some(PromptRecord::from_record(chosen, character.unwrap_or_default()))
}
