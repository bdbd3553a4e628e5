//! # Feedback store
//!
//! One flat file holding a JSON array of every feedback entry ever
//! submitted, created lazily and rewritten in full on each append.
//!
//! Persistence is best-effort: a file that fails to parse reads back as an
//! empty list (logged, not raised), and the read-modify-write append has no
//! locking, so two concurrent submissions can race and one may be lost.
//! Both are accepted at this scale and documented here rather than hidden.
use std::{io, path::PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedbackEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub feedback: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl FeedbackEntry {
    /// Builds a new entry with a fresh id and the current time. A missing
    /// email is stored as the empty string.
    pub fn new(name: String, email: Option<String>, feedback: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: email.unwrap_or_default(),
            feedback,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn ensure_file(&self) -> io::Result<()> {
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }

        fs::write(&self.path, "[]").await
    }

    /// Loads every stored entry, oldest first. The file is created empty if
    /// absent. Unparseable contents read back as an empty list.
    pub async fn read(&self) -> io::Result<Vec<FeedbackEntry>> {
        self.ensure_file().await?;

        let raw = fs::read_to_string(&self.path).await?;

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Feedback file is not valid JSON, treating as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Appends one entry by rewriting the whole file. Not atomic.
    pub async fn append(&self, entry: FeedbackEntry) -> io::Result<()> {
        let mut entries = self.read().await?;
        entries.push(entry);

        let raw = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, raw).await
    }
}
