//! Local append-only safety net for quote-bearing messages.
//!
//! One JSONL entry per message, written after remote persistence attempts
//! regardless of their outcome. The running process never reads the file
//! back; it exists for manual recovery.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub supplier_id: String,
    pub raw_message: String,
    pub amounts: Vec<Decimal>,
    pub product_flags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct BackupLog {
    path: PathBuf,
}

impl BackupLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. The file is opened per write so a rotated or
    /// deleted file does not strand an open handle.
    pub async fn append(&self, entry: &BackupEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry)
            .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
        line.push(b'\n');

        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(&line).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{BackupEntry, BackupLog};

    fn entry(message: &str) -> BackupEntry {
        BackupEntry {
            supplier_id: "59170001234@c.us".to_string(),
            raw_message: message.to_string(),
            amounts: vec![Decimal::from(120)],
            product_flags: vec!["chair".to_string()],
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn appends_one_json_line_per_entry() {
        let dir = TempDir::new().expect("temp dir");
        let log = BackupLog::new(dir.path().join("backup.jsonl"));

        log.append(&entry("silla $120")).await.expect("first append");
        log.append(&entry("mesa $450")).await.expect("second append");

        let raw = std::fs::read_to_string(log.path()).expect("read backup");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: BackupEntry = serde_json::from_str(lines[0]).expect("parse first line");
        assert_eq!(first.raw_message, "silla $120");
        assert_eq!(first.amounts, vec![Decimal::from(120)]);
    }

    #[tokio::test]
    async fn append_fails_when_directory_is_missing() {
        let dir = TempDir::new().expect("temp dir");
        let log = BackupLog::new(dir.path().join("missing").join("backup.jsonl"));

        assert!(log.append(&entry("silla $120")).await.is_err());
    }
}
