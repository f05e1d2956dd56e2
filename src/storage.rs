//! Append-only JSON-lines files.
//!
//! One serialized record per line. A missing file reads as empty; a line that
//! fails to parse is reported with its position rather than skipped.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Read every record in `path`.
pub async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Append one record, creating the file and its directory if needed.
pub async fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        n: u32,
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let rows: Vec<Row> = read_records(&dir.path().join("none.jsonl")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_append_then_read_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.jsonl");

        append_record(&path, &Row { n: 1 }).await.unwrap();
        append_record(&path, &Row { n: 2 }).await.unwrap();

        let rows: Vec<Row> = read_records(&path).await.unwrap();
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[tokio::test]
    async fn test_corrupt_line_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        tokio::fs::write(&path, "{\"n\":1}\nnot json\n").await.unwrap();

        let err = read_records::<Row>(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }
}
