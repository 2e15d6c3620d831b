//! Journal file codec
//!
//! One JSON object per line: `{"name": "...", "type": "counter"|"gauge", "value": n}`.
//! Rewrites go to `<path>.tmp` first and are renamed over the journal, so a
//! shorter snapshot never leaves stale bytes from a longer one behind.

use metrix_core::{Metric, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Result of decoding a journal
#[derive(Debug, Default)]
pub struct Decoded {
    /// Records in file order (later records for a key supersede earlier ones)
    pub metrics: Vec<Metric>,
    /// Lines that could not be decoded
    pub skipped: usize,
}

/// Serialize a snapshot into journal bytes
pub fn encode(metrics: &[Metric]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(metrics.len() * 48);
    for metric in metrics {
        serde_json::to_writer(&mut buf, metric)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Parse journal bytes line by line, skipping blank and malformed lines.
///
/// Lines are split on `\n` before any decoding, so a line that is not valid
/// UTF-8 or not valid JSON costs only itself.
pub fn decode(content: &[u8]) -> Decoded {
    let mut decoded = Decoded::default();
    for (idx, line) in content.split(|&b| b == b'\n').enumerate() {
        let line = trim_line(line);
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<Metric>(line) {
            Ok(metric) => decoded.metrics.push(metric),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping malformed journal line");
                decoded.skipped += 1;
            }
        }
    }
    decoded
}

fn trim_line(mut line: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = line {
        if !first.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    while let [rest @ .., last] = line {
        if !last.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    line
}

/// Path of the scratch file used while rewriting `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Create the parent directory and an empty journal if either is missing
pub async fn ensure_exists(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(())
}

/// Replace the journal at `path` with `bytes`
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await
}

/// Read the raw journal bytes, treating a missing file as empty
pub async fn read(path: &Path) -> std::io::Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
