use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

use super::hash::ContentHash;
use super::rate::TokenBucket;

/// Suffix of the in-progress marker written next to the destination.
pub const PART_SUFFIX: &str = ".part";

const MAX_BACKOFF_MS: u64 = 8_000;
const BASE_BACKOFF_MS: u64 = 250;

/// Byte-level progress callback: `(bytes_so_far, total_if_known)`.
pub type ByteProgress<'a> = dyn Fn(u64, Option<u64>) + Send + Sync + 'a;

/// Transfer options for one artifact.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Human-readable name used in errors and logs.
    pub label: String,
    /// Candidate URLs, tried in order on every attempt.
    pub mirrors: Vec<String>,
    /// 0 = unlimited.
    pub max_kbps: u64,
    /// Bound on one whole attempt against one candidate.
    pub timeout: Duration,
    pub max_attempts: u32,
    pub allow_resume: bool,
    pub expected_hash: Option<ContentHash>,
}

impl FetchOptions {
    pub fn new(label: impl Into<String>, mirrors: Vec<String>) -> Self {
        Self {
            label: label.into(),
            mirrors,
            max_kbps: 0,
            timeout: Duration::from_secs(30),
            max_attempts: 5,
            allow_resume: true,
            expected_hash: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub bytes: u64,
    /// The candidate URL that delivered the file.
    pub source_url: String,
}

/// `foo.jar` → `foo.jar.part`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Pause before attempt `attempt + 1`.
pub fn backoff(attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::from_millis((BASE_BACKOFF_MS * factor).min(MAX_BACKOFF_MS))
}

/// Resumable, mirror-aware, hash-verified downloader.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Single file download ────────────────────────────

    /// Download `url` (or the mirrors listed in `opts`) to `dest`.
    ///
    /// Bytes land in `<dest>.part` first and are renamed into place only
    /// after the optional hash check passes. A hash mismatch is returned
    /// immediately and leaves the marker on disk.
    pub async fn fetch_file(
        &self,
        url: &str,
        dest: &Path,
        opts: &FetchOptions,
        on_progress: &ByteProgress<'_>,
    ) -> LauncherResult<FetchOutcome> {
        let candidates = if opts.mirrors.is_empty() {
            vec![url.to_string()]
        } else {
            opts.mirrors.clone()
        };
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let part = part_path(dest);
        let attempts = opts.max_attempts.max(1);
        let mut last_error: Option<LauncherError> = None;

        for attempt in 1..=attempts {
            for candidate in &candidates {
                match self.transfer(candidate, &part, opts, on_progress).await {
                    Ok(bytes) => {
                        self.finalize(&part, dest, opts).await?;
                        debug!("Downloaded: {} -> {:?}", candidate, dest);
                        return Ok(FetchOutcome {
                            bytes,
                            source_url: candidate.clone(),
                        });
                    }
                    Err(e) if !e.is_retryable() => return Err(e),
                    Err(e) => {
                        debug!(
                            "[{}] attempt {}/{} via {} failed: {}",
                            opts.label, attempt, attempts, candidate, e
                        );
                        last_error = Some(e);
                    }
                }
            }
            if attempt < attempts {
                tokio::time::sleep(backoff(attempt)).await;
            }
        }

        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidate URL".to_string());
        warn!("[{}] giving up after {} attempts: {}", opts.label, attempts, cause);
        Err(LauncherError::Network {
            label: opts.label.clone(),
            cause,
        })
    }

    /// One attempt against one candidate, cancelled once `opts.timeout`
    /// elapses. Bytes already in `part` stay there for the next attempt.
    async fn transfer(
        &self,
        url: &str,
        part: &Path,
        opts: &FetchOptions,
        on_progress: &ByteProgress<'_>,
    ) -> LauncherResult<u64> {
        tokio::time::timeout(opts.timeout, self.stream_into(url, part, opts, on_progress))
            .await
            .map_err(|_| LauncherError::Timeout {
                url: url.to_string(),
                after_ms: opts.timeout.as_millis() as u64,
            })?
    }

    async fn stream_into(
        &self,
        url: &str,
        part: &Path,
        opts: &FetchOptions,
        on_progress: &ByteProgress<'_>,
    ) -> LauncherResult<u64> {
        let io_err = |e: std::io::Error| LauncherError::Io {
            path: part.to_path_buf(),
            source: e,
        };

        let mut offset = 0;
        if opts.allow_resume {
            if let Ok(meta) = tokio::fs::metadata(part).await {
                offset = meta.len();
            }
        }

        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            let _ = tokio::fs::remove_file(part).await;
            return Err(LauncherError::RangeNotSatisfiable {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let append = offset > 0 && status == StatusCode::PARTIAL_CONTENT;
        if !append {
            offset = 0;
        }
        let total = response.content_length().map(|len| len + offset);

        let mut file = if append {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(part)
                .await
                .map_err(io_err)?
        } else {
            tokio::fs::File::create(part).await.map_err(io_err)?
        };

        let mut bucket = TokenBucket::new(opts.max_kbps);
        let mut written = offset;
        let mut stream = response.bytes_stream();
        on_progress(written, total);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
            if let Some(bucket) = bucket.as_mut() {
                bucket.throttle(chunk.len() as u64).await;
            }
            on_progress(written, total);
        }

        file.flush().await.map_err(io_err)?;
        drop(file);
        Ok(written)
    }

    async fn finalize(&self, part: &Path, dest: &Path, opts: &FetchOptions) -> LauncherResult<()> {
        if let Some(expected) = &opts.expected_hash {
            if let Err(actual) = expected.verify_file(part).await? {
                warn!("[{}] integrity check failed for {:?}", opts.label, part);
                return Err(LauncherError::Integrity {
                    path: part.to_path_buf(),
                    expected: expected.hex.clone(),
                    actual,
                });
            }
        }

        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            tokio::fs::remove_file(dest)
                .await
                .map_err(|e| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::rename(part, dest)
            .await
            .map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })
    }

    /// Whether an existing file matches `expected`.
    pub async fn validate(path: &Path, expected: &ContentHash) -> LauncherResult<bool> {
        Ok(expected.verify_file(path).await?.is_ok())
    }
}
