//! HTTP download of Go release archives.
//!
//! ## Features
//!
//! - Streaming downloads with a text progress line on stdout
//! - Automatic retry with exponential backoff (3 attempts)
//! - Downloads to a `.part` file, then renames on success

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use rand::Rng;
use tokio::io::AsyncWriteExt;

/// Maximum number of download attempts.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Returns `true` if `source` looks like an `http(s)://` URL.
#[must_use]
pub fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Extracts the archive file name from a download URL.
///
/// Query strings and fragments are ignored. Returns `None` when the path
/// has no usable last segment.
#[must_use]
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let (_, path) = path.split_once('/')?;
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

/// Downloads `url` to `dest`, printing progress.
///
/// The body is streamed into `<dest>.part` and renamed onto `dest` once the
/// transfer completes, so `dest` never holds a truncated archive.
///
/// # Errors
///
/// Returns an error if:
/// - The network request fails after all retries
/// - The server answers with a non-success status
/// - The destination file cannot be created or written
pub async fn download_file(url: &str, dest: &Path) -> Result<PathBuf> {
    let temp_path = partial_path(dest);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut last_error = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = calculate_retry_delay(attempt);
            println!(
                "Retrying download (attempt {}/{})...",
                attempt + 1,
                MAX_RETRIES
            );
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        tracing::debug!(url, attempt, "downloading");
        match download_with_progress(url, &temp_path).await {
            Ok(()) => {
                tokio::fs::rename(&temp_path, dest).await.with_context(|| {
                    format!(
                        "Failed to rename {} to {}",
                        temp_path.display(),
                        dest.display()
                    )
                })?;
                return Ok(dest.to_path_buf());
            }
            Err(e) => {
                tracing::warn!(url, attempt, error = %e, "download attempt failed");
                last_error = Some(e);
                let _ = tokio::fs::remove_file(&temp_path).await;
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("Download failed after {MAX_RETRIES} attempts")))
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(OsString::from(".part"));
    PathBuf::from(name)
}

async fn download_with_progress(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;

    if !response.status().is_success() {
        bail!("HTTP error {}: {url}", response.status());
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    let mut progress = Progress::new(response.content_length());
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read chunk from {url}"))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", dest.display()))?;
        progress.advance(chunk.len() as u64);
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to flush {}", dest.display()))?;
    progress.finish();

    Ok(())
}

/// Single-line progress report, redrawn at most every [`PROGRESS_INTERVAL_MS`].
struct Progress {
    total: Option<u64>,
    received: u64,
    started: Instant,
    last_drawn: Option<Instant>,
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
            started: Instant::now(),
            last_drawn: None,
        }
    }

    fn advance(&mut self, bytes: u64) {
        self.received += bytes;
        let due = self
            .last_drawn
            .is_none_or(|at| at.elapsed().as_millis() >= PROGRESS_INTERVAL_MS);
        if due {
            self.draw();
        }
    }

    fn finish(&mut self) {
        self.draw();
        println!();
    }

    fn draw(&mut self) {
        self.last_drawn = Some(Instant::now());
        print!("\r{}     ", self.line());
        let _ = std::io::stdout().flush();
    }

    #[allow(clippy::cast_precision_loss)]
    fn line(&self) -> String {
        let secs = self.started.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            self.received as f64 / secs
        } else {
            0.0
        };
        match self.total {
            Some(total) => format!(
                "{} of {} ({}%) at {}/s",
                human_size(self.received as f64),
                human_size(total as f64),
                percent(self.received, total),
                human_size(rate)
            ),
            None => format!(
                "{} at {}/s",
                human_size(self.received as f64),
                human_size(rate)
            ),
        }
    }
}

fn percent(done: u64, total: u64) -> u64 {
    (done.saturating_mul(100) / total).min(100)
}

/// Scales a byte count to the largest binary unit below it.
fn human_size(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024.0 {
        return format!("{bytes:.0} B");
    }
    let mut value = bytes / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Delay before retry `attempt`: doubles each time with +/- 25% jitter.
fn calculate_retry_delay(attempt: u32) -> u64 {
    let base_delay = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
    let jitter_range = base_delay / 4;
    let jitter = rand::rng().random_range(0..=jitter_range * 2);
    base_delay - jitter_range + jitter
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn retry_delay_increases_exponentially() {
        let delay_0 = calculate_retry_delay(0);
        let delay_1 = calculate_retry_delay(1);
        let delay_2 = calculate_retry_delay(2);

        assert!((750..=1250).contains(&delay_0));
        assert!((1500..=2500).contains(&delay_1));
        assert!((3000..=5000).contains(&delay_2));
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://go.dev/dl/go1.21.5.linux-amd64.tar.gz"));
        assert!(is_url("HTTP://mirror.local/go.zip"));
        assert!(!is_url("/tmp/go1.21.5.linux-amd64.tar.gz"));
        assert!(!is_url("ftp://mirror.local/go.zip"));
    }

    #[test]
    fn file_name_from_url_takes_last_segment() {
        assert_eq!(
            file_name_from_url("https://go.dev/dl/go1.21.5.linux-amd64.tar.gz").as_deref(),
            Some("go1.21.5.linux-amd64.tar.gz")
        );
        assert_eq!(
            file_name_from_url("https://mirror.local/go1.22.zip?token=abc#x").as_deref(),
            Some("go1.22.zip")
        );
        assert_eq!(file_name_from_url("https://go.dev/dl/"), None);
        assert_eq!(file_name_from_url("https://go.dev"), None);
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/d/go1.21.tar.gz")),
            PathBuf::from("/d/go1.21.tar.gz.part")
        );
    }

    #[test]
    fn human_size_picks_unit() {
        assert_eq!(human_size(512.0), "512 B");
        assert_eq!(human_size(2048.0), "2.0 KB");
        assert_eq!(human_size(3.0 * 1024.0 * 1024.0), "3.0 MB");
        assert_eq!(human_size(1.5 * 1024.0 * 1024.0 * 1024.0), "1.5 GB");
    }

    #[test]
    fn percent_is_capped() {
        assert_eq!(percent(50, 200), 25);
        assert_eq!(percent(300, 200), 100);
    }

    #[test]
    fn progress_line_without_length() {
        let mut progress = Progress::new(Some(0));
        progress.received = 10;
        assert!(progress.total.is_none());
        assert!(progress.line().starts_with("10 B at "));
    }

    #[tokio::test]
    async fn download_file_streams_body_to_destination() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = b"fake go archive bytes";

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let temp = assert_fs::TempDir::new().unwrap();
        let dest = temp.path().join("downloads").join("go1.21.tar.gz");
        let url = format!("http://{addr}/dl/go1.21.tar.gz");

        let path = download_file(&url, &dest).await.expect("Download should succeed");
        server.await.unwrap();

        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert!(!partial_path(&dest).exists());
    }
}
