//! Source recording downloads
//!
//! Fetches `Piano.<dynamic>.<Note>.aiff` from the configured base URL with a
//! blocking reqwest client. The body is read into memory, written to a `.part`
//! sibling and only renamed into place once the write has finished.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::{Result, SampleError};
use crate::notes::PianoNote;

const USER_AGENT: &str = concat!("piano-samples/", env!("CARGO_PKG_VERSION"));

/// What happened to one note's source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The file was fetched and written
    Downloaded { bytes: u64, sha256: String },
    /// A file was already present and `overwrite` was off
    Skipped,
}

/// Blocking HTTP downloader for the sample set
pub struct Downloader {
    client: reqwest::blocking::Client,
    base_url: String,
    dynamic: String,
    overwrite: bool,
}

impl Downloader {
    /// Build a downloader from the run configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SampleError::DownloadFailed {
                url: config.base_url.clone(),
                reason: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dynamic: config.dynamic.clone(),
            overwrite: config.overwrite,
        })
    }

    /// Remote URL of a note's recording
    pub fn sample_url(&self, note: PianoNote) -> String {
        format!("{}/Piano.{}.{}.aiff", self.base_url, self.dynamic, note)
    }

    /// Download one note into `dest`
    ///
    /// Parent directories are created. An existing `dest` is left alone
    /// unless the downloader was configured to overwrite.
    pub fn fetch(&self, note: PianoNote, dest: &Path) -> Result<DownloadOutcome> {
        if dest.exists() && !self.overwrite {
            tracing::debug!("{} already present at {}, skipping", note, dest.display());
            return Ok(DownloadOutcome::Skipped);
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let url = self.sample_url(note);
        tracing::info!("Downloading {} from {}", note, url);

        let response = self.client.get(&url).send().map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                format!("cannot connect: {}", e)
            } else {
                e.to_string()
            };
            SampleError::DownloadFailed {
                url: url.clone(),
                reason,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SampleError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| SampleError::DownloadFailed {
            url: url.clone(),
            reason: format!("body read failed: {}", e),
        })?;

        let part = part_path(dest);
        if let Err(e) = fs::write(&part, &body).and_then(|_| fs::rename(&part, dest)) {
            let _ = fs::remove_file(&part);
            return Err(SampleError::Io(e));
        }

        let sha256 = format!("{:x}", Sha256::digest(&body));
        tracing::debug!("{}: {} bytes, sha256 {}", note, body.len(), sha256);

        Ok(DownloadOutcome::Downloaded {
            bytes: body.len() as u64,
            sha256,
        })
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::tempdir;

    /// Serve a single HTTP response on a random local port
    fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0_u8; 4096];
            let n = stream.read(&mut request).unwrap();
            let header = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            String::from_utf8_lossy(&request[..n]).to_string()
        });
        (format!("http://{}/piano", addr), handle)
    }

    fn downloader(base_url: &str, overwrite: bool) -> Downloader {
        let config = Config {
            base_url: base_url.to_string(),
            overwrite,
            timeout_secs: 5,
            ..Config::default()
        };
        Downloader::new(&config).unwrap()
    }

    #[test]
    fn test_sample_url_pattern() {
        let dl = downloader("https://example.org/samples/", false);
        let note: PianoNote = "Bb3".parse().unwrap();
        assert_eq!(
            dl.sample_url(note),
            "https://example.org/samples/Piano.ff.Bb3.aiff"
        );
    }

    #[test]
    fn test_default_url_matches_iowa_layout() {
        let dl = Downloader::new(&Config::default()).unwrap();
        let note: PianoNote = "A0".parse().unwrap();
        assert_eq!(
            dl.sample_url(note),
            "https://theremin.music.uiowa.edu/sound%20files/MIS/Piano_Other/piano/Piano.ff.A0.aiff"
        );
    }

    #[test]
    fn test_fetch_writes_file_and_hash() {
        let (base, server) = serve_once("200 OK", b"FORM-fake-aiff");
        let dir = tempdir().unwrap();
        let dest = dir.path().join("aiff").join("C4.aiff");

        let outcome = downloader(&base, false)
            .fetch("C4".parse().unwrap(), &dest)
            .unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /piano/Piano.ff.C4.aiff"));
        assert_eq!(fs::read(&dest).unwrap(), b"FORM-fake-aiff");
        assert!(!part_path(&dest).exists());
        match outcome {
            DownloadOutcome::Downloaded { bytes, sha256 } => {
                assert_eq!(bytes, 14);
                assert_eq!(sha256, format!("{:x}", Sha256::digest(b"FORM-fake-aiff")));
            }
            other => panic!("Expected a download, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_http_error() {
        let (base, server) = serve_once("404 Not Found", b"");
        let dir = tempdir().unwrap();
        let dest = dir.path().join("C8.aiff");

        let result = downloader(&base, false).fetch("C8".parse().unwrap(), &dest);
        server.join().unwrap();

        assert!(matches!(result, Err(SampleError::HttpStatus { status: 404, .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_existing_file_is_skipped() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("A0.aiff");
        fs::write(&dest, b"cached").unwrap();

        // Nothing listens on this URL; a request would fail.
        let outcome = downloader("http://127.0.0.1:9/none", false)
            .fetch("A0".parse().unwrap(), &dest)
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::Skipped);
        assert_eq!(fs::read(&dest).unwrap(), b"cached");
    }

    #[test]
    fn test_overwrite_replaces_existing() {
        let (base, server) = serve_once("200 OK", b"fresh");
        let dir = tempdir().unwrap();
        let dest = dir.path().join("A0.aiff");
        fs::write(&dest, b"stale").unwrap();

        downloader(&base, true)
            .fetch("A0".parse().unwrap(), &dest)
            .unwrap();
        server.join().unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"fresh");
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/x/A0.aiff")),
            PathBuf::from("/tmp/x/A0.aiff.part")
        );
    }
}
