//! Whole-object storage access for local files, HTTP URLs and S3 objects
//!
//! S3 objects are addressed path-style against the configured endpoint, or
//! virtual-host style against AWS when no endpoint is set. Requests carry no
//! signature, so only public buckets and local emulators are reachable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use reqwest::blocking::Client;

use crate::error::{RideDurationError, Result};
use crate::utils::{log_operation_complete, log_operation_start};

/// Whole-request timeout for remote reads and writes, sized for a full month of trips
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(600);

/// Options controlling remote storage access
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageOptions {
    /// S3-compatible endpoint, e.g. `http://localhost:4566`
    pub endpoint_url: Option<String>,
}

/// A parsed object location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file on the local filesystem
    Local(PathBuf),
    /// An `http://` or `https://` URL
    Http(String),
    /// An object in an S3 bucket
    S3 { bucket: String, key: String },
}

impl Location {
    /// Parse a location string
    ///
    /// # Errors
    /// Returns a config error for `s3://` locations without a bucket or key
    pub fn parse(location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Self::Http(location.to_string()));
        }

        if let Some(rest) = location.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() || key.is_empty() {
                return Err(RideDurationError::config(format!(
                    "S3 location must look like s3://bucket/key, got {location:?}"
                )));
            }
            return Ok(Self::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let path = location.strip_prefix("file://").unwrap_or(location);
        Ok(Self::Local(PathBuf::from(path)))
    }

    /// The HTTP URL used to reach a remote object, `None` for local files
    #[must_use]
    pub fn url(&self, options: &StorageOptions) -> Option<String> {
        match self {
            Self::Local(_) => None,
            Self::Http(url) => Some(url.clone()),
            Self::S3 { bucket, key } => Some(match &options.endpoint_url {
                Some(endpoint) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
                None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
            }),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Http(url) => f.write_str(url),
            Self::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// Read an entire object into memory
pub fn read_bytes(location: &Location, options: &StorageOptions) -> Result<Bytes> {
    let start = std::time::Instant::now();
    log_operation_start("Reading", location);

    let bytes = match location {
        Location::Local(path) => Bytes::from(read_local(path)?),
        remote => {
            let url = remote_url(remote, options)?;
            let response = http_client(location)?
                .get(&url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|e| RideDurationError::storage(location.to_string(), e.to_string()))?;
            response
                .bytes()
                .map_err(|e| RideDurationError::storage(location.to_string(), e.to_string()))?
        }
    };

    log_operation_complete("read", location, bytes.len(), Some(start.elapsed()));
    Ok(bytes)
}

/// Write an entire object, replacing any existing one
pub fn write_bytes(location: &Location, options: &StorageOptions, data: Bytes) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing", location);
    let len = data.len();

    match location {
        Location::Local(path) => write_local(path, &data)?,
        remote => {
            let url = remote_url(remote, options)?;
            http_client(location)?
                .put(&url)
                .body(data.to_vec())
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|e| RideDurationError::storage(location.to_string(), e.to_string()))?;
        }
    }

    log_operation_complete("wrote", location, len, Some(start.elapsed()));
    Ok(())
}

fn http_client(location: &Location) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ride-duration/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| RideDurationError::storage(location.to_string(), e.to_string()))
}

fn remote_url(location: &Location, options: &StorageOptions) -> Result<String> {
    location
        .url(options)
        .ok_or_else(|| RideDurationError::storage(location.to_string(), "not a remote location"))
}

fn read_local(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        RideDurationError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read file {}: {e}", path.display()),
        ))
    })
}

fn write_local(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data).map_err(|e| {
        RideDurationError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write file {}: {e}", path.display()),
        ))
    })
}
