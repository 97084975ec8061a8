// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource locators - find module source under a base location

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::{ModuleError, Result};

/// Source text of a module together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResource {
    /// Canonical identifier (`pkg/main` when found as a directory)
    pub id: String,
    /// File path or URL the source was read from
    pub origin: String,
    /// Source text
    pub content: String,
}

/// Finds module source for a canonical identifier.
///
/// `Ok(None)` means the module does not exist. Any other failure is an
/// error and is never turned into "not found".
pub trait ResourceLocator {
    /// Locates the source for `id`.
    fn locate(&self, id: &str) -> Result<Option<ModuleResource>>;
}

/// Options for remote bases
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// Request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("modrun/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Builds the locator for a base location.
///
/// `http` and `https` URLs get a [`RemoteLocator`]. `file:` URLs and plain
/// paths get a [`FileSystemLocator`]; the directory must exist.
pub fn from_base(base: &str, options: &RemoteOptions) -> Result<Box<dyn ResourceLocator>> {
    match Url::parse(base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(Box::new(RemoteLocator::new(url, options)?))
        }
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| ModuleError::InvalidBase(format!("{} is not a local path", base)))?;
            Ok(Box::new(FileSystemLocator::open(path)?))
        }
        // A single letter scheme is a Windows drive, not a URL
        Ok(url) if url.scheme().len() > 1 => Err(ModuleError::InvalidBase(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            base
        ))),
        _ => Ok(Box::new(FileSystemLocator::open(base)?)),
    }
}

/// Locates modules in a directory tree
#[derive(Debug, Clone)]
pub struct FileSystemLocator {
    root: PathBuf,
}

impl FileSystemLocator {
    /// Create a locator rooted at `root` without checking it
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a locator rooted at an existing directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ModuleError::InvalidBase(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// The base directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<id>.js` and `<id>/main.js` under the base directory. A leading `/`
    /// stays under it.
    fn candidates(&self, id: &str) -> Option<(PathBuf, PathBuf)> {
        let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();
        let (last, parents) = segments.split_last()?;
        let mut dir = self.root.clone();
        dir.extend(parents);
        let file = dir.join(format!("{}.js", last));
        let main = dir.join(last).join("main.js");
        Some((file, main))
    }
}

impl ResourceLocator for FileSystemLocator {
    fn locate(&self, id: &str) -> Result<Option<ModuleResource>> {
        let Some((file, main)) = self.candidates(id) else {
            return Ok(None);
        };

        debug!(id, path = %file.display(), "probing module file");
        if let Some(content) = read_source(id, &file)? {
            return Ok(Some(ModuleResource {
                id: id.to_string(),
                origin: file.display().to_string(),
                content,
            }));
        }

        debug!(id, path = %main.display(), "probing module directory");
        if let Some(content) = read_source(id, &main)? {
            return Ok(Some(ModuleResource {
                id: format!("{}/main", id.trim_end_matches('/')),
                origin: main.display().to_string(),
                content,
            }));
        }

        Ok(None)
    }
}

/// Reads a source file; `Ok(None)` if there is no regular file at `path`.
fn read_source(id: &str, path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ModuleError::Io {
                id: id.to_string(),
                source,
            });
        }
    };
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|source| ModuleError::Decode {
            id: id.to_string(),
            source,
        })
}

/// Locates modules over HTTP(S)
#[derive(Debug, Clone)]
pub struct RemoteLocator {
    base: Url,
    client: Client,
}

impl RemoteLocator {
    /// Create a remote locator for `base`
    pub fn new(base: Url, options: &RemoteOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| ModuleError::InvalidBase(format!("HTTP client: {}", e)))?;
        Ok(Self { base, client })
    }

    /// The base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of `id`: `<id>.js` resolved as a reference against the base.
    pub fn module_url(&self, id: &str) -> Result<Url> {
        self.base
            .join(&format!("{}.js", id))
            .map_err(|e| ModuleError::MalformedIdentifier {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

impl ResourceLocator for RemoteLocator {
    fn locate(&self, id: &str) -> Result<Option<ModuleResource>> {
        let url = self.module_url(id)?;
        info!(id, %url, "fetching module");

        let fetch_error = |reason: String| ModuleError::Fetch {
            id: id.to_string(),
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!(id, %url, %status, "remote module absent");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        let content = String::from_utf8(bytes.to_vec()).map_err(|source| ModuleError::Decode {
            id: id.to_string(),
            source,
        })?;

        Ok(Some(ModuleResource {
            id: id.to_string(),
            origin: url.to_string(),
            content,
        }))
    }
}
