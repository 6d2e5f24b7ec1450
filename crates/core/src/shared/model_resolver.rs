use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to store model at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where a resolved model file was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelOrigin {
    Cached,
    Bundled,
    Downloaded,
}

impl fmt::Display for ModelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelOrigin::Cached => "cached",
            ModelOrigin::Bundled => "bundled",
            ModelOrigin::Downloaded => "downloaded",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModel {
    pub path: PathBuf,
    pub origin: ModelOrigin,
}

/// Locates the detection model, downloading it once if needed.
///
/// Looks in the user cache directory, then `bundled_dir`, then downloads
/// into the cache. This runs before the capture loop starts; the loop
/// itself never touches the network.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<ResolvedModel, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, bundled_dir, progress)
}

/// Same as [`resolve`] with an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<ResolvedModel, ModelResolveError> {
    let found = |path: PathBuf, origin| Ok(ResolvedModel { path, origin });

    let cached = cache_dir.join(name);
    if cached.is_file() {
        return found(cached, ModelOrigin::Cached);
    }
    if let Some(bundled) = bundled_dir.map(|dir| dir.join(name)) {
        if bundled.is_file() {
            return found(bundled, ModelOrigin::Bundled);
        }
    }

    fs::create_dir_all(cache_dir).map_err(|source| ModelResolveError::CacheDir {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    log::info!("Downloading {name} to {}", cache_dir.display());
    download(url, &cached, progress)?;
    found(cached, ModelOrigin::Downloaded)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceGate/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceGate/models/` or `~/.cache/FaceGate/models/`
/// - Windows: `%LOCALAPPDATA%/FaceGate/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("FaceGate").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Downloads into `<dest>.part` and renames on success, so an interrupted
/// download never leaves a truncated model at `dest`.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let part = dest.with_extension("part");
    let result = fetch(url, &part, progress).and_then(|()| {
        fs::rename(&part, dest).map_err(|source| ModelResolveError::Store {
            path: dest.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn fetch(url: &str, part: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;
    let store_err = |source| ModelResolveError::Store {
        path: part.to_path_buf(),
        source,
    };

    let file = fs::File::create(part).map_err(store_err)?;
    let mut writer = ProgressWriter {
        inner: io::BufWriter::new(file),
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut writer).map_err(store_err)?;
    writer.flush().map_err(store_err)
}

/// Reports cumulative bytes to the progress callback as they are written.
struct ProgressWriter<W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = &self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
