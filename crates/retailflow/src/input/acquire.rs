//! Locating the raw dataset on disk.
//!
//! The dataset arrives either as a single zip archive of CSV files or as
//! already-extracted CSV files. Fetching is behind [`DatasetSource`] so a
//! local directory and an HTTP download are interchangeable.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{PipelineError, Result};

/// Something that can produce a directory holding the raw dataset.
pub trait DatasetSource {
    /// Return the directory for the given dataset identifier.
    fn fetch(&self, dataset: &str) -> Result<PathBuf>;
}

/// A dataset already present in a local directory.
pub struct LocalDirectory {
    path: PathBuf,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for LocalDirectory {
    fn fetch(&self, dataset: &str) -> Result<PathBuf> {
        if !self.path.is_dir() {
            return Err(PipelineError::MissingResource(format!(
                "directory {} for dataset '{}' does not exist",
                self.path.display(),
                dataset
            )));
        }
        Ok(self.path.clone())
    }
}

/// A dataset downloaded as a zip archive over HTTP.
///
/// No retry or timeout policy is applied.
pub struct HttpArchive {
    url: String,
    target_dir: PathBuf,
}

impl HttpArchive {
    pub fn new(url: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            target_dir: target_dir.into(),
        }
    }
}

impl DatasetSource for HttpArchive {
    fn fetch(&self, dataset: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.target_dir)
            .map_err(|e| PipelineError::io(&self.target_dir, e))?;

        info!(url = %self.url, dataset, "Downloading dataset");
        let bytes = reqwest::blocking::get(&self.url)?
            .error_for_status()?
            .bytes()?;

        let file_name = format!("{}.zip", dataset.replace('/', "_"));
        let archive = self.target_dir.join(file_name);
        fs::write(&archive, &bytes).map_err(|e| PipelineError::io(&archive, e))?;
        info!(path = %archive.display(), bytes = bytes.len(), "Dataset downloaded");

        Ok(self.target_dir.clone())
    }
}

/// Resolve the directory holding the dataset's CSV files.
///
/// Extracts the first zip archive (by name) into `<dir>/extracted` when one
/// is present; otherwise uses `dir` itself if it holds CSV files.
pub fn locate_csv_dir(dir: &Path) -> Result<PathBuf> {
    let zips = files_with_extension(dir, "zip")?;
    if let Some(zip_path) = zips.first() {
        let extract_dir = dir.join("extracted");
        fs::create_dir_all(&extract_dir).map_err(|e| PipelineError::io(&extract_dir, e))?;

        info!(archive = %zip_path.display(), into = %extract_dir.display(), "Extracting archive");
        let file = File::open(zip_path).map_err(|e| PipelineError::io(zip_path, e))?;
        let mut archive = zip::ZipArchive::new(file)?;
        archive.extract(&extract_dir)?;
        return Ok(extract_dir);
    }

    if !files_with_extension(dir, "csv")?.is_empty() {
        info!(dir = %dir.display(), "No archive found; using extracted CSV files");
        return Ok(dir.to_path_buf());
    }

    Err(PipelineError::MissingResource(format!(
        "no .zip archive or .csv files found in {}",
        dir.display()
    )))
}

/// CSV files in a directory, sorted by name.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(dir, "csv")
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
