//! Stage loading: HTTP, file, or the built-in tour.
//!
//! Any failure degrades to the default seven stages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use journey_core::stage::{StageError, StageSet};
use journey_events::StageDocument;
use thiserror::Error;

/// How long a stage fetch may take before falling back.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid stages: {0}")]
    Invalid(#[from] StageError),
}

/// Where stages come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StageSource {
    Url(String),
    File(PathBuf),
    #[default]
    Defaults,
}

impl StageSource {
    /// A file wins over a URL when both are given.
    pub fn from_options(url: Option<&str>, file: Option<&Path>) -> Self {
        match (file, url) {
            (Some(path), _) => StageSource::File(path.to_path_buf()),
            (None, Some(url)) => StageSource::Url(url.to_string()),
            (None, None) => StageSource::Defaults,
        }
    }
}

/// Fetches a stage document over HTTP.
pub fn fetch_document(url: &str) -> Result<StageDocument, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let body = client.get(url).send()?.error_for_status()?.text()?;
    Ok(StageDocument::from_json(&body)?)
}

/// Reads a stage document from disk.
pub fn read_document(path: &Path) -> Result<StageDocument, LoadError> {
    let content = std::fs::read_to_string(path)?;
    Ok(StageDocument::from_json(&content)?)
}

/// Loads and validates stages without falling back.
pub fn try_load(source: &StageSource) -> Result<StageSet, LoadError> {
    let document = match source {
        StageSource::Url(url) => fetch_document(url)?,
        StageSource::File(path) => read_document(path)?,
        StageSource::Defaults => return Ok(StageSet::defaults()),
    };
    Ok(StageSet::from_document(&document)?)
}

/// Loads stages, using the defaults on any failure.
pub fn load_stages(source: &StageSource) -> StageSet {
    match try_load(source) {
        Ok(stages) => {
            tracing::info!("Loaded {} stages from {:?}", stages.len(), source);
            stages
        }
        Err(e) => {
            tracing::warn!("Using default stages, failed to load {:?}: {}", source, e);
            StageSet::defaults()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_precedence() {
        let path = Path::new("stages.json");
        assert_eq!(
            StageSource::from_options(Some("http://x"), Some(path)),
            StageSource::File(path.to_path_buf())
        );
        assert_eq!(
            StageSource::from_options(Some("http://x"), None),
            StageSource::Url("http://x".to_string())
        );
        assert_eq!(StageSource::from_options(None, None), StageSource::Defaults);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let doc = journey_events::fixtures::sample_stage_document();
        write!(file, "{}", doc.to_json_pretty().unwrap()).unwrap();

        let stages = load_stages(&StageSource::File(file.path().to_path_buf()));
        assert_eq!(stages.len(), 4);
        assert_eq!(stages.get(0).unwrap().id, "corona");
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"stages": [{{"id": "x", "name": "x", "duration_seconds": -1}}]}}"#).unwrap();

        assert!(matches!(
            try_load(&StageSource::File(file.path().to_path_buf())),
            Err(LoadError::Invalid(_))
        ));
        assert_eq!(load_stages(&StageSource::File(file.path().to_path_buf())).len(), 7);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let source = StageSource::File(PathBuf::from("/definitely/not/here.json"));
        assert!(matches!(try_load(&source), Err(LoadError::Io(_))));
        assert_eq!(load_stages(&source), StageSet::defaults());
    }

    #[test]
    fn test_unreachable_url_falls_back() {
        // Port 9 on localhost refuses connections
        let stages = load_stages(&StageSource::Url("http://127.0.0.1:9/stages".to_string()));
        assert_eq!(stages.len(), 7);
    }
}
