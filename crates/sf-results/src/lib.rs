//! sf-results: CSV result sinks and run manifests.

pub mod csv;
pub mod hash;
pub mod manifest;

pub use csv::{BufferedCsvSink, StreamingCsvSink, create_sink};
pub use hash::compute_study_hash;
pub use manifest::{RunManifest, load_manifest, manifest_path, write_manifest};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Study error: {0}")]
    Study(#[from] sf_study::StudyError),

    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: String },
}
