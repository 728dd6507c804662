//! sf-study: versioned study files describing a sweep run.

pub mod migrate;
pub mod plan;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use plan::build_plan;
pub use schema::*;
pub use validate::{ValidationError, validate_study};

use sf_sweep::SweepPlan;

pub type StudyResult<T> = Result<T, StudyError>;

#[derive(thiserror::Error, Debug)]
pub enum StudyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Study {
    /// Validate and convert into a runnable plan.
    pub fn to_plan(&self) -> StudyResult<SweepPlan> {
        validate_study(self)?;
        Ok(build_plan(self)?)
    }
}

pub fn from_yaml_str(content: &str) -> StudyResult<Study> {
    let mut study: Study = serde_yaml::from_str(content)?;
    study = migrate_to_latest(study)?;
    validate_study(&study)?;
    Ok(study)
}

pub fn to_yaml_string(study: &Study) -> StudyResult<String> {
    validate_study(study)?;
    Ok(serde_yaml::to_string(study)?)
}

pub fn load_yaml(path: &std::path::Path) -> StudyResult<Study> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, study: &Study) -> StudyResult<()> {
    let content = to_yaml_string(study)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Canonical JSON form, used for content hashing.
pub fn to_canonical_json(study: &Study) -> StudyResult<String> {
    Ok(serde_json::to_string(study)?)
}
