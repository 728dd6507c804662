//! Study file migration.

use crate::StudyError;
use crate::schema::Study;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut study: Study) -> Result<Study, StudyError> {
    while study.version < LATEST_VERSION {
        study = migrate_one_version(study)?;
    }
    Ok(study)
}

fn migrate_one_version(study: Study) -> Result<Study, StudyError> {
    match study.version {
        0 => migrate_v0_to_v1(study),
        v => Err(StudyError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files predate the version field and share the v1 layout.
fn migrate_v0_to_v1(mut study: Study) -> Result<Study, StudyError> {
    study.version = 1;
    Ok(study)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unversioned_study_is_upgraded() {
        let study = Study {
            version: 0,
            ..Study::default()
        };
        let migrated = migrate_to_latest(study).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
    }

    #[test]
    fn latest_study_is_untouched() {
        let study = Study::default();
        assert_eq!(migrate_to_latest(study.clone()).unwrap(), study);
    }
}
