//! Content-based hashing for studies.

use sha2::{Digest, Sha256};
use sf_study::Study;

use crate::ResultsResult;

/// SHA-256 of the study's canonical JSON, as lowercase hex.
pub fn compute_study_hash(study: &Study) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    let study_json = sf_study::to_canonical_json(study)?;
    hasher.update(study_json.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stability() {
        let study = Study::default();
        let hash = compute_study_hash(&study).unwrap();
        assert_eq!(hash, compute_study_hash(&study.clone()).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn hash_covers_the_study_content() {
        // SHA-256 of the empty string.
        const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

        let study = Study::default();
        let json = sf_study::to_canonical_json(&study).unwrap();
        let expected = format!("{:x}", Sha256::digest(json.as_bytes()));

        let hash = compute_study_hash(&study).unwrap();
        assert_eq!(hash, expected);
        assert_ne!(hash, EMPTY);
    }

    #[test]
    fn hash_differs_for_different_studies() {
        let a = Study::default();
        let mut b = Study::default();
        b.sweeps[0].fixed.insert("pressure_bar".to_string(), 2.0);

        assert_ne!(
            compute_study_hash(&a).unwrap(),
            compute_study_hash(&b).unwrap()
        );
    }
}
