use anyhow::{Context, Result};
use std::path::Path;

pub mod fit;
pub mod fit_header;
pub mod fit_profile;
pub mod parallel;

pub use fit::{decode, decode_activity, peek_activity_date, DecodedActivity};

/// Check the file extension for `.fit`, ignoring case
pub fn has_fit_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("fit"))
}

/// Read and decode one activity file from disk
pub fn read_activity_file(path: &Path) -> Result<DecodedActivity> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read activity file: {}", path.display()))?;
    let activity = decode_activity(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::ActivityBuilder;

    #[test]
    fn test_has_fit_extension() {
        assert!(has_fit_extension(Path::new("ride.fit")));
        assert!(has_fit_extension(Path::new("/a/b/RIDE.FIT")));
        assert!(!has_fit_extension(Path::new("ride.gpx")));
        assert!(!has_fit_extension(Path::new("fit")));
    }

    #[test]
    fn test_read_activity_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ride.fit");
        std::fs::write(&path, ActivityBuilder::new(100).constant(4, 180).to_bytes()).unwrap();

        let activity = read_activity_file(&path).unwrap();
        assert_eq!(activity.samples.len(), 4);
        assert!(read_activity_file(&dir.path().join("missing.fit")).is_err());
    }
}
