//! Archive staging to fast storage
//!
//! A one-time, single-threaded recursive copy of the archive directory to a
//! faster store (typically a RAM-backed path such as /dev/shm). Staging must
//! complete before any partitioner or stream is constructed over the
//! relocated archive; [`crate::pipeline::PipelineBuilder`] runs it as a
//! blocking prerequisite. An already-populated target is treated as benign
//! and idempotent.

use crate::{Error, Result};
use std::path::Path;

/// Stage an archive directory to a fast-storage target
///
/// Copies `source` recursively to `target`. If `target` already exists the
/// call is a no-op: the archive is immutable, so a previous staging run left
/// an equivalent copy behind.
///
/// # Errors
///
/// Returns [`Error::StagingFailure`] for any failure other than an
/// already-populated target.
pub fn stage_archive(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        tracing::info!(staged = %target.display(), "staging target already populated, reusing");
        return Ok(());
    }
    copy_recursive(source, target).map_err(|e| {
        Error::StagingFailure(format!(
            "copying {} to {}: {e}",
            source.display(),
            target.display()
        ))
    })?;
    tracing::info!(
        from = %source.display(),
        staged = %target.display(),
        "archive staged to fast storage"
    );
    Ok(())
}

fn copy_recursive(source: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(target)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let dest = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_recursive(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stage_copies_tree() {
        let src = tempfile::tempdir().unwrap();
        let event = src.path().join("event000000000");
        fs::create_dir(&event).unwrap();
        fs::write(event.join("hits.csv"), "hit_id,x,y,z\n").unwrap();

        let dst_root = tempfile::tempdir().unwrap();
        let dst = dst_root.path().join("staged");
        stage_archive(src.path(), &dst).unwrap();

        let staged = dst.join("event000000000").join("hits.csv");
        assert_eq!(fs::read_to_string(staged).unwrap(), "hit_id,x,y,z\n");
    }

    #[test]
    fn test_existing_target_is_benign() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("marker"), "new").unwrap();

        let dst = tempfile::tempdir().unwrap();
        fs::write(dst.path().join("marker"), "old").unwrap();

        // Second staging run must not fail or overwrite.
        stage_archive(src.path(), dst.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dst.path().join("marker")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_missing_source_fails() {
        let dst_root = tempfile::tempdir().unwrap();
        let result = stage_archive(
            Path::new("/nonexistent/archive"),
            &dst_root.path().join("staged"),
        );
        assert!(matches!(result, Err(Error::StagingFailure(_))));
    }
}
