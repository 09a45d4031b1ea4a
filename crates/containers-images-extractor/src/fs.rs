//! Path validation, deletion and persistence helpers

use crate::error::Result;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File written by [`save_json`] when persisting a resolution
pub const RESOLUTION_FILE_NAME: &str = "containers-resolution.json";

/// Checks that `path` is an existing directory
///
/// Every invalid path is reported as an error: an empty path and a missing
/// path as [`io::ErrorKind::NotFound`], anything that is not a directory as
/// [`io::ErrorKind::NotADirectory`]. OS errors from `stat` are returned as-is.
pub async fn validate_folder_path(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "folder path is empty",
        ));
    }

    let metadata = fs::metadata(path).await?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("not a directory: {}", path.display()),
        ));
    }

    Ok(())
}

/// Removes a directory and everything below it
///
/// A directory that is already gone counts as deleted.
pub async fn delete_directory(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {
            tracing::debug!("Deleted directory: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Serializes `value` as pretty JSON into `folder/file_name`
///
/// The folder is created when missing. Returns the written file path.
pub async fn save_json<T>(folder: &Path, file_name: &str, value: &T) -> Result<PathBuf>
where
    T: Serialize + ?Sized,
{
    fs::create_dir_all(folder).await?;

    let path = folder.join(file_name);
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&path, content).await?;

    tracing::debug!("Saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_validate_existing_folder() {
        let temp_dir = tempdir().unwrap();
        assert!(validate_folder_path(temp_dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_empty_path() {
        let err = validate_folder_path(Path::new("")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_validate_missing_folder() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = validate_folder_path(&missing).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_validate_file_is_not_a_folder() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "content").unwrap();

        let err = validate_folder_path(&file).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_delete_directory() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("output/nested");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("file.txt"), "content").unwrap();

        delete_directory(&temp_dir.path().join("output")).await.unwrap();

        assert!(!temp_dir.path().join("output").exists());
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_delete_missing_directory_is_ok() {
        let temp_dir = tempdir().unwrap();
        assert!(
            delete_directory(&temp_dir.path().join("missing"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_save_json_creates_folder() {
        let temp_dir = tempdir().unwrap();
        let folder = temp_dir.path().join(".checkmarx/containers");

        let path = save_json(&folder, RESOLUTION_FILE_NAME, &vec!["a", "b"])
            .await
            .unwrap();

        assert_eq!(path, folder.join(RESOLUTION_FILE_NAME));
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, vec!["a", "b"]);
    }
}
