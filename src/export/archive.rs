// ABOUTME: Zip packaging of a shapefile folder and its transient directory helpers
// ABOUTME: Archives `<dir>` to `<dir>.zip` with paths relative to the folder

use crate::logging::Logger;
use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the contents of `dir` into `<dir>.zip`
///
/// Entries are stored relative to `dir`, so the archive of `out/roads`
/// contains `roads.shp`, not `out/roads/roads.shp`. An empty directory
/// yields a valid, empty archive. Returns the archive path.
///
/// On failure the partially written archive is deleted.
pub fn zip_directory(dir: &Path, logger: &dyn Logger) -> Result<PathBuf> {
    let archive_path = archive_path_for(dir);
    logger.info(&format!("Zipping shp layers: {}", archive_path.display()));

    if let Err(e) = write_archive(dir, &archive_path) {
        if archive_path.exists() {
            if let Err(cleanup) = std::fs::remove_file(&archive_path) {
                logger.error(&format!(
                    "Failed to remove partial archive {}: {}",
                    archive_path.display(),
                    cleanup
                ));
            }
        }
        return Err(e);
    }

    Ok(archive_path)
}

fn write_archive(dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .context("Archive entry escaped the source directory")?;
        let name = zip_entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .with_context(|| format!("Failed to add directory {}", relative.display()))?;
        } else {
            zip.start_file(name, options)
                .with_context(|| format!("Failed to add file {}", relative.display()))?;
            let mut source = File::open(entry.path())
                .with_context(|| format!("Failed to open {}", entry.path().display()))?;
            io::copy(&mut source, &mut zip)
                .with_context(|| format!("Failed to compress {}", entry.path().display()))?;
        }
    }

    zip.finish()
        .with_context(|| format!("Failed to finalize archive {}", archive_path.display()))?;
    Ok(())
}

/// `<dir>.zip`, next to the directory
pub fn archive_path_for(dir: &Path) -> PathBuf {
    let mut path = dir.as_os_str().to_owned();
    path.push(".zip");
    PathBuf::from(path)
}

// Zip entry names always use forward slashes
fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Create `path` and its parents; no-op when it already exists
pub fn create_folder(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create folder {}", path.display()))
}

/// Recursively delete `path`
///
/// Fails when the folder does not exist.
pub fn remove_folder(path: &Path) -> Result<()> {
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove folder {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{CapturingLogger, LogLevel};
    use std::io::Read;
    use tempfile::tempdir;

    fn entry_names(archive: &Path) -> Vec<String> {
        let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_zip_directory_stores_relative_paths() {
        let dir = tempdir().unwrap();
        let layer = dir.path().join("roads");
        std::fs::create_dir(&layer).unwrap();
        for ext in ["shp", "shx", "dbf", "prj"] {
            std::fs::write(layer.join(format!("roads.{}", ext)), ext.as_bytes()).unwrap();
        }

        let logger = CapturingLogger::new();
        let archive = zip_directory(&layer, &logger).unwrap();

        assert_eq!(archive, dir.path().join("roads.zip"));
        assert_eq!(
            logger.entries(),
            vec![(
                LogLevel::Info,
                format!("Zipping shp layers: {}", archive.display())
            )]
        );
        assert_eq!(
            entry_names(&archive),
            vec!["roads.dbf", "roads.prj", "roads.shp", "roads.shx"]
        );

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("roads.shp")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "shp");
    }

    #[test]
    fn test_zip_directory_recurses_into_subfolders() {
        let dir = tempdir().unwrap();
        let layer = dir.path().join("rivers");
        std::fs::create_dir_all(layer.join("meta")).unwrap();
        std::fs::write(layer.join("rivers.shp"), b"x").unwrap();
        std::fs::write(layer.join("meta").join("notes.txt"), b"y").unwrap();

        let archive = zip_directory(&layer, &CapturingLogger::new()).unwrap();
        let names = entry_names(&archive);

        assert!(names.contains(&"rivers.shp".to_string()));
        assert!(names.iter().any(|n| n == "meta/notes.txt"));
    }

    #[test]
    fn test_zip_empty_directory_produces_empty_archive() {
        let dir = tempdir().unwrap();
        let layer = dir.path().join("empty");
        std::fs::create_dir(&layer).unwrap();

        let archive = zip_directory(&layer, &CapturingLogger::new()).unwrap();
        assert!(archive.exists());
        assert!(entry_names(&archive).is_empty());
    }

    #[test]
    fn test_zip_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(zip_directory(&missing, &CapturingLogger::new()).is_err());
        assert!(!archive_path_for(&missing).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_zip_leaves_no_partial_archive() {
        let dir = tempdir().unwrap();
        let layer = dir.path().join("roads");
        std::fs::create_dir(&layer).unwrap();
        std::fs::write(layer.join("roads.dbf"), b"dbf").unwrap();
        // Dangling link: listed by the walk, cannot be opened
        std::os::unix::fs::symlink(dir.path().join("gone.shp"), layer.join("roads.shp")).unwrap();

        let err = zip_directory(&layer, &CapturingLogger::new()).unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to open"));
        assert!(!archive_path_for(&layer).exists());
    }

    #[test]
    fn test_create_folder_is_idempotent() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("a").join("b");

        create_folder(&folder).unwrap();
        std::fs::write(folder.join("keep.txt"), b"1").unwrap();
        create_folder(&folder).unwrap();

        assert!(folder.join("keep.txt").exists());
    }

    #[test]
    fn test_remove_folder_deletes_tree() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("layer");
        std::fs::create_dir_all(folder.join("nested")).unwrap();
        std::fs::write(folder.join("nested").join("f"), b"1").unwrap();

        remove_folder(&folder).unwrap();
        assert!(!folder.exists());
    }

    #[test]
    fn test_remove_missing_folder_is_error() {
        let dir = tempdir().unwrap();
        let err = remove_folder(&dir.path().join("never-created")).unwrap_err();
        assert!(err.to_string().contains("Failed to remove folder"));
    }
}
