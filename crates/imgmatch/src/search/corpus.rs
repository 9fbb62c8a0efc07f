use std::path::{Path, PathBuf};

use crate::error::SearchError;

/// File extensions scanned in a corpus, matched case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "tiff"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

/// List the image files directly inside `dir`, sorted by file name.
///
/// Subdirectories and files with other extensions are skipped.
pub fn list_candidates(dir: &Path) -> Result<Vec<PathBuf>, SearchError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SearchError::CorpusRead {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(is_supported(Path::new("a.PNG")));
        assert!(is_supported(Path::new("dir/b.JpEg")));
        assert!(is_supported(Path::new("c.tiff")));
        assert!(!is_supported(Path::new("d.tif")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("png")));
    }

    #[test]
    fn lists_only_image_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.gif", "readme.txt", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.png")).unwrap();

        let names: Vec<String> = list_candidates(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.JPG", "b.png", "c.gif"]);
    }

    #[test]
    fn missing_directory_is_corpus_error() {
        let err = list_candidates(Path::new("/nonexistent/imgmatch-corpus")).unwrap_err();
        assert!(matches!(err, SearchError::CorpusRead { .. }), "{err}");
    }
}
