use crate::editing::{Document, EditError};
use crate::serialize::markdown;
use crate::serialize::raw::{self, RawError};
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of stored documents in the canonical JSON format.
pub const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed document: {0}")]
    Format(#[from] RawError),
    #[error("Document structure: {0}")]
    Structure(#[from] EditError),
    #[error("Invalid documents directory: {0}")]
    InvalidDocumentsDir(String),
}

/// Read a stored document from its canonical JSON file.
pub fn read_document(relative_path: &RelativePath, docs_root: &Path) -> Result<Document, IoError> {
    let absolute_path = relative_path.to_path(docs_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let content = fs::read_to_string(&absolute_path)?;
    Ok(raw::from_json_str(&content)?)
}

/// Write a document to its canonical JSON file, creating parent directories
/// as needed.
pub fn write_document(
    relative_path: &RelativePath,
    docs_root: &Path,
    document: &Document,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(docs_root);
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = raw::to_json_string(document)?;
    content.push('\n');
    fs::write(&absolute_path, content)?;
    Ok(())
}

/// Read a markdown file and convert it into a document.
pub fn import_markdown(relative_path: &RelativePath, docs_root: &Path) -> Result<Document, IoError> {
    let absolute_path = relative_path.to_path(docs_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let content = fs::read_to_string(&absolute_path)?;
    Ok(markdown::from_markdown(&content)?)
}

/// Write a document out as markdown.
pub fn export_markdown(
    relative_path: &RelativePath,
    docs_root: &Path,
    document: &Document,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(docs_root);
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = markdown::to_markdown(document);
    content.push('\n');
    fs::write(&absolute_path, content)?;
    Ok(())
}

/// Scan for stored documents in the documents directory.
pub fn scan_documents(docs_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !docs_root.exists() {
        return Err(IoError::InvalidDocumentsDir(
            "documents directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(docs_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir)?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == DOCUMENT_EXTENSION
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_documents_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidDocumentsDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::BlockKind;
    use crate::tests::{
        create_test_docs_dir, create_test_file, doc, heading, leaf_texts, para,
        top_level_kinds,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_then_read_round_trips() {
        // Given a document written to disk
        let docs_dir = create_test_docs_dir();
        let document = doc(vec![heading(1, "Plan"), para("Step one.")]);
        let path = RelativePath::new("plan.json");
        write_document(path, docs_dir.path(), &document).unwrap();

        // When reading it back
        let restored = read_document(path, docs_dir.path()).unwrap();

        // Then keys and content survive
        assert_eq!(leaf_texts(&restored), vec!["Plan", "Step one."]);
        assert_eq!(
            restored.nodes()[0].key(),
            document.nodes()[0].key()
        );
    }

    #[test]
    fn test_read_missing_document() {
        let docs_dir = create_test_docs_dir();
        let result = read_document(RelativePath::new("missing.json"), docs_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_malformed_document() {
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "broken.json", "{ not json");
        let result = read_document(RelativePath::new("broken.json"), docs_dir.path());
        assert!(matches!(result, Err(IoError::Format(_))));
    }

    #[test]
    fn test_write_document_creates_parent_directories() {
        let docs_dir = create_test_docs_dir();
        let document = doc(vec![para("nested")]);
        let path = RelativePath::new("folder/subfolder/note.json");

        write_document(path, docs_dir.path(), &document).unwrap();

        let restored = read_document(path, docs_dir.path()).unwrap();
        assert_eq!(leaf_texts(&restored), vec!["nested"]);
    }

    #[test]
    fn test_import_markdown_file() {
        // Given a markdown file on disk
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "notes.md", "# Notes\n\n- one\n- two\n");

        // When importing it
        let document = import_markdown(RelativePath::new("notes.md"), docs_dir.path()).unwrap();

        // Then it parses into the expected blocks
        assert_eq!(
            top_level_kinds(&document),
            vec![BlockKind::Heading { level: 1 }, BlockKind::BulletedList]
        );
    }

    #[test]
    fn test_export_markdown_file() {
        let docs_dir = create_test_docs_dir();
        let document = doc(vec![heading(2, "Title"), para("Body.")]);
        let path = RelativePath::new("out.md");

        export_markdown(path, docs_dir.path(), &document).unwrap();

        let written = std::fs::read_to_string(path.to_path(docs_dir.path())).unwrap();
        assert_eq!(written, "## Title\n\nBody.\n");
    }

    #[test]
    fn test_scan_finds_documents_sorted() {
        // Given a directory with documents and other files
        let docs_dir = create_test_docs_dir();
        let b = doc(vec![para("b")]);
        let a = doc(vec![para("a")]);
        write_document(RelativePath::new("b.json"), docs_dir.path(), &b).unwrap();
        write_document(RelativePath::new("a.json"), docs_dir.path(), &a).unwrap();
        create_test_file(&docs_dir, "readme.md", "# not scanned");

        // When scanning
        let files = scan_documents(docs_dir.path()).unwrap();

        // Then only documents are found, in sorted order
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_scan_nested_directories() {
        let docs_dir = create_test_docs_dir();
        let root = doc(vec![para("root")]);
        write_document(RelativePath::new("root.json"), docs_dir.path(), &root).unwrap();
        let nested = doc(vec![para("nested")]);
        write_document(
            RelativePath::new("sub/nested.json"),
            docs_dir.path(),
            &nested,
        )
        .unwrap();

        let files = scan_documents(docs_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "nested.json"));
    }

    #[test]
    fn test_scan_invalid_directory() {
        let result = scan_documents(Path::new("/this/path/does/not/exist"));
        assert!(matches!(result, Err(IoError::InvalidDocumentsDir(_))));
    }

    #[test]
    fn test_validate_documents_dir() {
        let docs_dir = create_test_docs_dir();
        assert!(validate_documents_dir(docs_dir.path()).is_ok());
        assert!(matches!(
            validate_documents_dir(Path::new("/nonexistent/path")),
            Err(IoError::InvalidDocumentsDir(_))
        ));
    }
}
