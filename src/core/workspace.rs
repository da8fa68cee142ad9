//! Classification-aware access to workspace documents.
//!
//! The manifest only stores paths and types; document bodies are read from
//! disk each time they are needed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::convert::{convert_to_text, SourceFormat};
use crate::core::store::Store;
use crate::error::{Result, WorkspaceError};
use crate::models::{FileKind, Manifest, SelectionPolicy, WorkspaceFile};

/// A workspace document read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub name: String,
    pub content: String,
}

/// Result of reading every document of one type under a selection policy
#[derive(Debug, Default)]
pub struct DocumentSet {
    /// Selected content, or None when nothing usable is classified
    pub content: Option<String>,
    /// Paths that contributed to `content`
    pub sources: Vec<PathBuf>,
    /// Per-file failures; they never abort reading other files
    pub errors: Vec<WorkspaceError>,
}

impl DocumentSet {
    pub fn is_present(&self) -> bool {
        self.content.is_some()
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Read one manifest entry from disk
pub fn read_document(file: &WorkspaceFile) -> std::result::Result<Document, WorkspaceError> {
    let content = fs::read_to_string(&file.path).map_err(|source| WorkspaceError::FileUnavailable {
        path: file.path.clone(),
        source,
    })?;
    Ok(Document {
        path: file.path.clone(),
        name: file.display_name(),
        content,
    })
}

/// Read-only view over a manifest applying a selection policy
pub struct WorkspaceReader<'a> {
    manifest: &'a Manifest,
    policy: SelectionPolicy,
}

impl<'a> WorkspaceReader<'a> {
    pub fn new(manifest: &'a Manifest, policy: SelectionPolicy) -> Self {
        Self { manifest, policy }
    }

    pub fn resumes(&self) -> DocumentSet {
        self.collect(FileKind::Resume)
    }

    pub fn job_descriptions(&self) -> DocumentSet {
        self.collect(FileKind::Jd)
    }

    fn collect(&self, kind: FileKind) -> DocumentSet {
        let mut set = DocumentSet::default();
        match self.policy {
            SelectionPolicy::MostRecent => {
                if let Some(file) = self.manifest.latest(kind) {
                    match read_document(file) {
                        Ok(doc) => {
                            set.sources.push(doc.path);
                            set.content = Some(doc.content);
                        }
                        Err(e) => {
                            warn!("{}", e);
                            set.errors.push(e);
                        }
                    }
                }
            }
            SelectionPolicy::All => {
                let mut parts = Vec::new();
                for file in self.manifest.of_kind(kind) {
                    match read_document(file) {
                        Ok(doc) => {
                            parts.push(format!("--- {} ---\n{}", doc.name, doc.content.trim_end()));
                            set.sources.push(doc.path);
                        }
                        Err(e) => {
                            warn!("{}", e);
                            set.errors.push(e);
                        }
                    }
                }
                if !parts.is_empty() {
                    set.content = Some(parts.join("\n\n"));
                }
            }
        }
        debug!(
            "Read {} {} document(s), {} unavailable",
            set.sources.len(),
            kind,
            set.errors.len()
        );
        set
    }

    /// Human-readable listing; never touches file contents
    pub fn list(&self) -> Vec<String> {
        self.manifest.listing()
    }
}

/// Extensions accepted from the work directory
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "md", "txt"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// List candidate documents in the work directory, creating it if needed
pub fn scan_workdir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = extension_of(&path) {
            if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                files.push(path);
            }
        }
    }

    files.sort();
    debug!("Found {} candidate files in {}", files.len(), dir.display());
    Ok(files)
}

/// What `import_file` ended up adding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub path: PathBuf,
    pub kind: FileKind,
    /// True when the source was converted from PDF/DOCX
    pub converted: bool,
}

/// Bring a file into the workspace.
///
/// PDF/DOCX sources are converted to a sibling `.md` text file which is
/// added unclassified. Markdown and text files are added with `kind`
/// (unclassified when None).
pub fn import_file(store: &mut Store, path: &Path, kind: Option<FileKind>) -> Result<ImportOutcome> {
    let path = path
        .canonicalize()
        .map_err(|source| WorkspaceError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let ext = extension_of(&path).unwrap_or_default();
    let outcome = match ext.as_str() {
        "pdf" | "docx" => {
            let format = if ext == "pdf" { SourceFormat::Pdf } else { SourceFormat::Docx };
            let target = path.with_extension("md");
            convert_to_text(&path, format, &target)?;
            ImportOutcome {
                path: target,
                kind: FileKind::Auto,
                converted: true,
            }
        }
        "md" | "txt" => ImportOutcome {
            path,
            kind: kind.unwrap_or(FileKind::Auto),
            converted: false,
        },
        _ => return Err(WorkspaceError::UnsupportedFileType(path).into()),
    };

    store.add_file(outcome.path.clone(), outcome.kind)?;
    info!("Imported {} as {}", outcome.path.display(), outcome.kind);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_most_recent_policy() {
        let dir = TempDir::new().unwrap();
        let old = write(dir.path(), "old.md", "old resume");
        let new = write(dir.path(), "new.md", "new resume");
        let manifest = Manifest::new(vec![
            WorkspaceFile::new(&old, FileKind::Resume),
            WorkspaceFile::new(&new, FileKind::Resume),
        ]);

        let reader = WorkspaceReader::new(&manifest, SelectionPolicy::MostRecent);
        let set = reader.resumes();
        assert_eq!(set.as_deref(), Some("new resume"));
        assert_eq!(set.sources, vec![new]);
        assert!(!reader.job_descriptions().is_present());
    }

    #[test]
    fn test_all_policy_concatenates() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.md", "first");
        let b = write(dir.path(), "b.md", "second");
        let manifest = Manifest::new(vec![
            WorkspaceFile::new(&a, FileKind::Jd),
            WorkspaceFile::new(&b, FileKind::Jd),
        ]);

        let set = WorkspaceReader::new(&manifest, SelectionPolicy::All).job_descriptions();
        let content = set.content.unwrap();
        assert!(content.contains("--- a.md ---\nfirst"));
        assert!(content.contains("--- b.md ---\nsecond"));
        assert!(content.find("first").unwrap() < content.find("second").unwrap());
    }

    #[test]
    fn test_missing_file_reported_per_path() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "good.md", "present");
        let gone = dir.path().join("gone.md");
        let manifest = Manifest::new(vec![
            WorkspaceFile::new(&good, FileKind::Jd),
            WorkspaceFile::new(&gone, FileKind::Jd),
        ]);

        let set = WorkspaceReader::new(&manifest, SelectionPolicy::All).job_descriptions();
        assert_eq!(set.as_deref(), Some("--- good.md ---\npresent"));
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].path(), Some(&gone));

        // Most-recent policy does not fall back to an older file
        let set = WorkspaceReader::new(&manifest, SelectionPolicy::MostRecent).job_descriptions();
        assert!(set.content.is_none());
        assert_eq!(set.errors.len(), 1);

        // Listing is unaffected
        assert_eq!(manifest.listing().len(), 2);
    }

    #[test]
    fn test_scan_workdir_filters_extensions() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("workdir");
        fs::create_dir_all(&workdir).unwrap();
        write(&workdir, "cv.PDF", "");
        write(&workdir, "jd.txt", "");
        write(&workdir, "notes.rtf", "");

        let files = scan_workdir(&workdir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cv.PDF", "jd.txt"]);
    }

    #[test]
    fn test_scan_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("fresh");
        assert!(scan_workdir(&workdir).unwrap().is_empty());
        assert!(workdir.is_dir());
    }

    #[test]
    fn test_import_text_file() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path().join("config.json")).unwrap();
        let jd = write(dir.path(), "role.txt", "Senior engineer");

        let outcome = import_file(&mut store, &jd, Some(FileKind::Jd)).unwrap();
        assert!(!outcome.converted);
        assert_eq!(outcome.kind, FileKind::Jd);
        assert_eq!(store.data().workspace_files.counts().jd, 1);
    }

    #[test]
    fn test_import_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path().join("config.json")).unwrap();
        let file = write(dir.path(), "photo.png", "");
        assert!(import_file(&mut store, &file, None).is_err());
        assert!(store.data().workspace_files.is_empty());
    }
}
