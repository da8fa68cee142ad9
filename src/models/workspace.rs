use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Classification of a workspace document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Resume,
    /// Job description
    Jd,
    /// Not yet classified (e.g. freshly converted from PDF/DOCX)
    #[serde(alias = "unclassified")]
    Auto,
}

impl FileKind {
    pub fn tag(&self) -> &'static str {
        match self {
            FileKind::Resume => "RESUME",
            FileKind::Jd => "JD",
            FileKind::Auto => "AUTO",
        }
    }

    pub fn all() -> &'static [FileKind] {
        &[FileKind::Resume, FileKind::Jd, FileKind::Auto]
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Resume => "resume",
            FileKind::Jd => "jd",
            FileKind::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resume" | "cv" => Ok(FileKind::Resume),
            "jd" | "job" | "job_description" => Ok(FileKind::Jd),
            "auto" | "unclassified" => Ok(FileKind::Auto),
            other => Err(format!("Unknown file type '{}'. Expected resume, jd or auto", other)),
        }
    }
}

/// One entry of the workspace manifest. Identity is the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// When the entry was (re-)added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl WorkspaceFile {
    pub fn new(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
            added_at: Some(Utc::now()),
        }
    }

    /// File name for display, falling back to the full path
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Ordered list of workspace entries, oldest first.
///
/// Every mutation keeps paths unique: re-adding a path drops the old entry
/// and appends the new one, so manifest order is also recency order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Vec<WorkspaceFile>);

impl Manifest {
    pub fn new(files: Vec<WorkspaceFile>) -> Self {
        let mut manifest = Self::default();
        for file in files {
            manifest.upsert(file);
        }
        manifest
    }

    /// Insert or replace the entry for `file.path`
    pub fn upsert(&mut self, file: WorkspaceFile) {
        self.0.retain(|f| f.path != file.path);
        self.0.push(file);
    }

    /// Remove every entry whose path is in `paths`. Returns how many were removed.
    pub fn remove<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let targets: HashSet<&Path> = paths.iter().map(|p| p.as_ref()).collect();
        let before = self.0.len();
        self.0.retain(|f| !targets.contains(f.path.as_path()));
        before - self.0.len()
    }

    /// Change the type of an existing entry. Returns false if the path is absent.
    pub fn classify(&mut self, path: &Path, kind: FileKind) -> bool {
        match self.0.iter_mut().find(|f| f.path == path) {
            Some(entry) => {
                entry.kind = kind;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, path: &Path) -> Option<&WorkspaceFile> {
        self.0.iter().find(|f| f.path == path)
    }

    /// Entries of one type, oldest first
    pub fn of_kind(&self, kind: FileKind) -> Vec<&WorkspaceFile> {
        self.0.iter().filter(|f| f.kind == kind).collect()
    }

    /// The most recently added entry of one type
    pub fn latest(&self, kind: FileKind) -> Option<&WorkspaceFile> {
        self.0.iter().rev().find(|f| f.kind == kind)
    }

    /// Human-readable listing, one "name [TAG]" line per entry
    pub fn listing(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|f| format!("{} [{}]", f.display_name(), f.kind.tag()))
            .collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.iter().map(|f| f.path.clone()).collect()
    }

    /// Resolve 1-based indices to paths. Any out-of-range index fails the whole call.
    pub fn paths_at(&self, indices: &[usize]) -> Result<Vec<PathBuf>, usize> {
        indices
            .iter()
            .map(|&i| {
                if i == 0 || i > self.0.len() {
                    Err(i)
                } else {
                    Ok(self.0[i - 1].path.clone())
                }
            })
            .collect()
    }

    pub fn counts(&self) -> TypeCounts {
        let mut counts = TypeCounts::default();
        for f in &self.0 {
            match f.kind {
                FileKind::Resume => counts.resume += 1,
                FileKind::Jd => counts.jd += 1,
                FileKind::Auto => counts.auto += 1,
            }
        }
        counts
    }

    pub fn files(&self) -> &[WorkspaceFile] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Number of manifest entries per type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub resume: usize,
    pub jd: usize,
    pub auto: usize,
}

impl fmt::Display for TypeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resume, {} jd, {} unclassified", self.resume, self.jd, self.auto)
    }
}
