//! Fixed filesystem layout for a pipeline run.
//!
//! Every stage reads and writes artifacts under a single working root
//! (default `./repo_cloned`): cloned repositories as direct subdirectories,
//! and all derived artifacts inside the reserved `OUTPUT` directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the reserved artifact directory inside the working root.
/// Repository discovery must skip it.
pub const OUTPUT_DIR_NAME: &str = "OUTPUT";

/// Resolves the fixed artifact paths for one working root.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR_NAME)
    }

    /// Creates the artifact directory (and the root) if missing.
    pub fn ensure_output_dir(&self) -> io::Result<PathBuf> {
        let dir = self.output_dir();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn outputs_json(&self) -> PathBuf {
        self.output_dir().join("outputs.json")
    }

    pub fn code_txt(&self) -> PathBuf {
        self.output_dir().join("code.txt")
    }

    pub fn readme_txt(&self) -> PathBuf {
        self.output_dir().join("readme.txt")
    }

    pub fn summary_code_txt(&self) -> PathBuf {
        self.output_dir().join("summary_code.txt")
    }

    pub fn summary_md(&self) -> PathBuf {
        self.output_dir().join("summary.md")
    }

    pub fn output_pdf(&self) -> PathBuf {
        self.output_dir().join("output.pdf")
    }

    /// Lists repository directories directly under the root, skipping the
    /// reserved artifact directory. Sorted by name for deterministic output.
    pub fn discover_repos(&self) -> io::Result<Vec<PathBuf>> {
        let mut repos = Vec::new();
        if !self.root.exists() {
            return Ok(repos);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if entry.file_name() == OUTPUT_DIR_NAME {
                continue;
            }
            repos.push(path);
        }
        repos.sort();
        debug!(count = repos.len(), root = %self.root.display(), "Discovered repository directories");
        Ok(repos)
    }

    /// Concatenates the contents of the given artifact files, skipping the
    /// ones that do not exist. Read failures on present files propagate.
    pub fn gather_context(&self, paths: &[PathBuf]) -> io::Result<String> {
        let mut content = String::new();
        for path in paths {
            if path.exists() {
                content.push_str(&fs::read_to_string(path)?);
            }
        }
        Ok(content)
    }
}
