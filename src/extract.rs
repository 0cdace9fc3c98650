//! Content extraction: flatten acquired repository trees into the aggregate
//! corpus artifacts under the OUTPUT directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::workspace::Workspace;

/// Allow-list of source-code and markup extensions included in the corpus.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "java", "js", "ts", "cpp", "c", "cs", "rb", "go", "rs", "php", "md",
];

/// Result record for an extraction run.
#[derive(Debug)]
pub struct ExtractOutcome {
    pub success: bool,
    pub message: String,
    pub repos: Vec<RepoExtract>,
}

/// Per-repository summary of what was written where.
#[derive(Debug)]
pub struct RepoExtract {
    pub repo: String,
    pub code_file: PathBuf,
    pub readme_file: Option<PathBuf>,
}

struct Aggregate {
    sections: Vec<String>,
    readme: Option<String>,
}

/// Walks every repository tree and writes `code.txt` (always) and
/// `readme.txt` (only when a readme was captured) into the OUTPUT directory,
/// overwriting any previous run's artifacts.
///
/// Sections from multiple repositories are concatenated indiscriminately
/// into the same aggregate; only the relative-path header distinguishes
/// them. The first `README.md` (case-insensitive, any depth) across the
/// walk is captured exactly once. A stale `readme.txt` is removed when the
/// current trees have none, so the artifact is absent rather than empty.
pub fn extract_repos(workspace: &Workspace, repo_paths: &[PathBuf]) -> ExtractOutcome {
    let output_dir = match workspace.ensure_output_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = ?e, "Failed to create output directory for extraction");
            return ExtractOutcome {
                success: false,
                message: format!("Failed to create output directory: {e}"),
                repos: Vec::new(),
            };
        }
    };

    let mut aggregate = Aggregate {
        sections: Vec::new(),
        readme: None,
    };
    let mut repos = Vec::new();

    for repo_path in repo_paths {
        let repo_name = repo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| repo_path.display().to_string());
        info!(repo = %repo_name, path = %repo_path.display(), "Extracting repository content");

        let had_readme_before = aggregate.readme.is_some();
        if let Err(e) = visit_dir(repo_path, repo_path, &mut aggregate) {
            // Top-level walk failures degrade to a placeholder section so the
            // aggregate never silently loses a repository.
            warn!(error = ?e, repo = %repo_name, "Walk failed for repository");
            aggregate
                .sections
                .push(format!("\n# --- {repo_name} ---\n[ERROR reading file: {e}]"));
        }
        let captured_here = !had_readme_before && aggregate.readme.is_some();

        repos.push(RepoExtract {
            repo: repo_name,
            code_file: workspace.code_txt(),
            readme_file: captured_here.then(|| workspace.readme_txt()),
        });
    }

    if let Err(e) = fs::write(workspace.code_txt(), aggregate.sections.join("\n")) {
        error!(error = ?e, path = %workspace.code_txt().display(), "Failed to write code aggregate");
        return ExtractOutcome {
            success: false,
            message: format!("Failed to write code aggregate: {e}"),
            repos,
        };
    }

    match &aggregate.readme {
        Some(readme) => {
            if let Err(e) = fs::write(workspace.readme_txt(), readme) {
                error!(error = ?e, path = %workspace.readme_txt().display(), "Failed to write readme capture");
                return ExtractOutcome {
                    success: false,
                    message: format!("Failed to write readme capture: {e}"),
                    repos,
                };
            }
        }
        None => {
            // Absent, not empty: drop a previous run's capture.
            if workspace.readme_txt().exists() {
                if let Err(e) = fs::remove_file(workspace.readme_txt()) {
                    warn!(error = ?e, "Failed to remove stale readme.txt");
                }
            }
        }
    }

    info!(
        repos = repos.len(),
        sections = aggregate.sections.len(),
        readme = aggregate.readme.is_some(),
        output_dir = %output_dir.display(),
        "Code and README extraction complete"
    );
    ExtractOutcome {
        success: true,
        message: "Code and README extraction complete".to_string(),
        repos,
    }
}

/// Depth-first walk with directory entries sorted by name, so the aggregate
/// has a stable relative-path order per repository.
fn visit_dir(dir: &Path, repo_root: &Path, aggregate: &mut Aggregate) -> std::io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_name = entry.file_name();
        if path.is_dir() {
            // Version-control internals carry no allow-listed content.
            if file_name == ".git" {
                debug!(path = %path.display(), "Skipping directory");
                continue;
            }
            visit_dir(&path, repo_root, aggregate)?;
            continue;
        }

        let rel_path = path.strip_prefix(repo_root).unwrap_or(&path).to_path_buf();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if SOURCE_EXTENSIONS.contains(&extension.as_str()) {
            let section = match fs::read(&path) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    format!("\n# --- {} ---\n{}", rel_path.display(), content)
                }
                Err(e) => {
                    // Placeholder instead of a silently missing section.
                    warn!(error = ?e, path = %path.display(), "Failed to read file, inserting placeholder");
                    format!("\n# --- {} ---\n[ERROR reading file: {}]", rel_path.display(), e)
                }
            };
            aggregate.sections.push(section);
        }

        if aggregate.readme.is_none() && file_name.to_string_lossy().eq_ignore_ascii_case("readme.md")
        {
            match fs::read(&path) {
                Ok(bytes) => {
                    debug!(path = %path.display(), "Captured README");
                    aggregate.readme = Some(String::from_utf8_lossy(&bytes).into_owned());
                }
                Err(e) => {
                    aggregate.readme = Some(format!("[ERROR reading README.md: {e}]"));
                }
            }
        }
    }
    Ok(())
}
