//! Repository acquisition via the external `git` client.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info, warn};

/// Result record for a clone attempt. Callers branch on `success` rather
/// than matching an error: an existing target directory is a deliberate
/// safety guard, not necessarily fatal.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub success: bool,
    pub message: String,
    pub local_path: PathBuf,
}

/// Derives the default clone target from the URL's trailing path segment,
/// minus a `.git` suffix.
pub fn default_clone_path(repo_url: &str, workdir: &Path) -> PathBuf {
    let name = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_url)
        .trim_end_matches(".git");
    workdir.join(name)
}

/// Clones `repo_url` into `target` (or the derived default under `workdir`).
///
/// An existing target directory yields a non-fatal failure outcome without
/// touching the directory. A non-zero git exit yields a failure outcome
/// carrying git's stderr. No cleanup of partial clones is attempted.
pub fn clone_repository(repo_url: &str, target: Option<&Path>, workdir: &Path) -> CloneOutcome {
    let local_path = match target {
        Some(path) => path.to_path_buf(),
        None => default_clone_path(repo_url, workdir),
    };

    if let Some(parent) = local_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            error!(error = ?e, path = %parent.display(), "Failed to create clone parent directory");
            return CloneOutcome {
                success: false,
                message: format!("Failed to create parent directory {}: {}", parent.display(), e),
                local_path,
            };
        }
    }

    if local_path.exists() {
        warn!(path = %local_path.display(), "Clone target already exists, refusing to overwrite");
        return CloneOutcome {
            success: false,
            message: format!("Directory already exists: {}", local_path.display()),
            local_path,
        };
    }

    let output = Command::new("git")
        .arg("clone")
        .arg(repo_url)
        .arg(&local_path)
        .output();

    match output {
        Ok(out) if out.status.success() => {
            info!(
                repo_url = repo_url,
                path = %local_path.display(),
                "Successfully cloned git repository"
            );
            CloneOutcome {
                success: true,
                message: format!("Repository cloned to {}", local_path.display()),
                local_path,
            }
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            error!(
                repo_url = repo_url,
                path = %local_path.display(),
                status = ?out.status,
                stderr = %stderr,
                "Git clone exited with non-zero code"
            );
            CloneOutcome {
                success: false,
                message: format!("Git clone failed: {stderr}"),
                local_path,
            }
        }
        Err(e) => {
            error!(error = ?e, repo_url = repo_url, "Failed to launch git process");
            CloneOutcome {
                success: false,
                message: format!("Failed to launch git: {e}"),
                local_path,
            }
        }
    }
}
