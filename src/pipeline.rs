//! Coordinating module for the intent-acquire-extract-filter-summarise-render
//! pipeline.
//!
//! The pipeline state is an immutable-update record: each stage takes the
//! prior state by value and returns a new one, so individual stages can be
//! replayed and tested in isolation. Every stage checks its predecessor's
//! result explicitly and halts with a terminal error rather than operating
//! on empty or missing inputs.

use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use crate::acquire;
use crate::config::Config;
use crate::extract;
use crate::filter::{self, FilterError};
use crate::generate::{ChatClient, GenerateError};
use crate::intent::{self, IntentError, RequestIntent};
use crate::render::{self, RenderError};
use crate::summarise::{self, SummariseError};
use crate::workspace::Workspace;

/// Mutable record threaded through all stages. Created once per run,
/// discarded at process exit; stages also persist their outputs to disk
/// independently.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub repo_cloned: bool,
    pub extracted: bool,
    pub summary: String,
    pub pdf_path: Option<PathBuf>,
    pub intent: Option<RequestIntent>,
    /// Explicit manifest of acquired repository paths, passed through state
    /// instead of rediscovered by filesystem convention.
    pub repo_paths: Vec<PathBuf>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            repo_cloned: false,
            extracted: false,
            summary: String::new(),
            pdf_path: None,
            intent: None,
            repo_paths: Vec::new(),
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Final report of a completed run.
#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub intent: RequestIntent,
    pub repo_cloned: bool,
    pub extracted: bool,
    pub pdf_path: PathBuf,
}

#[derive(Debug)]
pub enum PipelineError {
    Config(String),
    Intent(IntentError),
    Generation(GenerateError),
    CloneFailed { message: String },
    ExtractionFailed { message: String },
    Filter(FilterError),
    Summarise(SummariseError),
    Render(RenderError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "configuration error: {msg}"),
            PipelineError::Intent(e) => write!(f, "intent extraction failed: {e}"),
            PipelineError::Generation(e) => write!(f, "text-generation client error: {e}"),
            PipelineError::CloneFailed { message } => write!(f, "clone failed: {message}"),
            PipelineError::ExtractionFailed { message } => {
                write!(f, "extraction failed: {message}")
            }
            PipelineError::Filter(e) => write!(f, "topic filter failed: {e}"),
            PipelineError::Summarise(e) => write!(f, "summarisation failed: {e}"),
            PipelineError::Render(e) => write!(f, "rendering failed: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// Process exit code per failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 1,
            PipelineError::Intent(IntentError::MalformedResponse(_)) => 2,
            PipelineError::Intent(IntentError::Generate(_)) => 5,
            PipelineError::Intent(IntentError::Io(_)) => 1,
            PipelineError::Generation(_) => 5,
            PipelineError::CloneFailed { .. } => 3,
            PipelineError::ExtractionFailed { .. } => 4,
            PipelineError::Filter(FilterError::Generate(_)) => 5,
            PipelineError::Filter(FilterError::Io(_)) => 1,
            PipelineError::Summarise(SummariseError::Generate(_)) => 5,
            PipelineError::Summarise(SummariseError::Io(_)) => 1,
            PipelineError::Render(_) => 6,
        }
    }
}

/// Stage 1: extract and persist the request intent.
pub async fn stage_intent(
    mut state: PipelineState,
    client: &dyn ChatClient,
    instructions: &str,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    let intent = intent::extract_intent(client, instructions, workspace)
        .await
        .map_err(PipelineError::Intent)?;
    state.summary = serde_json::to_string_pretty(&intent).unwrap_or_default();
    state.intent = Some(intent);
    Ok(state)
}

/// Stage 2: clone the repository named by the intent record.
///
/// A conflict on an existing target is non-fatal: the prior clone is reused
/// with a warning. A failure that leaves no usable directory halts the run.
pub fn stage_acquire(
    mut state: PipelineState,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    let intent = state.intent.as_ref().ok_or(PipelineError::CloneFailed {
        message: "no intent record available; intent extraction must run first".to_string(),
    })?;

    let outcome = acquire::clone_repository(&intent.repo_url, None, workspace.root());
    if outcome.success {
        state.repo_cloned = true;
        state.repo_paths.push(outcome.local_path);
    } else if outcome.local_path.is_dir() {
        warn!(
            path = %outcome.local_path.display(),
            message = %outcome.message,
            "Clone target exists, reusing prior clone"
        );
        state.repo_cloned = true;
        state.repo_paths.push(outcome.local_path);
    } else {
        return Err(PipelineError::CloneFailed {
            message: outcome.message,
        });
    }
    Ok(state)
}

/// Stage 3: extract the corpus from the acquired repositories.
pub fn stage_extract(
    mut state: PipelineState,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    if !state.repo_cloned {
        return Err(PipelineError::ExtractionFailed {
            message: "no repository acquired; clone must run first".to_string(),
        });
    }
    let repos = if state.repo_paths.is_empty() {
        workspace
            .discover_repos()
            .map_err(|e| PipelineError::ExtractionFailed {
                message: format!("failed to discover repositories: {e}"),
            })?
    } else {
        state.repo_paths.clone()
    };
    if repos.is_empty() {
        return Err(PipelineError::ExtractionFailed {
            message: "no repository directories found under the working root".to_string(),
        });
    }

    let outcome = extract::extract_repos(workspace, &repos);
    if !outcome.success {
        return Err(PipelineError::ExtractionFailed {
            message: outcome.message,
        });
    }
    state.extracted = true;
    Ok(state)
}

/// Stage 4: retain only topic-relevant content.
pub async fn stage_filter(
    mut state: PipelineState,
    client: &dyn ChatClient,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    if !state.extracted {
        return Err(PipelineError::ExtractionFailed {
            message: "corpus not extracted; extraction must run first".to_string(),
        });
    }
    let topic = state
        .intent
        .as_ref()
        .map(|i| i.topic.clone())
        .ok_or(PipelineError::CloneFailed {
            message: "no intent record available".to_string(),
        })?;
    state.summary = filter::filter_topic(client, workspace, &topic)
        .await
        .map_err(PipelineError::Filter)?;
    Ok(state)
}

/// Stage 5: produce the audience-targeted markdown narrative.
pub async fn stage_summarise(
    mut state: PipelineState,
    client: &dyn ChatClient,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    if !state.extracted {
        return Err(PipelineError::ExtractionFailed {
            message: "corpus not extracted; extraction must run first".to_string(),
        });
    }
    let intent = state
        .intent
        .clone()
        .ok_or(PipelineError::CloneFailed {
            message: "no intent record available".to_string(),
        })?;
    state.summary = summarise::summarise_report(client, workspace, &intent)
        .await
        .map_err(PipelineError::Summarise)?;
    Ok(state)
}

/// Stage 6: render the narrative to the final PDF.
pub fn stage_render(
    mut state: PipelineState,
    workspace: &Workspace,
) -> Result<PipelineState, PipelineError> {
    let pdf_path = render::render_report(workspace).map_err(PipelineError::Render)?;
    state.pdf_path = Some(pdf_path);
    Ok(state)
}

/// Runs the full chain to completion: intent, acquire, extract, filter,
/// summarise, render. Strictly sequential; no retries, no resume.
pub async fn run_pipeline(
    config: &Config,
    client: &dyn ChatClient,
) -> Result<PipelineReport, PipelineError> {
    let workspace = Workspace::new(&config.workdir);
    let state = PipelineState::new();
    info!(run_id = %state.run_id, workdir = %config.workdir.display(), "Starting pipeline run");

    let state = stage_intent(state, client, &config.instructions, &workspace).await?;
    let state = stage_acquire(state, &workspace)?;
    let state = stage_extract(state, &workspace)?;
    let state = stage_filter(state, client, &workspace).await?;
    let state = stage_summarise(state, client, &workspace).await?;
    let state = stage_render(state, &workspace)?;

    // All stages enforce their own preconditions, so these are present here.
    let intent = state.intent.clone().ok_or(PipelineError::CloneFailed {
        message: "pipeline completed without an intent record".to_string(),
    })?;
    let pdf_path = state.pdf_path.clone().ok_or(PipelineError::Render(
        RenderError::MissingInput(workspace.summary_md()),
    ))?;

    info!(run_id = %state.run_id, pdf = %pdf_path.display(), "Pipeline run complete");
    Ok(PipelineReport {
        run_id: state.run_id,
        intent,
        repo_cloned: state.repo_cloned,
        extracted: state.extracted,
        pdf_path,
    })
}
