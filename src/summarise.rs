//! Report summariser: produce the audience-targeted markdown narrative.

use std::fs;
use tracing::info;

use crate::generate::{truncate_chars, ChatClient, ChatMessage, GenerateError, CONTEXT_WINDOW_CHARS};
use crate::intent::RequestIntent;
use crate::workspace::Workspace;

#[derive(Debug)]
pub enum SummariseError {
    Generate(GenerateError),
    Io(std::io::Error),
}

impl std::fmt::Display for SummariseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummariseError::Generate(e) => write!(f, "summary call failed: {e}"),
            SummariseError::Io(e) => write!(f, "summary I/O failed: {e}"),
        }
    }
}

impl std::error::Error for SummariseError {}

impl From<std::io::Error> for SummariseError {
    fn from(e: std::io::Error) -> Self {
        SummariseError::Io(e)
    }
}

fn system_prompt(intent: &RequestIntent) -> String {
    format!(
        "You are a technical project summary writer. \
Your task is to create a detailed, project-based summary of a GitHub repository. \
This summary must be written for the {} stakeholder audience. \
The summary's main focus and title must be the following topic: {}. \
You will present the final summary in clean markdown format.",
        intent.audience.as_str(),
        intent.topic
    )
}

/// Concatenates readme, topic-filtered content and intent record, truncates
/// to the leading character window, and asks the service for a markdown
/// narrative titled by the topic. Persisted verbatim to `summary.md`.
pub async fn summarise_report(
    client: &dyn ChatClient,
    workspace: &Workspace,
    intent: &RequestIntent,
) -> Result<String, SummariseError> {
    let content = workspace.gather_context(&[
        workspace.readme_txt(),
        workspace.summary_code_txt(),
        workspace.outputs_json(),
    ])?;
    let window = truncate_chars(&content, CONTEXT_WINDOW_CHARS);
    info!(
        audience = intent.audience.as_str(),
        topic = %intent.topic,
        context_chars = window.chars().count(),
        "Requesting stakeholder summary"
    );

    let messages = vec![
        ChatMessage::system(system_prompt(intent)),
        ChatMessage::user(window),
    ];
    let summary = client
        .complete(messages)
        .await
        .map_err(SummariseError::Generate)?;

    fs::write(workspace.summary_md(), &summary)?;
    info!(
        chars = summary.len(),
        path = %workspace.summary_md().display(),
        "Persisted markdown narrative"
    );
    Ok(summary)
}
