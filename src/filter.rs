//! Topic filter: keep only the corpus content relevant to the report topic.

use std::fs;
use tracing::info;

use crate::generate::{truncate_chars, ChatClient, ChatMessage, GenerateError, CONTEXT_WINDOW_CHARS};
use crate::workspace::Workspace;

#[derive(Debug)]
pub enum FilterError {
    Generate(GenerateError),
    Io(std::io::Error),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::Generate(e) => write!(f, "topic filter call failed: {e}"),
            FilterError::Io(e) => write!(f, "topic filter I/O failed: {e}"),
        }
    }
}

impl std::error::Error for FilterError {}

impl From<std::io::Error> for FilterError {
    fn from(e: std::io::Error) -> Self {
        FilterError::Io(e)
    }
}

fn system_prompt(topic: &str) -> String {
    format!(
        "You are a content filtration expert. \
Your task is to process the provided information and return only the content \
that is specifically about the following topic: {topic}. \
Do not include any other information or commentary."
    )
}

/// Concatenates readme, code aggregate and intent record (files that exist,
/// in that order), truncates to the leading character window, and asks the
/// service to discard everything off-topic. The response is persisted
/// verbatim to `summary_code.txt` and returned as the new summary value; a
/// degenerate response passes through unchanged.
pub async fn filter_topic(
    client: &dyn ChatClient,
    workspace: &Workspace,
    topic: &str,
) -> Result<String, FilterError> {
    let content = workspace.gather_context(&[
        workspace.readme_txt(),
        workspace.code_txt(),
        workspace.outputs_json(),
    ])?;
    let window = truncate_chars(&content, CONTEXT_WINDOW_CHARS);
    info!(
        topic = topic,
        context_chars = window.chars().count(),
        "Requesting topic-relevant content"
    );

    let messages = vec![
        ChatMessage::system(system_prompt(topic)),
        ChatMessage::user(window),
    ];
    let summary = client
        .complete(messages)
        .await
        .map_err(FilterError::Generate)?;

    fs::write(workspace.summary_code_txt(), &summary)?;
    info!(
        chars = summary.len(),
        path = %workspace.summary_code_txt().display(),
        "Persisted topic-filtered content"
    );
    Ok(summary)
}
