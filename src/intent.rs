//! Intent extraction: turn free-form user instructions into the structured
//! record every later stage reads.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::generate::{ChatClient, ChatMessage, GenerateError};
use crate::workspace::Workspace;

const SYSTEM_PROMPT: &str = "You are an information extraction specialist. \
Your task is to analyze the provided text and identify three key pieces of information: \
the GitHub repository URL, the type of user, and the topic of the final report. \
You will return this information in a JSON object with the following keys: \
'repo_url', 'type_of_user', and 'topic'.";

/// Fixed enumeration of report-consumer roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Developer,
    BusinessAnalyst,
    ProductManager,
    TechnicalWriter,
}

impl Audience {
    /// Wire-format name, also interpolated into prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Developer => "developer",
            Audience::BusinessAnalyst => "business_analyst",
            Audience::ProductManager => "product_manager",
            Audience::TechnicalWriter => "technical_writer",
        }
    }
}

/// The durable record of user intent. Written once to `outputs.json` and
/// treated as immutable for the remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIntent {
    pub repo_url: String,
    #[serde(rename = "type_of_user")]
    pub audience: Audience,
    pub topic: String,
}

#[derive(Debug)]
pub enum IntentError {
    Generate(GenerateError),
    /// The response contained no parseable JSON object.
    MalformedResponse(serde_json::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for IntentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentError::Generate(e) => write!(f, "intent extraction call failed: {e}"),
            IntentError::MalformedResponse(e) => {
                write!(f, "no parseable intent JSON in response: {e}")
            }
            IntentError::Io(e) => write!(f, "failed to persist intent record: {e}"),
        }
    }
}

impl std::error::Error for IntentError {}

impl From<std::io::Error> for IntentError {
    fn from(e: std::io::Error) -> Self {
        IntentError::Io(e)
    }
}

fn fenced_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex"))
}

fn brace_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)(\{.*\})").expect("valid regex"))
}

/// Recovers the intent object from a chat response.
///
/// Parsing policy, in order: direct parse of the full text; the contents of
/// a fenced code block labeled `json`; the first brace-delimited substring.
/// When all three fail the original direct-parse error is returned.
pub fn extract_json(text: &str) -> Result<RequestIntent, serde_json::Error> {
    let direct_err = match serde_json::from_str(text) {
        Ok(intent) => return Ok(intent),
        Err(e) => e,
    };
    if let Some(caps) = fenced_json_re().captures(text) {
        if let Ok(intent) = serde_json::from_str(&caps[1]) {
            return Ok(intent);
        }
    }
    if let Some(caps) = brace_block_re().captures(text) {
        if let Ok(intent) = serde_json::from_str(&caps[1]) {
            return Ok(intent);
        }
    }
    Err(direct_err)
}

/// Sends the instructions to the service, parses the structured intent and
/// persists it to `outputs.json`, overwriting any prior record.
pub async fn extract_intent(
    client: &dyn ChatClient,
    instructions: &str,
    workspace: &Workspace,
) -> Result<RequestIntent, IntentError> {
    let messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(instructions),
    ];
    let response = client
        .complete(messages)
        .await
        .map_err(IntentError::Generate)?;

    let intent = match extract_json(&response) {
        Ok(intent) => intent,
        Err(e) => {
            error!(error = %e, response_chars = response.len(), "Failed to recover intent JSON from response");
            return Err(IntentError::MalformedResponse(e));
        }
    };

    workspace.ensure_output_dir()?;
    let serialized = serde_json::to_string_pretty(&intent).map_err(IntentError::MalformedResponse)?;
    fs::write(workspace.outputs_json(), &serialized)?;

    info!(
        repo_url = %intent.repo_url,
        audience = intent.audience.as_str(),
        topic = %intent.topic,
        path = %workspace.outputs_json().display(),
        "Extracted and persisted request intent"
    );
    Ok(intent)
}
