use repo_report::filter::filter_topic;
use repo_report::generate::{truncate_chars, MockChatClient, Role, CONTEXT_WINDOW_CHARS};
use repo_report::intent::{Audience, RequestIntent};
use repo_report::summarise::summarise_report;
use repo_report::workspace::Workspace;
use std::fs;
use tempfile::tempdir;

fn test_intent() -> RequestIntent {
    RequestIntent {
        repo_url: "https://github.com/example/demo".to_string(),
        audience: Audience::BusinessAnalyst,
        topic: "installation and setup".to_string(),
    }
}

#[test]
fn truncation_is_exact_and_char_based() {
    let short = "abc";
    assert_eq!(truncate_chars(short, CONTEXT_WINDOW_CHARS), "abc");

    let long: String = "x".repeat(7000);
    assert_eq!(truncate_chars(&long, CONTEXT_WINDOW_CHARS).len(), 6000);

    let exact: String = "y".repeat(6000);
    assert_eq!(truncate_chars(&exact, CONTEXT_WINDOW_CHARS), exact);
}

#[test]
fn truncation_respects_multibyte_boundaries() {
    // Two bytes per char: byte-based truncation would split mid-character.
    let long: String = "é".repeat(7000);
    let window = truncate_chars(&long, CONTEXT_WINDOW_CHARS);
    assert_eq!(window.chars().count(), 6000);
    assert!(window.chars().all(|c| c == 'é'));
}

#[tokio::test]
async fn filter_concatenates_artifacts_in_order_and_persists_verbatim() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path());
    workspace.ensure_output_dir().unwrap();
    fs::write(workspace.readme_txt(), "README;").unwrap();
    fs::write(workspace.code_txt(), "CODE;").unwrap();
    fs::write(workspace.outputs_json(), "INTENT;").unwrap();

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|messages| {
            messages[0].role == Role::System
                && messages[0].content.contains("installation and setup")
                && messages[1].content == "README;CODE;INTENT;"
        })
        .times(1)
        .returning(|_| Ok("FILTERED CONTENT".to_string()));

    let summary = filter_topic(&client, &workspace, "installation and setup")
        .await
        .expect("filter should succeed");
    assert_eq!(summary, "FILTERED CONTENT");
    assert_eq!(
        fs::read_to_string(workspace.summary_code_txt()).unwrap(),
        "FILTERED CONTENT"
    );
}

#[tokio::test]
async fn filter_truncates_context_to_window() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path());
    workspace.ensure_output_dir().unwrap();
    fs::write(workspace.code_txt(), "x".repeat(9000)).unwrap();

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|messages| messages[1].content.chars().count() == CONTEXT_WINDOW_CHARS)
        .times(1)
        .returning(|_| Ok("ok".to_string()));

    filter_topic(&client, &workspace, "topic").await.unwrap();
}

#[tokio::test]
async fn filter_skips_missing_artifacts() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path());
    workspace.ensure_output_dir().unwrap();
    fs::write(workspace.code_txt(), "only code").unwrap();

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|messages| messages[1].content == "only code")
        .times(1)
        .returning(|_| Ok("ok".to_string()));

    filter_topic(&client, &workspace, "topic").await.unwrap();
}

#[tokio::test]
async fn degenerate_response_passes_through_unchanged() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path());
    workspace.ensure_output_dir().unwrap();
    fs::write(workspace.code_txt(), "code").unwrap();

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .times(1)
        .returning(|_| Ok(String::new()));

    let summary = filter_topic(&client, &workspace, "topic").await.unwrap();
    assert_eq!(summary, "");
    assert_eq!(fs::read_to_string(workspace.summary_code_txt()).unwrap(), "");
}

#[tokio::test]
async fn summarise_targets_audience_and_topic_and_persists_markdown() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path());
    workspace.ensure_output_dir().unwrap();
    fs::write(workspace.readme_txt(), "README;").unwrap();
    fs::write(workspace.summary_code_txt(), "FILTERED;").unwrap();
    fs::write(workspace.outputs_json(), "INTENT;").unwrap();

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|messages| {
            messages[0].role == Role::System
                && messages[0].content.contains("business_analyst")
                && messages[0].content.contains("installation and setup")
                && messages[1].content == "README;FILTERED;INTENT;"
        })
        .times(1)
        .returning(|_| Ok("# Installation and setup\n\nNarrative.".to_string()));

    let summary = summarise_report(&client, &workspace, &test_intent())
        .await
        .expect("summarise should succeed");
    assert!(summary.starts_with("# Installation and setup"));
    assert_eq!(
        fs::read_to_string(workspace.summary_md()).unwrap(),
        summary
    );
}
