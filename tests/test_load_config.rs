use repo_report::load_config::load_config;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp config file");
    write(file.path(), yaml).expect("writing temp config");
    file
}

#[test]
#[serial]
fn load_config_success_injects_env_api_key() {
    let config_file = write_config(
        r#"
workdir: ./tmp/work
instructions: |
  I'm a developer reviewing https://github.com/example/demo, report on setup.
generation:
  model: gpt-4o
  temperature: 0.3
  timeout_secs: 30
"#,
    );
    env::set_var("OPENAI_API_KEY", "top-secret-test-key");
    env::remove_var("OPENAI_BASE_URL");

    let config = load_config(config_file.path()).expect("config should load");

    assert_eq!(config.workdir, PathBuf::from("./tmp/work"));
    assert!(config.instructions.contains("example/demo"));
    assert_eq!(config.generation.model, "gpt-4o");
    assert_eq!(config.generation.temperature, 0.3);
    assert_eq!(config.generation.timeout, Duration::from_secs(30));
    assert_eq!(config.generation.api_key.as_deref(), Some("top-secret-test-key"));
    assert_eq!(config.generation.base_url, "https://api.openai.com");
}

#[test]
#[serial]
fn missing_api_key_is_a_warning_not_an_error() {
    let config_file = write_config("instructions: report on setup\n");
    env::remove_var("OPENAI_API_KEY");

    let config = load_config(config_file.path()).expect("config should still load");
    assert_eq!(config.generation.api_key, None);
}

#[test]
#[serial]
fn defaults_apply_when_sections_are_omitted() {
    let config_file = write_config("instructions: report on setup\n");
    env::remove_var("OPENAI_API_KEY");

    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.workdir, PathBuf::from("./repo_cloned"));
    assert_eq!(config.generation.model, "gpt-4o");
    assert_eq!(config.generation.temperature, 0.3);
    assert_eq!(config.generation.timeout, Duration::from_secs(120));
}

#[test]
#[serial]
fn base_url_override_comes_from_env() {
    let config_file = write_config("instructions: report on setup\n");
    env::set_var("OPENAI_BASE_URL", "http://localhost:9000");

    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.generation.base_url, "http://localhost:9000");
    env::remove_var("OPENAI_BASE_URL");
}

#[test]
#[serial]
fn instructions_file_is_read_when_given() {
    let instructions = NamedTempFile::new().unwrap();
    write(instructions.path(), "Report on deployment for a product manager.").unwrap();
    let config_file = write_config(&format!(
        "instructions_file: {}\n",
        instructions.path().display()
    ));

    let config = load_config(config_file.path()).unwrap();
    assert_eq!(
        config.instructions,
        "Report on deployment for a product manager."
    );
}

#[test]
#[serial]
fn missing_instructions_is_an_error() {
    let config_file = write_config("workdir: ./tmp\n");
    assert!(load_config(config_file.path()).is_err());
}

#[test]
#[serial]
fn both_instruction_sources_is_an_error() {
    let config_file = write_config(
        "instructions: inline\ninstructions_file: ./does-not-matter.txt\n",
    );
    assert!(load_config(config_file.path()).is_err());
}

#[test]
#[serial]
fn unreadable_config_file_is_an_error() {
    assert!(load_config("/definitely/not/a/config.yaml").is_err());
}
