//! Loader tests over real configuration files.

use muse::types::MuseError;
use muse::utils::toml_config::{MuseConfig, OutputSchemaKind, ProviderConfig};
use std::fs;
use std::path::Path;

const ROOT: &str = r#"
[pipeline]
name = "marketing"
planning = true
max_rpm = 5
drafts_dir = "resources/drafts"

[catalogs]
agents = "config/agents.toml"
tasks = "config/tasks.toml"

[providers.gemini-main]
type = "gemini"
api_key_env = "GEMINI_API_KEY"

[models.default]
provider = "gemini-main"
model = "gemini-2.0-flash"
temperature = 0.6
"#;

const AGENTS: &str = r#"
[agents.researcher]
role = "Market Researcher"
goal = "Understand the market"
backstory = "Veteran analyst"
tools = ["web_search", "scrape_website"]
max_rpm = 1

[agents.writer]
role = "Writer"
goal = "Write the drafts"
backstory = "Journalist"
allow_delegation = true
max_iterations = 5
"#;

const TASKS: &str = r#"
[[tasks]]
name = "research"
description = "Research {product_name}"
expected_output = "A report"
agent = "researcher"

[[tasks]]
name = "drafts"
description = "Write drafts using {output:research}"
expected_output = "Structured drafts"
agent = "writer"
output_schema = "content"
context = ["research"]
"#;

fn write_config(dir: &Path, root: &str, agents: &str, tasks: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("config")).unwrap();
    let root_path = dir.join("muse.toml");
    fs::write(&root_path, root).unwrap();
    fs::write(dir.join("config/agents.toml"), agents).unwrap();
    fs::write(dir.join("config/tasks.toml"), tasks).unwrap();
    root_path
}

#[test]
fn loads_a_complete_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), ROOT, AGENTS, TASKS);

    let config = MuseConfig::load(&path).unwrap();

    assert_eq!(config.pipeline.name, "marketing");
    assert!(config.pipeline.planning);
    assert_eq!(config.pipeline.max_rpm, Some(5));

    assert_eq!(config.agents.len(), 2);
    let researcher = &config.agents["researcher"];
    assert_eq!(researcher.role, "Market Researcher");
    assert_eq!(researcher.max_rpm, Some(1));
    assert_eq!(researcher.max_iterations, 25); // default
    assert!(config.agents["writer"].allow_delegation);

    assert_eq!(config.tasks.len(), 2);
    assert_eq!(config.tasks[0].name, "research");
    assert_eq!(config.tasks[1].output_schema, Some(OutputSchemaKind::Content));
    assert_eq!(config.tasks[1].context, vec!["research".to_string()]);

    assert!(matches!(
        config.providers["gemini-main"],
        ProviderConfig::Gemini { .. }
    ));
    assert_eq!(config.models["default"].temperature, 0.6);
}

#[test]
fn missing_task_catalog_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    let root_path = dir.path().join("muse.toml");
    fs::write(&root_path, ROOT).unwrap();
    fs::write(dir.path().join("config/agents.toml"), AGENTS).unwrap();
    // tasks.toml is absent

    let err = MuseConfig::load(&root_path).unwrap_err();
    assert!(matches!(err, MuseError::Config(_)));
    assert!(err.to_string().contains("tasks.toml"));
}

#[test]
fn dangling_agent_reference_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let tasks = r#"
[[tasks]]
name = "research"
description = "Research"
expected_output = "A report"
agent = "nobody"
"#;
    let path = write_config(dir.path(), ROOT, AGENTS, tasks);

    let err = MuseConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("nobody"));
}

#[test]
fn malformed_toml_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), ROOT, "[agents.broken\nrole = ", TASKS);

    let err = MuseConfig::load(&path).unwrap_err();
    assert!(matches!(err, MuseError::Config(_)));
}

#[test]
fn unknown_model_reference_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let agents = r#"
[agents.researcher]
role = "Market Researcher"
goal = "Understand the market"
backstory = "Veteran analyst"
model = "missing-model"
"#;
    let tasks = r#"
[[tasks]]
name = "research"
description = "Research"
expected_output = "A report"
agent = "researcher"
"#;
    let path = write_config(dir.path(), ROOT, agents, tasks);

    let err = MuseConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("missing-model"));
}
