//! `muse-runner init` - scaffold a working marketing pipeline
//!
//! Writes a root `muse.toml` plus the two catalogs with a four-agent,
//! eight-task marketing crew. Existing files are left alone unless
//! `--force` is given.

use crate::cli::output::Output;
use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

const MUSE_TOML: &str = r#"# M.U.S.E pipeline configuration

[pipeline]
name = "marketing"
process = "sequential"
planning = true
max_rpm = 10
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
max_tokens = 2048
"#;

const AGENTS_TOML: &str = r#"# Agent catalog

[agents.head_of_marketing]
role = "Head of Marketing"
goal = "Position the product in front of its audience and turn research into a plan the team can execute"
backstory = "A marketing lead who has launched a dozen products on small budgets and insists on evidence before spend"
tools = ["web_search", "scrape_website", "list_directory", "read_file", "write_file"]
allow_delegation = true
reasoning = true
inject_date = true
max_rpm = 10

[agents.social_media_creator]
role = "Social Media Content Creator"
goal = "Turn strategy into scroll-stopping posts and reel scripts for the target audience"
backstory = "Grew three accounts past 100k followers by pairing platform trends with a consistent brand voice"
tools = ["web_search", "scrape_website", "list_directory", "read_file", "write_file"]
allow_delegation = true
inject_date = true
max_iterations = 5

[agents.blog_writer]
role = "Content Writer for Blogs"
goal = "Write clear, useful long-form drafts that earn organic traffic"
backstory = "A former journalist who treats every draft as a story with a reader, a promise, and a payoff"
tools = ["web_search", "scrape_website", "list_directory", "read_file", "write_file"]
allow_delegation = true
inject_date = true
max_iterations = 5

[agents.seo_specialist]
role = "SEO Specialist"
goal = "Make every piece of content findable without making it unreadable"
backstory = "Ten years of technical and on-page SEO across SaaS and education products"
tools = ["web_search", "scrape_website", "list_directory", "read_file", "write_file"]
allow_delegation = true
inject_date = true
max_iterations = 5
"#;

const TASKS_TOML: &str = r#"# Task catalog - executed top to bottom

[[tasks]]
name = "market_research"
description = """Research the current market for {product_name} ({product_description}). \
Identify the main competitors, their pricing, and the channels where {target_audience} \
actually spends attention. Budget constraint: {budget}."""
expected_output = "A market research summary with competitors, pricing landscape, and three channel recommendations"
agent = "head_of_marketing"

[[tasks]]
name = "prepare_marketing_strategy"
description = """Using the research below, prepare a marketing strategy for {product_name} \
that fits within {budget}. State the positioning, the top three channels, and what success \
looks like after one quarter."""
expected_output = "A one-page marketing strategy with positioning, channels, and quarterly goals"
agent = "head_of_marketing"
context = ["market_research"]

[[tasks]]
name = "create_content_calendar"
description = """Create a two-week content calendar for {product_name} aimed at \
{target_audience}, following the strategy from {output:prepare_marketing_strategy}. \
Cover social posts, reels, and blog slots with a working title for each."""
expected_output = "A day-by-day calendar with format, working title, and goal per slot"
agent = "social_media_creator"
context = ["prepare_marketing_strategy"]

[[tasks]]
name = "prepare_post_drafts"
description = """Draft the social media posts scheduled in the calendar for the first week. \
Write final copy for each post, ready to publish."""
expected_output = "Post drafts for the first calendar week as one structured content record"
agent = "social_media_creator"
output_schema = "content"
context = ["create_content_calendar"]

[[tasks]]
name = "prepare_scripts_for_reels"
description = """Write scripts for the reels scheduled in the calendar: hook, beats, \
voiceover lines, and on-screen text for each."""
expected_output = "Reel scripts as one structured content record"
agent = "social_media_creator"
output_schema = "content"
context = ["create_content_calendar"]

[[tasks]]
name = "content_research_for_blogs"
description = """Research the blog topics slotted in the calendar. For each topic collect \
the questions {target_audience} asks, sources worth citing, and an angle competitors missed."""
expected_output = "Research notes per blog topic with sources and a recommended angle"
agent = "blog_writer"
context = ["create_content_calendar"]

[[tasks]]
name = "draft_blogs"
description = """Write full blog drafts for the researched topics. Use the research notes, \
keep the reader of {target_audience} in mind, and end each draft with a concrete next step."""
expected_output = "Blog drafts as one structured content record"
agent = "blog_writer"
output_schema = "content"
context = ["content_research_for_blogs"]

[[tasks]]
name = "seo_optimization"
description = """Optimize the blog drafts for search: titles, meta descriptions, headings, \
internal link suggestions, and target keywords. Do not flatten the voice."""
expected_output = "SEO-optimized revisions as one structured content record"
agent = "seo_specialist"
output_schema = "content"
context = ["draft_blogs"]
"#;

pub fn run(dir: &Path, force: bool, out: &Output) -> anyhow::Result<()> {
    let files = [
        (dir.join("muse.toml"), MUSE_TOML),
        (dir.join("config/agents.toml"), AGENTS_TOML),
        (dir.join("config/tasks.toml"), TASKS_TOML),
    ];

    if !force {
        for (path, _) in &files {
            if path.exists() {
                bail!(
                    "'{}' already exists; re-run with --force to overwrite",
                    path.display()
                );
            }
        }
    }

    for (path, content) in &files {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create '{}'", parent.display()))?;
        }
        fs::write(path, content).with_context(|| format!("cannot write '{}'", path.display()))?;
        out.success(&format!("wrote {}", path.display()));
    }

    out.info("set GEMINI_API_KEY (or edit [providers]) before running");
    out.info("run: muse-runner run --input product_name=... --input target_audience=... --input product_description=... --input budget=...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use muse::utils::toml_config::MuseConfig;

    #[test]
    fn scaffold_loads_cleanly_through_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let out = Output::no_color();
        run(dir.path(), false, &out).unwrap();

        let config = MuseConfig::load(dir.path().join("muse.toml")).unwrap();
        assert_eq!(config.agents.len(), 4);
        assert_eq!(config.tasks.len(), 8);
        assert!(config.pipeline.planning);
        assert_eq!(config.tasks[0].name, "market_research");
        assert_eq!(config.tasks[7].name, "seo_optimization");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let out = Output::no_color();
        run(dir.path(), false, &out).unwrap();
        assert!(run(dir.path(), false, &out).is_err());
        assert!(run(dir.path(), true, &out).is_ok());
    }
}
