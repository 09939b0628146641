//! Prompt library commands

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Result};
use spendwise_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// List the advisor prompts with where each one is loaded from
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();
    print!("{}", prompt_listing(&mut library)?);
    Ok(())
}

/// Per-prompt summary: version, sections, variables, and override location
pub fn prompt_listing(library: &mut PromptLibrary) -> Result<String> {
    let override_dir = library.override_dir().cloned();
    let mut out = String::new();

    for &id in PromptId::all() {
        let prompt = library.get(id)?;

        let sections = match (prompt.system_section(), prompt.user_section()) {
            (Some(_), Some(_)) => "system + user",
            (None, Some(_)) => "user only",
            _ => "single body",
        };
        let variables: Vec<_> = prompt.variables().into_iter().collect();

        writeln!(
            out,
            "{} (v{}, {})",
            id.as_str(),
            prompt.metadata.version,
            prompt.metadata.task_type
        )?;
        writeln!(out, "  sections:  {}", sections)?;
        writeln!(out, "  variables: {}", variables.join(", "))?;
        match (&prompt.override_path, &override_dir) {
            (Some(path), _) => writeln!(out, "  source:    override {}", path.display())?,
            (None, Some(dir)) => {
                writeln!(out, "  source:    embedded")?;
                writeln!(out, "  override:  {}", override_file(dir, id).display())?;
            }
            (None, None) => writeln!(out, "  source:    embedded (no override directory)")?,
        }
    }

    Ok(out)
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = PromptId::from_name(prompt_id) else {
        let known: Vec<_> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!(
            "Unknown prompt ID: {} (available: {})",
            prompt_id,
            known.join(", ")
        );
    };

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!("Prompt: {} v{}", prompt.metadata.id, prompt.metadata.version);
    match prompt.override_path {
        Some(ref path) => println!("Source: override {}", path.display()),
        None => println!("Source: embedded"),
    }
    println!();
    println!("{}", prompt.content);

    Ok(())
}

/// Print the override file path for each prompt
pub fn cmd_prompts_path() -> Result<()> {
    let Some(dir) = default_prompts_dir() else {
        bail!("No local data directory on this system, prompt overrides are unavailable");
    };

    for &id in PromptId::all() {
        let path = override_file(&dir, id);
        let state = if path.exists() { "in use" } else { "not created" };
        println!("{}  ({})", path.display(), state);
    }

    Ok(())
}

fn override_file(dir: &Path, id: PromptId) -> std::path::PathBuf {
    dir.join(format!("{}.md", id.as_str()))
}
