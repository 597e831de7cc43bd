//! `fiscal prompts` subcommands

use anyhow::{bail, Result};
use fiscal_core::prompts::{default_prompts_dir, PromptId, PromptLibrary, PromptSource};

use super::print_json;

fn overrides_dir_display() -> String {
    default_prompts_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no data directory on this system)".to_string())
}

pub fn cmd_prompts_list(json: bool) -> Result<()> {
    let prompts = PromptLibrary::new().list();
    if json {
        return print_json(&prompts);
    }

    println!("📝 Assistant prompts");
    println!();
    println!("   {:<24} {:>3}  {:<14} SOURCE", "ID", "VER", "TASK");
    for info in &prompts {
        let source = match &info.override_path {
            Some(path) => format!("override ({})", path.display()),
            None => "embedded".to_string(),
        };
        println!(
            "   {:<24} {:>3}  {:<14} {}",
            info.id, info.version, info.task_type, source
        );
    }
    println!();
    println!("   Overrides are read from {}", overrides_dir_display());
    println!("   Save a copy as <id>.md there and edit it; new sessions pick it up.");
    Ok(())
}

pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = PromptId::parse(prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!("Unknown prompt '{}' (expected one of: {})", prompt_id, known.join(", "));
    };

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!(
        "{} v{} [{}]",
        prompt.metadata.id, prompt.metadata.version, prompt.metadata.task_type
    );
    match &prompt.source {
        PromptSource::Embedded => println!("source: embedded"),
        PromptSource::Override(path) => println!("source: {}", path.display()),
    }
    println!();
    println!("{}", prompt.content);
    Ok(())
}

pub fn cmd_prompts_path() -> Result<()> {
    let Some(path) = default_prompts_dir() else {
        bail!("No data directory on this system; prompt overrides are unavailable");
    };

    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(directory does not exist yet; create it to add overrides)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_unknown_prompt_fails() {
        let err = cmd_prompts_show("nope").unwrap_err();
        assert!(err.to_string().contains("answer_question"));
    }

    #[test]
    fn test_show_known_prompt() {
        assert!(cmd_prompts_show("answer_question").is_ok());
    }
}
