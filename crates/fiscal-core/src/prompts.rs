//! Prompt templates for the budget assistant
//!
//! Each prompt is a markdown file with YAML frontmatter and `# System` /
//! `# User` sections. A file named `<id>.md` in the overrides directory
//! (`~/.local/share/fiscal/prompts/overrides/`) replaces the embedded copy.
//!
//! Templates support `{{var}}` substitution and `{{#if var}}...{{/if}}`
//! blocks, which are kept only when `var` is set and non-empty.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ANSWER_QUESTION: &str = include_str!("../../../prompts/answer_question.md");
const ANALYZE_SPEECH: &str = include_str!("../../../prompts/analyze_speech.md");
const SUMMARIZE_CONVERSATION: &str = include_str!("../../../prompts/summarize_conversation.md");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Answer a question from formatted budget data
    AnswerQuestion,
    /// Relate a budget speech to the year's allocations
    AnalyzeSpeech,
    SummarizeConversation,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnswerQuestion => "answer_question",
            Self::AnalyzeSpeech => "analyze_speech",
            Self::SummarizeConversation => "summarize_conversation",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::AnswerQuestion,
            Self::AnalyzeSpeech,
            Self::SummarizeConversation,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::AnswerQuestion => ANSWER_QUESTION,
            Self::AnalyzeSpeech => ANALYZE_SPEECH,
            Self::SummarizeConversation => SUMMARIZE_CONVERSATION,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    pub task_type: String,
}

/// Where a loaded prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    Override(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter
    pub content: String,
    pub source: PromptSource,
    system: Option<String>,
    user: Option<String>,
}

impl Prompt {
    fn parse(text: &str, source: PromptSource) -> Result<Self> {
        let (metadata, content) = split_frontmatter(text)?;
        let mut system = None;
        let mut user = None;
        for (header, body) in sections(&content) {
            match header {
                "System" => system = Some(body),
                "User" => user = Some(body),
                _ => {}
            }
        }
        Ok(Self {
            metadata,
            content,
            source,
            system,
            user,
        })
    }

    pub fn is_override(&self) -> bool {
        matches!(self.source, PromptSource::Override(_))
    }

    pub fn system_section(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn user_section(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Render the user section, or the whole body if there is none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(self.user_section().unwrap_or(&self.content), vars)
    }
}

/// Loads prompts on first use and caches them for the library's lifetime
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self::with_dir(default_prompts_dir())
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self::with_dir(Some(path))
    }

    /// Ignore overrides; tests use this for stable output
    pub fn embedded_only() -> Self {
        Self::with_dir(None)
    }

    fn with_dir(override_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        let dir = self.override_dir.as_deref();
        match self.cache.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(load_prompt(dir, id)?)),
        }
    }

    pub fn list(&mut self) -> Vec<PromptInfo> {
        let mut infos = Vec::with_capacity(PromptId::all().len());
        for &id in PromptId::all() {
            let (version, task_type, override_path) = match self.get(id) {
                Ok(prompt) => (
                    prompt.metadata.version,
                    prompt.metadata.task_type.clone(),
                    match &prompt.source {
                        PromptSource::Override(path) => Some(path.clone()),
                        PromptSource::Embedded => None,
                    },
                ),
                Err(_) => (0, String::new(), None),
            };
            infos.push(PromptInfo {
                id: id.as_str().to_string(),
                version,
                task_type,
                has_override: override_path.is_some(),
                override_path,
            });
        }
        infos
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fiscal").join("prompts").join("overrides"))
}

fn load_prompt(override_dir: Option<&Path>, id: PromptId) -> Result<Prompt> {
    if let Some(path) = override_dir.map(|d| d.join(id.file_name())) {
        if path.is_file() {
            let text = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Cannot read prompt {}: {}", path.display(), e))
            })?;
            return Prompt::parse(&text, PromptSource::Override(path));
        }
    }
    Prompt::parse(id.embedded(), PromptSource::Embedded)
}

fn split_frontmatter(text: &str) -> Result<(PromptMetadata, String)> {
    let rest = text
        .trim_start()
        .strip_prefix("---")
        .ok_or_else(|| Error::InvalidData("Prompt has no YAML frontmatter".into()))?;
    let (yaml, body) = rest
        .split_once("\n---")
        .ok_or_else(|| Error::InvalidData("Prompt frontmatter is not terminated".into()))?;

    let metadata = serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidData(format!("Bad prompt frontmatter: {}", e)))?;
    Ok((metadata, body.trim().to_string()))
}

/// `# Header` sections of a prompt body, in order
fn sections(body: &str) -> Vec<(&str, String)> {
    let mut out: Vec<(&str, Vec<&str>)> = Vec::new();
    for line in body.lines() {
        if let Some(header) = line.strip_prefix("# ") {
            out.push((header.trim(), Vec::new()));
        } else if let Some((_, lines)) = out.last_mut() {
            lines.push(line);
        }
    }
    out.into_iter()
        .map(|(header, lines)| (header, lines.join("\n").trim().to_string()))
        .collect()
}

fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    // one entry per open {{#if}}; text is emitted only while all are true
    let mut open: Vec<bool> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let emitting = open.iter().all(|&keep| keep);
        if emitting {
            out.push_str(&rest[..start]);
        }
        let Some(len) = rest[start + 2..].find("}}") else {
            rest = &rest[start..];
            break;
        };
        let tag = &rest[start + 2..start + 2 + len];
        rest = &rest[start + 2 + len + 2..];

        if let Some(name) = tag.strip_prefix("#if ") {
            open.push(vars.get(name.trim()).is_some_and(|v| !v.is_empty()));
        } else if tag == "/if" {
            open.pop();
        } else if emitting {
            match vars.get(tag.trim()) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("{{");
                    out.push_str(tag);
                    out.push_str("}}");
                }
            }
        }
    }

    if open.iter().all(|&keep| keep) {
        out.push_str(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---
id: sample
version: 2
task_type: reasoning
---

# System
You explain budgets.

# User
Question: {{question}}.
";

    #[test]
    fn test_parse_sections_and_metadata() {
        let prompt = Prompt::parse(SAMPLE, PromptSource::Embedded).unwrap();
        assert_eq!(prompt.metadata.id, "sample");
        assert_eq!(prompt.metadata.version, 2);
        assert_eq!(prompt.metadata.task_type, "reasoning");
        assert_eq!(prompt.system_section(), Some("You explain budgets."));
        assert_eq!(prompt.user_section(), Some("Question: {{question}}."));
        assert!(!prompt.is_override());
    }

    #[test]
    fn test_frontmatter_required() {
        assert!(split_frontmatter("# System\nNo frontmatter").is_err());
        assert!(split_frontmatter("---\nid: x\n# System").is_err());
    }

    #[test]
    fn test_render_variables_and_conditionals() {
        let template = "Start{{#if year}}\nYear: {{year}}{{/if}}\nEnd {{unknown}}";

        let vars = HashMap::from([("year", "2024")]);
        assert_eq!(
            render_template(template, &vars),
            "Start\nYear: 2024\nEnd {{unknown}}"
        );

        let blank = HashMap::from([("year", "")]);
        assert_eq!(render_template(template, &blank), "Start\nEnd {{unknown}}");
    }

    #[test]
    fn test_nested_conditionals() {
        let template = "{{#if a}}A{{#if b}}B{{/if}}{{/if}}.";
        let vars = HashMap::from([("a", "1")]);
        assert_eq!(render_template(template, &vars), "A.");
        let vars = HashMap::from([("a", "1"), ("b", "1")]);
        assert_eq!(render_template(template, &vars), "AB.");
    }

    #[test]
    fn test_answer_prompt_renders_question_and_context() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::AnswerQuestion).unwrap();
        assert!(prompt.system_section().unwrap().contains("budget analyst"));

        let vars = HashMap::from([
            ("question", "How much went to defence?"),
            ("context", "## Budget 2024"),
        ]);
        let user = prompt.render_user(&vars);
        assert!(user.contains("Question: How much went to defence?"));
        assert!(user.contains("## Budget 2024"));
        assert!(!user.contains("Selected budget year"));
        assert!(!user.contains("{{"));
    }

    #[test]
    fn test_embedded_prompts_parse() {
        let mut lib = PromptLibrary::embedded_only();
        for &id in PromptId::all() {
            let prompt = lib.get(id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert_eq!(prompt.source, PromptSource::Embedded);
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
        assert_eq!(PromptId::parse("analyze_speech"), Some(PromptId::AnalyzeSpeech));
        assert_eq!(PromptId::parse("nope"), None);
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summarize_conversation.md"),
            "---\nid: summarize_conversation\nversion: 9\ntask_type: summarization\n---\n\n# System\nShort.\n\n# User\n{{conversation}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        let prompt = lib.get(PromptId::SummarizeConversation).unwrap();
        assert!(prompt.is_override());
        assert_eq!(prompt.metadata.version, 9);

        let listed = lib.list();
        assert_eq!(listed.len(), 3);
        assert!(listed
            .iter()
            .any(|p| p.id == "summarize_conversation" && p.has_override));
        assert!(listed
            .iter()
            .any(|p| p.id == "answer_question" && !p.has_override));
    }
}
