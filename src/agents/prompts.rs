use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::planner::Domain;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read prompt {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid prompt YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("prompt file {0} has no non-empty `prompt` text")]
    Empty(PathBuf),
}

/// System prompts for the three LLM-backed capabilities of one domain.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub expand: String,
    pub rerank: String,
    pub summarize: String,
}

impl PromptSet {
    pub fn builtin(domain: Domain) -> Self {
        let noun = domain.item_noun();
        Self {
            expand: format!(
                "You help youth hockey coaches find {noun}s. Rewrite the coach's goal as a single \
                 search query rich in related hockey terminology (skills, positions, game \
                 situations, age-appropriate progressions). Reply with JSON: \
                 {{\"expanded_query\": string}}."
            ),
            rerank: format!(
                "You review {noun} search results for a youth hockey coach. Score each current \
                 candidate for relevance to the goal from 0.0 to 1.0 with a short reason. List \
                 the titles of candidates that are high quality, using titles exactly as given. \
                 If more or better {noun}s are needed, write short feedback describing what to \
                 search for next; otherwise leave feedback empty. Reply with JSON: \
                 {{\"reranked\": [{{\"title\": string, \"relevance_score\": number, \"reason\": \
                 string}}], \"high_quality\": [string], \"feedback\": string}}."
            ),
            summarize: format!(
                "You are an assistant hockey coach. Summarize how the listed {noun}s serve the \
                 coach's goal, grouping them by focus and noting progressions. Write plain \
                 Markdown prose."
            ),
        }
    }

    /// Built-in prompts, with any `<prefix>_<name>.yaml` or `.txt` file in
    /// `dir` taking precedence.
    pub fn load(domain: Domain, dir: Option<&Path>) -> Result<Self, PromptError> {
        let mut set = Self::builtin(domain);
        let Some(dir) = dir else {
            return Ok(set);
        };
        let prefix = domain.prompt_prefix();
        for (name, slot) in [
            ("expand", &mut set.expand),
            ("rerank", &mut set.rerank),
            ("summarize", &mut set.summarize),
        ] {
            if let Some(text) = load_override(dir, &format!("{prefix}_{name}"))? {
                *slot = text;
            }
        }
        Ok(set)
    }
}

fn load_override(dir: &Path, stem: &str) -> Result<Option<String>, PromptError> {
    let yaml = dir.join(format!("{stem}.yaml"));
    if yaml.is_file() {
        debug!(path = %yaml.display(), "loading prompt override");
        let raw = read(&yaml)?;
        return parse_yaml_prompt(&raw, &yaml).map(Some);
    }

    let txt = dir.join(format!("{stem}.txt"));
    if txt.is_file() {
        debug!(path = %txt.display(), "loading prompt override");
        let raw = read(&txt)?;
        let text = raw.trim();
        if text.is_empty() {
            return Err(PromptError::Empty(txt));
        }
        return Ok(Some(text.to_string()));
    }

    Ok(None)
}

fn read(path: &Path) -> Result<String, PromptError> {
    fs::read_to_string(path).map_err(|source| PromptError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Accepts either a mapping with a `prompt` key or a bare string document.
fn parse_yaml_prompt(raw: &str, path: &Path) -> Result<String, PromptError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|source| PromptError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    let text = match &value {
        serde_yaml::Value::Mapping(map) => map.get("prompt").and_then(|p| p.as_str()),
        serde_yaml::Value::String(s) => Some(s.as_str()),
        _ => None,
    };

    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PromptError::Empty(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_prompts_name_the_domain() {
        let drills = PromptSet::builtin(Domain::Drills);
        assert!(drills.rerank.contains("drill"));
        assert!(drills.expand.contains("expanded_query"));

        let off_ice = PromptSet::builtin(Domain::OffIce);
        assert!(off_ice.summarize.contains("off-ice exercise"));
    }

    #[test]
    fn load_without_dir_is_builtin() {
        let set = PromptSet::load(Domain::Drills, None).unwrap();
        assert_eq!(set.rerank, PromptSet::builtin(Domain::Drills).rerank);
    }

    #[test]
    fn yaml_override_replaces_only_its_prompt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("drills_rerank.yaml"),
            "version: 2\nprompt: |\n  Judge drills strictly.\n",
        )
        .unwrap();

        let set = PromptSet::load(Domain::Drills, Some(dir.path())).unwrap();
        assert_eq!(set.rerank, "Judge drills strictly.");
        assert_eq!(set.expand, PromptSet::builtin(Domain::Drills).expand);
    }

    #[test]
    fn txt_override_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("off_ice_summarize.txt"), "  Keep it short.\n").unwrap();

        let set = PromptSet::load(Domain::OffIce, Some(dir.path())).unwrap();
        assert_eq!(set.summarize, "Keep it short.");
    }

    #[test]
    fn overrides_for_other_domain_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("off_ice_expand.txt"), "Off-ice only.").unwrap();

        let set = PromptSet::load(Domain::Drills, Some(dir.path())).unwrap();
        assert_eq!(set.expand, PromptSet::builtin(Domain::Drills).expand);
    }

    #[test]
    fn yaml_without_prompt_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("drills_expand.yaml"), "name: expander\n").unwrap();

        let err = PromptSet::load(Domain::Drills, Some(dir.path())).unwrap_err();
        assert!(matches!(err, PromptError::Empty(_)), "got: {err:?}");
    }

    #[test]
    fn bare_string_yaml_is_accepted() {
        let parsed = parse_yaml_prompt("\"Expand the goal.\"", Path::new("x.yaml")).unwrap();
        assert_eq!(parsed, "Expand the goal.");
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = parse_yaml_prompt("prompt: [unclosed", Path::new("bad.yaml")).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
