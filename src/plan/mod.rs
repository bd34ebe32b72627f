//! Markdown plan files: YAML frontmatter, body, and an optional Visuals section.

mod dates;

pub use dates::resolve_dates;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::markdown::{escape_md_link, escape_yaml, sanitize_heading};
use crate::planner::{Domain, RefinementOutcome};

#[derive(Debug, thiserror::Error)]
pub enum PlanWriteError {
    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid date range: {start} to {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Frontmatter fields of a written plan.
#[derive(Debug, Clone)]
pub struct PlanMeta {
    pub title: String,
    pub sport: String,
    pub age_group: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: String,
    pub goals: Vec<String>,
    pub location: String,
    pub amenities: Vec<String>,
    pub activities: Vec<String>,
}

/// An image to embed under Visuals; `source` is copied next to the plan.
#[derive(Debug, Clone)]
pub struct Visual {
    pub caption: String,
    pub source: PathBuf,
}

#[derive(Debug)]
pub struct PlanDocument {
    pub meta: PlanMeta,
    pub body: String,
    pub visuals: Vec<Visual>,
}

impl PlanDocument {
    /// First 8 hex chars of the body's SHA-256; names the file and its images.
    pub fn digest(&self) -> String {
        Sha256::digest(self.body.as_bytes())
            .iter()
            .take(4)
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Writes `<dir>/<prefix>_<digest>.md`, copying visuals into `<dir>/images/`.
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<PathBuf, PlanWriteError> {
        create_dir(dir)?;
        let digest = self.digest();

        let mut visuals_md = String::new();
        if !self.visuals.is_empty() {
            let images_dir = dir.join("images");
            create_dir(&images_dir)?;
            visuals_md.push_str("\n\n### Visuals\n\n");
            for (i, visual) in self.visuals.iter().enumerate() {
                let ext = visual
                    .source
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("png");
                let file_name = format!("{digest}_{i}.{ext}");
                let target = images_dir.join(&file_name);
                fs::copy(&visual.source, &target).map_err(|source| PlanWriteError::Io {
                    path: visual.source.clone(),
                    source,
                })?;
                visuals_md.push_str(&format!(
                    "![{}](images/{file_name})\n",
                    escape_md_link(&sanitize_heading(&visual.caption))
                ));
            }
        }

        let path = dir.join(format!("{prefix}_{digest}.md"));
        let contents = format!("{}{}{visuals_md}", render_frontmatter(&self.meta), self.body);
        fs::write(&path, contents).map_err(|source| PlanWriteError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), visuals = self.visuals.len(), "plan written");
        Ok(path)
    }
}

fn create_dir(dir: &Path) -> Result<(), PlanWriteError> {
    fs::create_dir_all(dir).map_err(|source| PlanWriteError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

pub fn render_frontmatter(meta: &PlanMeta) -> String {
    let fields = [
        ("title", meta.title.clone()),
        ("sport", meta.sport.clone()),
        ("age_group", meta.age_group.clone()),
        (
            "date_range",
            format!("{} to {}", meta.start_date, meta.end_date),
        ),
        ("frequency", meta.frequency.clone()),
        ("goals", meta.goals.join("; ")),
        ("location", meta.location.clone()),
        ("amenities", meta.amenities.join("; ")),
        ("activities", meta.activities.join("; ")),
    ];

    let mut fm = String::from("---\n");
    for (key, value) in fields {
        fm.push_str(&format!("{key}: \"{}\"\n", escape_yaml(&value)));
    }
    fm.push_str("---\n\n");
    fm
}

/// Markdown body for a finished refinement: heading, summary, accepted items.
pub fn render_body(domain: Domain, goal: &str, outcome: &RefinementOutcome) -> String {
    let mut out = format!(
        "# {}: {}\n\n",
        domain.plan_title(),
        sanitize_heading(goal.trim())
    );
    out.push_str(&format!(
        "_Search focus: {}_\n\n",
        sanitize_heading(outcome.expanded_query.trim())
    ));
    out.push_str("## Summary\n\n");
    out.push_str(outcome.summary.trim());
    out.push_str("\n\n");
    out.push_str(&format!("## Selected {}s\n\n", domain.item_noun()));
    out.push_str(&render_items(outcome));
    out
}

fn render_items(outcome: &RefinementOutcome) -> String {
    if outcome.results.is_empty() {
        return "(No candidates met the quality bar.)\n".to_string();
    }

    let mut out = String::new();
    for item in &outcome.results {
        let title = escape_md_link(&sanitize_heading(&item.title));
        match &item.link {
            Some(link) => out.push_str(&format!("- [{title}]({})", escape_md_link(link))),
            None => out.push_str(&format!("- {title}")),
        }
        let tags: Vec<String> = item
            .tags
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| format!("{name}: {}", values.join(", ")))
            .collect();
        if !tags.is_empty() {
            out.push_str(&format!(" ({})", sanitize_heading(&tags.join("; "))));
        }
        out.push('\n');
    }
    out
}
