use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::agents::{LlmQueryExpander, LlmReranker, LlmSummarizer, PromptError, PromptSet};
use crate::cli::PlanArgs;
use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::plan::{self, PlanDocument, PlanMeta, PlanWriteError, Visual};
use crate::planner::capability::Searcher;
use crate::planner::{self, Domain, PlanError, RefineRequest, RefinementOutcome};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Prompt(#[from] PromptError),

    #[error("{0}")]
    Plan(#[from] PlanError),

    #[error("{0}")]
    Write(#[from] PlanWriteError),
}

#[derive(Debug)]
pub struct PlanReport {
    pub outcome: RefinementOutcome,
    pub markdown: String,
    pub written_to: Option<PathBuf>,
}

/// Runs one planning session: refine the goal against the knowledge base,
/// render the result, and write it out when `--out` is set.
pub async fn run_plan(
    domain: Domain,
    args: &PlanArgs,
    settings: &Settings,
    gemini: GeminiClient,
    kb: &impl Searcher,
    today: NaiveDate,
) -> Result<PlanReport, AppError> {
    // Validate dates before spending any model calls.
    let dates = match args.out {
        Some(_) => Some(plan::resolve_dates(args.start, args.end, today)?),
        None => None,
    };

    let prompts = PromptSet::load(domain, settings.prompts_dir.as_deref())?;
    let expander = LlmQueryExpander::new(gemini.clone(), prompts.expand);
    let reranker = LlmReranker::new(gemini.clone(), prompts.rerank, domain);
    let summarizer = LlmSummarizer::new(gemini, prompts.summarize, domain);

    info!(
        tool = domain.search_tool(),
        max_iterations = settings.policy.max_iterations(),
        quality_threshold = settings.policy.quality_threshold(),
        "planning"
    );

    let request = RefineRequest {
        goal: &args.input,
        policy: settings.policy,
    };
    let outcome = planner::refine(&expander, kb, &reranker, &summarizer, &request).await?;

    let markdown = plan::render_body(domain, &args.input, &outcome);

    let written_to = match (&args.out, dates) {
        (Some(dir), Some((start_date, end_date))) => {
            let document = PlanDocument {
                meta: plan_meta(domain, args, start_date, end_date),
                body: markdown.clone(),
                visuals: args
                    .visuals
                    .iter()
                    .map(|path| Visual {
                        caption: path
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        source: path.clone(),
                    })
                    .collect(),
            };
            let path = document.save(dir, domain.file_prefix())?;
            info!(path = %path.display(), "plan saved");
            Some(path)
        }
        _ => None,
    };

    Ok(PlanReport {
        outcome,
        markdown,
        written_to,
    })
}

fn plan_meta(
    domain: Domain,
    args: &PlanArgs,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> PlanMeta {
    let goals = if args.goals.is_empty() {
        vec![args.input.trim().to_string()]
    } else {
        args.goals.clone()
    };
    PlanMeta {
        title: domain.plan_title().to_string(),
        sport: args.sport.clone(),
        age_group: args.age_group.clone(),
        start_date,
        end_date,
        frequency: args.frequency.clone(),
        goals,
        location: args.location.clone(),
        amenities: args.amenities.clone(),
        activities: args.activities.clone(),
    }
}
