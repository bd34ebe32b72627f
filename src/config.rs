use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

use crate::cli::PlanArgs;
use crate::kb::DEFAULT_KB_URL;
use crate::planner::LoopPolicy;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout; the Gemini client sets a longer per-request one.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

const KB_URL_ENV: &str = "RINKSIDE_KB_URL";

/// Everything a planning run needs besides credentials, resolved once from
/// flags and environment and passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub kb_url: String,
    pub policy: LoopPolicy,
    pub n_results: u8,
    pub prompts_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_args(args: &PlanArgs) -> Self {
        Self::resolve(args, env::var(KB_URL_ENV).ok())
    }

    fn resolve(args: &PlanArgs, env_kb_url: Option<String>) -> Self {
        let kb_url = [args.kb_url.clone(), env_kb_url]
            .into_iter()
            .flatten()
            .map(|u| u.trim().to_string())
            .find(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_KB_URL.to_string());
        Self {
            kb_url,
            policy: LoopPolicy::new(args.max_iterations, args.quality_threshold),
            n_results: args.results,
            prompts_dir: args.prompts.clone(),
        }
    }
}

pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}
