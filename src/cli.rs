use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rinkside", version, about = "Youth-hockey drill and off-ice workout planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find on-ice drills for a practice goal
    Drills(PlanArgs),
    /// Find off-ice exercises for a workout goal
    OffIce(PlanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// What the coach wants to work on (e.g. "U10 breakout passing")
    #[arg(long)]
    pub input: String,

    /// Upper bound on search/rerank rounds (1-20)
    #[arg(long, default_value_t = 5)]
    pub max_iterations: u32,

    /// Stop once this many high-quality items have been accepted
    #[arg(long, default_value_t = 5)]
    pub quality_threshold: usize,

    /// Results requested per knowledge-base search (1-50)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=50))]
    pub results: u8,

    /// Knowledge-base MCP endpoint (default: $RINKSIDE_KB_URL or http://localhost:8000/mcp)
    #[arg(long)]
    pub kb_url: Option<String>,

    /// Directory of prompt overrides (drills_rerank.yaml, off_ice_expand.txt, ...)
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Write the plan as Markdown into this directory
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, default_value = "hockey")]
    pub sport: String,

    #[arg(long, default_value = "")]
    pub age_group: String,

    /// e.g. "2x weekly"
    #[arg(long, default_value = "")]
    pub frequency: String,

    /// Plan goal for the frontmatter; repeatable (default: the input text)
    #[arg(long = "goal")]
    pub goals: Vec<String>,

    #[arg(long, default_value = "")]
    pub location: String,

    /// Available equipment or facilities; repeatable
    #[arg(long = "amenity")]
    pub amenities: Vec<String>,

    /// Preferred activities; repeatable
    #[arg(long = "activity")]
    pub activities: Vec<String>,

    /// Plan start date, YYYY-MM-DD (default: first of this month)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Plan end date, YYYY-MM-DD (default: start + 90 days)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Image to embed under Visuals; repeatable
    #[arg(long = "visual")]
    pub visuals: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drills_with_defaults() {
        let cli = Cli::try_parse_from(["rinkside", "drills", "--input", "breakouts"]).unwrap();
        let Command::Drills(args) = cli.command else {
            panic!("expected drills subcommand");
        };
        assert_eq!(args.input, "breakouts");
        assert_eq!(args.max_iterations, 5);
        assert_eq!(args.quality_threshold, 5);
        assert_eq!(args.results, 5);
        assert_eq!(args.sport, "hockey");
        assert!(args.out.is_none());
    }

    #[test]
    fn parses_off_ice_with_repeatable_flags() {
        let cli = Cli::try_parse_from([
            "rinkside",
            "off-ice",
            "--input",
            "leg power",
            "--amenity",
            "cones",
            "--amenity",
            "hurdles",
            "--start",
            "2026-11-01",
            "--visual",
            "a.png",
        ])
        .unwrap();
        let Command::OffIce(args) = cli.command else {
            panic!("expected off-ice subcommand");
        };
        assert_eq!(args.amenities, vec!["cones", "hurdles"]);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert_eq!(args.visuals, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["rinkside", "drills"]).is_err());
    }

    #[test]
    fn results_out_of_range_rejected() {
        assert!(
            Cli::try_parse_from(["rinkside", "drills", "--input", "x", "--results", "0"]).is_err()
        );
    }

    #[test]
    fn bad_date_rejected() {
        assert!(
            Cli::try_parse_from(["rinkside", "drills", "--input", "x", "--start", "next week"])
                .is_err()
        );
    }
}
