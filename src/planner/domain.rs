/// What kind of plan is being built. Selects the knowledge-base search tool,
/// the prompt set, and how the written plan is titled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Drills,
    OffIce,
}

impl Domain {
    /// MCP tool the knowledge-base server exposes for this domain.
    pub fn search_tool(self) -> &'static str {
        match self {
            Domain::Drills => "semantic_search_drills",
            Domain::OffIce => "semantic_search_office",
        }
    }

    /// Noun used in prompts: "drill" / "off-ice exercise".
    pub fn item_noun(self) -> &'static str {
        match self {
            Domain::Drills => "drill",
            Domain::OffIce => "off-ice exercise",
        }
    }

    pub fn plan_title(self) -> &'static str {
        match self {
            Domain::Drills => "Practice Plan",
            Domain::OffIce => "Off-Ice Workout Plan",
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            Domain::Drills => "practice_plan",
            Domain::OffIce => "workout_plan",
        }
    }

    /// Prefix for prompt override file names, e.g. `drills_rerank.yaml`.
    pub fn prompt_prefix(self) -> &'static str {
        match self {
            Domain::Drills => "drills",
            Domain::OffIce => "off_ice",
        }
    }
}
