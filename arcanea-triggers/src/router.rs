//! Guardian routing and suggestion tables

use serde::{Deserialize, Serialize};

/// Guardian chosen when no keyword scores.
pub const FALLBACK_GUARDIAN: &str = "elemental-fusion";

/// Guardian keyword table, in tie-break order.
const GUARDIAN_KEYWORDS: &[(&str, &[&str])] = &[
    ("dragon-forge", &["stuck", "blocked", "ignite", "burn", "transform", "fire"]),
    ("phoenix-artisan", &["rebuild", "renew", "rise", "ashes", "rebirth"]),
    ("volcano-sculptor", &["explode", "breakthrough", "pressure", "force", "erupt"]),
    ("crystal-architect", &["structure", "design", "build", "foundation", "architecture"]),
    ("mountain-builder", &["foundation", "core", "base", "solid", "enduring"]),
    ("river-storyteller", &["flow", "story", "narrative", "journey", "path"]),
    ("ocean-memory", &["depth", "emotion", "memory", "feel", "subconscious"]),
    ("whisper-messenger", &["communicate", "say", "express", "voice", "speak"]),
    ("void-gazer", &["imagine", "infinite", "possibility", "vision", "dream"]),
];

/// One piece of guidance returned by a `suggest` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Suggestion {
    fn new(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
        }
    }
}

/// Picks a guardian for free text by keyword score.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardianRouter;

impl GuardianRouter {
    pub fn new() -> Self {
        Self
    }

    /// Highest-scoring guardian for `text`. Each keyword found as a
    /// case-insensitive substring scores one; ties go to the earlier table
    /// entry.
    pub fn select(&self, text: &str) -> &'static str {
        let text = text.to_lowercase();
        let mut best: Option<(&'static str, usize)> = None;
        for (guardian, keywords) in GUARDIAN_KEYWORDS {
            let score = keywords.iter().filter(|k| text.contains(**k)).count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((*guardian, score));
            }
        }
        best.map(|(guardian, _)| guardian).unwrap_or(FALLBACK_GUARDIAN)
    }

    /// Scores per guardian, in table order.
    pub fn scores(&self, text: &str) -> Vec<(&'static str, usize)> {
        let text = text.to_lowercase();
        GUARDIAN_KEYWORDS
            .iter()
            .map(|(guardian, keywords)| {
                (*guardian, keywords.iter().filter(|k| text.contains(**k)).count())
            })
            .collect()
    }

    /// Guardians known to the router.
    pub fn guardians(&self) -> Vec<&'static str> {
        GUARDIAN_KEYWORDS.iter().map(|(g, _)| *g).collect()
    }

    /// Guardian-flavoured openers; guardians without their own set get the
    /// fallback guardian's.
    pub fn suggestions(&self, guardian: &str) -> Vec<Suggestion> {
        let entries: &[(&str, &str)] = match guardian {
            "dragon-forge" => &[
                ("ignite", "Ignite creative fire..."),
                ("burn", "Burn away limitations..."),
                ("transform", "Transform this into..."),
            ],
            "crystal-architect" => &[
                ("structure", "Structure this as..."),
                ("design", "Design the foundation..."),
                ("build", "Build the framework..."),
            ],
            "river-storyteller" => &[
                ("flow", "Let this flow into..."),
                ("narrative", "The narrative unfolds..."),
                ("journey", "On this journey..."),
            ],
            _ => &[
                ("combine", "Combine elemental forces..."),
                ("harmonize", "Harmonize all elements..."),
                ("unify", "Unify diverse energies..."),
            ],
        };
        entries.iter().map(|(k, t)| Suggestion::new(k, t)).collect()
    }
}

/// Technique templates for a skill id, or a generic one for unknown skills.
pub fn skill_suggestions(skill: &str) -> Vec<Suggestion> {
    let entries: &[(&str, &str)] = match skill {
        "skill_block_remove" => &[
            ("technique", "Try the 5-minute free-write technique"),
            ("prompt", "Write the worst version first, then refine"),
            ("exercise", "Change your environment - move to a different space"),
        ],
        "skill_structure" => &[
            ("framework", "Use the Three-Act Structure"),
            ("outline", "Start with bullet points for each section"),
            ("template", "Apply the Hero's Journey template"),
        ],
        "skill_narrative" => &[
            ("arc", "Consider the character's transformation arc"),
            ("tension", "Add tension through internal conflict"),
            ("pacing", "Vary scene lengths for rhythm"),
        ],
        "skill_order" => &[
            ("organize", "Group related concepts together"),
            ("sequence", "Present ideas in logical progression"),
            ("hierarchy", "Use heading levels for importance"),
        ],
        other => return vec![Suggestion::new("general", &format!("Apply {} technique", other))],
    };
    entries.iter().map(|(k, t)| Suggestion::new(k, t)).collect()
}
