use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod handler;
pub mod ledger;

pub use ledger::ReactionLedger;

/// The fixed reaction vocabulary. Empathy-oriented rather than a bare like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Empathy,
    Relatable,
    Support,
}

impl ReactionType {
    pub const ALL: [ReactionType; 4] = [
        ReactionType::Like,
        ReactionType::Empathy,
        ReactionType::Relatable,
        ReactionType::Support,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Empathy => "empathy",
            ReactionType::Relatable => "relatable",
            ReactionType::Support => "support",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReactionType::Like => "いいね",
            ReactionType::Empathy => "共感",
            ReactionType::Relatable => "同感",
            ReactionType::Support => "応援",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ReactionType::Like => "👍",
            ReactionType::Empathy => "🤝",
            ReactionType::Relatable => "💭",
            ReactionType::Support => "💪",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ReactionType::Like => "素敵だと思った",
            ReactionType::Empathy => "気持ちがわかる",
            ReactionType::Relatable => "自分も同じ",
            ReactionType::Support => "頑張ってほしい",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reaction type: {0}")]
pub struct UnknownReaction(pub String);

impl FromStr for ReactionType {
    type Err = UnknownReaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionType::ALL
            .into_iter()
            .find(|r| r.id() == s)
            .ok_or_else(|| UnknownReaction(s.to_string()))
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One row of the ledger. At most one exists per (post_id, user_id, kind).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reaction {
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ReactionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionState {
    pub active: bool,
}

/// Map a raw count onto the coarse bucket shown next to a reaction button.
/// Zero renders as nothing so the button shows its icon alone.
pub fn format_count(n: u64) -> &'static str {
    match n {
        0 => "",
        1..=4 => "数件",
        5..=9 => "5+",
        10..=49 => "10〜50",
        50..=99 => "50〜100",
        100..=499 => "100+",
        _ => "500+",
    }
}

/// Per-type display state for one post, in vocabulary order.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionSummary {
    #[serde(rename = "type")]
    pub kind: ReactionType,
    pub emoji: &'static str,
    pub label: &'static str,
    pub display_count: &'static str,
    pub reacted: bool,
}

pub fn summarize(reactions: &[Reaction], viewer: Option<Uuid>) -> Vec<ReactionSummary> {
    ReactionType::ALL
        .into_iter()
        .map(|kind| {
            let of_kind = reactions.iter().filter(|r| r.kind == kind);
            let count = of_kind.clone().count() as u64;
            let reacted = viewer.is_some_and(|v| of_kind.clone().any(|r| r.user_id == v));
            ReactionSummary {
                kind,
                emoji: kind.emoji(),
                label: kind.label(),
                display_count: format_count(count),
                reacted,
            }
        })
        .collect()
}

/// Catalogue entry for clients rendering the reaction bar.
#[derive(Debug, Serialize)]
pub struct ReactionInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

impl From<ReactionType> for ReactionInfo {
    fn from(kind: ReactionType) -> Self {
        ReactionInfo {
            id: kind.id(),
            label: kind.label(),
            emoji: kind.emoji(),
            description: kind.description(),
        }
    }
}
