//! Closed hobby-tag vocabulary.
//!
//! Tags arrive as strings at the HTTP boundary and in stored rows; they are
//! parsed into [`HobbyTag`] there and never travel through the core as text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Nature,
    Music,
    Indoor,
    Media,
    Vehicles,
    Creative,
}

impl TagCategory {
    pub const ALL: [TagCategory; 6] = [
        TagCategory::Nature,
        TagCategory::Music,
        TagCategory::Indoor,
        TagCategory::Media,
        TagCategory::Vehicles,
        TagCategory::Creative,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TagCategory::Nature => "自然・アウトドア",
            TagCategory::Music => "音楽",
            TagCategory::Indoor => "インドア",
            TagCategory::Media => "メディア",
            TagCategory::Vehicles => "乗り物",
            TagCategory::Creative => "クリエイティブ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HobbyTag {
    Onsen,
    Scenery,
    Autumn,
    Drive,
    Gardening,
    Jazz,
    Funk,
    Classical,
    HomeCenter,
    Diy,
    Reading,
    Coffee,
    Cooking,
    Anime,
    Manga,
    Game,
    Cars,
    Trains,
    Planes,
    Photography,
}

impl HobbyTag {
    pub const ALL: [HobbyTag; 20] = [
        HobbyTag::Onsen,
        HobbyTag::Scenery,
        HobbyTag::Autumn,
        HobbyTag::Drive,
        HobbyTag::Gardening,
        HobbyTag::Jazz,
        HobbyTag::Funk,
        HobbyTag::Classical,
        HobbyTag::HomeCenter,
        HobbyTag::Diy,
        HobbyTag::Reading,
        HobbyTag::Coffee,
        HobbyTag::Cooking,
        HobbyTag::Anime,
        HobbyTag::Manga,
        HobbyTag::Game,
        HobbyTag::Cars,
        HobbyTag::Trains,
        HobbyTag::Planes,
        HobbyTag::Photography,
    ];

    /// Stable identifier used in storage and URLs.
    pub fn id(self) -> &'static str {
        match self {
            HobbyTag::Onsen => "onsen",
            HobbyTag::Scenery => "scenery",
            HobbyTag::Autumn => "autumn",
            HobbyTag::Drive => "drive",
            HobbyTag::Gardening => "gardening",
            HobbyTag::Jazz => "jazz",
            HobbyTag::Funk => "funk",
            HobbyTag::Classical => "classical",
            HobbyTag::HomeCenter => "homeCenter",
            HobbyTag::Diy => "diy",
            HobbyTag::Reading => "reading",
            HobbyTag::Coffee => "coffee",
            HobbyTag::Cooking => "cooking",
            HobbyTag::Anime => "anime",
            HobbyTag::Manga => "manga",
            HobbyTag::Game => "game",
            HobbyTag::Cars => "cars",
            HobbyTag::Trains => "trains",
            HobbyTag::Planes => "planes",
            HobbyTag::Photography => "photography",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HobbyTag::Onsen => "温泉",
            HobbyTag::Scenery => "風景",
            HobbyTag::Autumn => "紅葉",
            HobbyTag::Drive => "ドライブ",
            HobbyTag::Gardening => "園芸",
            HobbyTag::Jazz => "ジャズ",
            HobbyTag::Funk => "ファンク",
            HobbyTag::Classical => "クラシック",
            HobbyTag::HomeCenter => "ホームセンター",
            HobbyTag::Diy => "DIY",
            HobbyTag::Reading => "読書",
            HobbyTag::Coffee => "コーヒー",
            HobbyTag::Cooking => "料理",
            HobbyTag::Anime => "アニメ",
            HobbyTag::Manga => "マンガ",
            HobbyTag::Game => "ゲーム",
            HobbyTag::Cars => "車",
            HobbyTag::Trains => "電車",
            HobbyTag::Planes => "飛行機",
            HobbyTag::Photography => "写真",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            HobbyTag::Onsen => "♨️",
            HobbyTag::Scenery => "🏞️",
            HobbyTag::Autumn => "🍂",
            HobbyTag::Drive => "🚗",
            HobbyTag::Gardening => "🌱",
            HobbyTag::Jazz => "🎷",
            HobbyTag::Funk => "🎸",
            HobbyTag::Classical => "🎻",
            HobbyTag::HomeCenter => "🔧",
            HobbyTag::Diy => "🛠️",
            HobbyTag::Reading => "📚",
            HobbyTag::Coffee => "☕",
            HobbyTag::Cooking => "🍳",
            HobbyTag::Anime => "📺",
            HobbyTag::Manga => "📖",
            HobbyTag::Game => "🎮",
            HobbyTag::Cars => "🚙",
            HobbyTag::Trains => "🚃",
            HobbyTag::Planes => "✈️",
            HobbyTag::Photography => "📷",
        }
    }

    pub fn category(self) -> TagCategory {
        match self {
            HobbyTag::Onsen
            | HobbyTag::Scenery
            | HobbyTag::Autumn
            | HobbyTag::Drive
            | HobbyTag::Gardening => TagCategory::Nature,
            HobbyTag::Jazz | HobbyTag::Funk | HobbyTag::Classical => TagCategory::Music,
            HobbyTag::HomeCenter
            | HobbyTag::Diy
            | HobbyTag::Reading
            | HobbyTag::Coffee
            | HobbyTag::Cooking => TagCategory::Indoor,
            HobbyTag::Anime | HobbyTag::Manga | HobbyTag::Game => TagCategory::Media,
            HobbyTag::Cars | HobbyTag::Trains | HobbyTag::Planes => TagCategory::Vehicles,
            HobbyTag::Photography => TagCategory::Creative,
        }
    }

    pub fn in_category(category: TagCategory) -> impl Iterator<Item = HobbyTag> {
        Self::ALL.into_iter().filter(move |t| t.category() == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hobby tag: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for HobbyTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HobbyTag::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

impl fmt::Display for HobbyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parse submitted tag ids, dropping duplicates but keeping submission order.
pub fn parse_tags<S: AsRef<str>>(raw: &[S]) -> Result<Vec<HobbyTag>, UnknownTag> {
    let mut tags = Vec::with_capacity(raw.len());
    for id in raw {
        let tag: HobbyTag = id.as_ref().parse()?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Deserialize a stored tag column, skipping ids that are no longer in the
/// vocabulary instead of failing the whole row.
pub fn known_tags<'de, D>(deserializer: D) -> Result<Vec<HobbyTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(|id| id.parse().ok()).collect())
}

/// Catalogue entry served to clients building a tag picker.
#[derive(Debug, Serialize)]
pub struct TagInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub category: TagCategory,
}

impl From<HobbyTag> for TagInfo {
    fn from(tag: HobbyTag) -> Self {
        TagInfo {
            id: tag.id(),
            label: tag.label(),
            emoji: tag.emoji(),
            category: tag.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_serde_names() {
        for tag in HobbyTag::ALL {
            let json = serde_json::to_value(tag).unwrap();
            assert_eq!(json, serde_json::Value::String(tag.id().to_string()));
            assert_eq!(tag.id().parse::<HobbyTag>(), Ok(tag));
        }
    }

    #[test]
    fn parse_rejects_unknown_and_dedups() {
        assert_eq!(
            parse_tags(&["reading", "coffee", "reading"]),
            Ok(vec![HobbyTag::Reading, HobbyTag::Coffee])
        );
        assert_eq!(
            parse_tags(&["reading", "skydiving"]),
            Err(UnknownTag("skydiving".to_string()))
        );
    }

    #[test]
    fn every_tag_belongs_to_exactly_one_listed_category() {
        let total: usize = TagCategory::ALL
            .into_iter()
            .map(|c| HobbyTag::in_category(c).count())
            .sum();
        assert_eq!(total, HobbyTag::ALL.len());
    }
}
