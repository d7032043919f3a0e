use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    anonymity::UNKNOWN_LABEL,
    error::FeedResult,
    store::{self, Entity, Filter, SharedStore},
    tags::{self, HobbyTag},
};

/// Public profile owned by the profile subsystem. Read-only here; only used
/// to render a non-anonymous author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "tags::known_tags")]
    pub hobby_tags: Vec<HobbyTag>,
}

impl Profile {
    /// Display name, else username, else the unknown-user label. Blank
    /// strings count as missing.
    pub fn display_name_or_fallback(&self) -> String {
        non_blank(&self.display_name)
            .or_else(|| non_blank(&self.username))
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    pub(crate) fn username_if_set(&self) -> Option<String> {
        non_blank(&self.username)
    }
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.clone().filter(|s| !s.trim().is_empty())
}

#[derive(Clone)]
pub struct ProfileDirectory {
    store: SharedStore,
}

impl ProfileDirectory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> FeedResult<Option<Profile>> {
        let rows = self
            .store
            .query(Entity::Profiles, &[Filter::Eq("id", id.into())], &[], Some(1))
            .await?;
        Ok(store::decode::<Profile>(rows)?.into_iter().next())
    }

    pub async fn by_ids(&self, ids: &[Uuid]) -> FeedResult<HashMap<Uuid, Profile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self
            .store
            .query(Entity::Profiles, &[Filter::In("id", ids.to_vec())], &[], None)
            .await?;
        Ok(store::decode::<Profile>(rows)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}
