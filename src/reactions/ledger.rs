use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    error::FeedResult,
    reactions::{Reaction, ReactionState, ReactionType},
    store::{self, Entity, Filter, SharedStore, StoreError},
};

/// Per-(post, user, type) existence table driving reaction counts and the
/// viewer's own reaction state.
#[derive(Clone)]
pub struct ReactionLedger {
    store: SharedStore,
}

fn key(post_id: Uuid, user_id: Uuid, kind: ReactionType) -> [Filter; 3] {
    [
        Filter::Eq("post_id", post_id.into()),
        Filter::Eq("user_id", user_id.into()),
        Filter::Eq("type", kind.id().into()),
    ]
}

impl ReactionLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Flip the viewer's reaction of `kind` on a post.
    ///
    /// Logged-out viewers only read: with no identity this is a no-op and
    /// returns `None`. A concurrent toggle from another device that inserted
    /// the same triple first surfaces as a conflict, which means the reaction
    /// is already active, so it is reported as such.
    pub async fn toggle(
        &self,
        post_id: Uuid,
        viewer: Option<Uuid>,
        kind: ReactionType,
    ) -> FeedResult<Option<ReactionState>> {
        let Some(user_id) = viewer else {
            debug!(%post_id, "ignoring reaction toggle without identity");
            return Ok(None);
        };

        if self.has_reacted(post_id, user_id, kind).await? {
            let removed = self
                .store
                .delete(Entity::Reactions, &key(post_id, user_id, kind))
                .await
                .map_err(|e| {
                    error!("Failed to remove reaction: {:?}", e);
                    e
                })?;
            debug!(%post_id, %user_id, %kind, removed, "reaction removed");
            return Ok(Some(ReactionState { active: false }));
        }

        let inserted = self
            .store
            .insert(
                Entity::Reactions,
                vec![
                    ("post_id", post_id.into()),
                    ("user_id", user_id.into()),
                    ("type", kind.id().into()),
                ],
            )
            .await;

        match inserted {
            Ok(_) => debug!(%post_id, %user_id, %kind, "reaction added"),
            Err(StoreError::Conflict(_)) => {
                debug!(%post_id, %user_id, %kind, "reaction already present, keeping it")
            }
            Err(e) => {
                error!("Failed to add reaction: {:?}", e);
                return Err(e.into());
            }
        }
        Ok(Some(ReactionState { active: true }))
    }

    pub async fn count(&self, post_id: Uuid, kind: ReactionType) -> FeedResult<u64> {
        let rows = self
            .store
            .query(
                Entity::Reactions,
                &[
                    Filter::Eq("post_id", post_id.into()),
                    Filter::Eq("type", kind.id().into()),
                ],
                &[],
                None,
            )
            .await?;
        Ok(rows.len() as u64)
    }

    pub async fn has_reacted(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: ReactionType,
    ) -> FeedResult<bool> {
        let rows = self
            .store
            .query(Entity::Reactions, &key(post_id, user_id, kind), &[], Some(1))
            .await?;
        Ok(!rows.is_empty())
    }

    /// All reaction rows for a batch of posts, used to enrich a timeline page.
    pub async fn for_posts(&self, post_ids: &[Uuid]) -> FeedResult<Vec<Reaction>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .query(
                Entity::Reactions,
                &[Filter::In("post_id", post_ids.to_vec())],
                &[],
                None,
            )
            .await?;
        Ok(store::decode(rows)?)
    }
}
