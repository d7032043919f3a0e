use std::collections::HashSet;

use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    error::FeedResult,
    follows::{FollowCounts, FollowEdge, FollowState},
    profiles::{Profile, ProfileDirectory},
    store::{self, Entity, Filter, Order, SharedStore, StoreError},
};

/// Directed follow edges between users. The edge set is the only record of
/// who follows whom; nothing here is cached.
#[derive(Clone)]
pub struct FollowGraph {
    store: SharedStore,
    profiles: ProfileDirectory,
}

fn edge(follower_id: Uuid, following_id: Uuid) -> [Filter; 2] {
    [
        Filter::Eq("follower_id", follower_id.into()),
        Filter::Eq("following_id", following_id.into()),
    ]
}

impl FollowGraph {
    pub fn new(store: SharedStore) -> Self {
        Self {
            profiles: ProfileDirectory::new(store.clone()),
            store,
        }
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> FeedResult<bool> {
        let rows = self
            .store
            .query(
                Entity::Follows,
                &edge(follower_id, following_id),
                &[],
                Some(1),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Follow if not following, unfollow otherwise. Self-follow is not
    /// rejected here; callers never offer the control on one's own profile.
    pub async fn toggle(&self, follower_id: Uuid, following_id: Uuid) -> FeedResult<FollowState> {
        if self.is_following(follower_id, following_id).await? {
            self.store
                .delete(Entity::Follows, &edge(follower_id, following_id))
                .await
                .map_err(|e| {
                    error!("Failed to unfollow: {:?}", e);
                    e
                })?;
            debug!(%follower_id, %following_id, "unfollowed");
            return Ok(FollowState { following: false });
        }

        let inserted = self
            .store
            .insert(
                Entity::Follows,
                vec![
                    ("follower_id", follower_id.into()),
                    ("following_id", following_id.into()),
                ],
            )
            .await;

        match inserted {
            Ok(_) => debug!(%follower_id, %following_id, "followed"),
            // Another device won the race; the edge exists either way.
            Err(StoreError::Conflict(_)) => {}
            Err(e) => {
                error!("Failed to follow: {:?}", e);
                return Err(e.into());
            }
        }
        Ok(FollowState { following: true })
    }

    pub async fn counts(&self, user_id: Uuid) -> FeedResult<FollowCounts> {
        let followers = self
            .store
            .query(
                Entity::Follows,
                &[Filter::Eq("following_id", user_id.into())],
                &[],
                None,
            )
            .await?
            .len() as u64;
        let following = self
            .store
            .query(
                Entity::Follows,
                &[Filter::Eq("follower_id", user_id.into())],
                &[],
                None,
            )
            .await?
            .len() as u64;

        Ok(FollowCounts {
            followers,
            following,
        })
    }

    /// Profiles following `user_id`, most recent follow first.
    pub async fn followers(&self, user_id: Uuid) -> FeedResult<Vec<Profile>> {
        let edges = self.edges("following_id", user_id).await?;
        let ids: Vec<Uuid> = edges.iter().map(|e| e.follower_id).collect();
        self.profiles_in_order(&ids).await
    }

    /// Profiles `user_id` follows, most recent follow first.
    pub async fn following(&self, user_id: Uuid) -> FeedResult<Vec<Profile>> {
        let edges = self.edges("follower_id", user_id).await?;
        let ids: Vec<Uuid> = edges.iter().map(|e| e.following_id).collect();
        self.profiles_in_order(&ids).await
    }

    /// Which of `candidates` the viewer currently follows.
    pub async fn followed_among(
        &self,
        viewer: Uuid,
        candidates: &[Uuid],
    ) -> FeedResult<HashSet<Uuid>> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = self
            .store
            .query(
                Entity::Follows,
                &[
                    Filter::Eq("follower_id", viewer.into()),
                    Filter::In("following_id", candidates.to_vec()),
                ],
                &[],
                None,
            )
            .await?;
        Ok(store::decode::<FollowEdge>(rows)?
            .into_iter()
            .map(|e| e.following_id)
            .collect())
    }

    async fn edges(&self, side: &'static str, user_id: Uuid) -> FeedResult<Vec<FollowEdge>> {
        let rows = self
            .store
            .query(
                Entity::Follows,
                &[Filter::Eq(side, user_id.into())],
                &[Order::desc("created_at")],
                None,
            )
            .await?;
        Ok(store::decode(rows)?)
    }

    async fn profiles_in_order(&self, ids: &[Uuid]) -> FeedResult<Vec<Profile>> {
        let mut by_id = self.profiles.by_ids(ids).await?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
