use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, error, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    anonymity,
    comments::{Comment, EnrichedComment, NewComment},
    error::{FeedError, FeedResult},
    profiles::ProfileDirectory,
    store::{self, Entity, Filter, Order, SharedStore},
};

/// Flat, oldest-first comment list under a single post.
#[derive(Clone)]
pub struct CommentThread {
    store: SharedStore,
    profiles: ProfileDirectory,
}

#[derive(Deserialize)]
struct CommentRef {
    post_id: Uuid,
}

impl CommentThread {
    pub fn new(store: SharedStore) -> Self {
        Self {
            profiles: ProfileDirectory::new(store.clone()),
            store,
        }
    }

    /// Comments on a post, oldest first. A store failure yields an empty list
    /// so the post stays renderable.
    pub async fn list(&self, post_id: Uuid) -> Vec<EnrichedComment> {
        match self.try_list(post_id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(%post_id, "Comment list unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_list(&self, post_id: Uuid) -> FeedResult<Vec<EnrichedComment>> {
        let rows = self
            .store
            .query(
                Entity::Comments,
                &[Filter::Eq("post_id", post_id.into())],
                &[Order::asc("created_at")],
                None,
            )
            .await?;
        let comments: Vec<Comment> = store::decode(rows)?;

        let mut named: Vec<Uuid> = comments
            .iter()
            .filter(|c| !c.is_anonymous)
            .map(|c| c.author_id)
            .collect();
        named.sort_unstable();
        named.dedup();
        let profiles = self.profiles.by_ids(&named).await?;

        Ok(comments
            .into_iter()
            .map(|comment| {
                let author = if comment.is_anonymous {
                    None
                } else {
                    profiles.get(&comment.author_id).cloned()
                };
                EnrichedComment { comment, author }
            })
            .collect())
    }

    pub async fn create(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
        is_anonymous: bool,
    ) -> FeedResult<EnrichedComment> {
        let new = NewComment {
            content: content.trim().to_string(),
        };
        new.validate()
            .map_err(|e| FeedError::Validation(e.to_string()))?;

        let row = self
            .store
            .insert(
                Entity::Comments,
                vec![
                    ("post_id", post_id.into()),
                    ("author_id", author_id.into()),
                    ("content", new.content.into()),
                    ("is_anonymous", is_anonymous.into()),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to create comment: {:?}", e);
                FeedError::from(e)
            })?;
        let comment: Comment = store::decode_one(row)?;

        let author = if comment.is_anonymous {
            None
        } else {
            self.profiles.get(author_id).await?
        };
        Ok(EnrichedComment { comment, author })
    }

    /// Delete a comment on behalf of `requester`, who must be its true author.
    pub async fn delete(&self, comment_id: Uuid, requester: Uuid) -> FeedResult<()> {
        let comment = self
            .get(comment_id)
            .await?
            .ok_or_else(|| FeedError::NotFound("Comment not found".to_string()))?;

        if !anonymity::can_delete(comment.author_id, Some(requester)) {
            return Err(FeedError::Permission(
                "Only the author can delete this comment".to_string(),
            ));
        }

        let removed = self
            .store
            .delete(
                Entity::Comments,
                &[
                    Filter::Eq("id", comment_id.into()),
                    Filter::Eq("author_id", requester.into()),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to delete comment: {:?}", e);
                FeedError::from(e)
            })?;

        if removed == 0 {
            return Err(FeedError::NotFound("Comment not found".to_string()));
        }
        debug!(%comment_id, "comment deleted");
        Ok(())
    }

    async fn get(&self, comment_id: Uuid) -> FeedResult<Option<Comment>> {
        let rows = self
            .store
            .query(
                Entity::Comments,
                &[Filter::Eq("id", comment_id.into())],
                &[],
                Some(1),
            )
            .await?;
        Ok(store::decode::<Comment>(rows)?.into_iter().next())
    }

    /// Comment totals for a batch of posts; posts without comments are absent.
    pub async fn counts_for(&self, post_ids: &[Uuid]) -> FeedResult<HashMap<Uuid, usize>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self
            .store
            .query(
                Entity::Comments,
                &[Filter::In("post_id", post_ids.to_vec())],
                &[],
                None,
            )
            .await?;

        let mut counts = HashMap::new();
        for r in store::decode::<CommentRef>(rows)? {
            *counts.entry(r.post_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
