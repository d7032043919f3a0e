use tracing::{debug, error};
use uuid::Uuid;
use validator::Validate;

use crate::{
    anonymity,
    error::{FeedError, FeedResult},
    posts::{CreatePost, NewPost, Post},
    store::{self, Entity, Filter, SharedStore},
    tags,
};

/// Post creation and author-initiated deletion. Posts are never edited.
#[derive(Clone)]
pub struct PostService {
    store: SharedStore,
}

impl PostService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, author_id: Uuid, payload: CreatePost) -> FeedResult<Post> {
        let hobby_tags =
            tags::parse_tags(&payload.hobby_tags).map_err(|e| FeedError::Validation(e.to_string()))?;
        let new = NewPost {
            content: payload.content.trim().to_string(),
            is_anonymous: payload.is_anonymous,
            hobby_tags,
        };
        new.validate()
            .map_err(|e| FeedError::Validation(e.to_string()))?;

        let row = self
            .store
            .insert(
                Entity::Posts,
                vec![
                    ("author_id", author_id.into()),
                    ("content", new.content.into()),
                    ("is_anonymous", new.is_anonymous.into()),
                    (
                        "hobby_tags",
                        new.hobby_tags
                            .iter()
                            .map(|t| t.id().to_string())
                            .collect::<Vec<_>>()
                            .into(),
                    ),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to create post: {:?}", e);
                FeedError::from(e)
            })?;

        let post: Post = store::decode_one(row)?;
        debug!(post_id = %post.id, "post created");
        Ok(post)
    }

    pub async fn get(&self, post_id: Uuid) -> FeedResult<Option<Post>> {
        let rows = self
            .store
            .query(Entity::Posts, &[Filter::Eq("id", post_id.into())], &[], Some(1))
            .await?;
        Ok(store::decode::<Post>(rows)?.into_iter().next())
    }

    /// Delete a post on behalf of `requester`, who must be its true author
    /// whether or not it was posted anonymously. Reactions and comments go
    /// with it through the store's cascade.
    pub async fn delete(&self, post_id: Uuid, requester: Uuid) -> FeedResult<()> {
        let post = self
            .get(post_id)
            .await?
            .ok_or_else(|| FeedError::NotFound("Post not found".to_string()))?;

        if !anonymity::can_delete(post.author_id, Some(requester)) {
            return Err(FeedError::Permission(
                "Only the author can delete this post".to_string(),
            ));
        }

        let removed = self
            .store
            .delete(
                Entity::Posts,
                &[
                    Filter::Eq("id", post_id.into()),
                    Filter::Eq("author_id", requester.into()),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to delete post: {:?}", e);
                FeedError::from(e)
            })?;

        if removed == 0 {
            return Err(FeedError::NotFound("Post not found".to_string()));
        }
        debug!(%post_id, "post deleted");
        Ok(())
    }
}
