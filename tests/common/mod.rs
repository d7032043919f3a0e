#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quietfeed::store::{
    Entity, Filter, MemoryStore, Order, Row, SharedStore, Store, StoreError, Value,
};
use uuid::Uuid;

pub fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

/// A memory store that can be switched into an outage: while down, every
/// call fails with [`StoreError::Unavailable`].
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn query(
        &self,
        entity: Entity,
        filters: &[Filter],
        order: &[Order],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        self.check()?;
        self.inner.query(entity, filters, order, limit).await
    }

    async fn insert(
        &self,
        entity: Entity,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<Row, StoreError> {
        self.check()?;
        self.inner.insert(entity, fields).await
    }

    async fn delete(&self, entity: Entity, filters: &[Filter]) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.delete(entity, filters).await
    }
}

/// A [`FlakyStore`] and the same store as a [`SharedStore`] for the services.
pub fn flaky_store() -> (Arc<FlakyStore>, SharedStore) {
    let flaky = Arc::new(FlakyStore::default());
    let shared: SharedStore = flaky.clone();
    (flaky, shared)
}

pub async fn seed_profile(store: &SharedStore, username: &str, display_name: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    let mut fields = vec![("id", Value::from(id)), ("username", Value::from(username))];
    if let Some(name) = display_name {
        fields.push(("display_name", name.into()));
        fields.push(("avatar_url", format!("https://img.example/{username}.png").into()));
    }
    store.insert(Entity::Profiles, fields).await.unwrap();
    id
}

/// Insert a post row directly, with an explicit id and timestamp so ties can
/// be produced on purpose.
pub async fn seed_post_at(
    store: &SharedStore,
    author: Uuid,
    id: Uuid,
    created_at: DateTime<Utc>,
    tags: &[&str],
    is_anonymous: bool,
) -> Uuid {
    store
        .insert(
            Entity::Posts,
            vec![
                ("id", id.into()),
                ("author_id", author.into()),
                ("content", format!("post {id}").into()),
                ("is_anonymous", is_anonymous.into()),
                (
                    "hobby_tags",
                    tags.iter().map(|t| t.to_string()).collect::<Vec<_>>().into(),
                ),
                ("created_at", created_at.into()),
            ],
        )
        .await
        .unwrap();
    id
}
