use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use super::{Direction, Entity, Filter, Order, Row, Store, StoreError, Value};

type Record = BTreeMap<&'static str, Value>;

/// (child entity, child column, parent entity). Deleting a parent cascades.
const FOREIGN_KEYS: &[(Entity, &str, Entity)] = &[
    (Entity::Posts, "author_id", Entity::Profiles),
    (Entity::Comments, "post_id", Entity::Posts),
    (Entity::Comments, "author_id", Entity::Profiles),
    (Entity::Reactions, "post_id", Entity::Posts),
    (Entity::Reactions, "user_id", Entity::Profiles),
    (Entity::Follows, "follower_id", Entity::Profiles),
    (Entity::Follows, "following_id", Entity::Profiles),
];

#[derive(Default)]
struct Tables {
    rows: HashMap<Entity, Vec<Record>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Tables {
    fn table(&self, entity: Entity) -> &[Record] {
        self.rows.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Strictly increasing, microsecond precision like a `timestamptz` column.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(at);
        at
    }

    fn remove_matching(&mut self, entity: Entity, filters: &[Filter]) -> u64 {
        let Some(table) = self.rows.get_mut(&entity) else {
            return 0;
        };
        let (removed, kept): (Vec<Record>, Vec<Record>) = table
            .drain(..)
            .partition(|record| filters.iter().all(|f| matches(record, f)));
        *table = kept;

        for record in &removed {
            let Some(Value::Uuid(id)) = record.get("id").cloned() else {
                continue;
            };
            for (child, column, parent) in FOREIGN_KEYS {
                if *parent == entity {
                    self.remove_matching(*child, &[Filter::Eq(*column, Value::Uuid(id))]);
                }
            }
        }
        removed.len() as u64
    }
}

/// In-process [`Store`] with the same unique keys, foreign keys and cascades
/// as the Postgres schema. Used by the test suite and by local runs without
/// `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(
        &self,
        entity: Entity,
        filters: &[Filter],
        order: &[Order],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        let tables = self.lock()?;
        let mut hits: Vec<&Record> = tables
            .table(entity)
            .iter()
            .filter(|record| filters.iter().all(|f| matches(record, f)))
            .collect();

        hits.sort_by(|a, b| {
            order
                .iter()
                .map(|o| {
                    let ord = compare(a.get(o.field), b.get(o.field));
                    match o.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(hits
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(to_row)
            .collect())
    }

    async fn insert(
        &self,
        entity: Entity,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<Row, StoreError> {
        let mut tables = self.lock()?;
        let mut record: Record = fields.into_iter().collect();

        if entity.unique_key() == ["id"] && !record.contains_key("id") {
            record.insert("id", Value::Uuid(Uuid::new_v4()));
        }
        if !record.contains_key("created_at") {
            let at = tables.next_created_at();
            record.insert("created_at", Value::Timestamp(at));
        }

        for (child, column, parent) in FOREIGN_KEYS {
            if *child != entity {
                continue;
            }
            let Some(value) = record.get(column) else {
                continue;
            };
            if !tables.table(*parent).iter().any(|p| p.get("id") == Some(value)) {
                return Err(StoreError::MissingReference(format!(
                    "{}.{} -> {}",
                    entity.table(),
                    column,
                    parent.table()
                )));
            }
        }

        let key = entity.unique_key();
        let taken = tables
            .table(entity)
            .iter()
            .any(|existing| key.iter().all(|col| existing.get(col) == record.get(col)));
        if taken {
            return Err(StoreError::Conflict(format!(
                "{} ({})",
                entity.table(),
                key.join(", ")
            )));
        }

        let row = to_row(&record);
        tables.rows.entry(entity).or_default().push(record);
        Ok(row)
    }

    async fn delete(&self, entity: Entity, filters: &[Filter]) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables.remove_matching(entity, filters))
    }
}

fn matches(record: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(field, value) => record.get(field) == Some(value),
        Filter::Contains(field, item) => {
            matches!(record.get(field), Some(Value::TextList(items)) if items.contains(item))
        }
        Filter::In(field, ids) => {
            matches!(record.get(field), Some(Value::Uuid(id)) if ids.contains(id))
        }
        Filter::Before([a, b], [x, y]) => match compare(record.get(a), Some(x)) {
            Ordering::Less => true,
            Ordering::Equal => compare(record.get(b), Some(y)) == Ordering::Less,
            Ordering::Greater => false,
        },
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn to_row(record: &Record) -> Row {
    let object: serde_json::Map<String, serde_json::Value> = record
        .iter()
        .map(|(column, value)| (column.to_string(), value.to_json()))
        .collect();
    serde_json::Value::Object(object)
}
