use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Direction, Entity, Filter, Order, Row, Store, StoreError, Value};

/// [`Store`] over a Postgres pool. Every statement is built with bound
/// parameters; column names only ever come from the crate's own constants.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn query(
        &self,
        entity: Entity,
        filters: &[Filter],
        order: &[Order],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
        qb.push(entity.table()).push(" t");
        push_filters(&mut qb, filters);

        for (i, o) in order.iter().enumerate() {
            qb.push(if i == 0 { " ORDER BY " } else { ", " });
            qb.push(column(o.field));
            qb.push(match o.direction {
                Direction::Asc => " ASC",
                Direction::Desc => " DESC",
            });
        }
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        qb.build_query_scalar::<serde_json::Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert(
        &self,
        entity: Entity,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<Row, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(entity.table()).push(" AS t (");
        for (i, (name, _)) in fields.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{}\"", name));
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING to_jsonb(t)");

        qb.build_query_scalar::<serde_json::Value>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, entity: Entity, filters: &[Filter]) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(entity.table()).push(" t");
        push_filters(&mut qb, filters);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

fn column(field: &str) -> String {
    format!("t.\"{}\"", field)
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Uuid(id) => qb.push_bind(id),
        Value::Text(text) => qb.push_bind(text),
        Value::Bool(flag) => qb.push_bind(flag),
        Value::Timestamp(at) => qb.push_bind(at),
        Value::TextList(items) => qb.push_bind(items),
    };
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq(field, value) => {
                qb.push(column(field)).push(" = ");
                push_value(qb, value.clone());
            }
            Filter::Contains(field, item) => {
                qb.push(column(field))
                    .push(" @> ")
                    .push_bind(vec![item.clone()]);
            }
            Filter::In(field, ids) => {
                qb.push(column(field))
                    .push(" = ANY(")
                    .push_bind(ids.clone())
                    .push(")");
            }
            Filter::Before([a, b], [x, y]) => {
                qb.push(format!("({}, {}) < (", column(a), column(b)));
                push_value(qb, x.clone());
                qb.push(", ");
                push_value(qb, y.clone());
                qb.push(")");
            }
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => StoreError::Conflict(db.message().to_string()),
            Some("23503") => StoreError::MissingReference(db.message().to_string()),
            _ => {
                tracing::error!("Database error: {:?}", err);
                StoreError::Unavailable(db.message().to_string())
            }
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Malformed(err.to_string())
        }
        _ => {
            tracing::error!("Database error: {:?}", err);
            StoreError::Unavailable(err.to_string())
        }
    }
}
