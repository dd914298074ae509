//! Generic record access engine
//!
//! Implements `get`, `list`, `save`, `delete` (plus a few append helpers) once,
//! for any type implementing [`Storable`]. Every primitive takes
//! `&mut AnyConnection`, so the same call works on a pooled connection or
//! inside a transaction via `&mut *tx`.
//!
//! `save` is a single `INSERT ... ON CONFLICT (<key>) DO UPDATE` statement.
//! Conflict resolution happens inside the backend, which is what keeps
//! concurrent writers to the same key safe without any application lock.

use crate::db::schema::{Column, TableSchema};
use crate::error::{Result, StoreError};
use sqlx::any::AnyRow;
use sqlx::{Any, AnyConnection, FromRow, Row, ValueRef};
use std::fmt;

/// A record type with a backing table
pub trait Storable: for<'r> FromRow<'r, AnyRow> + Send + Unpin {
    /// Table layout for this record type
    fn schema() -> &'static TableSchema;

    /// Backing table name
    fn table_name() -> &'static str {
        Self::schema().name
    }

    /// Values for every writable column, in schema order
    fn values(&self) -> Vec<SqlValue>;
}

/// Read a nullable text column from `row`
///
/// The `Any` driver refuses to decode SQL `NULL` into `Option<String>`, so the
/// raw value is checked before decoding. Record types with nullable columns
/// implement `FromRow` by hand on top of this.
pub fn nullable_text(row: &AnyRow, column: &str) -> sqlx::Result<Option<String>> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    row.try_get::<String, _>(column).map(Some)
}

/// A value bound into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    NullableText(Option<String>),
    BigInt(i64),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::NullableText(Some(v)) => write!(f, "{}", v),
            SqlValue::NullableText(None) => write!(f, "NULL"),
            SqlValue::BigInt(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        SqlValue::NullableText(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Eq(&'static str, SqlValue),
    After(&'static str, SqlValue),
    Contains(String, SqlValue),
}

/// Predicate set for `get`, `list`, `count` and `delete`
///
/// Filters are ANDed equality predicates plus an optional exclusive lower
/// bound. Ordering and limit only apply to `list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match rows where `column = value`
    pub fn eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    /// Match rows where `column > value`
    pub fn after(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filters.push(Filter::After(column, value.into()));
        self
    }

    /// Match rows where the text expression `expr` contains `needle`,
    /// ignoring ASCII case
    ///
    /// `expr` is a column or a backend expression such as
    /// [`Dialect::json_text`](crate::db::Dialect::json_text). `LIKE`
    /// wildcards in `needle` match literally.
    pub fn contains(mut self, expr: impl Into<String>, needle: &str) -> Self {
        let escaped = needle
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        self.filters
            .push(Filter::Contains(expr.into(), SqlValue::Text(format!("%{}%", escaped))));
        self
    }

    /// Append a sort key
    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    /// Append a sort key computed by a backend expression
    pub fn order_by_expr(mut self, expr: impl Into<String>, order: Order) -> Self {
        self.order.push((expr.into(), order));
        self
    }

    /// Cap the number of rows; 0 means unlimited
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Human-readable predicate summary for error messages
    pub fn describe(&self) -> String {
        if self.filters.is_empty() {
            return "<all>".to_string();
        }
        self.filters
            .iter()
            .map(|f| match f {
                Filter::Eq(c, v) => format!("{}={}", c, v),
                Filter::After(c, v) => format!("{}>{}", c, v),
                Filter::Contains(e, v) => format!("{}~{}", e, v),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn where_sql(&self, schema: &TableSchema) -> (String, Vec<SqlValue>) {
        if self.filters.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut clauses = Vec::with_capacity(self.filters.len());
        let mut params = Vec::with_capacity(self.filters.len());
        for (i, filter) in self.filters.iter().enumerate() {
            let n = i + 1;
            let (clause, value) = match filter {
                Filter::Eq(c, v) => (format!("{} = ${}", c, n), v),
                Filter::After(c, v) => (format!("{} > ${}", c, n), v),
                Filter::Contains(e, v) => (format!("LOWER({}) LIKE ${} ESCAPE '\\'", e, n), v),
            };
            if let Filter::Eq(c, _) | Filter::After(c, _) = filter {
                debug_assert!(schema.has_column(c), "unknown column {}", c);
            }
            clauses.push(clause);
            params.push(value.clone());
        }

        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }

    fn order_sql(&self, schema: &TableSchema) -> String {
        let keys: Vec<String> = if self.order.is_empty() {
            // Creation order, with the key as a deterministic tie-breaker
            schema
                .column("created_at")
                .map(|c| c.name)
                .into_iter()
                .chain(schema.primary_key.iter().copied())
                .map(|c| format!("{} ASC", c))
                .collect()
        } else {
            self.order
                .iter()
                .map(|(c, o)| format!("{} {}", c, o.as_sql()))
                .collect()
        };
        format!(" ORDER BY {}", keys.join(", "))
    }
}

macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                SqlValue::Text(v) => query.bind(v),
                SqlValue::NullableText(v) => query.bind(v),
                SqlValue::BigInt(v) => query.bind(v),
            };
        }
        query
    }};
}

fn placeholder(column: &Column, index: usize) -> String {
    // A NULL bound through the Any driver carries no text type on postgres
    if column.nullable {
        format!("CAST(${} AS TEXT)", index)
    } else {
        format!("${}", index)
    }
}

fn insert_sql(schema: &TableSchema) -> String {
    let columns: Vec<&Column> = schema.writable_columns().collect();
    let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| placeholder(c, i + 1))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        names.join(", "),
        placeholders.join(", ")
    )
}

fn upsert_sql(schema: &TableSchema) -> String {
    let updates: Vec<String> = schema
        .writable_columns()
        .filter(|c| !schema.primary_key.contains(&c.name) && c.name != "created_at")
        .map(|c| format!("{} = excluded.{}", c.name, c.name))
        .collect();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "{} ON CONFLICT ({}) {}",
        insert_sql(schema),
        schema.primary_key.join(", "),
        action
    )
}

fn insert_if_absent_sql(schema: &TableSchema) -> String {
    format!(
        "{} ON CONFLICT ({}) DO NOTHING",
        insert_sql(schema),
        schema.primary_key.join(", ")
    )
}

fn record_values<T: Storable>(record: &T) -> Vec<SqlValue> {
    let values = record.values();
    debug_assert_eq!(
        values.len(),
        T::schema().writable_columns().count(),
        "value count mismatch for {}",
        T::table_name()
    );
    values
}

/// Return every record matching `query`
///
/// Without explicit ordering, rows come back by `created_at` ascending.
pub async fn list<T: Storable>(conn: &mut AnyConnection, query: &Query) -> Result<Vec<T>> {
    let schema = T::schema();
    let (where_sql, params) = query.where_sql(schema);
    let mut sql = format!(
        "SELECT * FROM {}{}{}",
        schema.name,
        where_sql,
        query.order_sql(schema)
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let rows = bind_values!(sqlx::query_as::<Any, T>(&sql), params)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Return the first record matching `query`, if any
pub async fn find<T: Storable>(conn: &mut AnyConnection, query: &Query) -> Result<Option<T>> {
    let mut first = list::<T>(conn, &query.clone().limit(1)).await?;
    Ok(if first.is_empty() {
        None
    } else {
        Some(first.swap_remove(0))
    })
}

/// Return the first record matching `query`, or `NotFound`
pub async fn get<T: Storable>(conn: &mut AnyConnection, query: &Query) -> Result<T> {
    find::<T>(conn, query).await?.ok_or_else(|| {
        StoreError::not_found(format!("{} where {}", T::table_name(), query.describe()))
    })
}

/// Insert `record`, replacing every non-key column if the key already exists
pub async fn save<T: Storable>(conn: &mut AnyConnection, record: &T) -> Result<()> {
    let sql = upsert_sql(T::schema());
    bind_values!(sqlx::query::<Any>(&sql), record_values(record))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Append `record`; used for tables with a generated key
pub async fn insert<T: Storable>(conn: &mut AnyConnection, record: &T) -> Result<()> {
    let sql = insert_sql(T::schema());
    bind_values!(sqlx::query::<Any>(&sql), record_values(record))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Insert `record` unless its key exists; returns whether a row was written
pub async fn insert_if_absent<T: Storable>(conn: &mut AnyConnection, record: &T) -> Result<bool> {
    let sql = insert_if_absent_sql(T::schema());
    let result = bind_values!(sqlx::query::<Any>(&sql), record_values(record))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every record matching `query`; returns the number removed
pub async fn delete<T: Storable>(conn: &mut AnyConnection, query: &Query) -> Result<u64> {
    let schema = T::schema();
    let (where_sql, params) = query.where_sql(schema);
    let sql = format!("DELETE FROM {}{}", schema.name, where_sql);
    let result = bind_values!(sqlx::query::<Any>(&sql), params)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Count records matching `query`
pub async fn count<T: Storable>(conn: &mut AnyConnection, query: &Query) -> Result<i64> {
    let schema = T::schema();
    let (where_sql, params) = query.where_sql(schema);
    let sql = format!("SELECT COUNT(*) FROM {}{}", schema.name, where_sql);
    let count = bind_values!(sqlx::query_scalar::<Any, i64>(&sql), params)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
