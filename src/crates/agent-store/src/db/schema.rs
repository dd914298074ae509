//! Table schemas for storable records
//!
//! Each record type declares a static [`TableSchema`]. The schema drives both
//! DDL generation for the schema manager and SQL generation for the record
//! access engine, so the column list lives in exactly one place.

use crate::db::Dialect;

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// UTF-8 text (identifiers, timestamps, JSON payloads)
    Text,
    /// 64-bit signed integer
    BigInt,
    /// Backend-generated 64-bit key; never written by the engine
    Serial,
}

/// A single table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Text,
            nullable: false,
        }
    }

    pub const fn nullable_text(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Text,
            nullable: true,
        }
    }

    pub const fn big_int(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::BigInt,
            nullable: false,
        }
    }

    pub const fn serial(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Serial,
            nullable: false,
        }
    }

    /// Whether the engine supplies a value for this column on insert
    pub fn is_writable(&self) -> bool {
        self.column_type != ColumnType::Serial
    }

    fn definition(&self, dialect: Dialect) -> String {
        match (self.column_type, dialect) {
            (ColumnType::Serial, Dialect::Sqlite) => {
                format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name)
            }
            (ColumnType::Serial, Dialect::Postgres) => format!("{} BIGSERIAL PRIMARY KEY", self.name),
            (column_type, _) => {
                let sql_type = match column_type {
                    ColumnType::BigInt => "BIGINT",
                    _ => "TEXT",
                };
                if self.nullable {
                    format!("{} {}", self.name, sql_type)
                } else {
                    format!("{} {} NOT NULL", self.name, sql_type)
                }
            }
        }
    }
}

/// A secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Table layout for one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub indexes: &'static [Index],
}

impl TableSchema {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Columns written on insert, in bind order
    pub fn writable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_writable())
    }

    fn has_serial_key(&self) -> bool {
        self.primary_key.len() == 1
            && self
                .column(self.primary_key[0])
                .map(|c| c.column_type == ColumnType::Serial)
                .unwrap_or(false)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(|c| c.definition(dialect)).collect();
        if !self.has_serial_key() {
            parts.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            parts.join(", ")
        )
    }

    /// `CREATE INDEX IF NOT EXISTS` statements for this table
    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({})",
                    self.name,
                    index.name,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }

    /// `DROP TABLE IF EXISTS` statement for this table
    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COMPOSITE: TableSchema = TableSchema {
        name: "widgets",
        columns: &[
            Column::text("id"),
            Column::text("owner"),
            Column::nullable_text("label"),
            Column::big_int("position"),
        ],
        primary_key: &["id", "owner"],
        indexes: &[Index {
            name: "owner",
            columns: &["owner"],
        }],
    };

    static SERIAL: TableSchema = TableSchema {
        name: "entries",
        columns: &[Column::serial("id"), Column::text("body")],
        primary_key: &["id"],
        indexes: &[],
    };

    #[test]
    fn test_composite_key_ddl() {
        assert_eq!(
            COMPOSITE.create_table_sql(Dialect::Sqlite),
            "CREATE TABLE IF NOT EXISTS widgets (id TEXT NOT NULL, owner TEXT NOT NULL, \
             label TEXT, position BIGINT NOT NULL, PRIMARY KEY (id, owner))"
        );
    }

    #[test]
    fn test_serial_key_per_dialect() {
        assert_eq!(
            SERIAL.create_table_sql(Dialect::Sqlite),
            "CREATE TABLE IF NOT EXISTS entries (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)"
        );
        assert_eq!(
            SERIAL.create_table_sql(Dialect::Postgres),
            "CREATE TABLE IF NOT EXISTS entries (id BIGSERIAL PRIMARY KEY, body TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_index_and_drop_sql() {
        assert_eq!(
            COMPOSITE.create_index_sql(),
            vec!["CREATE INDEX IF NOT EXISTS idx_widgets_owner ON widgets (owner)".to_string()]
        );
        assert_eq!(COMPOSITE.drop_table_sql(), "DROP TABLE IF EXISTS widgets");
    }

    #[test]
    fn test_writable_columns_skip_serial() {
        let names: Vec<_> = SERIAL.writable_columns().map(|c| c.name).collect();
        assert_eq!(names, vec!["body"]);
    }
}
