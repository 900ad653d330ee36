//! # Statement Builder
//!
//! Assembles the SQL that crosses the execution channel: text with plain
//! `?` placeholders plus a parallel list of positional parameters. Every
//! identifier is resolved against the schema registry first, so a typo or
//! a stale column name fails before anything is dispatched.
//!
//! ## Statement Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Select::new(entity)      SELECT "t"."a", ...  [LEFT JOIN ...]          │
//! │    .left_join(..)           [WHERE "t"."c" = ? AND ...]                 │
//! │    .filter(..)                                                          │
//! │                                                                         │
//! │  insert(entity, rec)      INSERT INTO "t" (..) VALUES (..)              │
//! │                             RETURNING <all columns>                     │
//! │  update(entity, id, p)    UPDATE "t" SET .. WHERE "id" = ?              │
//! │                             RETURNING <all columns>                     │
//! │  delete(entity, id)       DELETE FROM "t" WHERE "id" = ? RETURNING "id" │
//! │  increment(..)            UPDATE "t" SET "c" = "c" + ? .. RETURNING "id"│
//! │  clear_reference(..)      UPDATE child SET ref = NULL WHERE ref = ?     │
//! │  delete_by_reference(..)  DELETE FROM child WHERE ref = ?               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes RETURN their row so "did anything match" is answered by the
//! result itself. The channel runs everything through one fetch path, and
//! an update or delete that matched nothing simply returns no rows.
//!
//! No ORDER BY support: listings ride on rowid order and callers sort
//! client-side where presentation demands it.

use serde::Serialize;
use serde_json::Value;

use crate::codec::{self, OutputColumn};
use crate::error::{DbError, DbResult};
use crate::schema::{require_column, ColumnDef, ColumnType, Entity, TableDef};

// =============================================================================
// Statements
// =============================================================================

/// One executable statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// A statement with no parameters (DDL, fixed queries).
    pub fn raw(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// A statement whose result rows have a known column shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedStatement {
    pub statement: Statement,
    pub columns: Vec<OutputColumn>,
}

/// Comparison operators accepted by [`Select::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    fn sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Ne => "<>",
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Gt => ">",
            Cmp::Ge => ">=",
        }
    }
}

// =============================================================================
// Select Builder
// =============================================================================

#[derive(Debug)]
struct Output {
    table: &'static str,
    column: &'static ColumnDef,
    alias: Option<&'static str>,
}

#[derive(Debug)]
struct Join {
    parent: Entity,
    on_column: &'static str,
}

#[derive(Debug)]
struct Filter {
    column: &'static str,
    cmp: Cmp,
    value: Value,
}

/// Builder for SELECT statements over one entity, with optional left joins
/// along declared references.
///
/// Starts out selecting every base column in registry order; `columns`
/// narrows the projection, `join_column` widens it with parent columns.
#[derive(Debug)]
pub struct Select {
    entity: Entity,
    outputs: Vec<Output>,
    joins: Vec<Join>,
    filters: Vec<Filter>,
}

impl Select {
    pub fn new(entity: Entity) -> Self {
        let table = entity.table();
        let outputs = table
            .columns
            .iter()
            .map(|column| Output {
                table: table.name,
                column,
                alias: None,
            })
            .collect();
        Select {
            entity,
            outputs,
            joins: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Replaces the projection with the named base columns.
    pub fn columns(mut self, names: &[&str]) -> DbResult<Self> {
        let table = self.entity.table();
        let mut outputs = Vec::with_capacity(names.len());
        for name in names {
            outputs.push(Output {
                table: table.name,
                column: require_column(self.entity, name)?,
                alias: None,
            });
        }
        self.outputs = outputs;
        Ok(self)
    }

    /// Left-joins `parent` along the declared reference. The join alone
    /// adds no output columns; follow with [`Select::join_column`].
    pub fn left_join(mut self, parent: Entity) -> DbResult<Self> {
        let table = self.entity.table();
        let reference = table
            .reference_to(parent)
            .ok_or_else(|| no_reference(table, parent))?;
        self.joins.push(Join {
            parent,
            on_column: reference.column,
        });
        Ok(self)
    }

    /// Adds a joined parent column to the projection under its own name.
    pub fn join_column(self, parent: Entity, column: &str) -> DbResult<Self> {
        self.push_join_column(parent, column, None)
    }

    /// Adds a joined parent column to the projection under `alias`.
    pub fn join_column_as(
        self,
        parent: Entity,
        column: &str,
        alias: &'static str,
    ) -> DbResult<Self> {
        self.push_join_column(parent, column, Some(alias))
    }

    fn push_join_column(
        mut self,
        parent: Entity,
        column: &str,
        alias: Option<&'static str>,
    ) -> DbResult<Self> {
        if !self.joins.iter().any(|j| j.parent == parent) {
            return Err(DbError::InvalidStatement {
                table: self.entity.table().name,
                reason: format!("\"{}\" is not joined", parent.table_name()),
            });
        }
        self.outputs.push(Output {
            table: parent.table_name(),
            column: require_column(parent, column)?,
            alias,
        });
        Ok(self)
    }

    /// Adds a WHERE clause on a base column. Multiple filters AND together.
    pub fn filter(mut self, column: &str, cmp: Cmp, value: Value) -> DbResult<Self> {
        let def = require_column(self.entity, column)?;
        self.filters.push(Filter {
            column: def.name,
            cmp,
            value,
        });
        Ok(self)
    }

    pub fn build(self) -> TypedStatement {
        let Select {
            entity,
            outputs,
            joins,
            filters,
        } = self;
        let table = entity.table();

        let projection: Vec<String> = outputs
            .iter()
            .map(|o| {
                let mut expr = format!("\"{}\".\"{}\"", o.table, o.column.name);
                if let Some(alias) = o.alias {
                    expr.push_str(&format!(" AS \"{alias}\""));
                }
                expr
            })
            .collect();

        let mut sql = format!("SELECT {} FROM \"{}\"", projection.join(", "), table.name);
        for join in &joins {
            let parent = join.parent.table();
            sql.push_str(&format!(
                " LEFT JOIN \"{}\" ON \"{}\".\"{}\" = \"{}\".\"{}\"",
                parent.name,
                table.name,
                join.on_column,
                parent.name,
                parent.primary_key()
            ));
        }

        let mut params = Vec::with_capacity(filters.len());
        if !filters.is_empty() {
            let clauses: Vec<String> = filters
                .iter()
                .map(|f| format!("\"{}\".\"{}\" {} ?", table.name, f.column, f.cmp.sql()))
                .collect();
            sql.push_str(&format!(" WHERE {}", clauses.join(" AND ")));
            params.extend(filters.into_iter().map(|f| f.value));
        }

        let columns = outputs
            .iter()
            .map(|o| match o.alias {
                Some(alias) => OutputColumn::joined(alias, o.column.ty),
                // Joined columns are nullable even when their home table
                // says otherwise: a LEFT JOIN may find no parent row
                None if o.table != table.name => OutputColumn::joined(o.column.name, o.column.ty),
                None => OutputColumn::from_def(o.column),
            })
            .collect();

        TypedStatement {
            statement: Statement { sql, params },
            columns,
        }
    }
}

// =============================================================================
// Write Statements
// =============================================================================

/// INSERT built from a typed payload, returning the stored row.
pub fn insert<T: Serialize>(entity: Entity, record: &T) -> DbResult<TypedStatement> {
    let table = entity.table();
    let encoded = codec::encode_insert(entity, record)?;

    let column_list: Vec<String> = encoded.columns.iter().map(|c| format!("\"{c}\"")).collect();
    let placeholders = vec!["?"; encoded.values.len()].join(", ");
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING {}",
        table.name,
        column_list.join(", "),
        placeholders,
        returning_list(table)
    );

    Ok(TypedStatement {
        statement: Statement {
            sql,
            params: encoded.values,
        },
        columns: all_output_columns(table),
    })
}

/// UPDATE built from a typed patch, returning the stored row.
///
/// No matching row means no returned row; callers turn that into their
/// not-found error.
pub fn update<T: Serialize>(entity: Entity, id: i64, patch: &T) -> DbResult<TypedStatement> {
    let table = entity.table();
    let encoded = codec::encode_patch(entity, patch)?;

    let assignments: Vec<String> = encoded
        .columns
        .iter()
        .map(|c| format!("\"{c}\" = ?"))
        .collect();
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ? RETURNING {}",
        table.name,
        assignments.join(", "),
        table.primary_key(),
        returning_list(table)
    );

    let mut params = encoded.values;
    params.push(Value::from(id));
    Ok(TypedStatement {
        statement: Statement { sql, params },
        columns: all_output_columns(table),
    })
}

/// DELETE by primary key, returning the deleted id (empty means no match).
pub fn delete(entity: Entity, id: i64) -> Statement {
    let table = entity.table();
    let pk = table.primary_key();
    Statement {
        sql: format!(
            "DELETE FROM \"{}\" WHERE \"{pk}\" = ? RETURNING \"{pk}\"",
            table.name
        ),
        params: vec![Value::from(id)],
    }
}

/// DELETE every `child` row whose reference points at `parent_id`.
/// Matching zero rows is a legitimate outcome, so nothing is returned.
pub fn delete_by_reference(child: Entity, parent: Entity, parent_id: i64) -> DbResult<Statement> {
    let table = child.table();
    let reference = table
        .reference_to(parent)
        .ok_or_else(|| no_reference(table, parent))?;
    Ok(Statement {
        sql: format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = ?",
            table.name, reference.column
        ),
        params: vec![Value::from(parent_id)],
    })
}

/// Sets every `child` reference pointing at `parent_id` to NULL, touching
/// `updated_at` where the child tracks it.
pub fn clear_reference(child: Entity, parent: Entity, parent_id: i64) -> DbResult<Statement> {
    let table = child.table();
    let reference = table
        .reference_to(parent)
        .ok_or_else(|| no_reference(table, parent))?;

    let mut sql = format!(
        "UPDATE \"{}\" SET \"{}\" = NULL",
        table.name, reference.column
    );
    let mut params = Vec::new();
    if table.column("updated_at").is_some() {
        sql.push_str(", \"updated_at\" = ?");
        params.push(codec::now_value());
    }
    sql.push_str(&format!(" WHERE \"{}\" = ?", reference.column));
    params.push(Value::from(parent_id));
    Ok(Statement { sql, params })
}

/// Adds `delta` to a numeric column in place.
///
/// The read-modify-write happens inside the store, so concurrent deltas
/// against the same row compose instead of overwriting each other.
pub fn increment(entity: Entity, id: i64, column: &str, delta: f64) -> DbResult<Statement> {
    let table = entity.table();
    let def = require_column(entity, column)?;
    if !matches!(def.ty, ColumnType::Integer | ColumnType::Real) {
        return Err(DbError::InvalidStatement {
            table: table.name,
            reason: format!("column \"{}\" is not numeric", def.name),
        });
    }
    if !delta.is_finite() {
        return Err(DbError::InvalidValue {
            table: table.name,
            column: def.name.to_string(),
            expected: "REAL",
        });
    }

    let mut sql = format!(
        "UPDATE \"{}\" SET \"{}\" = \"{}\" + ?",
        table.name, def.name, def.name
    );
    let mut params = vec![Value::from(delta)];
    if table.column("updated_at").is_some() {
        sql.push_str(", \"updated_at\" = ?");
        params.push(codec::now_value());
    }
    let pk = table.primary_key();
    sql.push_str(&format!(" WHERE \"{pk}\" = ? RETURNING \"{pk}\""));
    params.push(Value::from(id));
    Ok(Statement { sql, params })
}

/// SELECT COUNT(*) over a table; decode with
/// [`codec::decode_scalar_i64`](crate::codec::decode_scalar_i64).
pub fn count(entity: Entity) -> Statement {
    Statement::raw(format!("SELECT COUNT(*) FROM \"{}\"", entity.table_name()))
}

fn returning_list(table: &TableDef) -> String {
    table
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn all_output_columns(table: &'static TableDef) -> Vec<OutputColumn> {
    table.columns.iter().map(OutputColumn::from_def).collect()
}

fn no_reference(table: &'static TableDef, parent: Entity) -> DbError {
    DbError::InvalidStatement {
        table: table.name,
        reason: format!("no declared reference to \"{}\"", parent.table_name()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kfet_core::{CustomerPatch, NewCategory};
    use serde_json::json;

    #[test]
    fn test_select_all_columns() {
        let stmt = Select::new(Entity::Category).build();
        assert_eq!(
            stmt.statement.sql,
            "SELECT \"categories\".\"id\", \"categories\".\"name\", \"categories\".\"dept\", \
             \"categories\".\"year\", \"categories\".\"created_at\", \"categories\".\"updated_at\" \
             FROM \"categories\""
        );
        assert!(stmt.statement.params.is_empty());
        assert_eq!(stmt.columns.len(), 6);
    }

    #[test]
    fn test_select_with_join_and_aliases() {
        let stmt = Select::new(Entity::Customer)
            .left_join(Entity::Category)
            .unwrap()
            .join_column(Entity::Category, "dept")
            .unwrap()
            .join_column(Entity::Category, "year")
            .unwrap()
            .join_column_as(Entity::Category, "name", "categoryName")
            .unwrap()
            .build();

        assert!(stmt.statement.sql.starts_with("SELECT \"customers\".\"id\""));
        assert!(stmt
            .statement
            .sql
            .contains("\"categories\".\"name\" AS \"categoryName\""));
        assert!(stmt.statement.sql.ends_with(
            "LEFT JOIN \"categories\" ON \"customers\".\"categoryId\" = \"categories\".\"id\""
        ));

        let joined: Vec<_> = stmt.columns.iter().rev().take(3).rev().collect();
        assert_eq!(joined[0].name, "dept");
        assert_eq!(joined[2].name, "categoryName");
        assert!(joined.iter().all(|c| c.nullable));
    }

    #[test]
    fn test_select_filter_and_projection() {
        let stmt = Select::new(Entity::Product)
            .columns(&["id", "name"])
            .unwrap()
            .filter("categoryId", Cmp::Eq, json!(3))
            .unwrap()
            .build();
        assert_eq!(
            stmt.statement.sql,
            "SELECT \"products\".\"id\", \"products\".\"name\" FROM \"products\" \
             WHERE \"products\".\"categoryId\" = ?"
        );
        assert_eq!(stmt.statement.params, vec![json!(3)]);
    }

    #[test]
    fn test_select_rejects_bad_identifiers() {
        let err = Select::new(Entity::Customer)
            .filter("firstname", Cmp::Eq, json!("x"))
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { .. }));

        let err = Select::new(Entity::Customer)
            .left_join(Entity::Product)
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatement { .. }));

        // join_column requires the join to be declared first
        let err = Select::new(Entity::Customer)
            .join_column(Entity::Category, "dept")
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatement { .. }));
    }

    #[test]
    fn test_insert_statement() {
        let record = NewCategory {
            name: "DI 3A".to_string(),
            dept: "DI".to_string(),
            year: "3A".to_string(),
        };
        let stmt = insert(Entity::Category, &record).unwrap();
        assert_eq!(
            stmt.statement.sql,
            "INSERT INTO \"categories\" (\"name\", \"dept\", \"year\", \"created_at\", \
             \"updated_at\") VALUES (?, ?, ?, ?, ?) RETURNING \"id\", \"name\", \"dept\", \
             \"year\", \"created_at\", \"updated_at\""
        );
        assert_eq!(stmt.statement.params.len(), 5);
        assert_eq!(stmt.statement.params[0], json!("DI 3A"));
        assert_eq!(stmt.columns.len(), 6);
    }

    #[test]
    fn test_update_statement() {
        let patch = CustomerPatch {
            first_name: Some("Jo".to_string()),
            ..Default::default()
        };
        let stmt = update(Entity::Customer, 9, &patch).unwrap();
        assert!(stmt.statement.sql.starts_with(
            "UPDATE \"customers\" SET \"firstName\" = ?, \"updated_at\" = ? WHERE \"id\" = ? \
             RETURNING \"id\""
        ));
        assert_eq!(stmt.statement.params.len(), 3);
        assert_eq!(stmt.statement.params[2], json!(9));
    }

    #[test]
    fn test_delete_statement() {
        let stmt = delete(Entity::Product, 4);
        assert_eq!(
            stmt.sql,
            "DELETE FROM \"products\" WHERE \"id\" = ? RETURNING \"id\""
        );
        assert_eq!(stmt.params, vec![json!(4)]);
    }

    #[test]
    fn test_reference_statements() {
        let stmt = clear_reference(Entity::Customer, Entity::Category, 4).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"customers\" SET \"categoryId\" = NULL, \"updated_at\" = ? \
             WHERE \"categoryId\" = ?"
        );
        assert_eq!(stmt.params.len(), 2);
        assert_eq!(stmt.params[1], json!(4));

        let stmt = delete_by_reference(Entity::Product, Entity::ProductCategory, 2).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM \"products\" WHERE \"categoryId\" = ?");

        assert!(delete_by_reference(Entity::Product, Entity::Customer, 2).is_err());
    }

    #[test]
    fn test_increment_statement() {
        let stmt = increment(Entity::Customer, 9, "account", -4.0).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"customers\" SET \"account\" = \"account\" + ?, \"updated_at\" = ? \
             WHERE \"id\" = ? RETURNING \"id\""
        );
        assert_eq!(stmt.params[0], json!(-4.0));
        assert_eq!(stmt.params[2], json!(9));
    }

    #[test]
    fn test_increment_guards() {
        let err = increment(Entity::Customer, 9, "firstName", 1.0).unwrap_err();
        assert!(matches!(err, DbError::InvalidStatement { .. }));

        let err = increment(Entity::Customer, 9, "account", f64::NAN).unwrap_err();
        assert!(matches!(err, DbError::InvalidValue { .. }));
    }

    #[test]
    fn test_count_statement() {
        let stmt = count(Entity::Order);
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM \"orders\"");
        assert!(stmt.params.is_empty());
    }
}
