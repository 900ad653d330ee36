//! # Repositories
//!
//! The domain operations, one repository per entity. Each holds a shared
//! handle to the execution channel and expresses everything it does as
//! statements: single dispatch for plain reads and writes, an atomic
//! batch wherever one domain action must change more than one row.
//!
//! ## Multi-Statement Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderRepository::place         [INSERT order, debit customer account]  │
//! │  CustomerRepository::           [credit customer account,               │
//! │      adjust_balance              INSERT money_adjustment]               │
//! │  CategoryRepository::delete     [detach customers, DELETE category]     │
//! │  ProductCategoryRepository::    [DELETE products of category,           │
//! │      delete                      DELETE category]                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Existence is verified before a batch runs, so a missing target means
//! NotFound and no statement is dispatched.

pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod product_category;

pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use product_category::ProductCategoryRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::channel::ExecutionChannel;
use crate::codec;
use crate::error::{DbError, DbResult};
use crate::schema::Entity;
use crate::statement::{Cmp, Select, TypedStatement};

/// Runs a typed select and decodes every returned row.
pub(crate) async fn fetch_all_as<T: DeserializeOwned>(
    channel: &dyn ExecutionChannel,
    entity: Entity,
    stmt: &TypedStatement,
) -> DbResult<Vec<T>> {
    let rows = channel.execute_one(&stmt.statement).await?;
    codec::decode_rows(entity.table().name, &stmt.columns, &rows)
}

/// Runs a typed statement that targets the row with `id`, mapping an
/// empty result to NotFound.
pub(crate) async fn fetch_required<T: DeserializeOwned>(
    channel: &dyn ExecutionChannel,
    entity: Entity,
    id: i64,
    stmt: &TypedStatement,
) -> DbResult<T> {
    let rows = channel.execute_one(&stmt.statement).await?;
    match rows.first() {
        Some(row) => codec::decode_row(entity.table().name, &stmt.columns, row),
        None => Err(DbError::not_found(entity.kind(), id)),
    }
}

/// Runs a statement that must produce a row (INSERT ... RETURNING).
pub(crate) async fn fetch_created<T: DeserializeOwned>(
    channel: &dyn ExecutionChannel,
    entity: Entity,
    stmt: &TypedStatement,
) -> DbResult<T> {
    let rows = channel.execute_one(&stmt.statement).await?;
    decode_first(entity, &stmt.columns, &rows)
}

/// Decodes the first row of a result set that is contractually non-empty.
pub(crate) fn decode_first<T: DeserializeOwned>(
    entity: Entity,
    columns: &[codec::OutputColumn],
    rows: &[Vec<Value>],
) -> DbResult<T> {
    let table = entity.table().name;
    match rows.first() {
        Some(row) => codec::decode_row(table, columns, row),
        None => Err(DbError::Decode(format!("{table}: statement returned no row"))),
    }
}

/// Errors with NotFound unless a row with `id` exists.
pub(crate) async fn ensure_exists(
    channel: &dyn ExecutionChannel,
    entity: Entity,
    id: i64,
) -> DbResult<()> {
    let stmt = Select::new(entity)
        .columns(&["id"])?
        .filter("id", Cmp::Eq, Value::from(id))?
        .build();
    let rows = channel.execute_one(&stmt.statement).await?;
    if rows.is_empty() {
        return Err(DbError::not_found(entity.kind(), id));
    }
    Ok(())
}
