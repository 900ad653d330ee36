//! Cohort category operations.
//!
//! Categories group customers by department and school year. Deleting one
//! must not take its customers with it: the delete batch detaches them
//! first, in the same transaction.

use std::sync::Arc;

use kfet_core::validation::validate_name;
use kfet_core::{Category, CategoryPatch, NewCategory};
use serde_json::Value;
use tracing::debug;

use crate::batch::Batch;
use crate::channel::ExecutionChannel;
use crate::codec;
use crate::error::DbResult;
use crate::schema::Entity;
use crate::statement::{self, Cmp, Select};

use super::{ensure_exists, fetch_all_as, fetch_created, fetch_required};

pub struct CategoryRepository {
    channel: Arc<dyn ExecutionChannel>,
}

impl CategoryRepository {
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self { channel }
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let stmt = Select::new(Entity::Category).build();
        fetch_all_as(self.channel.as_ref(), Entity::Category, &stmt).await
    }

    pub async fn get(&self, id: i64) -> DbResult<Category> {
        let stmt = Select::new(Entity::Category)
            .filter("id", Cmp::Eq, Value::from(id))?
            .build();
        fetch_required(self.channel.as_ref(), Entity::Category, id, &stmt).await
    }

    pub async fn create(&self, input: &NewCategory) -> DbResult<Category> {
        validate_name("name", &input.name)?;
        validate_name("dept", &input.dept)?;
        validate_name("year", &input.year)?;

        debug!(name = %input.name, "creating category");
        let stmt = statement::insert(Entity::Category, input)?;
        fetch_created(self.channel.as_ref(), Entity::Category, &stmt).await
    }

    pub async fn update(&self, id: i64, patch: &CategoryPatch) -> DbResult<Category> {
        if let Some(name) = &patch.name {
            validate_name("name", name)?;
        }
        if let Some(dept) = &patch.dept {
            validate_name("dept", dept)?;
        }
        if let Some(year) = &patch.year {
            validate_name("year", year)?;
        }

        debug!(category_id = id, "updating category");
        let stmt = statement::update(Entity::Category, id, patch)?;
        fetch_required(self.channel.as_ref(), Entity::Category, id, &stmt).await
    }

    /// Deletes a category and detaches its customers in one transaction:
    /// their `categoryId` goes NULL and the customers survive.
    ///
    /// A missing category is NotFound before anything is dispatched, so
    /// the detach never runs against a target that was not there.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        ensure_exists(self.channel.as_ref(), Entity::Category, id).await?;

        debug!(category_id = id, "deleting category, detaching its customers");
        Batch::with(vec![
            statement::clear_reference(Entity::Customer, Entity::Category, id)?,
            statement::delete(Entity::Category, id),
        ])
        .execute(self.channel.as_ref())
        .await?;
        Ok(())
    }

    /// Distinct non-empty departments, sorted.
    pub async fn depts(&self) -> DbResult<Vec<String>> {
        self.distinct_column("dept").await
    }

    /// Distinct non-empty school years, sorted.
    pub async fn years(&self) -> DbResult<Vec<String>> {
        self.distinct_column("year").await
    }

    async fn distinct_column(&self, column: &str) -> DbResult<Vec<String>> {
        let stmt = Select::new(Entity::Category).columns(&[column])?.build();
        let rows = self.channel.execute_one(&stmt.statement).await?;
        let cells = codec::decode_text_cells(Entity::Category.table_name(), &rows)?;
        Ok(distinct_sorted(cells))
    }
}

/// Dedup, drop empties, sort. The store keeps whatever was written;
/// presentation wants a clean axis.
fn distinct_sorted(cells: Vec<Option<String>>) -> Vec<String> {
    let mut values: Vec<String> = cells
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .collect();
    values.sort();
    values.dedup();
    values
}

// =============================================================================
// Unit Tests
// =============================================================================
