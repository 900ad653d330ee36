//! Product category operations (menu sections).
//!
//! Unlike cohort categories, deleting a menu section takes its products
//! with it: a section's products have no meaning on their own. The two
//! deletion policies diverge on purpose.

use std::sync::Arc;

use kfet_core::validation::validate_name;
use kfet_core::{NewProductCategory, ProductCategory, ProductCategoryPatch};
use serde_json::Value;
use tracing::debug;

use crate::batch::Batch;
use crate::channel::ExecutionChannel;
use crate::error::DbResult;
use crate::schema::Entity;
use crate::statement::{self, Cmp, Select};

use super::{ensure_exists, fetch_all_as, fetch_created, fetch_required};

pub struct ProductCategoryRepository {
    channel: Arc<dyn ExecutionChannel>,
}

impl ProductCategoryRepository {
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self { channel }
    }

    pub async fn list(&self) -> DbResult<Vec<ProductCategory>> {
        let stmt = Select::new(Entity::ProductCategory).build();
        fetch_all_as(self.channel.as_ref(), Entity::ProductCategory, &stmt).await
    }

    pub async fn get(&self, id: i64) -> DbResult<ProductCategory> {
        let stmt = Select::new(Entity::ProductCategory)
            .filter("id", Cmp::Eq, Value::from(id))?
            .build();
        fetch_required(self.channel.as_ref(), Entity::ProductCategory, id, &stmt).await
    }

    pub async fn create(&self, input: &NewProductCategory) -> DbResult<ProductCategory> {
        validate_name("name", &input.name)?;

        debug!(name = %input.name, "creating product category");
        let stmt = statement::insert(Entity::ProductCategory, input)?;
        fetch_created(self.channel.as_ref(), Entity::ProductCategory, &stmt).await
    }

    pub async fn update(
        &self,
        id: i64,
        patch: &ProductCategoryPatch,
    ) -> DbResult<ProductCategory> {
        if let Some(name) = &patch.name {
            validate_name("name", name)?;
        }

        debug!(product_category_id = id, "updating product category");
        let stmt = statement::update(Entity::ProductCategory, id, patch)?;
        fetch_required(self.channel.as_ref(), Entity::ProductCategory, id, &stmt).await
    }

    /// Deletes a product category and every product in it, in one
    /// transaction. A missing category is NotFound before anything is
    /// dispatched, so the cascade never fires for a bad id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        ensure_exists(self.channel.as_ref(), Entity::ProductCategory, id).await?;

        debug!(product_category_id = id, "deleting product category and its products");
        Batch::with(vec![
            statement::delete_by_reference(Entity::Product, Entity::ProductCategory, id)?,
            statement::delete(Entity::ProductCategory, id),
        ])
        .execute(self.channel.as_ref())
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
