//! Product catalog operations.
//!
//! Every product carries four price points: unit and three-pack, each in
//! a regular and a kfetier (staff) variant. The three-pack prices are
//! optional; a NULL means the bulk deal does not exist for that product.

use std::sync::Arc;

use kfet_core::validation::{validate_name, validate_price};
use kfet_core::{NewProduct, Product, ProductPatch};
use serde_json::Value;
use tracing::debug;

use crate::channel::ExecutionChannel;
use crate::error::{DbError, DbResult};
use crate::schema::Entity;
use crate::statement::{self, Cmp, Select};

use super::{fetch_all_as, fetch_created, fetch_required};

pub struct ProductRepository {
    channel: Arc<dyn ExecutionChannel>,
}

impl ProductRepository {
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self { channel }
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let stmt = Select::new(Entity::Product).build();
        fetch_all_as(self.channel.as_ref(), Entity::Product, &stmt).await
    }

    /// Products of one menu section.
    pub async fn list_by_category(&self, category_id: i64) -> DbResult<Vec<Product>> {
        let stmt = Select::new(Entity::Product)
            .filter("categoryId", Cmp::Eq, Value::from(category_id))?
            .build();
        fetch_all_as(self.channel.as_ref(), Entity::Product, &stmt).await
    }

    pub async fn get(&self, id: i64) -> DbResult<Product> {
        let stmt = Select::new(Entity::Product)
            .filter("id", Cmp::Eq, Value::from(id))?
            .build();
        fetch_required(self.channel.as_ref(), Entity::Product, id, &stmt).await
    }

    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        validate_name("name", &input.name)?;
        validate_price("price", input.price)?;
        validate_price("priceForKfetier", input.price_for_kfetier)?;
        if let Some(price) = input.price_for_three {
            validate_price("priceForThree", price)?;
        }
        if let Some(price) = input.price_for_three_kfetier {
            validate_price("priceForThreeKfetier", price)?;
        }

        debug!(name = %input.name, price = input.price, "creating product");
        let stmt = statement::insert(Entity::Product, input)?;
        fetch_created(self.channel.as_ref(), Entity::Product, &stmt).await
    }

    pub async fn update(&self, id: i64, patch: &ProductPatch) -> DbResult<Product> {
        if let Some(name) = &patch.name {
            validate_name("name", name)?;
        }
        if let Some(price) = patch.price {
            validate_price("price", price)?;
        }
        if let Some(price) = patch.price_for_kfetier {
            validate_price("priceForKfetier", price)?;
        }
        if let Some(Some(price)) = patch.price_for_three {
            validate_price("priceForThree", price)?;
        }
        if let Some(Some(price)) = patch.price_for_three_kfetier {
            validate_price("priceForThreeKfetier", price)?;
        }

        debug!(product_id = id, "updating product");
        let stmt = statement::update(Entity::Product, id, patch)?;
        fetch_required(self.channel.as_ref(), Entity::Product, id, &stmt).await
    }

    /// Deletes a product. Past orders keep their dangling productId; the
    /// sales history stays intact.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(product_id = id, "deleting product");
        let rows = self
            .channel
            .execute_one(&statement::delete(Entity::Product, id))
            .await?;
        if rows.is_empty() {
            return Err(DbError::not_found(Entity::Product.kind(), id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_ledger;
    use kfet_core::ValidationError;

    fn coffee() -> NewProduct {
        NewProduct {
            name: "Coffee".to_string(),
            price: 0.5,
            price_for_three: Some(1.2),
            price_for_kfetier: 0.4,
            price_for_three_kfetier: Some(1.0),
            category_id: None,
            image_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_keeps_all_price_points() {
        let ledger = memory_ledger().await;
        let product = ledger.products().create(&coffee()).await.unwrap();
        assert_eq!(product.price, 0.5);
        assert_eq!(product.price_for_three, Some(1.2));
        assert_eq!(product.price_for_kfetier, 0.4);
        assert_eq!(product.price_for_three_kfetier, Some(1.0));
    }

    #[tokio::test]
    async fn test_create_allows_free_products() {
        let ledger = memory_ledger().await;
        let mut input = coffee();
        input.name = "Tap water".to_string();
        input.price = 0.0;
        input.price_for_kfetier = 0.0;
        // Zero is a price; negative is not
        let product = ledger.products().create(&input).await.unwrap();
        assert_eq!(product.price, 0.0);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let ledger = memory_ledger().await;
        let mut input = coffee();
        input.price = -0.5;
        let err = ledger.products().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Input(ValidationError::MustBeNonNegative { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_category_filters() {
        let ledger = memory_ledger().await;
        let mut in_section = coffee();
        in_section.category_id = Some(1);
        ledger.products().create(&in_section).await.unwrap();
        ledger.products().create(&coffee()).await.unwrap();

        let filtered = ledger.products().list_by_category(1).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category_id, Some(1));
        assert_eq!(ledger.products().list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_can_clear_bulk_price() {
        let ledger = memory_ledger().await;
        let product = ledger.products().create(&coffee()).await.unwrap();

        let patched = ledger
            .products()
            .update(
                product.id,
                &ProductPatch {
                    price_for_three: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.price_for_three, None);
        assert_eq!(patched.price_for_three_kfetier, Some(1.0));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let ledger = memory_ledger().await;
        let err = ledger.products().delete(404).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound {
                entity: "Product",
                id: 404
            }
        ));
    }
}
