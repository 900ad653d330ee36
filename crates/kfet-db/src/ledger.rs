//! # Ledger Facade
//!
//! The crate's front door. Opening a ledger connects the execution
//! channel, makes sure the schema exists, and hands out repositories
//! that share that one channel.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Ledger                                       │
//! │                                                                         │
//! │  categories()  customers()  product_categories()  products()  orders()  │
//! │       │             │                │                │          │      │
//! │       └─────────────┴────────┬───────┴────────────────┴──────────┘      │
//! │                              ▼                                          │
//! │                  Arc<dyn ExecutionChannel>                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Opening never writes rows: schema creation is idempotent and the
//! development fixture only goes in through an explicit [`Ledger::seed`].

use std::sync::Arc;

use crate::bootstrap;
use crate::channel::{ChannelConfig, ExecutionChannel, SqliteChannel};
use crate::error::DbResult;
use crate::repository::{
    CategoryRepository, CustomerRepository, OrderRepository, ProductCategoryRepository,
    ProductRepository,
};
use crate::seed::{self, SeedReport};

/// A ready-to-use point-of-sale ledger.
pub struct Ledger {
    channel: Arc<dyn ExecutionChannel>,
    categories: CategoryRepository,
    customers: CustomerRepository,
    product_categories: ProductCategoryRepository,
    products: ProductRepository,
    orders: OrderRepository,
}

impl Ledger {
    /// Opens (creating if missing) the store described by `config` and
    /// brings the schema up to date.
    pub async fn open(config: &ChannelConfig) -> DbResult<Self> {
        let channel = SqliteChannel::connect(config).await?;
        Self::with_channel(Arc::new(channel)).await
    }

    /// Builds a ledger over an existing channel. Useful when statements
    /// should travel through something other than the bundled SQLite
    /// transport.
    pub async fn with_channel(channel: Arc<dyn ExecutionChannel>) -> DbResult<Self> {
        bootstrap::init(channel.as_ref()).await?;
        Ok(Ledger {
            categories: CategoryRepository::new(channel.clone()),
            customers: CustomerRepository::new(channel.clone()),
            product_categories: ProductCategoryRepository::new(channel.clone()),
            products: ProductRepository::new(channel.clone()),
            orders: OrderRepository::new(channel.clone()),
            channel,
        })
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn customers(&self) -> &CustomerRepository {
        &self.customers
    }

    pub fn product_categories(&self) -> &ProductCategoryRepository {
        &self.product_categories
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    /// Seeds the development fixture. A populated store is left alone.
    pub async fn seed(&self) -> DbResult<SeedReport> {
        seed::run(self.channel.clone()).await
    }

    /// Drops and recreates the schema. Every row is lost.
    pub async fn reset(&self) -> DbResult<()> {
        bootstrap::reset(self.channel.as_ref()).await
    }

    /// Closes the underlying channel.
    pub async fn close(&self) {
        self.channel.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::test_utils::memory_ledger;
    use kfet_core::{NewCategory, NewCustomer, NewOrder, NewProduct};

    #[tokio::test]
    async fn test_open_prepares_an_empty_store() {
        let ledger = memory_ledger().await;
        assert!(ledger.categories().list().await.unwrap().is_empty());
        assert!(ledger.customers().list().await.unwrap().is_empty());
        assert!(ledger.products().list().await.unwrap().is_empty());
        assert!(ledger.orders().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_lifecycle() {
        let ledger = memory_ledger().await;

        let category = ledger
            .categories()
            .create(&NewCategory {
                name: "DI 3A".to_string(),
                dept: "DI".to_string(),
                year: "3A".to_string(),
            })
            .await
            .unwrap();
        let customer = ledger
            .customers()
            .create(&NewCustomer {
                first_name: "Marie".to_string(),
                last_name: "Curie".to_string(),
                account: Some(25.0),
                is_kfetier: Some(true),
                category_id: Some(category.id),
            })
            .await
            .unwrap();
        let product = ledger
            .products()
            .create(&NewProduct {
                name: "Sandwich".to_string(),
                price: 4.0,
                price_for_three: None,
                price_for_kfetier: 3.5,
                price_for_three_kfetier: None,
                category_id: None,
                image_path: None,
            })
            .await
            .unwrap();

        // An order debits the balance in the same transaction
        ledger
            .orders()
            .place(&NewOrder {
                customer_id: Some(customer.id),
                product_id: Some(product.id),
                quantity: 1,
                total_price: 4.0,
            })
            .await
            .unwrap();
        let after_order = ledger.customers().get(customer.id).await.unwrap();
        assert_eq!(after_order.customer.account, 21.0);

        // A top-up credits it and leaves an audit row
        ledger
            .customers()
            .adjust_balance(customer.id, 10.0)
            .await
            .unwrap();
        let after_credit = ledger.customers().get(customer.id).await.unwrap();
        assert_eq!(after_credit.customer.account, 31.0);

        // Deleting the cohort detaches the customer without touching the
        // balance or the history
        ledger.categories().delete(category.id).await.unwrap();
        let detached = ledger.customers().get(customer.id).await.unwrap();
        assert_eq!(detached.customer.category_id, None);
        assert_eq!(detached.customer.account, 31.0);
        assert_eq!(
            ledger
                .orders()
                .list_for_customer(customer.id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            ledger
                .customers()
                .adjustments(customer.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_reset_then_reseed() {
        let ledger = memory_ledger().await;
        ledger.seed().await.unwrap();
        assert_eq!(ledger.customers().list().await.unwrap().len(), 15);

        ledger.reset().await.unwrap();
        assert!(ledger.customers().list().await.unwrap().is_empty());
        let err = ledger.customers().get(1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let report = ledger.seed().await.unwrap();
        assert_eq!(report.categories, 12);
        assert_eq!(report.customers, 15);
    }
}
