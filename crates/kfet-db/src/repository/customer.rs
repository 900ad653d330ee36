//! Customer account operations.
//!
//! Customers carry a prepaid balance. The balance changes exactly two
//! ways: an order debits it, a balance adjustment credits (or debits) it
//! with an audit row. Both run as atomic batches, and both apply the
//! change as an in-store delta so concurrent writers compose.

use std::sync::Arc;

use kfet_core::validation::{validate_adjustment_amount, validate_balance, validate_name};
use kfet_core::{
    Customer, CustomerPatch, CustomerWithCategory, MoneyAdjustment, NewCustomer,
    NewMoneyAdjustment,
};
use serde_json::Value;
use tracing::debug;

use crate::batch::Batch;
use crate::channel::ExecutionChannel;
use crate::error::{DbError, DbResult};
use crate::schema::Entity;
use crate::statement::{self, Cmp, Select};

use super::{decode_first, ensure_exists, fetch_all_as, fetch_created, fetch_required};

pub struct CustomerRepository {
    channel: Arc<dyn ExecutionChannel>,
}

impl CustomerRepository {
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self { channel }
    }

    /// All customers, each with its cohort's dept, year, and name pulled
    /// in through the declared reference (NULLs when detached).
    pub async fn list(&self) -> DbResult<Vec<CustomerWithCategory>> {
        let stmt = Self::joined_select()?.build();
        fetch_all_as(self.channel.as_ref(), Entity::Customer, &stmt).await
    }

    pub async fn get(&self, id: i64) -> DbResult<CustomerWithCategory> {
        let stmt = Self::joined_select()?
            .filter("id", Cmp::Eq, Value::from(id))?
            .build();
        fetch_required(self.channel.as_ref(), Entity::Customer, id, &stmt).await
    }

    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        validate_name("firstName", &input.first_name)?;
        validate_name("lastName", &input.last_name)?;
        if let Some(account) = input.account {
            validate_balance(account)?;
        }

        debug!(
            first_name = %input.first_name,
            last_name = %input.last_name,
            "creating customer"
        );
        let stmt = statement::insert(Entity::Customer, input)?;
        fetch_created(self.channel.as_ref(), Entity::Customer, &stmt).await
    }

    /// Partial update. The balance is deliberately not patchable here;
    /// it moves only through orders and [`Self::adjust_balance`], which
    /// keep the audit trail complete.
    pub async fn update(&self, id: i64, patch: &CustomerPatch) -> DbResult<Customer> {
        if let Some(first_name) = &patch.first_name {
            validate_name("firstName", first_name)?;
        }
        if let Some(last_name) = &patch.last_name {
            validate_name("lastName", last_name)?;
        }

        debug!(customer_id = id, "updating customer");
        let stmt = statement::update(Entity::Customer, id, patch)?;
        fetch_required(self.channel.as_ref(), Entity::Customer, id, &stmt).await
    }

    /// Deletes a customer. Past orders and adjustments keep their
    /// now-dangling customerId, preserving the sales history.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(customer_id = id, "deleting customer");
        let rows = self
            .channel
            .execute_one(&statement::delete(Entity::Customer, id))
            .await?;
        if rows.is_empty() {
            return Err(DbError::not_found(Entity::Customer.kind(), id));
        }
        Ok(())
    }

    /// Applies a signed amount to the balance and appends the matching
    /// audit row, atomically. Returns the recorded adjustment.
    pub async fn adjust_balance(&self, customer_id: i64, amount: f64) -> DbResult<MoneyAdjustment> {
        validate_adjustment_amount(amount)?;
        ensure_exists(self.channel.as_ref(), Entity::Customer, customer_id).await?;

        debug!(customer_id = customer_id, amount = amount, "adjusting balance");
        let adjustment = statement::insert(
            Entity::MoneyAdjustment,
            &NewMoneyAdjustment {
                customer_id,
                amount,
            },
        )?;
        let results = Batch::with(vec![
            statement::increment(Entity::Customer, customer_id, "account", amount)?,
            adjustment.statement.clone(),
        ])
        .execute(self.channel.as_ref())
        .await?;

        let rows = results.get(1).map(Vec::as_slice).unwrap_or(&[]);
        decode_first(Entity::MoneyAdjustment, &adjustment.columns, rows)
    }

    /// Audit trail for one customer, in recording order.
    pub async fn adjustments(&self, customer_id: i64) -> DbResult<Vec<MoneyAdjustment>> {
        let stmt = Select::new(Entity::MoneyAdjustment)
            .filter("customerId", Cmp::Eq, Value::from(customer_id))?
            .build();
        fetch_all_as(self.channel.as_ref(), Entity::MoneyAdjustment, &stmt).await
    }

    fn joined_select() -> DbResult<Select> {
        Select::new(Entity::Customer)
            .left_join(Entity::Category)?
            .join_column(Entity::Category, "dept")?
            .join_column(Entity::Category, "year")?
            .join_column_as(Entity::Category, "name", "categoryName")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_ledger, MockChannel, RecordedCall};
    use kfet_core::NewCategory;
    use serde_json::json;

    fn sample(first: &str, last: &str, account: f64) -> NewCustomer {
        NewCustomer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            account: Some(account),
            is_kfetier: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&NewCustomer {
                first_name: "Jean".to_string(),
                last_name: "Dupont".to_string(),
                account: None,
                is_kfetier: None,
                category_id: None,
            })
            .await
            .unwrap();

        assert_eq!(customer.account, 0.0);
        assert!(!customer.is_kfetier);
        assert_eq!(customer.category_id, None);
        assert_eq!(customer.created_at, customer.updated_at);
    }

    #[tokio::test]
    async fn test_list_carries_cohort_columns() {
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

        let mut in_cohort = sample("Marie", "Curie", 25.0);
        in_cohort.category_id = Some(category.id);
        ledger.customers().create(&in_cohort).await.unwrap();
        ledger
            .customers()
            .create(&sample("Alan", "Turing", 0.0))
            .await
            .unwrap();

        let listed = ledger.customers().list().await.unwrap();
        assert_eq!(listed.len(), 2);

        let marie = listed.iter().find(|c| c.customer.first_name == "Marie").unwrap();
        assert_eq!(marie.dept.as_deref(), Some("DI"));
        assert_eq!(marie.year.as_deref(), Some("3A"));
        assert_eq!(marie.category_name.as_deref(), Some("DI 3A"));

        let alan = listed.iter().find(|c| c.customer.first_name == "Alan").unwrap();
        assert_eq!(alan.dept, None);
        assert_eq!(alan.category_name, None);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let ledger = memory_ledger().await;
        let err = ledger.customers().get(42).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound {
                entity: "Customer",
                id: 42
            }
        ));
    }

    #[tokio::test]
    async fn test_update_can_detach_from_category() {
        let ledger = memory_ledger().await;
        let category = ledger
            .categories()
            .create(&NewCategory {
                name: "DA 4A".to_string(),
                dept: "DA".to_string(),
                year: "4A".to_string(),
            })
            .await
            .unwrap();
        let mut input = sample("Ada", "Lovelace", 15.75);
        input.category_id = Some(category.id);
        let customer = ledger.customers().create(&input).await.unwrap();

        let patched = ledger
            .customers()
            .update(
                customer.id,
                &CustomerPatch {
                    category_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.category_id, None);
        // Untouched fields keep their values
        assert_eq!(patched.account, 15.75);
    }

    #[tokio::test]
    async fn test_update_empty_patch_is_rejected() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&sample("Grace", "Hopper", 5.0))
            .await
            .unwrap();
        let err = ledger
            .customers()
            .update(customer.id, &CustomerPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::EmptyPatch { .. }));
    }

    #[tokio::test]
    async fn test_adjust_balance_credits_and_records() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&sample("Marie", "Curie", 25.0))
            .await
            .unwrap();

        let adjustment = ledger
            .customers()
            .adjust_balance(customer.id, 10.0)
            .await
            .unwrap();
        assert_eq!(adjustment.customer_id, customer.id);
        assert_eq!(adjustment.amount, 10.0);

        let after = ledger.customers().get(customer.id).await.unwrap();
        assert_eq!(after.customer.account, 35.0);

        let trail = ledger.customers().adjustments(customer.id).await.unwrap();
        assert_eq!(trail, vec![adjustment]);
    }

    #[tokio::test]
    async fn test_adjust_balance_accepts_debits() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&sample("Isaac", "Newton", 20.0))
            .await
            .unwrap();

        ledger
            .customers()
            .adjust_balance(customer.id, -30.0)
            .await
            .unwrap();
        let after = ledger.customers().get(customer.id).await.unwrap();
        // Negative balances are legal: debts are tracked, not refused
        assert_eq!(after.customer.account, -10.0);
    }

    #[tokio::test]
    async fn test_adjust_balance_rejects_zero() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&sample("Nikola", "Tesla", 50.0))
            .await
            .unwrap();
        let err = ledger
            .customers()
            .adjust_balance(customer.id, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Input(_)));
    }

    #[tokio::test]
    async fn test_adjust_balance_missing_customer_records_nothing() {
        let ledger = memory_ledger().await;
        let err = ledger.customers().adjust_balance(999, 10.0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(ledger.customers().adjustments(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_balance_wire_shape() {
        // Exists check answers, then the batch is refused: the operation
        // must surface the failure untouched
        let channel = Arc::new(
            MockChannel::with_responses(vec![vec![vec![json!(7)]]]).failing_batches(),
        );
        let repo = CustomerRepository::new(channel.clone());
        let err = repo.adjust_balance(7, 5.0).await.unwrap_err();
        assert!(matches!(err, DbError::Channel(_)));

        let calls = channel.recorded_calls().await;
        match &calls[1] {
            RecordedCall::Batch(statements) => {
                assert_eq!(statements.len(), 2);
                assert!(statements[0]
                    .sql
                    .starts_with("UPDATE \"customers\" SET \"account\" = \"account\" + ?"));
                assert!(statements[1].sql.starts_with("INSERT INTO \"money_adjustments\""));
            }
            other => panic!("expected a batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_removes_customer() {
        let ledger = memory_ledger().await;
        let customer = ledger
            .customers()
            .create(&sample("Sophie", "Germain", 7.5))
            .await
            .unwrap();
        ledger.customers().delete(customer.id).await.unwrap();

        let err = ledger.customers().get(customer.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(matches!(
            ledger.customers().delete(customer.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
