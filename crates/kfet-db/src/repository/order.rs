//! Order operations.
//!
//! An order for a known customer is two effects or none: the order row
//! and the balance debit commit together. An anonymous order (walk-in
//! cash sale) is a plain insert with no balance involved.

use std::sync::Arc;

use kfet_core::validation::{validate_price, validate_quantity};
use kfet_core::{NewOrder, Order};
use serde_json::Value;
use tracing::debug;

use crate::batch::Batch;
use crate::channel::ExecutionChannel;
use crate::error::DbResult;
use crate::schema::Entity;
use crate::statement::{self, Cmp, Select};

use super::{decode_first, ensure_exists, fetch_all_as, fetch_created};

pub struct OrderRepository {
    channel: Arc<dyn ExecutionChannel>,
}

impl OrderRepository {
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self { channel }
    }

    /// Places an order.
    ///
    /// `totalPrice` is taken as given and debited as-is: price policy
    /// (bulk deals, kfetier rates) lives with the caller, the ledger
    /// records what was charged. The debit is applied as an in-store
    /// delta, so simultaneous orders for one customer both count.
    pub async fn place(&self, input: &NewOrder) -> DbResult<Order> {
        validate_quantity(input.quantity)?;
        validate_price("totalPrice", input.total_price)?;

        let insert = statement::insert(Entity::Order, input)?;
        match input.customer_id {
            Some(customer_id) => {
                ensure_exists(self.channel.as_ref(), Entity::Customer, customer_id).await?;

                debug!(
                    customer_id = customer_id,
                    total_price = input.total_price,
                    "placing order with balance debit"
                );
                let results = Batch::with(vec![
                    insert.statement.clone(),
                    statement::increment(
                        Entity::Customer,
                        customer_id,
                        "account",
                        -input.total_price,
                    )?,
                ])
                .execute(self.channel.as_ref())
                .await?;

                let rows = results.first().map(Vec::as_slice).unwrap_or(&[]);
                decode_first(Entity::Order, &insert.columns, rows)
            }
            None => {
                debug!(total_price = input.total_price, "placing anonymous order");
                fetch_created(self.channel.as_ref(), Entity::Order, &insert).await
            }
        }
    }

    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let stmt = Select::new(Entity::Order).build();
        fetch_all_as(self.channel.as_ref(), Entity::Order, &stmt).await
    }

    /// Orders recorded for one customer, in placement order.
    pub async fn list_for_customer(&self, customer_id: i64) -> DbResult<Vec<Order>> {
        let stmt = Select::new(Entity::Order)
            .filter("customerId", Cmp::Eq, Value::from(customer_id))?
            .build();
        fetch_all_as(self.channel.as_ref(), Entity::Order, &stmt).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
