//! # Domain Types
//!
//! Record types for every persisted entity, plus the insert payloads and
//! patch types consumed by the data layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  per entity E:                                                          │
//! │                                                                         │
//! │  ┌──────────────┐     ┌──────────────┐     ┌──────────────┐            │
//! │  │      E       │     │    NewE      │     │   EPatch     │            │
//! │  │ ──────────── │     │ ──────────── │     │ ──────────── │            │
//! │  │ full record  │     │ insert       │     │ partial      │            │
//! │  │ id + every   │     │ payload,     │     │ update, only │            │
//! │  │ column incl. │     │ defaults may │     │ provided     │            │
//! │  │ timestamps   │     │ be omitted   │     │ fields apply │            │
//! │  └──────────────┘     └──────────────┘     └──────────────┘            │
//! │                                                                         │
//! │  Entities: Category, Customer, ProductCategory, Product,               │
//! │            Order, MoneyAdjustment                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serde Names Are Column Names
//! Every field (de)serializes under the exact persisted column name
//! (`firstName`, `isKfetier`, `created_at`, ...). The data layer's row codec
//! relies on this: records become column/value maps and back without any
//! field-mapping table.
//!
//! ## Absent vs. Null in Patches
//! Patch fields are `Option<T>`: `None` means "not part of this patch".
//! For *nullable* columns the field is `Option<Option<T>>` so that
//! `Some(None)` expresses "set the column to NULL" (e.g. detaching a
//! customer from its category) while `None` still means "leave it alone".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Deserializes `Option<Option<T>>` so that an explicit `null` becomes
/// `Some(None)` instead of collapsing into `None`.
///
/// Combined with `#[serde(default)]`, an absent field stays `None` and a
/// `null` field becomes `Some(None)`, the two cases patches must keep apart.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// =============================================================================
// Category (customer cohorts)
// =============================================================================

/// A customer cohort: a department/year pair such as "DI 3A".
///
/// Customers optionally belong to one category. Deleting a category detaches
/// its customers (their reference is cleared); it never deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    /// Display label, conventionally "{dept} {year}".
    pub name: String,
    /// Department code (e.g. "DI", "DA").
    pub dept: String,
    /// Year code (e.g. "3A", "5A").
    pub year: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`Category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub dept: String,
    pub year: String,
}

/// Partial update for [`Category`]. Only provided fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a prepaid account balance.
///
/// The balance is the one mutable number this system guards: every change to
/// it happens in the same atomic batch as its correlated record (an order row
/// or a money-adjustment row). It may go negative; regulars run tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Prepaid balance. Signed: negative means the customer owes the kfet.
    pub account: f64,
    /// Membership flag; members get the discounted price tier.
    #[serde(rename = "isKfetier")]
    pub is_kfetier: bool,
    /// Cohort reference; cleared (not cascaded) when the category is deleted.
    #[serde(rename = "categoryId")]
    pub category_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A customer together with its joined category columns.
///
/// Produced by the customer list/get operations, which left-join
/// `categories`; the joined fields are null for uncategorized customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerWithCategory {
    #[serde(flatten)]
    pub customer: Customer,
    pub dept: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
}

/// Insert payload for [`Customer`].
///
/// `account` and `is_kfetier` fall back to their declared defaults (0.0 and
/// false) when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<f64>,
    #[serde(rename = "isKfetier", default, skip_serializing_if = "Option::is_none")]
    pub is_kfetier: Option<bool>,
    #[serde(rename = "categoryId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Partial update for [`Customer`].
///
/// Note: the balance is deliberately NOT patchable here. Balance changes go
/// through order placement or balance adjustment so that the audit trail
/// stays complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPatch {
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "isKfetier", default, skip_serializing_if = "Option::is_none")]
    pub is_kfetier: Option<bool>,
    /// `Some(None)` detaches the customer from its category.
    #[serde(
        rename = "categoryId",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<Option<i64>>,
}

// =============================================================================
// Product Category
// =============================================================================

/// A catalog grouping for products (e.g. "Boissons", "Snacks").
///
/// Deleting a product category cascade-deletes its products. Customer
/// cohorts go the other way (detach), and the split is per entity on purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
    #[serde(rename = "imagePath")]
    pub image_path: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`ProductCategory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProductCategory {
    pub name: String,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Partial update for [`ProductCategory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductCategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "imagePath",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_path: Option<Option<String>>,
}

// =============================================================================
// Product
// =============================================================================

/// A product for sale, with its four-way price matrix.
///
/// The member ("kfétier") prices are conventionally at or below the base
/// prices, but nothing enforces that; pricing is the operator's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Base unit price.
    pub price: f64,
    /// Bundle price for three units, when offered.
    #[serde(rename = "priceForThree")]
    pub price_for_three: Option<f64>,
    /// Member unit price.
    #[serde(rename = "priceForKfetier")]
    pub price_for_kfetier: f64,
    /// Member bundle price for three units, when offered.
    #[serde(rename = "priceForThreeKfetier")]
    pub price_for_three_kfetier: Option<f64>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<i64>,
    #[serde(rename = "imagePath")]
    pub image_path: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(rename = "priceForThree", default, skip_serializing_if = "Option::is_none")]
    pub price_for_three: Option<f64>,
    #[serde(rename = "priceForKfetier")]
    pub price_for_kfetier: f64,
    #[serde(
        rename = "priceForThreeKfetier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_for_three_kfetier: Option<f64>,
    #[serde(rename = "categoryId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Partial update for [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        rename = "priceForThree",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_for_three: Option<Option<f64>>,
    #[serde(rename = "priceForKfetier", default, skip_serializing_if = "Option::is_none")]
    pub price_for_kfetier: Option<f64>,
    #[serde(
        rename = "priceForThreeKfetier",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_for_three_kfetier: Option<Option<f64>>,
    #[serde(
        rename = "categoryId",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<Option<i64>>,
    #[serde(
        rename = "imagePath",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_path: Option<Option<String>>,
}

// =============================================================================
// Order
// =============================================================================

/// A recorded sale.
///
/// Orders are append-only: created, never mutated. An order with a customer
/// reference was recorded atomically with the matching balance debit; an
/// order without one is an anonymous cash sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "customerId")]
    pub customer_id: Option<i64>,
    #[serde(rename = "productId")]
    pub product_id: Option<i64>,
    pub quantity: i64,
    /// Caller-computed total; this layer debits it verbatim, it never
    /// recomputes price × quantity (promotions are priced at the till).
    #[serde(rename = "totalPrice")]
    pub total_price: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    #[serde(rename = "customerId", default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(rename = "productId", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    pub quantity: i64,
    #[serde(rename = "totalPrice")]
    pub total_price: f64,
}

// =============================================================================
// Money Adjustment
// =============================================================================

/// One manual balance change: a top-up (positive) or correction (negative).
///
/// Append-only audit trail. Together with orders, these rows explain every
/// movement of every customer balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MoneyAdjustment {
    pub id: i64,
    #[serde(rename = "customerId")]
    pub customer_id: i64,
    /// Signed amount added to the balance.
    pub amount: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`MoneyAdjustment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMoneyAdjustment {
    #[serde(rename = "customerId")]
    pub customer_id: i64,
    pub amount: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_serializes_under_column_names() {
        let new = NewCustomer {
            first_name: "Marie".to_string(),
            last_name: "Curie".to_string(),
            account: Some(25.0),
            is_kfetier: Some(true),
            category_id: None,
        };

        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["firstName"], "Marie");
        assert_eq!(value["isKfetier"], true);
        // Omitted fields must not appear at all
        assert!(value.get("categoryId").is_none());
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let untouched: CustomerPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.category_id, None);

        let detached: CustomerPatch = serde_json::from_str(r#"{"categoryId": null}"#).unwrap();
        assert_eq!(detached.category_id, Some(None));

        let moved: CustomerPatch = serde_json::from_str(r#"{"categoryId": 7}"#).unwrap();
        assert_eq!(moved.category_id, Some(Some(7)));

        // And the distinction survives serialization
        let detach_json = serde_json::to_value(&detached).unwrap();
        assert!(detach_json["categoryId"].is_null());
        let untouched_json = serde_json::to_value(&untouched).unwrap();
        assert!(untouched_json.get("categoryId").is_none());
    }

    #[test]
    fn test_customer_with_category_flattens() {
        let json = r#"{
            "id": 1,
            "firstName": "Jean",
            "lastName": "Dupont",
            "account": 10.5,
            "isKfetier": false,
            "categoryId": 3,
            "created_at": "2024-09-01T08:00:00Z",
            "updated_at": "2024-09-01T08:00:00Z",
            "dept": "DI",
            "year": "3A",
            "categoryName": "DI 3A"
        }"#;

        let row: CustomerWithCategory = serde_json::from_str(json).unwrap();
        assert_eq!(row.customer.first_name, "Jean");
        assert_eq!(row.customer.category_id, Some(3));
        assert_eq!(row.dept.as_deref(), Some("DI"));
        assert_eq!(row.category_name.as_deref(), Some("DI 3A"));
    }

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        let patch = ProductPatch::default();
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
