//! # Schema Registry
//!
//! Static description of every persisted table: ordered columns, semantic
//! types, nullability, defaults, and outgoing references. The statement
//! builder consults it to know which columns exist and in what order; the
//! row codec consults it to know how to encode payloads and decode rows;
//! bootstrap renders its DDL from it.
//!
//! ## The Six Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Schema                                    │
//! │                                                                         │
//! │   ┌────────────┐ detach      ┌───────────┐                             │
//! │   │ categories │◄────────────│ customers │◄──────────────┐             │
//! │   └────────────┘  categoryId └─────┬─────┘               │             │
//! │                                    │ customerId          │ customerId  │
//! │   ┌────────────────────┐           ▼                ┌────┴──────────┐  │
//! │   │ productsCategories │      ┌────────┐            │money_         │  │
//! │   └─────────┬──────────┘      │ orders │            │adjustments    │  │
//! │     cascade │ categoryId      └────┬───┘            └───────────────┘  │
//! │             ▼                      │ productId                         │
//! │       ┌──────────┐                 │                                   │
//! │       │ products │◄────────────────┘                                   │
//! │       └──────────┘                                                     │
//! │                                                                         │
//! │  References are declared but NOT enforced by the store (no ON DELETE): │
//! │  cascade and detach are this layer's job, executed as atomic batches.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Semantics
//! - `Boolean` columns are stored as INTEGER 0/1; the codec maps them to
//!   `bool` on decode
//! - `Timestamp` columns are stored as RFC 3339 TEXT and are filled by the
//!   codec, never by the store (a store-side default would not round-trip)

use crate::error::{DbError, DbResult};

// =============================================================================
// Entities
// =============================================================================

/// The persisted entities, one per table.
///
/// `ALL` is ordered parents-before-children, so creating tables in `ALL`
/// order and dropping them in reverse always respects the declared
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Category,
    Customer,
    ProductCategory,
    Product,
    Order,
    MoneyAdjustment,
}

impl Entity {
    /// Every entity, parents before children.
    pub const ALL: [Entity; 6] = [
        Entity::Category,
        Entity::Customer,
        Entity::ProductCategory,
        Entity::Product,
        Entity::Order,
        Entity::MoneyAdjustment,
    ];

    /// The table definition for this entity.
    pub fn table(self) -> &'static TableDef {
        match self {
            Entity::Category => &CATEGORIES,
            Entity::Customer => &CUSTOMERS,
            Entity::ProductCategory => &PRODUCTS_CATEGORIES,
            Entity::Product => &PRODUCTS,
            Entity::Order => &ORDERS,
            Entity::MoneyAdjustment => &MONEY_ADJUSTMENTS,
        }
    }

    /// The persisted table name.
    pub fn table_name(self) -> &'static str {
        self.table().name
    }

    /// Human-readable entity kind, used in error messages.
    pub fn kind(self) -> &'static str {
        match self {
            Entity::Category => "Category",
            Entity::Customer => "Customer",
            Entity::ProductCategory => "ProductCategory",
            Entity::Product => "Product",
            Entity::Order => "Order",
            Entity::MoneyAdjustment => "MoneyAdjustment",
        }
    }
}

// =============================================================================
// Column Model
// =============================================================================

/// Semantic column types.
///
/// `Boolean` and `Timestamp` exist alongside their storage classes because
/// the codec treats them specially (0/1 ↔ bool, RFC 3339 text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// The SQLite storage type used in DDL.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text | ColumnType::Timestamp => "TEXT",
        }
    }

    /// Label used in validation/decoding error messages.
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// A declared default, substituted by the codec when an insert payload
/// omits the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnDefault {
    Real(f64),
    Bool(bool),
    /// Fill with the current time at encode. Used by the bookkeeping
    /// timestamps; rendered as no DDL default on purpose (SQLite's
    /// CURRENT_TIMESTAMP format is not RFC 3339 and would not round-trip).
    Now,
}

/// One column of a table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
    pub primary_key: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            nullable: false,
            default: None,
            primary_key: false,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A declared outgoing reference (foreign key, unenforced by the store).
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    /// The referencing column on this table.
    pub column: &'static str,
    /// The entity whose primary key is referenced.
    pub parent: Entity,
}

// =============================================================================
// Table Definitions
// =============================================================================

/// A table: ordered columns plus outgoing references.
#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub references: &'static [Reference],
}

impl TableDef {
    /// Looks up a column by its persisted name.
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All columns except the store-assigned primary key, in declared order.
    pub fn writable_columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// The primary key column name.
    pub fn primary_key(&self) -> &'static str {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name)
            .unwrap_or("id")
    }

    /// The declared reference pointing at `parent`, if any.
    pub fn reference_to(&self, parent: Entity) -> Option<&'static Reference> {
        self.references.iter().find(|r| r.parent == parent)
    }

    /// Renders the CREATE TABLE IF NOT EXISTS statement for this table.
    pub fn create_sql(&self) -> String {
        let mut lines = Vec::with_capacity(self.columns.len());
        for col in self.columns {
            let mut line = format!("  \"{}\" {}", col.name, col.ty.sql_type());
            if col.primary_key {
                line.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else {
                if !col.nullable {
                    line.push_str(" NOT NULL");
                }
                match col.default {
                    Some(ColumnDefault::Real(v)) => line.push_str(&format!(" DEFAULT {v}")),
                    Some(ColumnDefault::Bool(b)) => {
                        line.push_str(if b { " DEFAULT 1" } else { " DEFAULT 0" })
                    }
                    // Codec-filled; no store-side default
                    Some(ColumnDefault::Now) | None => {}
                }
                if let Some(reference) = self.references.iter().find(|r| r.column == col.name) {
                    let parent = reference.parent.table();
                    line.push_str(&format!(
                        " REFERENCES \"{}\"(\"{}\")",
                        parent.name,
                        parent.primary_key()
                    ));
                }
            }
            lines.push(line);
        }

        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n)",
            self.name,
            lines.join(",\n")
        )
    }

    /// Renders the DROP TABLE IF EXISTS statement for this table.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name)
    }
}

/// Validates that `column` exists on `entity`'s table.
pub fn require_column(entity: Entity, column: &str) -> DbResult<&'static ColumnDef> {
    let table = entity.table();
    table.column(column).ok_or_else(|| DbError::UnknownColumn {
        table: table.name,
        column: column.to_string(),
    })
}

static CATEGORIES: TableDef = TableDef {
    name: "categories",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("dept", ColumnType::Text),
        ColumnDef::new("year", ColumnType::Text),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
        ColumnDef::new("updated_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[],
};

static CUSTOMERS: TableDef = TableDef {
    name: "customers",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("firstName", ColumnType::Text),
        ColumnDef::new("lastName", ColumnType::Text),
        ColumnDef::new("account", ColumnType::Real).default(ColumnDefault::Real(0.0)),
        ColumnDef::new("isKfetier", ColumnType::Boolean).default(ColumnDefault::Bool(false)),
        ColumnDef::new("categoryId", ColumnType::Integer).nullable(),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
        ColumnDef::new("updated_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[Reference {
        column: "categoryId",
        parent: Entity::Category,
    }],
};

static PRODUCTS_CATEGORIES: TableDef = TableDef {
    name: "productsCategories",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("imagePath", ColumnType::Text).nullable(),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
        ColumnDef::new("updated_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[],
};

static PRODUCTS: TableDef = TableDef {
    name: "products",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("price", ColumnType::Real),
        ColumnDef::new("priceForThree", ColumnType::Real).nullable(),
        ColumnDef::new("priceForKfetier", ColumnType::Real),
        ColumnDef::new("priceForThreeKfetier", ColumnType::Real).nullable(),
        ColumnDef::new("categoryId", ColumnType::Integer).nullable(),
        ColumnDef::new("imagePath", ColumnType::Text).nullable(),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
        ColumnDef::new("updated_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[Reference {
        column: "categoryId",
        parent: Entity::ProductCategory,
    }],
};

static ORDERS: TableDef = TableDef {
    name: "orders",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("customerId", ColumnType::Integer).nullable(),
        ColumnDef::new("productId", ColumnType::Integer).nullable(),
        ColumnDef::new("quantity", ColumnType::Integer),
        ColumnDef::new("totalPrice", ColumnType::Real),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[
        Reference {
            column: "customerId",
            parent: Entity::Customer,
        },
        Reference {
            column: "productId",
            parent: Entity::Product,
        },
    ],
};

static MONEY_ADJUSTMENTS: TableDef = TableDef {
    name: "money_adjustments",
    columns: &[
        ColumnDef::new("id", ColumnType::Integer).primary_key(),
        ColumnDef::new("customerId", ColumnType::Integer),
        ColumnDef::new("amount", ColumnType::Real),
        ColumnDef::new("created_at", ColumnType::Timestamp).default(ColumnDefault::Now),
    ],
    references: &[Reference {
        column: "customerId",
        parent: Entity::Customer,
    }],
};

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customers_ddl() {
        let sql = Entity::Customer.table().create_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"customers\" (\n\
             \x20 \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n\
             \x20 \"firstName\" TEXT NOT NULL,\n\
             \x20 \"lastName\" TEXT NOT NULL,\n\
             \x20 \"account\" REAL NOT NULL DEFAULT 0,\n\
             \x20 \"isKfetier\" INTEGER NOT NULL DEFAULT 0,\n\
             \x20 \"categoryId\" INTEGER REFERENCES \"categories\"(\"id\"),\n\
             \x20 \"created_at\" TEXT NOT NULL,\n\
             \x20 \"updated_at\" TEXT NOT NULL\n\
             )"
        );
    }

    #[test]
    fn test_orders_ddl_has_unenforced_references() {
        let sql = Entity::Order.table().create_sql();
        assert!(sql.contains("\"customerId\" INTEGER REFERENCES \"customers\"(\"id\")"));
        assert!(sql.contains("\"totalPrice\" REAL NOT NULL"));
        assert!(!sql.contains("ON DELETE"));
    }

    #[test]
    fn test_all_order_is_parents_first() {
        // Every reference must point at an entity that appears earlier
        for (idx, entity) in Entity::ALL.iter().enumerate() {
            for reference in entity.table().references {
                let parent_idx = Entity::ALL
                    .iter()
                    .position(|e| *e == reference.parent)
                    .unwrap();
                assert!(
                    parent_idx < idx,
                    "{} references {} which is created later",
                    entity.table_name(),
                    reference.parent.table_name()
                );
            }
        }
    }

    #[test]
    fn test_column_lookup() {
        let table = Entity::Customer.table();
        assert!(table.column("isKfetier").is_some());
        assert!(table.column("is_kfetier").is_none());
        assert_eq!(table.primary_key(), "id");
    }

    #[test]
    fn test_writable_columns_exclude_primary_key() {
        let names: Vec<&str> = Entity::Order
            .table()
            .writable_columns()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["customerId", "productId", "quantity", "totalPrice", "created_at"]
        );
    }

    #[test]
    fn test_reference_lookup() {
        let table = Entity::Customer.table();
        let reference = table.reference_to(Entity::Category).unwrap();
        assert_eq!(reference.column, "categoryId");
        assert!(table.reference_to(Entity::Product).is_none());
    }
}
