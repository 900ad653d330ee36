//! # Development Fixture
//!
//! Seeds a fresh store with the cohort grid (every dept × year) and a
//! small customer roster spread across it. Deterministic on purpose:
//! demos and tests should see the same data on every machine.

use std::sync::Arc;

use kfet_core::{NewCategory, NewCustomer};
use tracing::info;

use crate::bootstrap;
use crate::channel::ExecutionChannel;
use crate::error::DbResult;
use crate::repository::{CategoryRepository, CustomerRepository};
use crate::schema::Entity;

/// Departments represented at the venue.
pub const DEPTS: [&str; 4] = ["DI", "DA", "DEE", "DMS"];

/// School years represented at the venue.
pub const YEARS: [&str; 3] = ["3A", "4A", "5A"];

const SAMPLE_CUSTOMERS: [(&str, &str, f64, bool); 15] = [
    ("Jean", "Dupont", 10.5, false),
    ("Marie", "Curie", 25.0, true),
    ("Alan", "Turing", 0.0, false),
    ("Ada", "Lovelace", 15.75, true),
    ("Grace", "Hopper", 5.0, false),
    ("Nikola", "Tesla", 50.0, true),
    ("Isaac", "Newton", 20.0, false),
    ("Albert", "Einstein", 30.0, true),
    ("Rosalind", "Franklin", 12.5, false),
    ("Stephen", "Hawking", 40.0, true),
    ("Katherine", "Johnson", 8.0, false),
    ("Tim", "Berners-Lee", 18.0, true),
    ("Margaret", "Hamilton", 22.0, false),
    ("Elon", "Musk", 100.0, true),
    ("Sophie", "Germain", 7.5, false),
];

/// What one seeding pass inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub customers: usize,
}

/// Seeds the fixture into an empty store.
///
/// A store that already holds cohorts or customers is left untouched and
/// the report says zero inserted.
pub async fn run(channel: Arc<dyn ExecutionChannel>) -> DbResult<SeedReport> {
    let existing_categories = bootstrap::count_rows(channel.as_ref(), Entity::Category).await?;
    let existing_customers = bootstrap::count_rows(channel.as_ref(), Entity::Customer).await?;
    if existing_categories > 0 || existing_customers > 0 {
        info!(
            categories = existing_categories,
            customers = existing_customers,
            "store already populated, seeding skipped"
        );
        return Ok(SeedReport {
            categories: 0,
            customers: 0,
        });
    }

    let categories = CategoryRepository::new(channel.clone());
    let customers = CustomerRepository::new(channel.clone());

    let mut cohorts = Vec::with_capacity(DEPTS.len() * YEARS.len());
    for dept in DEPTS {
        for year in YEARS {
            let category = categories
                .create(&NewCategory {
                    name: format!("{dept} {year}"),
                    dept: dept.to_string(),
                    year: year.to_string(),
                })
                .await?;
            cohorts.push(category.id);
        }
    }

    for (idx, (first_name, last_name, account, is_kfetier)) in SAMPLE_CUSTOMERS.iter().enumerate()
    {
        // Round-robin over the cohort grid keeps the spread deterministic
        let category_id = cohorts[idx % cohorts.len()];
        customers
            .create(&NewCustomer {
                first_name: (*first_name).to_string(),
                last_name: (*last_name).to_string(),
                account: Some(*account),
                is_kfetier: Some(*is_kfetier),
                category_id: Some(category_id),
            })
            .await?;
    }

    info!(
        categories = cohorts.len(),
        customers = SAMPLE_CUSTOMERS.len(),
        "seeded development fixture"
    );
    Ok(SeedReport {
        categories: cohorts.len(),
        customers: SAMPLE_CUSTOMERS.len(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_ledger;

    #[tokio::test]
    async fn test_seed_populates_cohorts_and_roster() {
        let ledger = memory_ledger().await;
        let report = ledger.seed().await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                categories: 12,
                customers: 15
            }
        );

        assert_eq!(
            ledger.categories().depts().await.unwrap(),
            vec!["DA", "DEE", "DI", "DMS"]
        );
        assert_eq!(
            ledger.categories().years().await.unwrap(),
            vec!["3A", "4A", "5A"]
        );

        let roster = ledger.customers().list().await.unwrap();
        assert_eq!(roster.len(), 15);
        assert!(roster.iter().all(|c| c.customer.category_id.is_some()));
        assert!(roster.iter().all(|c| c.dept.is_some()));
    }

    #[tokio::test]
    async fn test_seed_skips_populated_store() {
        let ledger = memory_ledger().await;
        ledger.seed().await.unwrap();

        let second = ledger.seed().await.unwrap();
        assert_eq!(
            second,
            SeedReport {
                categories: 0,
                customers: 0
            }
        );
        assert_eq!(ledger.customers().list().await.unwrap().len(), 15);
    }
}
