//! # Bootstrap
//!
//! Creates and resets the persisted schema. The DDL comes straight from
//! the registry, so the physical tables cannot drift from what the codec
//! and builder believe is there.

use tracing::info;

use crate::channel::ExecutionChannel;
use crate::codec;
use crate::error::DbResult;
use crate::schema::Entity;
use crate::statement::{self, Statement};

/// Creates every missing table, parents first. Safe on every open.
pub async fn init(channel: &dyn ExecutionChannel) -> DbResult<()> {
    for entity in Entity::ALL {
        channel
            .execute_one(&Statement::raw(entity.table().create_sql()))
            .await?;
    }
    info!(tables = Entity::ALL.len(), "schema ready");
    Ok(())
}

/// Drops every table, children first, then recreates the schema empty.
pub async fn reset(channel: &dyn ExecutionChannel) -> DbResult<()> {
    for entity in Entity::ALL.iter().rev() {
        channel
            .execute_one(&Statement::raw(entity.table().drop_sql()))
            .await?;
    }
    info!("schema dropped");
    init(channel).await
}

/// Current row count of one table.
pub async fn count_rows(channel: &dyn ExecutionChannel, entity: Entity) -> DbResult<i64> {
    let rows = channel.execute_one(&statement::count(entity)).await?;
    codec::decode_scalar_i64(entity.table_name(), &rows)
}

// =============================================================================
// Unit Tests
// =============================================================================
