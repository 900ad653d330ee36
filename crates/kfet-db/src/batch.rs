//! # Batch Coordinator
//!
//! Collects statements that must land together and submits them through
//! the channel's transactional path. The channel guarantees atomicity;
//! this type guarantees the statements arrive in the order they were
//! queued and that results come back index-aligned with them.
//!
//! An empty batch is a completed no-op: it never touches the channel, so
//! "nothing to do" cannot fail and cannot open a useless transaction.

use crate::channel::{ExecutionChannel, Rows};
use crate::error::DbResult;
use crate::statement::Statement;

/// An ordered set of statements executed as one atomic unit.
#[derive(Debug, Default)]
pub struct Batch {
    statements: Vec<Statement>,
}

impl Batch {
    pub fn new() -> Self {
        Batch {
            statements: Vec::new(),
        }
    }

    /// A batch pre-filled with `statements`, in order.
    pub fn with(statements: Vec<Statement>) -> Self {
        Batch { statements }
    }

    /// Appends a statement; it will run after everything queued before it.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Runs the whole batch atomically.
    ///
    /// `results[i]` holds the rows of `statements[i]`. Either every
    /// statement was applied, or the error carries the first failure and
    /// none were.
    pub async fn execute(self, channel: &dyn ExecutionChannel) -> DbResult<Vec<Rows>> {
        if self.statements.is_empty() {
            return Ok(Vec::new());
        }
        channel.execute_batch(&self.statements).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockChannel, RecordedCall};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_batch_skips_the_channel() {
        let channel = MockChannel::new();
        let results = Batch::new().execute(&channel).await.unwrap();
        assert!(results.is_empty());
        assert!(channel.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_alignment() {
        let channel = MockChannel::new();
        let mut batch = Batch::new();
        batch.push(Statement::raw("CREATE TABLE a (x)"));
        batch.push(Statement {
            sql: "INSERT INTO a VALUES (?)".to_string(),
            params: vec![json!(1)],
        });
        assert_eq!(batch.len(), 2);

        let results = batch.execute(&channel).await.unwrap();
        assert_eq!(results.len(), 2);

        let calls = channel.recorded_calls().await;
        match calls.as_slice() {
            [RecordedCall::Batch(statements)] => {
                assert_eq!(statements[0].sql, "CREATE TABLE a (x)");
                assert_eq!(statements[1].params, vec![json!(1)]);
            }
            other => panic!("expected one batch call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_batch_failure_propagates() {
        let channel = MockChannel::new().failing_batches();
        let err = Batch::with(vec![Statement::raw("SELECT 1")])
            .execute(&channel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("injected"));
    }
}
