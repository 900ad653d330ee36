//! Test doubles and fixtures shared by the crate's unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::channel::{ChannelConfig, ExecutionChannel, Rows};
use crate::error::{DbError, DbResult};
use crate::ledger::Ledger;
use crate::statement::Statement;

/// One observed channel call, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    One(Statement),
    Batch(Vec<Statement>),
}

/// Scripted [`ExecutionChannel`] that records everything it is asked to
/// run.
///
/// Responses are served from a queue, one row set per executed statement
/// (batch statements consume one each); when the queue runs dry the
/// answer is an empty row set. With `failing_batches` every batch call is
/// recorded and then refused, mimicking a transaction that rolled back.
pub struct MockChannel {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<Rows>>,
    fail_batches: bool,
}

impl MockChannel {
    pub fn new() -> Self {
        MockChannel {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            fail_batches: false,
        }
    }

    pub fn with_responses(responses: Vec<Rows>) -> Self {
        MockChannel {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
            fail_batches: false,
        }
    }

    pub fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionChannel for MockChannel {
    async fn execute_one(&self, statement: &Statement) -> DbResult<Rows> {
        self.calls
            .lock()
            .await
            .push(RecordedCall::One(statement.clone()));
        Ok(self.responses.lock().await.pop_front().unwrap_or_default())
    }

    async fn execute_batch(&self, statements: &[Statement]) -> DbResult<Vec<Rows>> {
        self.calls
            .lock()
            .await
            .push(RecordedCall::Batch(statements.to_vec()));
        if self.fail_batches {
            return Err(DbError::Channel("injected batch failure".to_string()));
        }
        let mut responses = self.responses.lock().await;
        Ok(statements
            .iter()
            .map(|_| responses.pop_front().unwrap_or_default())
            .collect())
    }
}

/// Fresh in-memory ledger: tables created, nothing seeded.
pub async fn memory_ledger() -> Ledger {
    Ledger::open(&ChannelConfig::in_memory()).await.unwrap()
}
