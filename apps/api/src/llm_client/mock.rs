//! Scripted oracle for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ExtractionOracle, LlmError, Operation, OracleRequest};

/// One queued oracle reply.
pub enum Scripted {
    Json(Value),
    Fail(LlmError),
    /// Never answers within any reasonable deadline.
    Hang,
}

/// Returns queued replies in order and records every call it receives.
/// Running out of replies is an `EmptyContent` error.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(Operation, String)>>,
}

impl ScriptedOracle {
    pub fn new(replies: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Operations called, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.calls.lock().unwrap().iter().map(|(op, _)| *op).collect()
    }

    /// User prompts sent, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl ExtractionOracle for ScriptedOracle {
    async fn complete_json(&self, request: &OracleRequest) -> Result<Value, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.operation, request.prompt.clone()));
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Json(value)) => Ok(value),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::EmptyContent)
            }
            None => Err(LlmError::EmptyContent),
        }
    }
}
