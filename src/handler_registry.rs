//! Handler registry for the logistics API worker.
//!
//! Bridges the plain function handlers in `handlers/` to the `StepHandler`
//! trait required by the tasker-worker dispatch system. Each function is
//! wrapped in a `FunctionHandler` that pulls the task context out of the
//! `TaskSequenceStep` and calls the underlying function.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::debug;

use tasker_shared::messaging::StepExecutionResult;
use tasker_shared::types::base::TaskSequenceStep;
use tasker_shared::TaskerResult;
use tasker_worker::worker::handlers::{StepHandler, StepHandlerRegistry};

use crate::handlers;

/// Callable of the step that sends the new order e-mail.
pub const SEND_NEW_ORDER_MAIL: &str = "mail_send_new_order_mail";

type HandlerFn = Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

struct FunctionHandler {
    handler_name: String,
    handler_fn: HandlerFn,
}

impl FunctionHandler {
    fn new(name: impl Into<String>, f: HandlerFn) -> Self {
        Self {
            handler_name: name.into(),
            handler_fn: f,
        }
    }
}

#[async_trait]
impl StepHandler for FunctionHandler {
    async fn call(&self, step: &TaskSequenceStep) -> TaskerResult<StepExecutionResult> {
        let start = Instant::now();
        let step_uuid = step.workflow_step.workflow_step_uuid;

        let context = step
            .task
            .task
            .context
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));

        debug!("Running step handler {} for step {}", self.handler_name, step_uuid);
        let outcome = (self.handler_fn)(&context);
        let elapsed_ms = start.elapsed().as_millis() as i64;

        match outcome {
            Ok(result) => Ok(StepExecutionResult::success(step_uuid, result, elapsed_ms, None)),
            Err(err) => Ok(StepExecutionResult::failure(
                step_uuid, err, None, None, false, elapsed_ms, None,
            )),
        }
    }

    fn name(&self) -> &str {
        &self.handler_name
    }
}

/// `StepHandlerRegistry` holding every step handler of the logistics API.
pub struct LogisticsHandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn StepHandler>>>,
}

impl Default for LogisticsHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticsHandlerRegistry {
    pub fn new() -> Self {
        let registry = Self {
            handlers: RwLock::new(HashMap::new()),
        };
        registry.register_fn(SEND_NEW_ORDER_MAIL, Box::new(handlers::mail::send_new_order_mail));
        registry
    }

    /// Number of registered handlers (for logging at startup).
    pub fn handler_count(&self) -> usize {
        self.handlers.read().expect("registry lock poisoned").len()
    }

    fn register_fn(&self, name: &str, f: HandlerFn) {
        let handler = Arc::new(FunctionHandler::new(name, f));
        self.register(name, handler);
    }
}

#[async_trait]
impl StepHandlerRegistry for LogisticsHandlerRegistry {
    async fn get(&self, step: &TaskSequenceStep) -> Option<Arc<dyn StepHandler>> {
        let handlers = self.handlers.read().expect("registry lock poisoned");
        handlers
            .get(&step.step_definition.handler.callable)
            .cloned()
    }

    fn register(&self, name: &str, handler: Arc<dyn StepHandler>) {
        self.handlers
            .write()
            .expect("registry lock poisoned")
            .insert(name.to_string(), handler);
    }

    fn handler_available(&self, name: &str) -> bool {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .contains_key(name)
    }

    fn registered_handlers(&self) -> Vec<String> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}
