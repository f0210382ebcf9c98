//! Background job dispatch.
//!
//! Controllers hand jobs to a [`JobQueue`] and move on; nothing waits for the
//! job to run. In production the queue submits a Tasker task through the
//! orchestration REST API and the worker in this process executes its steps.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

/// Identity of a background job: the key controllers enqueue it under and the
/// Tasker task template that runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobDescriptor {
    pub key: &'static str,
    pub task_name: &'static str,
    pub namespace: &'static str,
    pub version: &'static str,
}

/// Notifies a deliveryman that an order was assigned to them.
pub const NEW_ORDER_MAIL: JobDescriptor = JobDescriptor {
    key: "NewOrderMail",
    task_name: "new_order_mail",
    namespace: "logistics_rs",
    version: "1.0.0",
};

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue `job` with `payload` as its context.
    async fn add(&self, job: &JobDescriptor, payload: Value) -> anyhow::Result<()>;
}

// ============================================================================
// OrchestrationQueue: Tasker orchestration REST API
// ============================================================================

/// Queue backed by the Tasker orchestration service.
#[derive(Debug, Clone)]
pub struct OrchestrationQueue {
    client: reqwest::Client,
    orchestration_url: String,
}

impl OrchestrationQueue {
    pub fn new(orchestration_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            orchestration_url: orchestration_url.into(),
        }
    }

    fn task_request(job: &JobDescriptor, payload: Value) -> Value {
        serde_json::json!({
            "name": job.task_name,
            "namespace": job.namespace,
            "version": job.version,
            "initiator": "logistics-api",
            "source_system": "logistics-api",
            "reason": format!("{} queued by the logistics API", job.key),
            "context": payload
        })
    }
}

#[async_trait]
impl JobQueue for OrchestrationQueue {
    async fn add(&self, job: &JobDescriptor, payload: Value) -> anyhow::Result<()> {
        let response = self
            .client
            .post(format!("{}/v1/tasks", self.orchestration_url))
            .json(&Self::task_request(job, payload))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Orchestration returned {}: {}", status, body);
        }

        let body: Value = response.json().await?;
        let task_uuid_str = body["task_uuid"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing task_uuid in orchestration response"))?;
        let task_uuid = uuid::Uuid::parse_str(task_uuid_str)?;

        info!("Job {} queued as task {}", job.key, task_uuid);
        Ok(())
    }
}

// ============================================================================
// MemoryQueue: records jobs in-process
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub key: String,
    pub payload: Value,
}

/// Queue that only remembers what was enqueued.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<QueuedJob> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn add(&self, job: &JobDescriptor, payload: Value) -> anyhow::Result<()> {
        self.jobs.lock().await.push(QueuedJob {
            key: job.key.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_request_targets_the_job_template() {
        let request = OrchestrationQueue::task_request(&NEW_ORDER_MAIL, json!({ "order": { "id": 1 } }));
        assert_eq!(request["name"], "new_order_mail");
        assert_eq!(request["namespace"], "logistics_rs");
        assert_eq!(request["version"], "1.0.0");
        assert_eq!(request["context"]["order"]["id"], 1);
    }

    #[tokio::test]
    async fn memory_queue_records_jobs_in_order() {
        let queue = MemoryQueue::new();
        queue.add(&NEW_ORDER_MAIL, json!({ "n": 1 })).await.unwrap();
        queue.add(&NEW_ORDER_MAIL, json!({ "n": 2 })).await.unwrap();

        let jobs = queue.jobs().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].key, "NewOrderMail");
        assert_eq!(jobs[1].payload["n"], 2);
    }

    #[tokio::test]
    async fn unreachable_orchestration_is_an_error() {
        let queue = OrchestrationQueue::new("http://127.0.0.1:9");
        assert!(queue.add(&NEW_ORDER_MAIL, json!({})).await.is_err());
    }
}
