use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::callback::CallbackRegistry;
use crate::client::GeminiClient;
use crate::config::RateLimitSettings;
use crate::response::GeminiResponse;
use crate::types::WirePayload;
use crate::{ErrorKind, Result};

/// Bounded retry schedule: at most `max_attempts` sends, waiting
/// `delays[i]` after the i-th failure (the last delay repeats).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: [1, 5, 10].into_iter().map(Duration::from_secs).collect(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delays,
        }
    }

    /// `max_retries` attempts, starting at `retry_delay` ms and growing by
    /// `backoff_multiplier` each time.
    pub fn from_config(settings: &RateLimitSettings) -> Self {
        let attempts = settings.max_retries.max(1);
        let multiplier = if settings.backoff_multiplier.is_finite() && settings.backoff_multiplier > 0.0 {
            settings.backoff_multiplier
        } else {
            1.0
        };
        let delays = (0..attempts.saturating_sub(1))
            .map(|i| {
                let ms = settings.retry_delay as f64 * multiplier.powi(i as i32);
                Duration::from_millis(ms.min(u64::MAX as f64) as u64)
            })
            .collect();
        Self::new(attempts, delays)
    }

    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let idx = failed_attempt.saturating_sub(1) as usize;
        self.delays
            .get(idx)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Plain-data description of a deferred send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Random id carried through the job's log records.
    #[serde(default = "new_job_id")]
    pub id: String,
    pub payload: WirePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl GenerationJob {
    pub fn new(payload: WirePayload) -> Self {
        Self {
            id: new_job_id(),
            payload,
            model: None,
            callback: None,
            params: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_callback(mut self, name: impl Into<String>, params: Vec<Value>) -> Self {
        self.callback = Some(name.into());
        self.params = params;
        self
    }
}

#[derive(Clone)]
pub struct JobRunner {
    client: GeminiClient,
    callbacks: Arc<CallbackRegistry>,
    policy: RetryPolicy,
}

impl JobRunner {
    pub fn new(client: GeminiClient, callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            client,
            callbacks,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// Run the job on a tokio task.
    pub fn dispatch(&self, job: GenerationJob) -> JoinHandle<Result<GeminiResponse>> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(job).await })
    }

    /// Run the job on the current task.
    pub async fn run(&self, job: GenerationJob) -> Result<GeminiResponse> {
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.client.send(&job.payload, job.model.as_deref()).await {
                Ok(response) => break response,
                Err(e) if attempt >= self.policy.max_attempts || !worth_retrying(&e) => {
                    warn!(job = %job.id, attempt, kind = %e.kind(), error = %e, "gemini job failed");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.delay_after(attempt);
                    debug!(
                        job = %job.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying gemini job"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        self.run_callback(&job, &response).await;
        Ok(response)
    }

    async fn run_callback(&self, job: &GenerationJob, response: &GeminiResponse) {
        let Some(name) = job.callback.as_deref() else {
            return;
        };
        match self.callbacks.get(name) {
            Some(callback) => callback.on_complete(response, &job.params).await,
            None => debug!(job = %job.id, callback = name, "no callback registered; skipping"),
        }
    }
}

fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

fn worth_retrying(err: &crate::Error) -> bool {
    !matches!(err.kind(), ErrorKind::Configuration | ErrorKind::InvalidInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.delay_after(1), Duration::from_secs(1));
        assert_eq!(p.delay_after(2), Duration::from_secs(5));
        assert_eq!(p.delay_after(3), Duration::from_secs(10));
        assert_eq!(p.delay_after(9), Duration::from_secs(10));
    }

    #[test]
    fn test_from_config_backoff() {
        let p = RetryPolicy::from_config(&RateLimitSettings {
            max_retries: 4,
            retry_delay: 100,
            backoff_multiplier: 2.0,
        });
        assert_eq!(p.max_attempts, 4);
        assert_eq!(
            p.delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let p = RetryPolicy::from_config(&RateLimitSettings {
            max_retries: 0,
            retry_delay: 10,
            backoff_multiplier: 2.0,
        });
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.delay_after(1), Duration::ZERO);
    }

    #[test]
    fn test_configuration_and_input_errors_are_final() {
        assert!(!worth_retrying(&crate::Error::configuration("no key")));
        assert!(!worth_retrying(&crate::Error::invalid_input("bad")));
        assert!(worth_retrying(&crate::Error::BadRequest {
            message: "x".into()
        }));
    }

    #[test]
    fn test_job_serializes_as_plain_data() {
        let payload = crate::types::GenerateRequest::Generate {
            prompt: "hi".into(),
            options: Default::default(),
        }
        .to_payload()
        .unwrap();
        let job = GenerationJob::new(payload)
            .with_model("gemini-pro")
            .with_callback("notify", vec![serde_json::json!(42)]);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["model"], "gemini-pro");
        assert_eq!(json["callback"], "notify");
        let back: GenerationJob = serde_json::from_value(json).unwrap();
        assert_eq!(back, job);
        assert_ne!(GenerationJob::new(back.payload.clone()).id, job.id);
    }
}
