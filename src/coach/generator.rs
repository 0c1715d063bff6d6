use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::oracle::{CompletionRequest, Oracle, OracleError};
use super::parser::parse_race_plan;
use super::prompt::{build_race_context, ValidationError, SYSTEM_PROMPT};
use crate::config::{OracleConfig, DEFAULT_TIMEOUT};
use crate::models::{RaceContext, RacePlan};

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CoachError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Builds the prompt, calls the oracle and parses the reply.
///
/// Each oracle attempt is bounded by `timeout`. A transient failure is
/// retried once when `retry` is set; anything else is returned as is.
#[derive(Clone)]
pub struct RacePlanGenerator {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
    retry: bool,
    retry_delay: Duration,
}

impl RacePlanGenerator {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: DEFAULT_TIMEOUT,
            retry: true,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn from_config(oracle: Arc<dyn Oracle>, config: &OracleConfig) -> Self {
        Self::new(oracle)
            .with_timeout(config.timeout)
            .with_retry(config.retry)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub async fn generate(&self, context: &RaceContext) -> Result<RacePlan, CoachError> {
        let prompt = build_race_context(context)?;
        let text = self.complete(prompt).await?;
        Ok(parse_race_plan(&text))
    }

    /// Raw oracle text for an already-built prompt.
    pub async fn complete(&self, prompt: String) -> Result<String, OracleError> {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt,
        };

        match self.attempt(&request).await {
            Err(err) if self.retry && err.is_transient() => {
                tracing::warn!(error = %err, "oracle call failed, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                self.attempt(&request).await
            }
            result => result,
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        tokio::time::timeout(self.timeout, self.oracle.complete(request))
            .await
            .unwrap_or(Err(OracleError::Timeout(self.timeout)))
    }
}
