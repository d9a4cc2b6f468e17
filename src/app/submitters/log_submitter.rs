use crate::domain::model::{SubmissionPayload, SubmissionReceipt};
use crate::domain::ports::Submitter;
use crate::utils::error::Result;
use async_trait::async_trait;

pub const ACKNOWLEDGEMENT: &str = "Form submitted successfully!";

/// Logs the value tree and acknowledges. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct LogSubmitter;

impl LogSubmitter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Submitter for LogSubmitter {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt> {
        let json = serde_json::to_string_pretty(payload)?;
        tracing::info!("Form data submitted for '{}':\n{}", payload.form_id, json);

        Ok(SubmissionReceipt {
            message: ACKNOWLEDGEMENT.to_string(),
            location: None,
        })
    }
}
