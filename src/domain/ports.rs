use crate::domain::model::{SubmissionPayload, SubmissionReceipt};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Receives a validated form. The form engine never persists anything itself.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt>;
}

/// Blocking user interaction: the column-name prompt and the alert dialog.
pub trait Prompter {
    /// `None` means the user cancelled.
    fn prompt(&mut self, message: &str) -> Option<String>;
    fn alert(&mut self, message: &str);
}
