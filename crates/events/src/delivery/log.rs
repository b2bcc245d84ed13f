//! Log-only notification dispatcher.

use async_trait::async_trait;
use backstage_core::collaborators::{NotificationDispatcher, NotificationError};

use crate::templates::render;

/// Renders notifications and writes them to the log instead of sending.
#[derive(Debug, Clone, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send(
        &self,
        template: &str,
        to: &str,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        let message = render(template, data)?;
        tracing::info!(
            to,
            template,
            subject = %message.subject,
            body = %message.body,
            "Notification (SMTP not configured)"
        );
        Ok(())
    }
}
