//! Fire-and-forget notification helper.

use backstage_core::collaborators::NotificationDispatcher;

/// Send a notification, logging (never returning) any failure.
///
/// Business state is already committed when this runs, so a delivery
/// failure must not fail the request. Returns whether the send succeeded.
pub async fn notify(
    dispatcher: &dyn NotificationDispatcher,
    template: &str,
    to: &str,
    data: &serde_json::Value,
) -> bool {
    match dispatcher.send(template, to, data).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(template, to, error = %e, "Notification failed");
            false
        }
    }
}
