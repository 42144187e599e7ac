use thiserror::Error;

use crate::db::operations::notifications::{
    insert_notification, NewNotification, NotificationRecord,
};
use crate::db::operations::users::get_user;
use crate::db::DatabaseProxy;
use crate::services::email_provider::EmailService;

/// Notification taxonomy used across the API.
pub const NOTIFICATION_KINDS: [&str; 5] =
    ["assignment", "material", "announcement", "grade", "feedback"];

pub fn is_valid_kind(kind: &str) -> bool {
    NOTIFICATION_KINDS.contains(&kind)
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("recipient not found")]
    UnknownRecipient,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Persists a notification for the recipient and, when an email provider is
/// configured, delivers a copy by mail. Email delivery is best-effort: a
/// failed send is logged and never fails the notification itself.
pub async fn notify(
    proxy: &DatabaseProxy,
    email: &EmailService,
    input: NewNotification,
) -> Result<NotificationRecord, NotificationError> {
    let Some(recipient) = get_user(proxy, &input.recipient_id).await? else {
        return Err(NotificationError::UnknownRecipient);
    };

    let record = insert_notification(proxy, &input).await?;

    if email.is_available() {
        let body = format!("<p>{}</p>", record.message);
        if let Err(err) = email.send_email(&recipient.email, &record.title, &body).await {
            tracing::warn!(
                error = %err,
                recipient = %recipient.email,
                "notification email delivery failed"
            );
        }
    }

    Ok(record)
}
