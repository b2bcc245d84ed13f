//! Plain-text notification templates.
//!
//! Data is a JSON object with camelCase keys. Missing keys render as empty
//! text so that a partially populated payload still produces a message.

use backstage_core::collaborators::NotificationError;
use backstage_core::templates;
use serde_json::Value;

/// Subject prefix on every outgoing message.
const SUBJECT_PREFIX: &str = "[Backstage]";

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Render `template` with `data`.
pub fn render(template: &str, data: &Value) -> Result<RenderedMessage, NotificationError> {
    let t = |key: &str| text(data, key);

    let (subject, body) = match template {
        templates::BOOKING_RECEIVED => (
            format!("Booking request {} received", t("referenceCode")),
            format!(
                "Hi {},\n\nWe received your request to book {} on {} in {}.\n\
                 Your reference is {}. Our team will be in touch shortly.",
                t("requesterName"),
                t("artistName"),
                t("eventDate"),
                t("eventCity"),
                t("referenceCode"),
            ),
        ),
        templates::BOOKING_STATUS_CHANGED => (
            format!("Booking {} is now {}", t("referenceCode"), t("toStatus")),
            with_note(
                format!(
                    "Hi {},\n\nYour booking {} moved from {} to {}.",
                    t("requesterName"),
                    t("referenceCode"),
                    t("fromStatus"),
                    t("toStatus"),
                ),
                &t("note"),
            ),
        ),
        templates::CONTRACT_SIGNATURE_REQUEST => (
            format!("Contract ready to sign: {}", t("referenceCode")),
            with_note(
                format!(
                    "Hi {},\n\nThe contract for {} ({}) is ready.\n\
                     Quoted amount: {} {}\n\n\
                     Review and sign here: {}\n\
                     This link expires at {}.",
                    t("requesterName"),
                    t("artistName"),
                    t("referenceCode"),
                    t("quotedAmount"),
                    t("currency"),
                    t("signingUrl"),
                    t("expiresAt"),
                ),
                &t("customMessage"),
            ),
        ),
        templates::CONTRACT_ARTIST_NOTICE => (
            format!("Contract sent for {}", t("referenceCode")),
            format!(
                "Hi {},\n\nA contract for {} on {} was sent to {} for signature.\n\
                 Signing link: {}",
                t("artistName"),
                t("referenceCode"),
                t("eventDate"),
                t("requesterName"),
                t("signingUrl"),
            ),
        ),
        templates::CONTRACT_SIGNED => (
            format!("Booking {} confirmed", t("referenceCode")),
            format!(
                "Hi {},\n\nThank you. The contract for {} was signed by \"{}\" at {}.\n\
                 Your booking is confirmed.",
                t("requesterName"),
                t("referenceCode"),
                t("signature"),
                t("signedAt"),
            ),
        ),
        templates::BOOKING_CONFIRMED_ARTIST => (
            format!("New confirmed booking {}", t("referenceCode")),
            format!(
                "Hi {},\n\nBooking {} on {} in {} has been confirmed.",
                t("artistName"),
                t("referenceCode"),
                t("eventDate"),
                t("eventCity"),
            ),
        ),
        templates::PRESSKIT_SHARED => (
            format!("{}: {}", t("artistName"), t("presskitTitle")),
            format!(
                "Hi {},\n\nYou have been given access to the {} presskit \"{}\".\n\
                 View it here: {}\nThe link expires at {}.",
                t("recipientName"),
                t("artistName"),
                t("presskitTitle"),
                t("url"),
                t("expiresAt"),
            ),
        ),
        templates::PRESSKIT_VIEWED => (
            format!("Presskit viewed: {}", t("presskitTitle")),
            format!(
                "The presskit \"{}\" was opened by a link shared with {}.\n\
                 Views so far: {}. Source address: {}.",
                t("presskitTitle"),
                t("recipientEmail"),
                t("currentViews"),
                t("ipAddress"),
            ),
        ),
        templates::PRESSKIT_DOWNLOADED => (
            format!("Presskit downloaded: {}", t("presskitTitle")),
            format!(
                "The presskit \"{}\" was downloaded by a link shared with {}.\n\
                 Source address: {}.",
                t("presskitTitle"),
                t("recipientEmail"),
                t("ipAddress"),
            ),
        ),
        other => return Err(NotificationError::UnknownTemplate(other.to_string())),
    };

    Ok(RenderedMessage {
        subject: format!("{SUBJECT_PREFIX} {subject}"),
        body,
    })
}

fn text(data: &Value, key: &str) -> String {
    match data.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn with_note(body: String, note: &str) -> String {
    if note.is_empty() {
        body
    } else {
        format!("{body}\n\n{note}")
    }
}
