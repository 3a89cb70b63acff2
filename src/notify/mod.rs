//! Best-effort delivery of progress events to live recipients.

mod events;
mod sessions;

pub use events::ProgressEvent;
pub use sessions::SessionRegistry;

/// Push side of the progress channel.
///
/// Both operations are fire-and-forget: they never block on the recipient and
/// silently drop events for recipients that are gone.
pub trait NotificationChannel: Send + Sync {
    fn push_to_one(&self, recipient: &str, event: ProgressEvent);

    fn push_to_all(&self, event: ProgressEvent);
}
