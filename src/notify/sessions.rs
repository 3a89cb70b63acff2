use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{NotificationChannel, ProgressEvent};

/// Live recipients of progress events.
///
/// A recipient is registered when it connects and deregistered when it goes
/// away. Registering hands back the receiving end of an unbounded queue, so
/// pushes never wait on the recipient. Closed queues are pruned on the next
/// push that hits them.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, UnboundedSender<ProgressEvent>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `recipient`, replacing any previous session with the same id.
    pub fn register(&self, recipient: impl Into<String>) -> UnboundedReceiver<ProgressEvent> {
        let recipient = recipient.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!("Registering session {recipient}");
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient, sender);
        receiver
    }

    /// Returns whether a session was removed.
    pub fn deregister(&self, recipient: &str) -> bool {
        debug!("Deregistering session {recipient}");
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(recipient)
            .is_some()
    }

    /// Sorted ids of the currently registered recipients.
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, closed: &[String]) {
        if closed.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        for recipient in closed {
            if sessions.get(recipient).is_some_and(UnboundedSender::is_closed) {
                debug!("Pruning closed session {recipient}");
                sessions.remove(recipient);
            }
        }
    }
}

impl NotificationChannel for SessionRegistry {
    fn push_to_one(&self, recipient: &str, event: ProgressEvent) {
        let sender = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(recipient)
            .cloned();

        let Some(sender) = sender else {
            debug!("No session for {recipient}, dropping {} event", event.kind());
            return;
        };

        if sender.send(event).is_err() {
            debug!("Session {recipient} is closed, dropping event");
            self.prune(&[recipient.to_string()]);
        }
    }

    fn push_to_all(&self, event: ProgressEvent) {
        let sessions: Vec<(String, UnboundedSender<ProgressEvent>)> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, sender)| (id.clone(), sender.clone()))
            .collect();

        let closed: Vec<String> = sessions
            .into_iter()
            .filter_map(|(id, sender)| sender.send(event.clone()).is_err().then_some(id))
            .collect();

        self.prune(&closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_deregister() {
        let registry = SessionRegistry::new();
        let _a = registry.register("a");
        let _b = registry.register("b");
        assert_eq!(registry.snapshot(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.deregister("a"));
        assert!(!registry.deregister("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_push_to_one_reaches_only_that_recipient() {
        let registry = SessionRegistry::new();
        let mut a = registry.register("a");
        let mut b = registry.register("b");

        registry.push_to_one("a", ProgressEvent::status("hello"));

        assert_eq!(a.try_recv().unwrap(), ProgressEvent::status("hello"));
        assert!(b.try_recv().is_err());
    }

    #[test]
    fn test_push_to_all_broadcasts() {
        let registry = SessionRegistry::new();
        let mut a = registry.register("a");
        let mut b = registry.register("b");

        registry.push_to_all(ProgressEvent::status("maintenance"));

        assert_eq!(a.try_recv().unwrap(), ProgressEvent::status("maintenance"));
        assert_eq!(b.try_recv().unwrap(), ProgressEvent::status("maintenance"));
    }

    #[test]
    fn test_push_to_unknown_recipient_is_a_no_op() {
        let registry = SessionRegistry::new();
        registry.push_to_one("ghost", ProgressEvent::status("anyone?"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let registry = SessionRegistry::new();
        let receiver = registry.register("gone");
        drop(receiver);

        registry.push_to_one("gone", ProgressEvent::status("late"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregister_replaces_previous_session() {
        let registry = SessionRegistry::new();
        let mut old = registry.register("a");
        let mut new = registry.register("a");

        registry.push_to_one("a", ProgressEvent::status("x"));

        assert!(new.try_recv().is_ok());
        assert!(old.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregistered_session_stream_ends() {
        let registry = SessionRegistry::new();
        let mut rx = registry.register("a");
        registry.push_to_one("a", ProgressEvent::status("first"));
        registry.deregister("a");

        assert_eq!(
            tokio_test::block_on(rx.recv()),
            Some(ProgressEvent::status("first"))
        );
        assert_eq!(tokio_test::block_on(rx.recv()), None);
    }
}
