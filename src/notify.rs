//! Route-scoped notification queues
//!
//! Messages are queued either for the route rendered now or for the next
//! route; a route change promotes the next-route queue and drops whatever
//! the previous route was still showing.

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A single queued message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Session-scoped notification service shared by the controllers
#[derive(Debug, Default)]
pub struct Notifications {
    current: Vec<Notification>,
    next: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message on the route currently rendered
    pub fn push_for_current_route(&mut self, message: impl Into<String>, severity: Severity) {
        self.current.push(Notification {
            message: message.into(),
            severity,
        });
    }

    /// Queue a message for the route rendered after the next transition
    pub fn push_for_next_route(&mut self, message: impl Into<String>, severity: Severity) {
        self.next.push(Notification {
            message: message.into(),
            severity,
        });
    }

    /// Promote next-route messages; called exactly once per route transition
    pub fn route_changed(&mut self) {
        self.current = std::mem::take(&mut self.next);
    }

    /// Messages for the route currently rendered, oldest first
    pub fn current(&self) -> &[Notification] {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_route_message_visible_immediately() {
        let mut notifications = Notifications::new();
        notifications.push_for_current_route("saved", Severity::Info);

        assert_eq!(notifications.current().len(), 1);
        assert_eq!(notifications.current()[0].message, "saved");
    }

    #[test]
    fn test_next_route_message_hidden_until_transition() {
        let mut notifications = Notifications::new();
        notifications.push_for_next_route("updated", Severity::Info);
        assert!(notifications.current().is_empty());

        notifications.route_changed();
        assert_eq!(notifications.current().len(), 1);
        assert_eq!(notifications.current()[0].message, "updated");

        // consumed once: gone after the following transition
        notifications.route_changed();
        assert!(notifications.current().is_empty());
    }

    #[test]
    fn test_transition_drops_stale_current_messages() {
        let mut notifications = Notifications::new();
        notifications.push_for_current_route("old error", Severity::Error);
        notifications.push_for_next_route("fresh", Severity::Info);

        notifications.route_changed();
        let current = notifications.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "fresh");
    }

    #[test]
    fn test_ordering_preserved() {
        let mut notifications = Notifications::new();
        notifications.push_for_next_route("first", Severity::Info);
        notifications.push_for_next_route("second", Severity::Error);

        notifications.route_changed();
        let messages: Vec<_> = notifications
            .current()
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
