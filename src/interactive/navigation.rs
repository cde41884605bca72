use tokio::sync::watch;

use super::constants::MAX_NAVIGATION_HISTORY;

/// The page URL (its query string) with back/forward history.
///
/// Every change of the current entry is published to subscribers.
pub struct Location {
    history: Vec<String>,
    current_index: usize,
    max_history: usize,
    notifier: watch::Sender<String>,
}

impl Location {
    pub fn new(url: impl Into<String>, max_history: usize) -> Self {
        let url = normalize(url.into());
        let (notifier, _) = watch::channel(url.clone());
        Self {
            history: vec![url],
            current_index: 0,
            max_history: max_history.max(1),
            notifier,
        }
    }

    pub fn current(&self) -> &str {
        &self.history[self.current_index]
    }

    /// Adds a new entry after the current one, dropping any forward history.
    pub fn push(&mut self, url: impl Into<String>) {
        self.history.truncate(self.current_index + 1);
        self.history.push(normalize(url.into()));

        if self.history.len() > self.max_history {
            self.history.remove(0);
        }
        self.current_index = self.history.len() - 1;
        self.publish();
    }

    /// Overwrites the current entry without adding history.
    pub fn replace(&mut self, url: impl Into<String>) {
        self.history[self.current_index] = normalize(url.into());
        self.publish();
    }

    pub fn go_back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.current_index -= 1;
        self.publish();
        Some(self.current())
    }

    pub fn go_forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.current_index += 1;
        self.publish();
        Some(self.current())
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.notifier.subscribe()
    }

    fn publish(&self) {
        let url = &self.history[self.current_index];
        self.notifier.send_if_modified(|published| {
            if published == url {
                return false;
            }
            published.clone_from(url);
            true
        });
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("", MAX_NAVIGATION_HISTORY)
    }
}

fn normalize(url: String) -> String {
    match url.strip_prefix('?') {
        Some(rest) => rest.to_string(),
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let location = Location::new("?s=jane", 10);
        assert_eq!(location.current(), "s=jane");
        assert_eq!(location.len(), 1);
        assert!(!location.can_go_back());
        assert!(!location.can_go_forward());
    }

    #[test]
    fn test_push_and_back_forward() {
        let mut location = Location::default();
        location.push("s=a");
        location.push("s=b");

        assert_eq!(location.go_back(), Some("s=a"));
        assert_eq!(location.go_back(), Some(""));
        assert_eq!(location.go_back(), None);
        assert_eq!(location.go_forward(), Some("s=a"));
        assert_eq!(location.go_forward(), Some("s=b"));
        assert_eq!(location.go_forward(), None);
    }

    #[test]
    fn test_push_truncates_forward_history() {
        let mut location = Location::default();
        location.push("s=a");
        location.push("s=b");
        location.go_back();

        location.push("s=c");
        assert!(!location.can_go_forward());
        assert_eq!(location.go_back(), Some("s=a"));
        assert_eq!(location.len(), 3);
    }

    #[test]
    fn test_replace_keeps_history_length() {
        let mut location = Location::default();
        location.push("s=a");
        location.replace("s=a&p=2");

        assert_eq!(location.len(), 2);
        assert_eq!(location.current(), "s=a&p=2");
        assert_eq!(location.go_back(), Some(""));
    }

    #[test]
    fn test_max_history() {
        let mut location = Location::new("s=0", 3);
        for i in 1..=5 {
            location.push(format!("s={i}"));
        }

        assert_eq!(location.len(), 3);
        assert_eq!(location.go_back(), Some("s=4"));
        assert_eq!(location.go_back(), Some("s=3"));
        assert_eq!(location.go_back(), None);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let mut location = Location::default();
        let mut rx = location.subscribe();
        assert!(!rx.has_changed().unwrap());

        location.replace("s=cats");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "s=cats");

        // Same URL again is not a change.
        location.replace("?s=cats");
        assert!(!rx.has_changed().unwrap());

        location.push("s=dogs");
        location.go_back();
        assert_eq!(*rx.borrow_and_update(), "s=cats");
    }
}
