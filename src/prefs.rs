//! Application preferences with change notification.
//!
//! Theme and language are held by one explicit store that is handed to
//! whoever needs it. Components subscribe for changes instead of
//! listening for global events. Writes are last-writer-wins.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Preferences) + Send + Sync>;

struct Inner {
    current: Preferences,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Shared preferences. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

impl PreferenceStore {
    pub fn new(initial: Preferences) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                current: initial,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A listener that panicked leaves the data intact; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self) -> Preferences {
        self.lock().current
    }

    /// Register `listener`; it is called with the new snapshot after
    /// every change, in subscription order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Preferences) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(sid, _)| *sid != id);
        inner.listeners.len() != before
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|p| p.theme = theme);
    }

    pub fn set_language(&self, language: Language) {
        self.update(|p| p.language = language);
    }

    /// Apply `change` and notify subscribers if anything changed.
    pub fn update(&self, change: impl FnOnce(&mut Preferences)) {
        let (snapshot, listeners) = {
            let mut inner = self.lock();
            let mut next = inner.current;
            change(&mut next);
            if next == inner.current {
                return;
            }
            inner.current = next;
            let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (next, listeners)
        };
        log::debug!("Preferences changed: {:?}", snapshot);
        // Called outside the lock so listeners may read the store.
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_changes_in_order() {
        let store = PreferenceStore::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log_a = seen.clone();
        store.subscribe(move |p| log_a.lock().unwrap().push(("a", p.theme)));
        let log_b = seen.clone();
        store.subscribe(move |p| log_b.lock().unwrap().push(("b", p.theme)));

        store.set_theme(Theme::Dark);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", Theme::Dark), ("b", Theme::Dark)]
        );
    }

    #[test]
    fn unchanged_value_does_not_notify() {
        let store = PreferenceStore::default();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        store.subscribe(move |_| *c.lock().unwrap() += 1);

        store.set_language(Language::PtBr);
        assert_eq!(*count.lock().unwrap(), 0);
        store.set_language(Language::En);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = PreferenceStore::default();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let id = store.subscribe(move |_| *c.lock().unwrap() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_theme(Theme::Dark);
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn clones_share_state_last_writer_wins() {
        let store = PreferenceStore::default();
        let other = store.clone();
        store.set_theme(Theme::Dark);
        other.set_theme(Theme::Light);
        assert_eq!(store.get().theme, Theme::Light);
    }

    #[test]
    fn listener_can_read_store() {
        let store = PreferenceStore::default();
        let handle = store.clone();
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        store.subscribe(move |_| *s.lock().unwrap() = Some(handle.get().language));
        store.set_language(Language::Es);
        assert_eq!(*seen.lock().unwrap(), Some(Language::Es));
    }

    #[test]
    fn preferences_json() {
        let prefs: Preferences = serde_json::from_str(r#"{"theme": "dark", "language": "en"}"#).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.language, Language::En);
        let defaults: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.language, Language::PtBr);
    }
}
