//! Display-theme preference.
//!
//! Same persistence mechanism as the session record, none of its
//! authorization semantics. An unreadable stored value falls back to
//! light rather than erroring.

use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{KeyValueStore, KEY_THEME};

/// Display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted theme preference.
pub struct ThemePreference {
    store: Arc<dyn KeyValueStore>,
}

impl ThemePreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored theme, or light when absent or unreadable.
    pub fn current(&self) -> Theme {
        self.store
            .get(KEY_THEME)
            .ok()
            .flatten()
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set(&self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(KEY_THEME, theme.as_str())
    }

    /// Flip the preference and persist the new value.
    pub fn toggle(&self) -> Result<Theme, StoreError> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn prefs() -> (Arc<MemoryStore>, ThemePreference) {
        let store = Arc::new(MemoryStore::new());
        let prefs = ThemePreference::new(Arc::clone(&store) as Arc<dyn KeyValueStore>);
        (store, prefs)
    }

    #[test]
    fn defaults_to_light() {
        let (_store, prefs) = prefs();
        assert_eq!(prefs.current(), Theme::Light);
    }

    #[test]
    fn set_and_read_back() {
        let (store, prefs) = prefs();
        prefs.set(Theme::Dark).unwrap();
        assert_eq!(prefs.current(), Theme::Dark);
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let (_store, prefs) = prefs();
        assert_eq!(prefs.toggle().unwrap(), Theme::Dark);
        assert_eq!(prefs.toggle().unwrap(), Theme::Light);
        assert_eq!(prefs.current(), Theme::Light);
    }

    #[test]
    fn unreadable_value_falls_back_to_light() {
        let (store, prefs) = prefs();
        store.set(KEY_THEME, "solarized?").unwrap();
        assert_eq!(prefs.current(), Theme::Light);
    }
}
