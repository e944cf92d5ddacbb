use crate::storage::{KeyValueStore, StorageError};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light/dark preference, persisted under the `theme` key.
#[derive(Debug)]
pub struct ThemeManager {
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Theme>,
}

impl ThemeManager {
    /// Loads the saved theme, falling back to light for a missing or unknown value.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let current = store.get(THEME_KEY).and_then(|raw| Theme::parse(&raw)).unwrap_or_default();
        Self { store, current: Mutex::new(current) }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.theme() == Theme::Dark
    }

    /// # Errors
    /// Returns an error if the preference cannot be persisted.
    pub fn apply(&self, theme: Theme) -> Result<(), StorageError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.set(THEME_KEY, theme.as_str())?;
        *current = theme;
        Ok(())
    }

    /// Switches between light and dark and returns the new theme.
    ///
    /// # Errors
    /// Returns an error if the preference cannot be persisted.
    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let next = current.toggled();
        self.store.set(THEME_KEY, next.as_str())?;
        *current = next;
        Ok(next)
    }
}
