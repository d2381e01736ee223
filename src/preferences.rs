use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::{StorageError, Store, THEME_SLOT, load_slot, save_slot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Calm,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Calm];

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::Calm => "Calm",
        })
    }
}

/// Stored theme, or the default when nothing usable is stored.
pub fn load_theme(store: &dyn Store) -> Result<Theme, StorageError> {
    match load_slot::<Theme>(store, THEME_SLOT) {
        Ok(theme) => Ok(theme.unwrap_or_default()),
        Err(StorageError::Json(e)) => {
            log::warn!("Ignoring unreadable theme preference: {}", e);
            Ok(Theme::default())
        }
        Err(e) => Err(e),
    }
}

pub fn save_theme(store: &dyn Store, theme: Theme) -> Result<(), StorageError> {
    save_slot(store, THEME_SLOT, &theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn defaults_to_light_and_persists_choice() {
        let store = MemoryStore::new();
        assert_eq!(load_theme(&store).unwrap(), Theme::Light);
        save_theme(&store, Theme::Calm).unwrap();
        assert_eq!(store.load(THEME_SLOT).unwrap(), Some(json!("calm")));
        assert_eq!(load_theme(&store).unwrap(), Theme::Calm);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let store = MemoryStore::new();
        store.save(THEME_SLOT, &json!("solarized")).unwrap();
        assert_eq!(load_theme(&store).unwrap(), Theme::Light);
    }
}
