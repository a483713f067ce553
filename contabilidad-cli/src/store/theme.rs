use anyhow::Result;

use super::LocalStore;

const KEY: &str = "darkMode";

pub fn load_dark_mode(store: &LocalStore) -> bool {
    store.load(KEY)
}

pub fn save_dark_mode(store: &LocalStore, dark: bool) -> Result<()> {
    store.save(KEY, &dark)
}

/// Flips the preference and returns the new value.
pub fn toggle_dark_mode(store: &LocalStore) -> Result<bool> {
    let dark = !load_dark_mode(store);
    save_dark_mode(store, dark)?;
    Ok(dark)
}
