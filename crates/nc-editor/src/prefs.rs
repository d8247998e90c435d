//! Persisted UI preferences.
//!
//! The only preference is the sidebar width, which also shifts client
//! coordinates into canvas space. It is clamped both when read back and
//! while the user drags the sidebar edge.

use std::collections::HashMap;

pub const SIDEBAR_WIDTH_KEY: &str = "notecanvas.sidebarWidth";

/// String key/value storage provided by the host.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidebarConfig {
    pub min_width: f64,
    pub max_width: f64,
    pub default_width: f64,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            max_width: 600.0,
            default_width: 300.0,
        }
    }
}

impl SidebarConfig {
    pub fn clamp(&self, width: f64) -> f64 {
        if width.is_nan() {
            return self.default_width;
        }
        width.clamp(self.min_width, self.max_width)
    }

    /// Stored width, clamped; the default when missing or unparseable.
    pub fn load(&self, store: &dyn PreferenceStore) -> f64 {
        match store.get(SIDEBAR_WIDTH_KEY).map(|v| v.trim().parse::<f64>()) {
            Some(Ok(width)) => self.clamp(width),
            Some(Err(err)) => {
                log::warn!("ignoring stored sidebar width: {err}");
                self.default_width
            }
            None => self.default_width,
        }
    }

    /// Clamp an interactive resize and persist it. Returns the applied width.
    pub fn resize(&self, store: &mut dyn PreferenceStore, width: f64) -> f64 {
        let width = self.clamp(width);
        store.set(SIDEBAR_WIDTH_KEY, &width.to_string());
        width
    }
}
