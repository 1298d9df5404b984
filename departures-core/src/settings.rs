//! Stop-type and mode filter selection, persisted as flat key-value flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Category of physical station queried from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopType {
    Metro,
    Rail,
    Bus,
}

impl StopType {
    pub const ALL: [StopType; 3] = [StopType::Metro, StopType::Rail, StopType::Bus];

    /// The NaPTAN stop-type key used in API queries and settings storage.
    pub fn key(self) -> &'static str {
        match self {
            StopType::Metro => "NaptanMetroStation",
            StopType::Rail => "NaptanRailStation",
            StopType::Bus => "NaptanPublicBusCoachTram",
        }
    }
}

/// Transit line technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Tube,
    Dlr,
    Overground,
    ElizabethLine,
    Bus,
    Tram,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Tube,
        Mode::Dlr,
        Mode::Overground,
        Mode::ElizabethLine,
        Mode::Bus,
        Mode::Tram,
    ];

    /// The mode key used in API queries and settings storage.
    pub fn key(self) -> &'static str {
        match self {
            Mode::Tube => "tube",
            Mode::Dlr => "dlr",
            Mode::Overground => "overground",
            Mode::ElizabethLine => "elizabeth-line",
            Mode::Bus => "bus",
            Mode::Tram => "tram",
        }
    }
}

/// Which stop types and modes are enabled for departure queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    stop_types: [bool; StopType::ALL.len()],
    modes: [bool; Mode::ALL.len()],
}

impl Default for FilterSelection {
    /// Metro and rail stations on, bus stops off; tube, DLR, Overground
    /// and Elizabeth line on, bus and tram off.
    fn default() -> Self {
        let mut selection = Self {
            stop_types: [false; StopType::ALL.len()],
            modes: [false; Mode::ALL.len()],
        };
        selection.set_stop_type(StopType::Metro, true);
        selection.set_stop_type(StopType::Rail, true);
        selection.set_mode(Mode::Tube, true);
        selection.set_mode(Mode::Dlr, true);
        selection.set_mode(Mode::Overground, true);
        selection.set_mode(Mode::ElizabethLine, true);
        selection
    }
}

impl FilterSelection {
    pub fn stop_type_enabled(&self, stop_type: StopType) -> bool {
        self.stop_types[stop_type as usize]
    }

    pub fn set_stop_type(&mut self, stop_type: StopType, enabled: bool) {
        self.stop_types[stop_type as usize] = enabled;
    }

    pub fn mode_enabled(&self, mode: Mode) -> bool {
        self.modes[mode as usize]
    }

    pub fn set_mode(&mut self, mode: Mode, enabled: bool) {
        self.modes[mode as usize] = enabled;
    }

    /// Enabled stop types in declaration order, for deterministic URLs.
    pub fn enabled_stop_types(&self) -> Vec<StopType> {
        StopType::ALL
            .into_iter()
            .filter(|t| self.stop_type_enabled(*t))
            .collect()
    }

    /// Enabled modes in declaration order, for deterministic URLs.
    pub fn enabled_modes(&self) -> Vec<Mode> {
        Mode::ALL
            .into_iter()
            .filter(|m| self.mode_enabled(*m))
            .collect()
    }
}

/// Persisted filter settings.
///
/// Stored as one JSON object of boolean flags under fixed keys
/// (`type.<StopTypeKey>` and `mode.<ModeKey>`), matching the app's
/// key-value settings layout. Missing keys fall back to defaults; a
/// corrupt or absent file loads as the default selection.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the filter selection, falling back to defaults on any failure.
    pub fn load(&self) -> FilterSelection {
        let flags: BTreeMap<String, bool> = match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(flags) => flags,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "corrupt settings file, using defaults");
                    return FilterSelection::default();
                }
            },
            Err(_) => return FilterSelection::default(),
        };

        let mut selection = FilterSelection::default();
        for stop_type in StopType::ALL {
            if let Some(&enabled) = flags.get(&format!("type.{}", stop_type.key())) {
                selection.set_stop_type(stop_type, enabled);
            }
        }
        for mode in Mode::ALL {
            if let Some(&enabled) = flags.get(&format!("mode.{}", mode.key())) {
                selection.set_mode(mode, enabled);
            }
        }
        selection
    }

    /// Persist the filter selection, replacing any prior value.
    pub fn save(&self, selection: &FilterSelection) -> std::io::Result<()> {
        let mut flags = BTreeMap::new();
        for stop_type in StopType::ALL {
            flags.insert(
                format!("type.{}", stop_type.key()),
                selection.stop_type_enabled(stop_type),
            );
        }
        for mode in Mode::ALL {
            flags.insert(format!("mode.{}", mode.key()), selection.mode_enabled(mode));
        }
        let json = serde_json::to_string_pretty(&flags).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection() {
        let selection = FilterSelection::default();

        assert!(selection.stop_type_enabled(StopType::Metro));
        assert!(selection.stop_type_enabled(StopType::Rail));
        assert!(!selection.stop_type_enabled(StopType::Bus));

        assert!(selection.mode_enabled(Mode::Tube));
        assert!(selection.mode_enabled(Mode::Dlr));
        assert!(selection.mode_enabled(Mode::Overground));
        assert!(selection.mode_enabled(Mode::ElizabethLine));
        assert!(!selection.mode_enabled(Mode::Bus));
        assert!(!selection.mode_enabled(Mode::Tram));
    }

    #[test]
    fn enabled_lists_are_in_declaration_order() {
        let selection = FilterSelection::default();
        assert_eq!(
            selection.enabled_stop_types(),
            vec![StopType::Metro, StopType::Rail]
        );
        assert_eq!(
            selection.enabled_modes(),
            vec![Mode::Tube, Mode::Dlr, Mode::Overground, Mode::ElizabethLine]
        );
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let mut selection = FilterSelection::default();
        selection.set_stop_type(StopType::Rail, false);
        selection.set_mode(Mode::Tram, true);

        store.save(&selection).unwrap();
        assert_eq!(store.load(), selection);
    }

    #[test]
    fn saved_file_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store.save(&FilterSelection::default()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let flags: BTreeMap<String, bool> = serde_json::from_str(&raw).unwrap();
        assert_eq!(flags.get("type.NaptanMetroStation"), Some(&true));
        assert_eq!(flags.get("type.NaptanPublicBusCoachTram"), Some(&false));
        assert_eq!(flags.get("mode.elizabeth-line"), Some(&true));
        assert_eq!(flags.get("mode.tram"), Some(&false));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), FilterSelection::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path);
        assert_eq!(store.load(), FilterSelection::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mode.bus": true}"#).unwrap();

        let store = SettingsStore::new(path);
        let selection = store.load();
        assert!(selection.mode_enabled(Mode::Bus));
        // Untouched keys keep their defaults.
        assert!(selection.stop_type_enabled(StopType::Metro));
        assert!(!selection.mode_enabled(Mode::Tram));
    }
}
