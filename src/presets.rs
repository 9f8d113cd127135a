//! Named, reusable sanitization and column-selection settings.
//!
//! All presets live as one JSON list under [`PRESETS_KEY`] in a
//! [`KeyValueStore`]. Reading is forgiving: an entry that does not decode is
//! logged and skipped, and a list that cannot be read at all is treated as
//! empty. Two seed presets are written the first time a store is opened.
//!
//! Presets carry no schema version.

pub mod storage;

use crate::error::{Result, SheetError};
use crate::model::SemanticType;
use crate::pipeline::{PolicyNumberOptions, SanitizationOptions, SsnFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Store key holding the serialized preset list.
pub const PRESETS_KEY: &str = "sheetwise.presets";

/// Per-column choices captured by a preset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSelection {
    pub semantic_type: SemanticType,
    pub selected: bool,
    pub display_name: Option<String>,
}

/// The part of a preset that is applied to a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetConfig {
    pub sanitization_options: SanitizationOptions,
    pub column_selections: BTreeMap<String, ColumnSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sanitization_options: SanitizationOptions,
    #[serde(default)]
    pub column_selections: BTreeMap<String, ColumnSelection>,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: Option<String>, config: PresetConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            date_created: Utc::now(),
            date_modified: None,
            sanitization_options: config.sanitization_options,
            column_selections: config.column_selections,
        }
    }

    pub fn config(&self) -> PresetConfig {
        PresetConfig {
            sanitization_options: self.sanitization_options.clone(),
            column_selections: self.column_selections.clone(),
        }
    }
}

/// Presets shipped with a fresh store.
pub fn seed_presets() -> Vec<Preset> {
    let contacts = SanitizationOptions {
        trim_whitespace: true,
        remove_special_chars: true,
        strip_html: true,
        format_phones: true,
        normalize_emails: true,
        format_zip_codes: true,
        sanitize_zip_codes: true,
        ..Default::default()
    };

    let financial = SanitizationOptions {
        trim_whitespace: true,
        format_currency: true,
        format_ssn: true,
        ssn_format: SsnFormat::Masked,
        date_format: Some("%Y-%m-%d".to_owned()),
        policy_number: Some(PolicyNumberOptions {
            columns: vec!["Policy Number".to_owned()],
            ..Default::default()
        }),
        per_value_fallback: false,
        ..Default::default()
    };

    vec![
        Preset::new(
            "Contact list cleanup",
            Some("Trim text, normalize emails and phone numbers, cut ZIP+4 to five digits".to_owned()),
            PresetConfig {
                sanitization_options: contacts,
                ..Default::default()
            },
        ),
        Preset::new(
            "Financial records",
            Some("Currency symbols, masked SSNs, ISO dates and segmented policy numbers".to_owned()),
            PresetConfig {
                sanitization_options: financial,
                ..Default::default()
            },
        ),
    ]
}

/// Decodes one stored entry.
fn decode_preset(value: serde_json::Value) -> Result<Preset> {
    serde_json::from_value(value).map_err(|e| SheetError::PresetCorruption(e.to_string()))
}

/// CRUD over the preset list in a key-value store.
#[derive(Debug)]
pub struct PresetStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Opens the store, writing the seed presets when the key is absent.
    pub fn open(mut store: S) -> Result<Self> {
        if store.get(PRESETS_KEY)?.is_none() {
            tracing::info!("Seeding preset store with defaults");
            let json = serde_json::to_string(&seed_presets())?;
            store.set(PRESETS_KEY, &json)?;
        }
        Ok(Self { store })
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Every readable preset, in stored order. A store that cannot be read
    /// is logged and treated as empty.
    pub fn list(&self) -> Vec<Preset> {
        self.load_all().unwrap_or_else(|e| {
            tracing::warn!("Preset store unreadable, treating as empty: {e}");
            Vec::new()
        })
    }

    /// Like [`PresetStore::list`], but a failing store read is an error.
    ///
    /// Only a list that reads but does not parse degrades to empty, and
    /// single undecodable entries are skipped. Mutators start from this so a
    /// failed read never ends up overwriting the stored list.
    ///
    /// # Errors
    ///
    /// Whatever [`KeyValueStore::get`] returns.
    pub fn load_all(&self) -> Result<Vec<Preset>> {
        let Some(raw) = self.store.get(PRESETS_KEY)? else {
            return Ok(Vec::new());
        };

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Preset list is corrupt, treating as empty: {e}");
                return Ok(Vec::new());
            }
        };

        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match decode_preset(entry) {
                Ok(preset) => Some(preset),
                Err(e) => {
                    tracing::warn!("Skipping preset #{idx}: {e}");
                    None
                }
            })
            .collect())
    }

    pub fn get(&self, id: Uuid) -> Option<Preset> {
        self.list().into_iter().find(|p| p.id == id)
    }

    /// Stores a new preset and returns its id. Unreadable entries already in
    /// the list are dropped on write.
    ///
    /// # Errors
    ///
    /// `Other` for a blank name; store read or write failures.
    pub fn save(
        &mut self,
        name: &str,
        description: Option<String>,
        config: PresetConfig,
    ) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SheetError::Other("Preset name cannot be empty".to_owned()));
        }

        let preset = Preset::new(name, description, config);
        let id = preset.id;
        let mut presets = self.load_all()?;
        presets.push(preset);
        self.write(&presets)?;
        tracing::info!("Saved preset '{name}' ({id})");
        Ok(id)
    }

    /// Replaces a preset's settings, keeping its id, name and creation date.
    ///
    /// # Errors
    ///
    /// `Other` for an unknown id; store read or write failures.
    pub fn overwrite(&mut self, id: Uuid, config: PresetConfig) -> Result<()> {
        let mut presets = self.load_all()?;
        let preset = presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        preset.sanitization_options = config.sanitization_options;
        preset.column_selections = config.column_selections;
        preset.date_modified = Some(Utc::now());
        self.write(&presets)
    }

    /// Removes a preset. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Store read or write failures.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let mut presets = self.load_all()?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        self.write(&presets)?;
        Ok(true)
    }

    /// The settings to apply for a preset.
    pub fn apply(&self, id: Uuid) -> Result<PresetConfig> {
        self.get(id).map(|p| p.config()).ok_or_else(|| not_found(id))
    }

    fn write(&mut self, presets: &[Preset]) -> Result<()> {
        let json = serde_json::to_string(presets)?;
        self.store.set(PRESETS_KEY, &json)
    }
}

fn not_found(id: Uuid) -> SheetError {
    SheetError::Other(format!("Preset {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PresetStore<MemoryStore> {
        PresetStore::open(MemoryStore::new()).expect("open store")
    }

    #[test]
    fn test_seeds_on_first_open_only() {
        let presets = store();
        let names: Vec<_> = presets.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Contact list cleanup", "Financial records"]);

        let mut inner = presets.into_inner();
        inner.set(PRESETS_KEY, "[]").expect("set");
        let reopened = PresetStore::open(inner).expect("reopen");
        assert!(reopened.list().is_empty());
    }

    #[test]
    fn test_save_apply_overwrite_delete() {
        let mut presets = store();
        let mut config = PresetConfig::default();
        config.column_selections.insert("Zip".into(), ColumnSelection {
            semantic_type: SemanticType::Zipcode,
            selected: true,
            display_name: Some("Postal code".into()),
        });

        let id = presets.save("Mine", None, config.clone()).expect("save");
        assert_eq!(presets.apply(id).expect("apply"), config);
        assert!(presets.get(id).and_then(|p| p.date_modified).is_none());

        let mut changed = config.clone();
        changed.sanitization_options.zip_extended = true;
        presets.overwrite(id, changed.clone()).expect("overwrite");
        let stored = presets.get(id).expect("present");
        assert_eq!(stored.config(), changed);
        assert!(stored.date_modified.is_some());

        assert!(presets.delete(id).expect("delete"));
        assert!(!presets.delete(id).expect("delete again"));
        assert!(presets.apply(id).is_err());
        assert!(presets.overwrite(id, config).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut presets = store();
        assert!(presets.save("   ", None, PresetConfig::default()).is_err());
    }

    #[test]
    fn test_corrupt_entry_is_skipped() {
        let mut inner = MemoryStore::new();
        let good = serde_json::to_value(&seed_presets()[0]).expect("serialize");
        let list = serde_json::json!([{"id": "not-a-uuid", "name": 3}, good]);
        inner.set(PRESETS_KEY, &list.to_string()).expect("set");

        let mut presets = PresetStore::open(inner).expect("open");
        let listed = presets.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Contact list cleanup");

        // Writing drops the unreadable entry.
        presets.save("Next", None, PresetConfig::default()).expect("save");
        assert_eq!(presets.list().len(), 2);
    }

    /// Memory store whose reads can be switched off.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        reads_fail: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            if self.reads_fail {
                return Err(SheetError::Io(std::io::Error::other("disk unavailable")));
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_read_does_not_overwrite_list() {
        let mut presets = PresetStore::open(FlakyStore::default()).expect("open");
        let seeded = presets.list();
        assert_eq!(seeded.len(), 2);

        presets.store.reads_fail = true;
        assert!(presets.list().is_empty());
        assert!(presets.load_all().is_err());
        assert!(presets.save("Mine", None, PresetConfig::default()).is_err());
        assert!(presets.delete(seeded[0].id).is_err());
        assert!(presets.overwrite(seeded[0].id, PresetConfig::default()).is_err());

        presets.store.reads_fail = false;
        let names: Vec<_> = presets.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Contact list cleanup", "Financial records"]);
    }

    #[test]
    fn test_unreadable_list_degrades_to_empty() {
        let mut inner = MemoryStore::new();
        inner.set(PRESETS_KEY, "{ not json").expect("set");
        let presets = PresetStore::open(inner).expect("open");
        assert!(presets.list().is_empty());
    }

    #[test]
    fn test_stored_shape_is_camel_case() {
        let presets = store();
        let raw = presets
            .into_inner()
            .get(PRESETS_KEY)
            .expect("get")
            .expect("seeded");
        assert!(raw.contains("\"dateCreated\""));
        assert!(raw.contains("\"sanitizationOptions\""));
        assert!(raw.contains("\"columnSelections\""));
        assert!(!raw.contains("\"dateModified\""));
    }
}
