//! Reads settings and item definition files and turns them into engine types.
//!
//! Provides format detection (RON/JSON/TOML), deserialization helpers, the
//! settings load/save pair and the item registry pipeline.

use crate::schema::{CookableData, FuelData, ItemData};
use serde::Serialize;
use serde::de::DeserializeOwned;
use smeltery_core::fixed::{Fixed64, checked_f64_to_fixed64};
use smeltery_core::id::ItemTypeId;
use smeltery_core::registry::{ConversionRule, FuelRule, Registry, RegistryBuilder, RegistryError};
use smeltery_core::settings::Settings;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while reading or writing data files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support for this kind of data.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A serialization error occurred.
    #[error("cannot write {file}: {detail}")]
    Serialize { file: PathBuf, detail: String },

    /// An item name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A number does not fit the engine's fixed-point range.
    #[error("{field} of '{item}' in {file} is out of range: {value}")]
    OutOfRange {
        file: PathBuf,
        item: String,
        field: &'static str,
        value: f64,
    },

    /// An item name appears twice.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved items were rejected by the registry builder.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Settings keys contain spaces, which RON identifiers cannot carry.
fn detect_settings_format(path: &Path) -> Result<Format, DataLoadError> {
    match detect_format(path)? {
        Format::Ron => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
        format => Ok(format),
    }
}

// ===========================================================================
// (De)serialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

fn parse_str<T: DeserializeOwned>(path: &Path, format: Format, content: &str) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(path, e)),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(path, format, &content)
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron | Format::Json => parse_str(path, format, &content),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

/// Serialize `value` in the format matching `path`'s extension.
pub fn serialize_to_string<T: Serialize>(path: &Path, value: &T) -> Result<String, DataLoadError> {
    let write_error = |e: &dyn std::fmt::Display| DataLoadError::Serialize {
        file: path.to_path_buf(),
        detail: e.to_string(),
    };
    match detect_format(path)? {
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(|e| write_error(&e)),
        Format::Json => serde_json::to_string_pretty(value).map_err(|e| write_error(&e)),
        Format::Toml => toml::to_string_pretty(value).map_err(|e| write_error(&e)),
    }
}

// ===========================================================================
// Settings
// ===========================================================================

/// Read a settings file, failing on any IO or parse problem.
pub fn try_load_settings(path: &Path) -> Result<Settings, DataLoadError> {
    detect_settings_format(path)?;
    deserialize_file(path)
}

/// Read a settings file, falling back to [`Settings::default`].
///
/// A missing file is not an error. A file that cannot be read or parsed is
/// logged and ignored.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        tracing::info!(file = %path.display(), "no settings file, using defaults");
        return Settings::default();
    }
    match try_load_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(file = %path.display(), %err, "failed to load settings, using defaults");
            Settings::default()
        }
    }
}

/// Write `settings` to `path` in the format matching its extension.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), DataLoadError> {
    detect_settings_format(path)?;
    let content = serialize_to_string(path, settings)?;
    std::fs::write(path, content)?;
    tracing::debug!(file = %path.display(), "saved settings");
    Ok(())
}

// ===========================================================================
// Item registry
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Load an items file (top-level key `items` in TOML) into a [`Registry`].
pub fn load_registry(path: &Path) -> Result<Registry, DataLoadError> {
    let items: Vec<ItemData> = deserialize_list(path, "items")?;
    build_registry(&items, path)
}

/// Resolve parsed item definitions into a [`Registry`].
///
/// Every name is registered first, so rules may refer to items defined later
/// in the file. `file` is only used in error messages.
pub fn build_registry(items: &[ItemData], file: &Path) -> Result<Registry, DataLoadError> {
    let mut builder = RegistryBuilder::new();
    let mut ids: HashMap<String, ItemTypeId> = HashMap::new();

    for item in items {
        if ids.contains_key(&item.name) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: item.name.clone(),
            });
        }
        let id = builder.register_item(&item.name)?;
        ids.insert(item.name.clone(), id);
    }

    for item in items {
        let id = *resolve_name(&ids, &item.name, file, "item")?;
        if let Some(fuel) = &item.fuel {
            builder.set_fuel(id, fuel_rule(&item.name, fuel, &ids, file)?)?;
        }
        if let Some(cookable) = &item.cookable {
            builder.set_conversion(id, conversion_rule(&item.name, cookable, &ids, file)?)?;
        }
    }

    let registry = builder.build()?;
    tracing::debug!(file = %file.display(), items = registry.item_count(), "loaded item registry");
    Ok(registry)
}

fn resolve_optional(
    name: Option<&str>,
    ids: &HashMap<String, ItemTypeId>,
    file: &Path,
) -> Result<Option<ItemTypeId>, DataLoadError> {
    name.map(|n| resolve_name(ids, n, file, "item").copied())
        .transpose()
}

/// Convert a number from an item file, rejecting NaN and anything outside Q32.32.
fn to_fixed(value: f64, field: &'static str, item: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    checked_f64_to_fixed64(value).ok_or_else(|| DataLoadError::OutOfRange {
        file: file.to_path_buf(),
        item: item.to_string(),
        field,
        value,
    })
}

fn fuel_rule(
    item: &str,
    data: &FuelData,
    ids: &HashMap<String, ItemTypeId>,
    file: &Path,
) -> Result<FuelRule, DataLoadError> {
    Ok(FuelRule {
        fuel_amount: to_fixed(data.amount, "amount", item, file)?,
        byproduct: resolve_optional(data.byproduct.as_deref(), ids, file)?,
        byproduct_amount: data.byproduct_amount,
        byproduct_chance: to_fixed(data.byproduct_chance, "byproduct_chance", item, file)?,
    })
}

fn conversion_rule(
    item: &str,
    data: &CookableData,
    ids: &HashMap<String, ItemTypeId>,
    file: &Path,
) -> Result<ConversionRule, DataLoadError> {
    Ok(ConversionRule {
        min_temperature: to_fixed(data.low_temp, "low_temp", item, file)?,
        max_temperature: to_fixed(data.high_temp, "high_temp", item, file)?,
        cook_time: data.cook_time,
        becomes: resolve_optional(data.becomes.as_deref(), ids, file)?,
        amount_of_become: to_fixed(data.amount_of_become, "amount_of_become", item, file)?.max(Fixed64::ZERO),
        sets_cooking_flag: data.sets_cooking_flag,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
