//! Loading pipeline: reads data files, resolves names, builds [`GameData`].
//!
//! Provides format detection (RON/JSON/TOML), file discovery and
//! deserialization helpers, plus the two entry points used by the CLI:
//! [`load_game_data`] for a data directory and [`load_config`] for a player
//! configuration file.

use hotm_core::catalog::CatalogError;
use hotm_core::profile::ProfileConfig;
use hotm_core::tables::GameData;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::resolve::{build_catalog, build_tables};
use crate::schema::{LayoutData, MiningData, NodeData};

/// Base names of the three data files.
pub const NODES_FILE: &str = "nodes";
pub const LAYOUT_FILE: &str = "layout";
pub const MINING_FILE: &str = "mining";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization or shape error.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved data failed catalog validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

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

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Deserialize in-memory `content`. `path` only labels errors.
pub fn parse_str<T: DeserializeOwned>(content: &str, format: Format, path: &Path) -> Result<T, DataLoadError> {
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
    parse_str(&content, format, path)
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    if format != Format::Toml {
        return parse_str(&content, format, path);
    }
    let table: toml::Value = parse_str(&content, format, path)?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array.try_into().map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
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

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load `nodes`, `layout` and `mining` from `dir`, each in any supported
/// format, and resolve them into validated [`GameData`].
#[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let nodes_path = require_data_file(dir, NODES_FILE)?;
    let layout_path = require_data_file(dir, LAYOUT_FILE)?;
    let mining_path = require_data_file(dir, MINING_FILE)?;
    debug!(
        nodes = %nodes_path.display(),
        layout = %layout_path.display(),
        mining = %mining_path.display(),
        "data files found"
    );

    let nodes: Vec<NodeData> = deserialize_list(&nodes_path, "nodes")?;
    let layout: LayoutData = deserialize_file(&layout_path)?;
    let mining: MiningData = deserialize_file(&mining_path)?;

    let catalog = build_catalog(&nodes, &layout, &nodes_path, &layout_path)?;
    let mining = build_tables(mining, &catalog, &mining_path)?;
    info!(nodes = catalog.len(), tiers = catalog.tiers(), "game data loaded");
    Ok(GameData { catalog, mining })
}

/// Read a player configuration. Unknown keys are ignored and missing keys
/// take their defaults.
pub fn load_config(path: &Path) -> Result<ProfileConfig, DataLoadError> {
    let config = deserialize_file(path)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hotm_data_test_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const NODES_RON: &str = r#"[
        (name: "drill", kind: stat, effects: [scaling(stat: mining_speed, initial: 0.0, per_level: 20.0)],
         max_level: Some(10), exponent: Some(2.0)),
        (name: "core", kind: misc),
    ]"#;

    const NODES_TOML: &str = r#"
[[nodes]]
name = "drill"
kind = "stat"
max_level = 10
exponent = 2.0
effects = [{ scaling = { stat = "mining_speed", initial = 0.0, per_level = 20.0 } }]

[[nodes]]
name = "core"
kind = "misc"
"#;

    const LAYOUT_RON: &str = r#"(
        rows: [["drill"], ["core"]],
        powder: [mithril, mithril],
        entry: "drill",
        core: "core",
        tokens_hotm: [1, 2],
        tokens_cotm: [0],
    )"#;

    fn mining_json() -> String {
        let blocks: Vec<String> = [
            "ore",
            "blue_mithril",
            "titanium",
            "glacite",
            "ruby",
            "amber",
            "topaz",
            "jasper",
            "aquamarine",
            "hardstone",
        ]
        .iter()
        .map(|b| format!(r#""{b}": {{"strength": 100.0, "drops": 1.0}}"#))
        .collect();
        format!(
            r#"{{"blocks": {{{}}}, "compact_chances": [0.1], "task_stats": {{"ore": ["mining_speed"]}}, "chest_lock_perk": "drill"}}"#,
            blocks.join(", ")
        )
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("nodes.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("nodes.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("nodes.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        let result = detect_format(Path::new("nodes.yaml"));
        assert!(matches!(result, Err(DataLoadError::UnsupportedFormat { .. })));
    }

    #[test]
    fn detect_format_no_extension() {
        let result = detect_format(Path::new("nodes"));
        assert!(matches!(result, Err(DataLoadError::UnsupportedFormat { .. })));
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_toml() {
        let dir = make_test_dir("find_toml");
        fs::write(dir.join("layout.toml"), "").unwrap();

        let result = find_data_file(&dir, "layout").unwrap();
        assert_eq!(result, Some(dir.join("layout.toml")));

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_missing() {
        let dir = make_test_dir("find_missing");

        let result = find_data_file(&dir, "layout").unwrap();
        assert_eq!(result, None);

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("nodes.ron"), "[]").unwrap();
        fs::write(dir.join("nodes.json"), "[]").unwrap();

        let result = find_data_file(&dir, "nodes");
        assert!(matches!(result, Err(DataLoadError::ConflictingFormats { .. })));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");

        let result = require_data_file(&dir, MINING_FILE);
        assert!(matches!(result, Err(DataLoadError::MissingRequired { file: "mining", .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_file / deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_ron_and_toml_agree() {
        let dir = make_test_dir("list_formats");
        let ron_path = dir.join("a.ron");
        let toml_path = dir.join("b.toml");
        fs::write(&ron_path, NODES_RON).unwrap();
        fs::write(&toml_path, NODES_TOML).unwrap();

        let from_ron: Vec<NodeData> = deserialize_list(&ron_path, "nodes").unwrap();
        let from_toml: Vec<NodeData> = deserialize_list(&toml_path, "nodes").unwrap();
        assert_eq!(from_ron.len(), 2);
        assert_eq!(from_toml.len(), 2);
        assert_eq!(from_ron[0].max_level, from_toml[0].max_level);
        assert_eq!(from_ron[0].effects, from_toml[0].effects);
        assert_eq!(from_toml[1].pad, 1);

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("list_toml_missing");
        let path = dir.join("nodes.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();

        let result: Result<Vec<NodeData>, _> = deserialize_list(&path, "nodes");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error_names_file() {
        let dir = make_test_dir("deser_parse_err");
        let path = dir.join("layout.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<LayoutData, _> = deserialize_file(&path);
        match result {
            Err(DataLoadError::Parse { file, detail }) => {
                assert_eq!(file, path);
                assert!(!detail.is_empty());
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn unknown_stat_is_rejected() {
        let text = r#"[(name: "x", kind: stat, effects: [flat(stat: mining_luck, value: 1.0)])]"#;
        let result: Result<Vec<NodeData>, _> = parse_str(text, Format::Ron, Path::new("nodes.ron"));
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
    }

    // -----------------------------------------------------------------------
    // resolve_name / check_duplicate
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_name_missing() {
        let map: HashMap<String, u32> = HashMap::new();

        let result = resolve_name(&map, "mole", Path::new("layout.ron"), "node");
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "node", .. }) if name == "mole"
        ));
    }

    #[test]
    fn check_duplicate_has_dup() {
        let mut map = HashMap::new();
        map.insert("mole".to_string(), 1u32);

        assert!(check_duplicate(&map, "sky_mall", Path::new("nodes.ron")).is_ok());
        let result = check_duplicate(&map, "mole", Path::new("nodes.ron"));
        assert!(matches!(
            result,
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "mole"
        ));
    }

    // -----------------------------------------------------------------------
    // load_game_data
    // -----------------------------------------------------------------------

    #[test]
    fn load_game_data_mixed_formats() {
        let dir = make_test_dir("load_mixed");
        fs::write(dir.join("nodes.toml"), NODES_TOML).unwrap();
        fs::write(dir.join("layout.ron"), LAYOUT_RON).unwrap();
        fs::write(dir.join("mining.json"), mining_json()).unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.catalog.len(), 2);
        assert_eq!(data.catalog.name(data.catalog.entry()), "drill");
        assert_eq!(data.mining.chest_lock_perk(), data.catalog.id("drill"));
        assert_eq!(data.catalog.tokens(2, 0), Some(2));

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_missing_file() {
        let dir = make_test_dir("load_missing");
        fs::write(dir.join("nodes.ron"), NODES_RON).unwrap();

        let result = load_game_data(&dir);
        assert!(matches!(result, Err(DataLoadError::MissingRequired { file: "layout", .. })));

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_unknown_chest_perk() {
        let dir = make_test_dir("load_bad_perk");
        fs::write(dir.join("nodes.ron"), NODES_RON).unwrap();
        fs::write(dir.join("layout.ron"), LAYOUT_RON).unwrap();
        fs::write(dir.join("mining.json"), mining_json().replace(r#""drill""#, r#""nope""#)).unwrap();

        let result = load_game_data(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, .. }) if name == "nope"
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_config
    // -----------------------------------------------------------------------

    #[test]
    fn load_config_toml_with_defaults() {
        let dir = make_test_dir("config_toml");
        let path = dir.join("profile.toml");
        fs::write(
            &path,
            r#"
mode = "powder"
powder_type = "mithril"
mithril_powder = 12345
given_tree = ["mining_speed", "mining_fortune"]
some_future_option = true
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.mode, "powder");
        assert_eq!(config.mithril_powder, 12345);
        assert_eq!(config.given_tree.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.heart_of_the_mountain, ProfileConfig::default().heart_of_the_mountain);

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Error display messages
    // -----------------------------------------------------------------------

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "nodes",
            dir: PathBuf::from("/data"),
        };
        assert!(format!("{e}").contains("nodes"));
        assert!(format!("{e}").contains("/data"));

        let e = DataLoadError::ConflictingFormats {
            a: PathBuf::from("nodes.ron"),
            b: PathBuf::from("nodes.json"),
        };
        let msg = format!("{e}");
        assert!(msg.contains("nodes.ron"));
        assert!(msg.contains("nodes.json"));

        let e = DataLoadError::Catalog(CatalogError::MissingAnchor("entry"));
        assert!(format!("{e}").contains("entry"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
        assert!(format!("{data_err}").contains("file not found"));
    }
}
