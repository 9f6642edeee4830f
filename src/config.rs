use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "recordstore";
const CONFIG_FILE: &str = "config.yaml";
const LOG_FILE: &str = "recordstore.log";

pub const DEFAULT_STORE: &str = "records.db";
pub const DEFAULT_INPUT: &str = "database.csv";
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub loader: LoaderConfig,
    pub inspector: InspectorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: PathBuf::from(DEFAULT_STORE) }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub input: PathBuf,
    pub delimiter: char,
    pub quote: char,
    pub has_header: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            delimiter: ',',
            quote: '\'',
            has_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectorConfig {
    pub limit: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT }
    }
}

impl Config {
    /// Load from `path` if given, otherwise from the app config directory.
    /// Only the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Config::from_file(p),
            None => Config::from_optional_file(default_config_file().as_deref()),
        }
    }

    /// Defaults when there is no candidate file or it does not exist.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) if p.is_file() => Config::from_file(p),
            _ => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let data = fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Config::from_yaml(&data)
            .with_context(|| format!("failed to parse YAML at {}", path.display()))
    }

    pub fn from_yaml(data: &[u8]) -> Result<Config> {
        // an empty document deserializes to null; treat it as all defaults
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }
        let mut config: Config = serde_yaml::from_slice(data)?;
        config.store.path = expand_path(&config.store.path)?;
        config.loader.input = expand_path(&config.loader.input)?;
        Ok(config)
    }
}

// ~/.config on macOS as well, so the layout matches Linux
fn config_root() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs_next::home_dir().map(|h| h.join(".config"))
    } else {
        dirs_next::config_dir()
    }
}

/// Where the default config file would live. Nothing is created.
pub fn default_config_file() -> Option<PathBuf> {
    config_root().map(|root| root.join(APP_NAME).join(CONFIG_FILE))
}

/// The application config directory, created if missing.
pub fn app_config_dir() -> Result<PathBuf> {
    let dir = config_root()
        .context("no config directory for this platform (is HOME set?)")?
        .join(APP_NAME);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir)
}

pub fn log_path() -> Result<PathBuf> {
    Ok(app_config_dir()
        .context("cannot place the log file")?
        .join(LOG_FILE))
}

/// Convert a delimiter or quote setting to the single byte the CSV reader needs.
pub fn ascii_byte(c: char, what: &str) -> Result<u8> {
    if !c.is_ascii() {
        bail!("{what} must be a single ASCII character, got {c:?}");
    }
    Ok(c as u8)
}

/// Expand a leading `~` and `$VAR` path components.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let mut expanded = PathBuf::new();
    let mut parts = path.iter();
    if path.starts_with("~") {
        parts.next();
        let home = dirs_next::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot expand ~ in {}", path.display()))?;
        expanded.push(home);
    }
    for part in parts {
        let part = part
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("path is not valid UTF-8: {}", path.display()))?;
        match part.strip_prefix('$') {
            Some(var) if cfg!(unix) && !var.is_empty() => {
                expanded.push(std::env::var(var).unwrap_or_default())
            }
            _ => expanded.push(part),
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_paths() {
        let c = Config::default();
        assert_eq!(c.store.path, PathBuf::from("records.db"));
        assert_eq!(c.loader.input, PathBuf::from("database.csv"));
        assert_eq!(c.loader.delimiter, ',');
        assert_eq!(c.loader.quote, '\'');
        assert!(c.loader.has_header);
        assert_eq!(c.inspector.limit, 10);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = Config::from_yaml(b"loader:\n  delimiter: ';'\ninspector:\n  limit: 3\n").unwrap();
        assert_eq!(c.loader.delimiter, ';');
        assert_eq!(c.loader.quote, '\'');
        assert_eq!(c.inspector.limit, 3);
        assert_eq!(c.store.path, PathBuf::from("records.db"));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Config::from_yaml(b"").unwrap(), Config::default());
        assert_eq!(Config::from_yaml(b"\n  \n").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_yaml(b"store:\n  file: x.db\n").is_err());
        assert!(Config::from_yaml(b"loader:\n  delimiter: ';;'\n").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn unreachable_default_location_gives_defaults() {
        assert_eq!(Config::from_optional_file(None).unwrap(), Config::default());

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("no-such-dir").join("config.yaml");
        assert_eq!(Config::from_optional_file(Some(&p)).unwrap(), Config::default());
        assert!(!dir.path().join("no-such-dir").exists());
    }

    #[test]
    fn existing_default_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.yaml");
        fs::write(&p, "inspector:\n  limit: 4\n").unwrap();
        assert_eq!(Config::from_optional_file(Some(&p)).unwrap().inspector.limit, 4);
    }

    #[test]
    fn default_location_is_under_app_dir() {
        if let Some(p) = default_config_file() {
            assert!(p.ends_with("recordstore/config.yaml"));
        }
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.yaml");
        fs::write(&p, "store:\n  path: /tmp/other.db\nloader:\n  has_header: false\n").unwrap();
        let c = Config::load(Some(&p)).unwrap();
        assert_eq!(c.store.path, PathBuf::from("/tmp/other.db"));
        assert!(!c.loader.has_header);
    }

    #[test]
    fn ascii_only_separators() {
        assert_eq!(ascii_byte('\t', "delimiter").unwrap(), b'\t');
        assert!(ascii_byte('§', "delimiter").is_err());
    }

    #[test]
    fn expands_home() {
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(expand_path(Path::new("~/a.db")).unwrap(), home.join("a.db"));
        }
        assert_eq!(expand_path(Path::new("rel/a.db")).unwrap(), PathBuf::from("rel/a.db"));
    }
}
