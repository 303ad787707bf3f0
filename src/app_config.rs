//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Key-value file configuration for harvester defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Listing page that links to the item pages.
    pub start_url: Option<String>,
    /// Root that relative paths resolve against.
    pub project_root: Option<PathBuf>,
    /// Directory receiving downloaded documents.
    pub output_dir: Option<PathBuf>,
    /// Manifest JSON path.
    pub manifest_path: Option<PathBuf>,
    /// Append-only error log path.
    pub error_log_path: Option<PathBuf>,
    /// Worker pool width (same range as CLI).
    pub concurrency: Option<u8>,
    /// Longest stall while fetching a document, in seconds.
    pub fetch_timeout_secs: Option<u64>,
    /// Page load timeout in seconds.
    pub page_timeout_secs: Option<u64>,
    /// Regex that item link URLs must match.
    pub link_pattern: Option<String>,
    pub disambiguate_names: Option<bool>,
    pub verify_on_skip: Option<bool>,
    pub user_agent: Option<String>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }
        validate_timeout_secs("fetch_timeout_secs", self.fetch_timeout_secs)?;
        validate_timeout_secs("page_timeout_secs", self.page_timeout_secs)?;

        if let Some(pattern) = &self.link_pattern {
            regex::Regex::new(pattern).with_context(|| {
                format!("Invalid config value for `link_pattern`: '{pattern}' is not a valid regex")
            })?;
        }
        if let Some(start_url) = &self.start_url {
            url::Url::parse(start_url).with_context(|| {
                format!("Invalid config value for `start_url`: '{start_url}' is not an absolute URL")
            })?;
        }

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

impl LoadedConfig {
    /// The parsed config, or an empty one when no file was loaded.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/statute-harvester/config.toml`
/// 2. `$HOME/.config/statute-harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("statute-harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("statute-harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path, or from the default path if present.
///
/// An explicit path that does not exist is an error; a missing default file
/// is not.
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file '{}' does not exist", path.display());
        }
        let config = read_config_file(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = read_config_file(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "start_url" => {
                cfg.start_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "link_pattern" => {
                cfg.link_pattern = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "user_agent" => {
                cfg.user_agent = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "project_root" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.project_root = Some(PathBuf::from(parsed));
            }
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "manifest_path" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.manifest_path = Some(PathBuf::from(parsed));
            }
            "error_log_path" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.error_log_path = Some(PathBuf::from(parsed));
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "fetch_timeout_secs" => {
                cfg.fetch_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "page_timeout_secs" => {
                cfg.page_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "disambiguate_names" => {
                cfg.disambiguate_names = Some(parse_boolean(value).with_context(invalid)?);
            }
            "verify_on_skip" => {
                cfg.verify_on_skip = Some(parse_boolean(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!(
                        "Invalid `verbosity` value '{}' on line {}",
                        parsed,
                        line_index + 1
                    )
                })?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
concurrency = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.concurrency, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.output_dir.is_none());
        assert!(cfg.start_url.is_none());
    }

    #[test]
    fn test_parse_config_all_harvest_fields() {
        let cfg = parse_config_str(
            r#"
start_url = "https://example.gov.pk/civil"
project_root = "/srv/lawyer"
output_dir = "Data/raw/pdfs"
manifest_path = "Data/metadata/manifest.json"
error_log_path = "Data/metadata/errors.log"
fetch_timeout_secs = 90
page_timeout_secs = 30
link_pattern = "-apa"
disambiguate_names = true
verify_on_skip = false
user_agent = "archive-bot/1.0"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.start_url.as_deref(), Some("https://example.gov.pk/civil"));
        assert_eq!(cfg.project_root, Some(PathBuf::from("/srv/lawyer")));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("Data/raw/pdfs")));
        assert_eq!(
            cfg.manifest_path,
            Some(PathBuf::from("Data/metadata/manifest.json"))
        );
        assert_eq!(
            cfg.error_log_path,
            Some(PathBuf::from("Data/metadata/errors.log"))
        );
        assert_eq!(cfg.fetch_timeout_secs, Some(90));
        assert_eq!(cfg.page_timeout_secs, Some(30));
        assert_eq!(cfg.link_pattern.as_deref(), Some("-apa"));
        assert_eq!(cfg.disambiguate_names, Some(true));
        assert_eq!(cfg.verify_on_skip, Some(false));
        assert_eq!(cfg.user_agent.as_deref(), Some("archive-bot/1.0"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_concurrency() {
        let err = parse_config_str("concurrency = 0").expect_err("invalid concurrency expected");
        assert!(
            err.to_string().contains("concurrency"),
            "expected concurrency validation error"
        );
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("concurrency = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
concurrency = 4 # workers
start_url = "https://example.gov.pk/laws#civil" # fragment kept inside quotes
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.concurrency, Some(4));
        assert_eq!(
            cfg.start_url.as_deref(),
            Some("https://example.gov.pk/laws#civil")
        );
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err =
            parse_config_str("fetch_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("fetch_timeout_secs"));

        let err = parse_config_str("page_timeout_secs = 3601")
            .expect_err("timeout above range expected");
        assert!(err.to_string().contains("page_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_link_pattern() {
        let err = parse_config_str(r#"link_pattern = "([a-z""#).expect_err("bad regex expected");
        assert!(err.to_string().contains("link_pattern"));
    }

    #[test]
    fn test_parse_config_rejects_relative_start_url() {
        let err = parse_config_str(r#"start_url = "/civil""#).expect_err("relative url rejected");
        assert!(err.to_string().contains("start_url"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_boolean() {
        let err = parse_config_str("verify_on_skip = yes").expect_err("invalid boolean expected");
        assert!(err.to_string().contains("verify_on_skip"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_path() {
        let err = parse_config_str("output_dir = pdfs").expect_err("unquoted string rejected");
        assert!(err.to_string().contains("output_dir"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("concurrency 4").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_verbosity_as_str() {
        assert_eq!(VerbositySetting::Default.as_str(), "default");
        assert_eq!(VerbositySetting::Verbose.as_str(), "verbose");
        assert_eq!(VerbositySetting::Quiet.as_str(), "quiet");
        assert_eq!(VerbositySetting::Debug.as_str(), "debug");
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("harvester.toml");
        fs::write(&path, "concurrency = 5\n").expect("write config");

        let loaded = load_file_config(Some(&path)).expect("explicit config should load");
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.file_config().concurrency, Some(5));
    }

    #[test]
    fn test_load_missing_explicit_config_is_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = load_file_config(Some(&dir.path().join("absent.toml")))
            .expect_err("missing explicit config rejected");
        assert!(err.to_string().contains("does not exist"));
    }
}
