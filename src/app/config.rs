//! File configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use zspot_core::AudioFormat;

/// Longest accepted pause, in seconds.
pub(crate) const MAX_PAUSE_SECS: u64 = 3600;

/// `key = value` file configuration for zspot defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    pub(crate) music_dir: Option<PathBuf>,
    pub(crate) episodes_dir: Option<PathBuf>,
    pub(crate) download_dir: Option<PathBuf>,
    pub(crate) config_dir: Option<PathBuf>,
    pub(crate) audio_format: Option<AudioFormat>,
    pub(crate) album_in_filename: Option<bool>,
    pub(crate) skip_existing: Option<bool>,
    pub(crate) skip_downloaded: Option<bool>,
    /// Seconds after each download.
    pub(crate) antiban_time: Option<u64>,
    /// Seconds after each album/playlist of a batch.
    pub(crate) antiban_album: Option<u64>,
    /// Search results per category.
    pub(crate) limit: Option<u8>,
    pub(crate) api_base_url: Option<String>,
    pub(crate) fetch_command: Option<String>,
    /// Write JSON metadata sidecars.
    pub(crate) sidecar: Option<bool>,
}

impl FileConfig {
    /// Validates values against the same ranges the CLI enforces.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_pause("antiban_time", self.antiban_time)?;
        validate_pause("antiban_album", self.antiban_album)?;
        if let Some(limit) = self.limit
            && !(1..=50).contains(&limit)
        {
            bail!("Invalid config value for `limit`: {limit}. Expected range: 1..=50");
        }
        if let Some(command) = &self.fetch_command
            && command.trim().is_empty()
        {
            bail!("Invalid config value for `fetch_command`: expected a command");
        }
        Ok(())
    }
}

fn validate_pause(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > MAX_PAUSE_SECS {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 0..={MAX_PAUSE_SECS}");
    }
    Ok(())
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/zspot/config.toml`
/// 2. `$HOME/.config/zspot/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("zspot")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("zspot")
            .join("config.toml"),
    )
}

pub(crate) fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path. A missing file yields
/// `None`; an unreadable or invalid file is an error.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let line_number = line_index + 1;
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "music_dir" => cfg.music_dir = Some(parse_path(value).with_context(context)?),
            "episodes_dir" => cfg.episodes_dir = Some(parse_path(value).with_context(context)?),
            "download_dir" => cfg.download_dir = Some(parse_path(value).with_context(context)?),
            "config_dir" => cfg.config_dir = Some(parse_path(value).with_context(context)?),
            "audio_format" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                let format = parsed
                    .parse::<AudioFormat>()
                    .map_err(anyhow::Error::msg)
                    .with_context(context)?;
                cfg.audio_format = Some(format);
            }
            "album_in_filename" => {
                cfg.album_in_filename = Some(parse_boolean(value).with_context(context)?);
            }
            "skip_existing" => {
                cfg.skip_existing = Some(parse_boolean(value).with_context(context)?);
            }
            "skip_downloaded" => {
                cfg.skip_downloaded = Some(parse_boolean(value).with_context(context)?);
            }
            "antiban_time" => {
                cfg.antiban_time = Some(parse_integer_u64(value).with_context(context)?);
            }
            "antiban_album" => {
                cfg.antiban_album = Some(parse_integer_u64(value).with_context(context)?);
            }
            "limit" => cfg.limit = Some(parse_integer_u8(value).with_context(context)?),
            "api_base_url" => {
                cfg.api_base_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "fetch_command" => {
                cfg.fetch_command = Some(parse_string_literal(value).with_context(context)?);
            }
            "sidecar" => cfg.sidecar = Some(parse_boolean(value).with_context(context)?),
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
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

/// Quoted path; a leading `~/` expands to `$HOME`.
fn parse_path(raw_value: &str) -> Result<PathBuf> {
    let literal = parse_string_literal(raw_value)?;
    if let Some(rest) = literal.strip_prefix("~/")
        && let Some(home) = env_var_non_empty_os("HOME")
    {
        return Ok(PathBuf::from(home).join(rest));
    }
    Ok(PathBuf::from(literal))
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

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
