//! Codec configuration (TOML)
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock behaviour. Example:
//!
//! ```toml
//! sample_interval = 64
//! site_fallback = "B"
//!
//! [[weapons]]
//! pattern = "ak47"
//! code = "AK"
//!
//! [[sites]]
//! id = 394
//! letter = "A"
//!
//! [sections]
//! preamble = true
//! legend = false
//!
//! [stats]
//! entry_team = [5, 6, 7, 8, 9]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document::DocumentSections;
use crate::error::ConfigError;

/// Codec settings shared by encoder and parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Keep one position sample every N ticks (default: 32, ~0.5s at 64 tick)
    #[serde(default = "default_sample_interval")]
    pub sample_interval: u64,
    /// Tick rate assumed when a document has no `TICK:` pragma (default: 128)
    #[serde(default = "default_tick_rate")]
    pub default_tick_rate: u32,
    /// Tick rate written when the telemetry source reports none (default: 64)
    #[serde(default = "default_encode_tick_rate")]
    pub encode_tick_rate: u32,
    /// Round length assumed when the round table has no end tick (default: 10000)
    #[serde(default = "default_round_span")]
    pub round_span_fallback: u64,
    /// Letter used for site ids missing from `sites` (default: B)
    #[serde(default = "default_site_fallback")]
    pub site_fallback: char,
    /// Weapon abbreviations, first match wins
    #[serde(default = "default_weapons")]
    pub weapons: Vec<WeaponCode>,
    /// Bombsite id → letter mapping
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteCode>,
    /// Optional header sections
    #[serde(default)]
    pub sections: SectionsConfig,
    /// Statistics settings
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Case-insensitive substring → weapon code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponCode {
    pub pattern: String,
    pub code: String,
}

/// Bombsite id → single letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCode {
    pub id: u32,
    pub letter: char,
}

/// Which optional header sections the assembler writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionsConfig {
    /// `# METADATA` preamble (default: false)
    #[serde(default)]
    pub preamble: bool,
    /// `# SITES:` line (default: true)
    #[serde(default = "default_true")]
    pub sites: bool,
    /// Format legend (default: true)
    #[serde(default = "default_true")]
    pub legend: bool,
}

/// Settings for [`crate::stats::MatchStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Player indices of the team whose entry success is measured.
    /// The document carries no team assignment, so this is opt-in.
    #[serde(default)]
    pub entry_team: Vec<u32>,
}

fn default_sample_interval() -> u64 {
    32
}
fn default_tick_rate() -> u32 {
    128
}
fn default_encode_tick_rate() -> u32 {
    64
}
fn default_round_span() -> u64 {
    10_000
}
fn default_site_fallback() -> char {
    'B'
}
fn default_true() -> bool {
    true
}

fn default_weapons() -> Vec<WeaponCode> {
    [
        ("ak47", "AK"),
        ("awp", "AWP"),
        ("m4a1", "M4"),
        ("deagle", "DE"),
        ("glock", "GL"),
        ("usp", "USP"),
    ]
    .into_iter()
    .map(|(pattern, code)| WeaponCode {
        pattern: pattern.to_string(),
        code: code.to_string(),
    })
    .collect()
}

fn default_sites() -> Vec<SiteCode> {
    vec![SiteCode {
        id: 394,
        letter: 'A',
    }]
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_interval: default_sample_interval(),
            default_tick_rate: default_tick_rate(),
            encode_tick_rate: default_encode_tick_rate(),
            round_span_fallback: default_round_span(),
            site_fallback: default_site_fallback(),
            weapons: default_weapons(),
            sites: default_sites(),
            sections: SectionsConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            preamble: false,
            sites: default_true(),
            legend: default_true(),
        }
    }
}

impl SectionsConfig {
    pub fn flags(&self) -> DocumentSections {
        let mut flags = DocumentSections::empty();
        flags.set(DocumentSections::PREAMBLE, self.preamble);
        flags.set(DocumentSections::SITES, self.sites);
        flags.set(DocumentSections::LEGEND, self.legend);
        flags
    }
}

impl CodecConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the codec cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval == 0 {
            return Err(ConfigError::Invalid(
                "sample_interval must be greater than zero".to_string(),
            ));
        }
        if self.default_tick_rate == 0 || self.encode_tick_rate == 0 {
            return Err(ConfigError::Invalid(
                "tick rates must be greater than zero".to_string(),
            ));
        }
        for weapon in &self.weapons {
            if weapon.pattern.is_empty() || weapon.code.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "weapon entry needs both pattern and code: {:?}",
                    weapon
                )));
            }
            if weapon.code.contains([',', '|', ' ']) {
                return Err(ConfigError::Invalid(format!(
                    "weapon code {:?} contains a reserved character",
                    weapon.code
                )));
            }
        }
        for site in self.sites.iter().map(|s| s.letter).chain([self.site_fallback]) {
            if !site.is_ascii_alphabetic() {
                return Err(ConfigError::Invalid(format!(
                    "site letter {:?} must be an ASCII letter",
                    site
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CodecConfig::from_toml("").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.sample_interval, 32);
        assert_eq!(config.default_tick_rate, 128);
        assert_eq!(config.weapons.len(), 6);
        assert_eq!(config.site_fallback, 'B');
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
sample_interval = 64
site_fallback = "C"

[[weapons]]
pattern = "famas"
code = "FA"

[sections]
preamble = true

[stats]
entry_team = [5, 6]
"#;
        let config = CodecConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.sample_interval, 64);
        assert_eq!(config.site_fallback, 'C');
        assert_eq!(config.weapons.len(), 1);
        assert_eq!(config.weapons[0].code, "FA");
        // Untouched sections keep their defaults
        assert!(config.sections.preamble);
        assert!(config.sections.sites);
        assert!(config.sections.legend);
        assert_eq!(config.sites, default_sites());
        assert_eq!(config.stats.entry_team, vec![5, 6]);
        assert!(CodecConfig::default().stats.entry_team.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let config = CodecConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = CodecConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_errors() {
        assert!(CodecConfig::from_toml("sample_interval = 0").is_err());
        assert!(CodecConfig::from_toml("site_fallback = \"1\"").is_err());
        assert!(
            CodecConfig::from_toml("[[weapons]]\npattern = \"x\"\ncode = \"A,B\"").is_err()
        );
        assert!(CodecConfig::from_toml("sample_interval = \"fast\"").is_err());
    }

    #[test]
    fn test_section_flags() {
        let flags = SectionsConfig::default().flags();
        assert!(!flags.contains(DocumentSections::PREAMBLE));
        assert!(flags.contains(DocumentSections::SITES | DocumentSections::LEGEND));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codec.toml");
        std::fs::write(&path, "sample_interval = 16\n").unwrap();

        let config = CodecConfig::from_file(&path).unwrap();
        assert_eq!(config.sample_interval, 16);

        let missing = CodecConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
