use crate::error::{HmapError, Result};
use crate::paths;
use crate::template;
use crate::types::PHASE_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PhaseConfig
// ---------------------------------------------------------------------------

/// Which rule decides whether a phase is open for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockRule {
    /// Phase P opens once every title in `required_documents[P]` is approved.
    #[default]
    RequiredDocuments,
    /// Phase P opens once every document of phase P-1 is approved.
    PreviousPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    #[serde(default)]
    pub unlock_rule: UnlockRule,
    #[serde(default = "template::default_phase_requirements")]
    pub required_documents: BTreeMap<u8, Vec<String>>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            unlock_rule: UnlockRule::default(),
            required_documents: template::default_phase_requirements(),
        }
    }
}

impl PhaseConfig {
    pub fn required_for(&self, phase: u8) -> &[String] {
        self.required_documents
            .get(&phase)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// SprintConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintConfig {
    #[serde(default = "default_sprint_count")]
    pub count: u32,
    #[serde(default = "default_sprint_length")]
    pub length_days: u32,
}

fn default_sprint_count() -> u32 {
    3
}

fn default_sprint_length() -> u32 {
    14
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            count: default_sprint_count(),
            length_days: default_sprint_length(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub sprints: SprintConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            version: 1,
            phases: PhaseConfig::default(),
            ai: AiConfig::default(),
            sprints: SprintConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(HmapError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (phase, titles) in &self.phases.required_documents {
            if *phase == 0 || *phase > PHASE_COUNT {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "phases.required_documents names phase {phase}; valid phases are 1..={PHASE_COUNT}"
                    ),
                });
            }
            if titles.iter().any(|t| t.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("phase {phase} lists an empty required document title"),
                });
            }
        }

        if self.sprints.length_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "sprints.length_days must be greater than zero".to_string(),
            });
        }

        if self.ai.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ai.timeout_secs is 0; generation requests will fail immediately"
                    .to_string(),
            });
        }

        if self.ai.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ai.model is empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
