//! Settings schema with compiled defaults.
//!
//! Every field has a serde default so partial settings files deep-merge
//! cleanly over [`MicaSettings::default()`].

use serde::{Deserialize, Serialize};

/// Top-level settings for the mica agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicaSettings {
    /// Settings schema version.
    pub version: String,
    /// Agent display name.
    pub name: String,
    /// Workspace location.
    pub workspace: WorkspaceSettings,
    /// Turn-engine knobs.
    pub agent: AgentSettings,
    /// History compaction knobs.
    pub compaction: CompactionSettings,
    /// Fact-extraction knobs.
    pub extraction: ExtractionSettings,
    /// Inbound-bus rate limiting (consumed by the external bus).
    pub bus: BusSettings,
}

impl Default for MicaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".into(),
            name: "mica".into(),
            workspace: WorkspaceSettings::default(),
            agent: AgentSettings::default(),
            compaction: CompactionSettings::default(),
            extraction: ExtractionSettings::default(),
            bus: BusSettings::default(),
        }
    }
}

/// Workspace location settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSettings {
    /// Workspace directory. `None` means `~/.mica/workspace`.
    pub path: Option<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self { path: None }
    }
}

/// Turn-engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Model identifier for the main loop.
    pub model: Option<String>,
    /// Maximum model-call iterations per turn.
    pub max_iterations: usize,
    /// Character cap for a single tool result.
    pub tool_result_max_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_iterations: 20,
            tool_result_max_chars: 3000,
        }
    }
}

/// History compaction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactionSettings {
    /// Whether compaction runs at all.
    pub enabled: bool,
    /// Estimated-token threshold that triggers compaction.
    pub token_threshold: usize,
    /// How many recent messages are kept verbatim.
    pub keep_recent: usize,
    /// Model override for summarization (cheaper than the main model).
    pub model: Option<String>,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            token_threshold: 8000,
            keep_recent: 10,
            model: None,
        }
    }
}

/// Fact-extraction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionSettings {
    /// Whether post-turn fact extraction runs.
    pub enabled: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Inbound-bus rate limiting. The queue itself is external; these values
/// are only carried so one settings file configures the whole process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusSettings {
    /// Max inbound messages per sender per window.
    pub rate_limit: u32,
    /// Window length in seconds.
    pub rate_window_secs: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            rate_limit: 30,
            rate_window_secs: 60,
        }
    }
}
