use crate::generator::capture::read_capture;
use crate::generator::profile::{build_pings, GeneratorConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use sonarcore::{DisplayConfig, Ping, RenderTuning};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the ping sequence comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Synthetic(GeneratorConfig),
    Capture { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic(GeneratorConfig::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub display: DisplayConfig,
    pub tuning: RenderTuning,
    pub source: SourceConfig,
    /// Ping index to jump to after sequential playback.
    pub seek: Option<usize>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .display
            .validate()
            .with_context(|| format!("validating display in {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(display: DisplayConfig, source: SourceConfig, seek: Option<usize>) -> Self {
        Self {
            display,
            tuning: RenderTuning::default(),
            source,
            seek,
        }
    }

    pub fn load_pings(&self) -> anyhow::Result<Vec<Ping>> {
        match &self.source {
            SourceConfig::Synthetic(generator) => {
                build_pings(generator).context("generating synthetic pings")
            }
            SourceConfig::Capture { path } => read_capture(path),
        }
    }
}
