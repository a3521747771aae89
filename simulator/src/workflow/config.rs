use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use ldrcore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the driver reads sensor lines from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    #[default]
    Synthetic,
    /// A captured serial log, one line per reading.
    Replay { path: PathBuf },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub pipeline: PipelineConfig,
    pub generator: GeneratorConfig,
    pub source: SourceConfig,
}

impl DriverConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading driver config {}", path_ref.display()))?;
        let config: DriverConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing driver config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Fails early on anything the pipeline or the generator would reject.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("validating pipeline section")?;
        if let SourceConfig::Synthetic = self.source {
            self.generator
                .validate()
                .context("validating generator section")?;
        }
        Ok(())
    }
}
