//! Where the bridge gets its inbounds from

use crate::error::Result;
use crate::inbound::{inbounds_from_config, normalize_inbounds};
use crate::model::InboundDescriptor;
use crate::profile::strip_comments;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the normalized inbound list for one request
#[async_trait]
pub trait InboundSource: Send + Sync {
    async fn list_inbounds(&self) -> Result<Vec<InboundDescriptor>>;
}

/// Reads the `inbounds` array of an engine config file on every call,
/// so edits to the file are picked up without a restart
pub struct ConfigFileSource {
    path: PathBuf,
}

impl ConfigFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl InboundSource for ConfigFileSource {
    async fn list_inbounds(&self) -> Result<Vec<InboundDescriptor>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let config: serde_json::Value = serde_json::from_str(&strip_comments(&text))?;
        let raws = inbounds_from_config(&config)?;
        let inbounds = normalize_inbounds(&raws);

        debug!(
            "loaded {} inbounds from {}",
            inbounds.len(),
            self.path.display()
        );
        Ok(inbounds)
    }
}

/// Fixed inbound list, useful for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    inbounds: Vec<InboundDescriptor>,
}

impl StaticSource {
    pub fn new(inbounds: Vec<InboundDescriptor>) -> Self {
        Self { inbounds }
    }
}

#[async_trait]
impl InboundSource for StaticSource {
    async fn list_inbounds(&self) -> Result<Vec<InboundDescriptor>> {
        Ok(self.inbounds.clone())
    }
}
