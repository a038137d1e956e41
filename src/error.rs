//! Error taxonomy shared by the normalizer, loader, core and HTTP surface

use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// No inbound advertises vless or vmess
    #[error("subscription feature is only available on server-side configurations with 'vless' or 'vmess' inbounds")]
    UnsupportedConfiguration,

    #[error("Missing required '{0}' query parameter.")]
    MissingQuery(&'static str),

    #[error("subscription config path is not provided (XRAY_API_BRIDGE_SUBS_CONFIG)")]
    ProfileConfigMissing,

    #[error("could not open subscription config file {path}: {source}")]
    ProfileLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode subscription config file {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid inbound configuration: {0}")]
    InboundParse(String),

    #[error("Inbound '{0}' not found")]
    InboundNotFound(String),

    #[error("No inbounds found in Xray-core.")]
    NoInbounds,

    #[error("No matching subscription links could be generated. Ensure the Xray-core instance is configured as a server with 'vless' or 'vmess' inbounds, and the provided 'uuid' is correct.")]
    NoLinks,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// HTTP status used when the error reaches the REST surface
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::MissingQuery(_) => StatusCode::BAD_REQUEST,
            BridgeError::NoInbounds | BridgeError::NoLinks | BridgeError::InboundNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
