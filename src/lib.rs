//! XrayBridge - REST bridge for Xray inbounds
//!
//! Provides:
//! - Normalization of Xray inbound JSON into a flat descriptor model
//! - Subscription profile loading from commented JSON
//! - Deterministic share-link generation (vless/vmess over raw, ws,
//!   httpupgrade, http, xhttp, grpc, kcp with none/tls/reality)
//! - An HTTP server exposing `/subscription`, `/inbound` and `/status`

pub mod error;
pub mod inbound;
pub mod model;
pub mod profile;
pub mod server;
pub mod source;
pub mod subscription;

pub use error::BridgeError;
pub use model::{ClientIdentity, InboundDescriptor, SubscriptionProfile};
pub use server::{BridgeConfig, BridgeServer, ListenAddr};
pub use source::{ConfigFileSource, InboundSource, StaticSource};
pub use subscription::{generate_links, SubscriptionFormat};
