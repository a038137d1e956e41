//! Inbound normalizer
//! Turns the human-readable Xray inbound JSON shape into `InboundDescriptor`s

use crate::error::{BridgeError, Result};
use crate::model::{
    is_supported_protocol, ClientIdentity, GrpcSettings, InboundDescriptor, KcpSettings,
    RealitySettings, TransportSettings, XhttpSettings,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInbound {
    tag: String,
    protocol: String,
    settings: Option<RawProxySettings>,
    stream_settings: Option<RawStreamSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProxySettings {
    clients: Vec<ClientIdentity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStreamSettings {
    network: Option<String>,
    security: Option<String>,
    reality_settings: Option<RawReality>,
    grpc_settings: Option<RawGrpc>,
    kcp_settings: Option<RawKcp>,
    xhttp_settings: Option<RawXhttp>,
    splithttp_settings: Option<RawXhttp>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawReality {
    short_ids: Vec<String>,
    server_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawGrpc {
    service_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawKcp {
    header: Option<RawKcpHeader>,
    seed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawKcpHeader {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawXhttp {
    host: String,
    path: String,
    mode: String,
}

/// Maps the engine's transport names onto the names used in share links
fn transport_alias(network: &str) -> &str {
    match network {
        "" | "tcp" => "raw",
        "splithttp" => "xhttp",
        "mkcp" => "kcp",
        other => other,
    }
}

/// Normalize a single inbound object
pub fn normalize_inbound(raw: &Value) -> Result<InboundDescriptor> {
    let inbound = RawInbound::deserialize(raw).map_err(|e| BridgeError::InboundParse(e.to_string()))?;
    let stream = inbound.stream_settings.unwrap_or_default();

    let network = transport_alias(stream.network.as_deref().unwrap_or("tcp")).to_string();
    let security = match stream.security.as_deref() {
        None | Some("") => "none".to_string(),
        Some(s) => s.to_string(),
    };

    // Only vless/vmess client lists are meaningful for link generation
    let mut clients = if is_supported_protocol(&inbound.protocol) {
        inbound.settings.map(|s| s.clients).unwrap_or_default()
    } else {
        Vec::new()
    };
    clients.retain(|client| {
        if client.id.is_empty() {
            warn!(
                "inbound {}: skipping client without id (email '{}')",
                inbound.tag, client.email
            );
            return false;
        }
        true
    });

    let transport = TransportSettings {
        xhttp: stream
            .xhttp_settings
            .or(stream.splithttp_settings)
            .map(|x| XhttpSettings {
                host: x.host,
                path: x.path,
                mode: x.mode,
            }),
        grpc: stream.grpc_settings.map(|g| GrpcSettings {
            service_name: g.service_name,
        }),
        kcp: stream.kcp_settings.map(|k| KcpSettings {
            header_type: k.header.map(|h| h.kind),
            seed: k.seed,
        }),
        reality: stream.reality_settings.map(|r| RealitySettings {
            short_ids: r.short_ids,
            server_names: r.server_names,
        }),
    };

    Ok(InboundDescriptor {
        tag: inbound.tag,
        protocol: inbound.protocol,
        network,
        security,
        clients,
        transport,
    })
}

/// Normalize a list of inbounds, skipping the ones that cannot be read
pub fn normalize_inbounds(raws: &[Value]) -> Vec<InboundDescriptor> {
    raws.iter()
        .filter_map(|raw| match normalize_inbound(raw) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                let tag = raw.get("tag").and_then(Value::as_str).unwrap_or("");
                warn!("failed to normalize inbound {}: {}", tag, e);
                None
            }
        })
        .collect()
}

/// Extract the inbound objects from a full engine config (or a bare array)
pub fn inbounds_from_config(config: &Value) -> Result<Vec<Value>> {
    match config {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) => match map.get("inbounds") {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(BridgeError::InboundParse("'inbounds' is not an array".to_string())),
            None => Ok(Vec::new()),
        },
        _ => Err(BridgeError::InboundParse("expected an object or an array".to_string())),
    }
}
