//! Normalized inbound and profile records consumed by the subscription core

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocols that can be advertised through subscription links
pub const SUPPORTED_PROTOCOLS: [&str; 2] = ["vless", "vmess"];

pub fn is_supported_protocol(protocol: &str) -> bool {
    SUPPORTED_PROTOCOLS.contains(&protocol)
}

/// Applies the `tcp -> raw` alias used at every network comparison
pub fn normalize_network(network: &str) -> &str {
    if network == "tcp" {
        "raw"
    } else {
        network
    }
}

/// Category key shared by descriptors and profiles: `protocol_network`
pub fn category_key(protocol: &str, network: &str) -> String {
    format!("{}_{}", protocol, normalize_network(network))
}

/// A client entry of an inbound. Identity is the `id` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub flow: String,
    #[serde(default)]
    pub level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XhttpSettings {
    pub host: String,
    pub path: String,
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcSettings {
    pub service_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KcpSettings {
    pub header_type: Option<String>,
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    pub short_ids: Vec<String>,
    pub server_names: Vec<String>,
}

/// Transport and security blocks lifted from an inbound's stream settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xhttp: Option<XhttpSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kcp: Option<KcpSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality: Option<RealitySettings>,
}

/// Normalized view of one configured inbound
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundDescriptor {
    pub tag: String,
    pub protocol: String,
    /// Already normalized (`raw`, `xhttp`, `kcp`, ...)
    pub network: String,
    pub security: String,
    pub clients: Vec<ClientIdentity>,
    pub transport: TransportSettings,
}

impl InboundDescriptor {
    pub fn category_key(&self) -> String {
        category_key(&self.protocol, &self.network)
    }

    /// Short ids advertised by a vless REALITY inbound, if any
    pub fn reality_short_ids(&self) -> Option<&[String]> {
        if self.protocol != "vless" || self.security != "reality" {
            return None;
        }
        self.transport
            .reality
            .as_ref()
            .map(|r| r.short_ids.as_slice())
            .filter(|ids| !ids.is_empty())
    }
}

/// Externally authored template describing how one category is advertised
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionProfile {
    /// Minimum client level; `-1` disables the gate
    pub level: i64,
    pub address: String,
    /// `0` means 443
    pub port: u16,
    pub protocol: String,
    pub network: String,
    pub security: String,
    pub description: String,
    pub encryption: String,
    pub fingerprint: String,
    pub server_name: String,
    pub flow: String,
    /// REALITY public key (`pbk`)
    pub password: String,
    pub mldsa65_verify: String,
    pub alpn: Vec<String>,
    pub ech_config_list: String,
    pub host: String,
    pub mode: String,
    pub path: String,
    /// Free-form xhttp `extra` object
    pub extra: Option<Value>,
}

impl SubscriptionProfile {
    pub fn normalized_network(&self) -> &str {
        normalize_network(&self.network)
    }

    pub fn category_key(&self) -> String {
        category_key(&self.protocol, &self.network)
    }

    /// Security with the empty value folded into `none`
    pub fn effective_security(&self) -> &str {
        if self.security.is_empty() {
            "none"
        } else {
            &self.security
        }
    }

    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            443
        } else {
            self.port
        }
    }

    /// `extra` is worth processing only when it carries more than `{}`
    pub fn has_extra(&self) -> bool {
        match &self.extra {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}
