//! Share-link synthesis
//! One pure function per transport and per security layer, composed by
//! `build_link`.

use crate::model::{normalize_network, ClientIdentity, InboundDescriptor, SubscriptionProfile};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Bytes left raw in query values and fragments: `A-Z a-z 0-9 - _ . ~`
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameters of a link, encoded sorted by key
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &'static str, value: impl Into<String>) {
        self.pairs.push((key, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Keys sorted, insertion order kept for equal keys, values escaped once
    pub fn encode(&self) -> String {
        let mut pairs: Vec<&(&'static str, String)> = self.pairs.iter().collect();
        pairs.sort_by_key(|(k, _)| *k);

        pairs
            .into_iter()
            .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Query escaping with space as `+`
fn escape(text: &str) -> String {
    text.split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_VALUE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Per-pair inputs shared by the transport and security handlers
pub struct LinkInput<'a> {
    pub client: &'a ClientIdentity,
    pub profile: &'a SubscriptionProfile,
    pub profile_index: usize,
    /// First descriptor of the profile's category
    pub descriptor: Option<&'a InboundDescriptor>,
    /// REALITY short id selected for this client, empty if none
    pub short_id: &'a str,
}

/// First descriptor whose protocol and normalized network equal the profile's
pub fn find_descriptor<'a>(
    inbounds: &'a [InboundDescriptor],
    profile: &SubscriptionProfile,
) -> Option<&'a InboundDescriptor> {
    let network = profile.normalized_network();
    inbounds
        .iter()
        .find(|ib| ib.protocol == profile.protocol && normalize_network(&ib.network) == network)
}

/// Short id for the client at `client_index` of the matched sequence.
/// Indexes past the end reuse the last id.
pub fn select_short_id(inbounds: &[InboundDescriptor], client_index: usize) -> &str {
    inbounds
        .iter()
        .find_map(InboundDescriptor::reality_short_ids)
        .and_then(|ids| ids.get(client_index).or_else(|| ids.last()))
        .map(String::as_str)
        .unwrap_or("")
}

/// `get-` + last 8 chars of the short id, or `get-subNNNNN` by profile position
pub fn spider_x(short_id: &str, profile_index: usize) -> String {
    let len = short_id.chars().count();
    if len >= 8 {
        let tail: String = short_id.chars().skip(len - 8).collect();
        format!("get-{}", tail)
    } else {
        format!("get-sub{:05}", profile_index)
    }
}

/// Fill `shortId`/`spiderX` into `downloadSettings.realitySettings` when the
/// download leg uses REALITY. Existing keys are never overwritten.
/// Returns `None` when `extra` is not a JSON object.
pub fn merge_extra(extra: &Value, short_id: &str, profile_index: usize) -> Option<Value> {
    let mut extra = extra.clone();
    let root = extra.as_object_mut()?;

    if let Some(download) = root.get_mut("downloadSettings").and_then(Value::as_object_mut) {
        let is_reality = download.get("security").and_then(Value::as_str) == Some("reality");
        if is_reality {
            if let Some(reality) = download
                .get_mut("realitySettings")
                .and_then(Value::as_object_mut)
            {
                fill_reality_extra(reality, short_id, profile_index);
            }
        }
    }

    Some(extra)
}

fn fill_reality_extra(reality: &mut Map<String, Value>, short_id: &str, profile_index: usize) {
    if !reality.contains_key("shortId") && !short_id.is_empty() {
        reality.insert("shortId".to_string(), Value::from(short_id));
    }
    if !reality.contains_key("spiderX") {
        let sid = reality.get("shortId").and_then(Value::as_str).unwrap_or("");
        let spx = spider_x(sid, profile_index);
        reality.insert("spiderX".to_string(), Value::from(spx));
    }
}

/// Security of the download leg declared inside `extra`, if any
fn download_security(extra: &Value) -> Option<&str> {
    extra
        .get("downloadSettings")?
        .get("security")?
        .as_str()
        .filter(|s| !s.is_empty())
}

fn xhttp_params(input: &LinkInput<'_>, params: &mut QueryParams) {
    let profile = input.profile;

    let host = if profile.host.is_empty() {
        &profile.address
    } else {
        &profile.host
    };
    params.add("host", host.as_str());

    if let Some(xhttp) = input.descriptor.and_then(|d| d.transport.xhttp.as_ref()) {
        params.add("path", xhttp.path.as_str());
    }

    let mode = if profile.mode.is_empty() {
        "auto"
    } else {
        profile.mode.as_str()
    };
    params.add("mode", mode);

    if profile.has_extra() {
        if let Some(extra) = profile.extra.as_ref() {
            if let Some(merged) = merge_extra(extra, input.short_id, input.profile_index) {
                params.add("extra", merged.to_string());
            }
        }
    }
}

fn http_params(network: &str, input: &LinkInput<'_>, params: &mut QueryParams) {
    let profile = input.profile;

    if profile.host.is_empty() {
        params.add("host", profile.address.as_str());
    } else if network == "http" {
        params.add("host", profile.host.replace(' ', ""));
    } else {
        params.add("host", profile.host.as_str());
    }

    if !profile.path.is_empty() && profile.path != "/" {
        params.add("path", profile.path.as_str());
    }
}

fn grpc_params(input: &LinkInput<'_>, params: &mut QueryParams) {
    let Some(grpc) = input.descriptor.and_then(|d| d.transport.grpc.as_ref()) else {
        return;
    };

    let service_name = grpc
        .service_name
        .split('|')
        .next()
        .unwrap_or_default();
    params.add("serviceName", service_name);

    let mode = if input.profile.mode.is_empty() {
        "gun"
    } else {
        input.profile.mode.as_str()
    };
    params.add("mode", mode);
}

fn kcp_params(input: &LinkInput<'_>, params: &mut QueryParams) {
    let Some(kcp) = input.descriptor.and_then(|d| d.transport.kcp.as_ref()) else {
        return;
    };

    if let Some(header) = kcp.header_type.as_deref() {
        if !header.is_empty() && header != "none" {
            params.add("headerType", header);
        }
    }
    if let Some(seed) = kcp.seed.as_deref() {
        params.add("seed", seed);
    }
}

/// Transport parameters keyed by the normalized network
pub fn transport_params(network: &str, input: &LinkInput<'_>, params: &mut QueryParams) {
    if network != "raw" {
        params.add("type", network);
    }

    match network {
        "xhttp" => xhttp_params(input, params),
        "http" | "ws" | "httpupgrade" => http_params(network, input, params),
        "grpc" => grpc_params(input, params),
        "kcp" => kcp_params(input, params),
        _ => {}
    }
}

fn tls_params(profile: &SubscriptionProfile, params: &mut QueryParams) {
    if !profile.fingerprint.is_empty() {
        params.add("fp", profile.fingerprint.as_str());
    }
    if !profile.server_name.is_empty() {
        params.add("sni", profile.server_name.as_str());
    }
    if !profile.alpn.is_empty() {
        params.add("alpn", profile.alpn.join(","));
    }
    if !profile.ech_config_list.is_empty() {
        params.add("ech", profile.ech_config_list.as_str());
    }
}

fn reality_params(input: &LinkInput<'_>, params: &mut QueryParams) {
    let profile = input.profile;

    let fp = if profile.fingerprint.is_empty() {
        "chrome"
    } else {
        profile.fingerprint.as_str()
    };
    params.add("fp", fp);

    if !profile.server_name.is_empty() {
        params.add("sni", profile.server_name.as_str());
    }

    let flow = if profile.flow.is_empty() {
        &input.client.flow
    } else {
        &profile.flow
    };
    if !flow.is_empty() {
        params.add("flow", flow.as_str());
    }

    params.add("pbk", profile.password.as_str());

    if !profile.mldsa65_verify.is_empty() {
        params.add("pqv", profile.mldsa65_verify.as_str());
    }
    if !input.short_id.is_empty() {
        params.add("sid", input.short_id);
    }
    params.add("spx", spider_x(input.short_id, input.profile_index));
}

/// Security parameters keyed by the profile's security value
pub fn security_params(security: &str, input: &LinkInput<'_>, params: &mut QueryParams) {
    if security != "none" {
        params.add("security", security);
    }

    match security {
        "tls" => tls_params(input.profile, params),
        "reality" => reality_params(input, params),
        _ => {}
    }
}

fn encryption_param(profile: &SubscriptionProfile, params: &mut QueryParams) {
    let encryption = profile.encryption.as_str();
    let implicit = match profile.protocol.as_str() {
        "vless" => "none",
        "vmess" => "auto",
        _ => return,
    };
    if !encryption.is_empty() && encryption != implicit {
        params.add("encryption", encryption);
    }
}

/// Link fragment: the profile description, or `protocol_network_security`
/// with `2<downloadSecurity>` appended when an xhttp download leg differs.
pub fn describe(profile: &SubscriptionProfile, network: &str, security: &str) -> String {
    if !profile.description.is_empty() {
        return profile.description.clone();
    }

    let mut description = format!("{}_{}_{}", profile.protocol, network, security);
    if network == "xhttp" && profile.has_extra() {
        if let Some(download) = profile.extra.as_ref().and_then(download_security) {
            if download != security {
                description.push('2');
                description.push_str(download);
            }
        }
    }
    description
}

fn authority_host(address: &str) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]", address)
    } else {
        address.to_string()
    }
}

/// Assemble the share link for one eligible (client, profile) pair
pub fn build_link(input: &LinkInput<'_>) -> String {
    let profile = input.profile;
    let network = profile.normalized_network();
    let security = profile.effective_security();

    let mut link = format!(
        "{}://{}@{}:{}",
        profile.protocol,
        input.client.id,
        authority_host(&profile.address),
        profile.effective_port()
    );

    let mut params = QueryParams::new();
    transport_params(network, input, &mut params);
    encryption_param(profile, &mut params);
    security_params(security, input, &mut params);

    if !params.is_empty() {
        link.push('?');
        link.push_str(&params.encode());
    }

    link.push('#');
    link.push_str(&escape(&describe(profile, network, security)));
    link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrpcSettings, KcpSettings, RealitySettings, TransportSettings, XhttpSettings};
    use serde_json::json;

    fn client(id: &str, flow: &str) -> ClientIdentity {
        ClientIdentity {
            id: id.to_string(),
            flow: flow.to_string(),
            ..Default::default()
        }
    }

    fn profile(protocol: &str, network: &str, security: &str) -> SubscriptionProfile {
        SubscriptionProfile {
            protocol: protocol.to_string(),
            network: network.to_string(),
            security: security.to_string(),
            address: "example.com".to_string(),
            ..Default::default()
        }
    }

    fn reality_inbound(short_ids: &[&str]) -> InboundDescriptor {
        InboundDescriptor {
            protocol: "vless".to_string(),
            network: "raw".to_string(),
            security: "reality".to_string(),
            transport: TransportSettings {
                reality: Some(RealitySettings {
                    short_ids: short_ids.iter().map(|s| s.to_string()).collect(),
                    server_names: vec![],
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn link(client: &ClientIdentity, profile: &SubscriptionProfile, descriptor: Option<&InboundDescriptor>, short_id: &str) -> String {
        build_link(&LinkInput {
            client,
            profile,
            profile_index: 0,
            descriptor,
            short_id,
        })
    }

    #[test]
    fn test_query_params_sorted() {
        let mut params = QueryParams::new();
        params.add("type", "ws");
        params.add("host", "a b");
        params.add("alpn", "h2,http/1.1");
        assert_eq!(params.encode(), "alpn=h2%2Chttp%2F1.1&host=a+b&type=ws");
    }

    #[test]
    fn test_escape_keeps_tilde_and_encodes_star() {
        assert_eq!(escape("a~b*c"), "a~b%2Ac");
        assert_eq!(escape("x  y+z"), "x++y%2Bz");
        assert_eq!(escape("ü/é"), "%C3%BC%2F%C3%A9");

        let c = client("u1", "");
        let mut p = profile("vless", "tcp", "none");
        p.description = "a~b*c".to_string();
        assert_eq!(link(&c, &p, None, ""), "vless://u1@example.com:443#a~b%2Ac");
    }

    #[test]
    fn test_plain_raw_link() {
        let c = client("u1", "");
        let p = profile("vless", "tcp", "none");
        assert_eq!(link(&c, &p, None, ""), "vless://u1@example.com:443#vless_raw_none");
    }

    #[test]
    fn test_explicit_port_and_description() {
        let c = client("u1", "");
        let mut p = profile("vmess", "raw", "");
        p.port = 8443;
        p.description = "My Node".to_string();
        assert_eq!(link(&c, &p, None, ""), "vmess://u1@example.com:8443#My+Node");
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        let c = client("u1", "");
        let mut p = profile("vless", "raw", "none");
        p.address = "2001:db8::1".to_string();
        assert!(link(&c, &p, None, "").starts_with("vless://u1@[2001:db8::1]:443"));
    }

    #[test]
    fn test_reality_link() {
        let c = client("u1", "xtls-rprx-vision");
        let mut p = profile("vless", "tcp", "reality");
        p.password = "PBK".to_string();
        p.server_name = "www.example.com".to_string();
        assert_eq!(
            link(&c, &p, None, "ab12cd34"),
            "vless://u1@example.com:443?flow=xtls-rprx-vision&fp=chrome&pbk=PBK&security=reality\
             &sid=ab12cd34&sni=www.example.com&spx=get-ab12cd34#vless_raw_reality"
        );
    }

    #[test]
    fn test_reality_flow_override_and_short_sid() {
        let c = client("u1", "client-flow");
        let mut p = profile("vless", "raw", "reality");
        p.password = "PBK".to_string();
        p.flow = "profile-flow".to_string();
        p.fingerprint = "firefox".to_string();
        p.mldsa65_verify = "PQV".to_string();
        let out = build_link(&LinkInput {
            client: &c,
            profile: &p,
            profile_index: 7,
            descriptor: None,
            short_id: "ab",
        });
        assert!(out.contains("flow=profile-flow"));
        assert!(out.contains("fp=firefox"));
        assert!(out.contains("pqv=PQV"));
        assert!(out.contains("sid=ab&"));
        assert!(out.contains("spx=get-sub00007"));
    }

    #[test]
    fn test_reality_without_short_id() {
        let c = client("u1", "");
        let mut p = profile("vless", "raw", "reality");
        p.password = "PBK".to_string();
        let out = link(&c, &p, None, "");
        assert!(!out.contains("sid="));
        assert!(!out.contains("flow="));
        assert!(out.contains("spx=get-sub00000"));
    }

    #[test]
    fn test_tls_params() {
        let c = client("u1", "");
        let mut p = profile("vless", "ws", "tls");
        p.fingerprint = "chrome".to_string();
        p.server_name = "sni.example.com".to_string();
        p.alpn = vec!["h2".to_string(), "http/1.1".to_string()];
        p.ech_config_list = "AEX+".to_string();
        p.path = "/ws".to_string();
        assert_eq!(
            link(&c, &p, None, ""),
            "vless://u1@example.com:443?alpn=h2%2Chttp%2F1.1&ech=AEX%2B&fp=chrome&host=example.com\
             &path=%2Fws&security=tls&sni=sni.example.com&type=ws#vless_ws_tls"
        );
    }

    #[test]
    fn test_tls_without_fingerprint_has_no_fp() {
        let c = client("u1", "");
        let p = profile("vless", "raw", "tls");
        let out = link(&c, &p, None, "");
        assert!(!out.contains("fp="));
        assert!(out.contains("security=tls"));
    }

    #[test]
    fn test_http_host_spaces_and_root_path() {
        let c = client("u1", "");
        let mut p = profile("vmess", "http", "none");
        p.host = "a.com, b.com".to_string();
        p.path = "/".to_string();
        let out = link(&c, &p, None, "");
        assert!(out.contains("host=a.com%2Cb.com"));
        assert!(!out.contains("path="));

        let mut p = profile("vmess", "ws", "none");
        p.host = "a.com b".to_string();
        assert!(link(&c, &p, None, "").contains("host=a.com+b"));
    }

    #[test]
    fn test_encryption_param() {
        let c = client("u1", "");
        let mut p = profile("vless", "raw", "none");
        p.encryption = "none".to_string();
        assert!(!link(&c, &p, None, "").contains("encryption="));
        p.encryption = "mlkem768x25519plus.native.0rtt.abc".to_string();
        assert!(link(&c, &p, None, "").contains("encryption=mlkem768x25519plus.native.0rtt.abc"));

        let mut p = profile("vmess", "raw", "none");
        p.encryption = "auto".to_string();
        assert!(!link(&c, &p, None, "").contains("encryption="));
        p.encryption = "aes-128-gcm".to_string();
        assert!(link(&c, &p, None, "").contains("encryption=aes-128-gcm"));
    }

    #[test]
    fn test_grpc_service_name_truncated() {
        let c = client("u1", "");
        let p = profile("vless", "grpc", "none");
        let descriptor = InboundDescriptor {
            protocol: "vless".to_string(),
            network: "grpc".to_string(),
            transport: TransportSettings {
                grpc: Some(GrpcSettings {
                    service_name: "svc|multi".to_string(),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            link(&c, &p, Some(&descriptor), ""),
            "vless://u1@example.com:443?mode=gun&serviceName=svc&type=grpc#vless_grpc_none"
        );

        // Without a matching descriptor only the type is emitted
        assert_eq!(
            link(&c, &p, None, ""),
            "vless://u1@example.com:443?type=grpc#vless_grpc_none"
        );
    }

    #[test]
    fn test_kcp_header_and_seed() {
        let c = client("u1", "");
        let p = profile("vmess", "kcp", "none");
        let mut descriptor = InboundDescriptor {
            protocol: "vmess".to_string(),
            network: "kcp".to_string(),
            transport: TransportSettings {
                kcp: Some(KcpSettings {
                    header_type: Some("none".to_string()),
                    seed: Some("s33d".to_string()),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let out = link(&c, &p, Some(&descriptor), "");
        assert!(!out.contains("headerType"));
        assert!(out.contains("seed=s33d"));

        descriptor.transport.kcp.as_mut().unwrap().header_type = Some("srtp".to_string());
        assert!(link(&c, &p, Some(&descriptor), "").contains("headerType=srtp"));
    }

    #[test]
    fn test_xhttp_defaults() {
        let c = client("u1", "");
        let p = profile("vless", "xhttp", "tls");
        let descriptor = InboundDescriptor {
            protocol: "vless".to_string(),
            network: "xhttp".to_string(),
            transport: TransportSettings {
                xhttp: Some(XhttpSettings {
                    path: "/xh".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            link(&c, &p, Some(&descriptor), ""),
            "vless://u1@example.com:443?host=example.com&mode=auto&path=%2Fxh&security=tls&type=xhttp#vless_xhttp_tls"
        );
    }

    #[test]
    fn test_xhttp_prefers_profile_host_and_mode() {
        let c = client("u1", "");
        let mut p = profile("vless", "xhttp", "none");
        p.host = "cdn.example.net".to_string();
        p.mode = "packet-up".to_string();
        assert_eq!(
            link(&c, &p, None, ""),
            "vless://u1@example.com:443?host=cdn.example.net&mode=packet-up&type=xhttp#vless_xhttp_none"
        );
    }

    #[test]
    fn test_merge_extra_fills_missing_reality_keys() {
        let extra = json!({
            "downloadSettings": {
                "security": "reality",
                "realitySettings": {"publicKey": "K"}
            }
        });
        let merged = merge_extra(&extra, "0123456789ab", 3).unwrap();
        let reality = &merged["downloadSettings"]["realitySettings"];
        assert_eq!(reality["shortId"], "0123456789ab");
        assert_eq!(reality["spiderX"], "get-456789ab");
        assert_eq!(reality["publicKey"], "K");
    }

    #[test]
    fn test_merge_extra_never_overwrites() {
        let extra = json!({
            "downloadSettings": {
                "security": "reality",
                "realitySettings": {"shortId": "cafe", "spiderX": "/custom"}
            }
        });
        let merged = merge_extra(&extra, "0123456789ab", 0).unwrap();
        assert_eq!(merged, extra);

        // Caller shortId drives the derived spiderX
        let extra = json!({
            "downloadSettings": {"security": "reality", "realitySettings": {"shortId": "cafe"}}
        });
        let merged = merge_extra(&extra, "0123456789ab", 2).unwrap();
        assert_eq!(merged["downloadSettings"]["realitySettings"]["shortId"], "cafe");
        assert_eq!(merged["downloadSettings"]["realitySettings"]["spiderX"], "get-sub00002");
    }

    #[test]
    fn test_merge_extra_ignores_non_reality_and_non_objects() {
        let extra = json!({"downloadSettings": {"security": "tls", "realitySettings": {}}});
        assert_eq!(merge_extra(&extra, "0123456789ab", 0).unwrap(), extra);

        let extra = json!({"downloadSettings": {"security": "reality"}});
        assert_eq!(merge_extra(&extra, "0123456789ab", 0).unwrap(), extra);

        assert!(merge_extra(&json!([1, 2]), "", 0).is_none());
        assert!(merge_extra(&json!("text"), "", 0).is_none());
    }

    #[test]
    fn test_xhttp_extra_and_description_suffix() {
        let c = client("u1", "");
        let mut p = profile("vless", "xhttp", "tls");
        p.extra = Some(json!({
            "downloadSettings": {
                "security": "reality",
                "realitySettings": {}
            }
        }));
        let out = link(&c, &p, None, "ab12cd34");

        let expected_extra = escape(
            r#"{"downloadSettings":{"realitySettings":{"shortId":"ab12cd34","spiderX":"get-ab12cd34"},"security":"reality"}}"#,
        );
        assert!(out.contains(&format!("extra={}", expected_extra)));
        assert!(out.ends_with("#vless_xhttp_tls2reality"));
    }

    #[test]
    fn test_xhttp_non_object_extra_is_skipped() {
        let c = client("u1", "");
        let mut p = profile("vless", "xhttp", "none");
        p.extra = Some(json!([1]));
        let out = link(&c, &p, None, "");
        assert!(!out.contains("extra="));
        assert!(out.ends_with("#vless_xhttp_none"));
    }

    #[test]
    fn test_select_short_id() {
        let inbounds = vec![
            InboundDescriptor {
                protocol: "vmess".to_string(),
                ..Default::default()
            },
            reality_inbound(&[]),
            reality_inbound(&["s0", "s1"]),
            reality_inbound(&["other"]),
        ];
        assert_eq!(select_short_id(&inbounds, 0), "s0");
        assert_eq!(select_short_id(&inbounds, 1), "s1");
        assert_eq!(select_short_id(&inbounds, 9), "s1");
        assert_eq!(select_short_id(&inbounds[..2], 0), "");
    }

    #[test]
    fn test_spider_x() {
        assert_eq!(spider_x("ab12cd34", 4), "get-ab12cd34");
        assert_eq!(spider_x("ffab12cd34", 4), "get-ab12cd34");
        assert_eq!(spider_x("abc", 4), "get-sub00004");
        assert_eq!(spider_x("", 123456), "get-sub123456");
    }

    #[test]
    fn test_find_descriptor_uses_alias() {
        let inbounds = vec![
            InboundDescriptor {
                tag: "first".to_string(),
                protocol: "vless".to_string(),
                network: "tcp".to_string(),
                ..Default::default()
            },
            InboundDescriptor {
                tag: "second".to_string(),
                protocol: "vless".to_string(),
                network: "raw".to_string(),
                ..Default::default()
            },
        ];
        let p = profile("vless", "raw", "none");
        assert_eq!(find_descriptor(&inbounds, &p).unwrap().tag, "first");
        assert!(find_descriptor(&inbounds, &profile("vmess", "raw", "none")).is_none());
    }
}
