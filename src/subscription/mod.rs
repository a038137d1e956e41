//! Subscription link generation
//!
//! `generate_links` is a pure function of the normalized inbounds, the
//! profile list, the query token and the optional override secret.

pub mod link;
pub mod matcher;

use crate::error::Result;
use crate::model::{ClientIdentity, InboundDescriptor, SubscriptionProfile};
use base64::Engine as _;
use std::str::FromStr;
use tracing::{debug, warn};

pub use link::{build_link, LinkInput, QueryParams};
pub use matcher::{categorize, Categorized, MatchPolicy};

/// Why a (client, profile) pair produced no link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    NotMember,
    LevelTooLow,
    MissingRealityKey,
}

/// Eligibility gate for one (client, profile) pair
pub fn check_eligibility(
    categorized: &Categorized<'_>,
    client: &ClientIdentity,
    profile: &SubscriptionProfile,
) -> std::result::Result<(), Ineligible> {
    if !categorized.is_member(&profile.category_key(), &client.id) {
        return Err(Ineligible::NotMember);
    }
    if profile.level != -1 && i64::from(client.level) < profile.level {
        return Err(Ineligible::LevelTooLow);
    }
    if profile.security == "reality" && profile.password.is_empty() {
        return Err(Ineligible::MissingRealityKey);
    }
    Ok(())
}

/// Generate the ordered share links for a query.
///
/// Links are grouped per matched client (device order), and within a client
/// follow the profile list order.
pub fn generate_links(
    inbounds: &[InboundDescriptor],
    profiles: &[SubscriptionProfile],
    query: &str,
    override_secret: Option<&str>,
) -> Result<Vec<String>> {
    let policy = MatchPolicy::from_query(query, override_secret);
    let categorized = categorize(inbounds, &policy)?;

    debug!(
        "matched {} clients across {} categories",
        categorized.matched.len(),
        categorized.members.len()
    );

    let mut links = Vec::new();
    for (client_index, &client) in categorized.matched.iter().enumerate() {
        let short_id = link::select_short_id(inbounds, client_index);

        for (profile_index, profile) in profiles.iter().enumerate() {
            match check_eligibility(&categorized, client, profile) {
                Ok(()) => {}
                Err(Ineligible::MissingRealityKey) => {
                    warn!(
                        "'password' (pbk) is missing for a REALITY subscription profile (Address: {}). Skipping.",
                        profile.address
                    );
                    continue;
                }
                Err(_) => continue,
            }

            let input = LinkInput {
                client,
                profile,
                profile_index,
                descriptor: link::find_descriptor(inbounds, profile),
                short_id,
            };
            links.push(build_link(&input));
        }
    }

    Ok(links)
}

/// Body encodings offered for a link list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubscriptionFormat {
    /// `{"success":true,"data":[...]}`
    #[default]
    Json,
    /// One link per line
    Plain,
    /// Base64 of the plain body
    Base64,
}

impl FromStr for SubscriptionFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "json" => Ok(SubscriptionFormat::Json),
            "plain" | "text" => Ok(SubscriptionFormat::Plain),
            "base64" => Ok(SubscriptionFormat::Base64),
            other => Err(format!("unknown subscription format '{}'", other)),
        }
    }
}

/// Newline separated links with a trailing newline
pub fn render_plain(links: &[String]) -> String {
    let mut out = links.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

pub fn render_base64(links: &[String]) -> String {
    base64::engine::general_purpose::STANDARD.encode(render_plain(links))
}
