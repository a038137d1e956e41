//! Client categorizer and matcher
//!
//! Clients are bucketed by `protocol_network`. Matching walks the buckets
//! index-first, category-second so that the same physical client advertised
//! under several categories lands at one stable position in the global
//! matched sequence (its device index).

use crate::error::{BridgeError, Result};
use crate::model::{is_supported_protocol, ClientIdentity, InboundDescriptor};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Which clients a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPolicy<'a> {
    /// The query equalled the override secret
    All,
    /// Comma separated client ids
    Ids(HashSet<&'a str>),
}

impl<'a> MatchPolicy<'a> {
    /// Build the policy for a query token. An empty secret disables match-all.
    pub fn from_query(query: &'a str, override_secret: Option<&str>) -> Self {
        match override_secret {
            Some(secret) if !secret.is_empty() && secret == query => MatchPolicy::All,
            _ => MatchPolicy::Ids(
                query
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .collect(),
            ),
        }
    }

    pub fn matches(&self, client: &ClientIdentity) -> bool {
        match self {
            MatchPolicy::All => true,
            MatchPolicy::Ids(ids) => ids.contains(client.id.as_str()),
        }
    }
}

/// Output of categorization, borrowing the descriptors for one request
#[derive(Debug, Default)]
pub struct Categorized<'a> {
    /// Every client advertised under each category, in descriptor order
    pub categories: IndexMap<String, Vec<&'a ClientIdentity>>,
    /// The matching subset of each category
    pub members: IndexMap<String, Vec<&'a ClientIdentity>>,
    /// Deduplicated matched clients in device order
    pub matched: Vec<&'a ClientIdentity>,
}

impl<'a> Categorized<'a> {
    /// Whether a client matched under the given category
    pub fn is_member(&self, key: &str, id: &str) -> bool {
        self.members
            .get(key)
            .map(|clients| clients.iter().any(|c| c.id == id))
            .unwrap_or(false)
    }
}

/// Group clients by category and select the ones the policy accepts
pub fn categorize<'a>(
    inbounds: &'a [InboundDescriptor],
    policy: &MatchPolicy<'_>,
) -> Result<Categorized<'a>> {
    let mut categories: IndexMap<String, Vec<&'a ClientIdentity>> = IndexMap::new();
    let mut supported = false;

    for inbound in inbounds {
        if !is_supported_protocol(&inbound.protocol) {
            continue;
        }
        supported = true;

        if inbound.clients.is_empty() {
            continue;
        }
        categories
            .entry(inbound.category_key())
            .or_default()
            .extend(inbound.clients.iter());
    }

    if !supported {
        return Err(BridgeError::UnsupportedConfiguration);
    }

    let mut members: IndexMap<String, Vec<&'a ClientIdentity>> = IndexMap::new();
    let mut matched = Vec::new();
    let mut seen: HashSet<&'a str> = HashSet::new();

    let max_len = categories.values().map(Vec::len).max().unwrap_or(0);
    for index in 0..max_len {
        for (key, clients) in &categories {
            let Some(&client) = clients.get(index) else {
                continue;
            };
            if !policy.matches(client) {
                continue;
            }

            members.entry(key.clone()).or_default().push(client);
            if seen.insert(client.id.as_str()) {
                matched.push(client);
            }
        }
    }

    Ok(Categorized {
        categories,
        members,
        matched,
    })
}
