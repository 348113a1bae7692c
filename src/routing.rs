//! Keyword-based routing of URLs to endpoints
//!
//! Routes are an ordered list of `(keyword, endpoint)` pairs. The first route
//! whose matcher accepts a URL wins, so insertion order is the tie-break and
//! results are deterministic for a fixed configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

use crate::models::Endpoint;

/// How a route keyword is compared against a URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Keyword appears anywhere in the URL, including path and query
    #[default]
    Substring,
    /// URL host equals the keyword or is a subdomain of it
    Host,
}

impl MatchStrategy {
    pub fn matches(&self, keyword: &str, url: &str) -> bool {
        match self {
            Self::Substring => url.contains(keyword),
            Self::Host => {
                let Some(host) = Url::parse(url)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
                else {
                    return false;
                };
                let keyword = keyword.to_ascii_lowercase();
                host == keyword || host.ends_with(&format!(".{keyword}"))
            }
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "host" => Ok(Self::Host),
            other => Err(format!("unknown match strategy: {other}")),
        }
    }
}

/// Ordered keyword → endpoint table
#[derive(Debug, Clone)]
pub struct EndpointRouter {
    routes: Vec<Endpoint>,
    strategy: MatchStrategy,
}

impl EndpointRouter {
    /// Build a router over endpoints whose names are the routing keywords
    pub fn new(routes: Vec<Endpoint>, strategy: MatchStrategy) -> Self {
        Self { routes, strategy }
    }

    /// First endpoint whose keyword matches `url`, or `None` when unrouted
    pub fn route(&self, url: &str) -> Option<&Endpoint> {
        self.routes
            .iter()
            .find(|endpoint| self.strategy.matches(&endpoint.name, url))
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.routes
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }
}
