// ABOUTME: Pagination and sort query parameters shared by list endpoints
// ABOUTME: Clamps skip/limit to sane bounds before they reach storage

use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// `skip`/`limit`/`sort` query parameters for list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub sort: Option<String>,
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
        }
    }
}

impl PageQuery {
    pub fn skip(&self) -> i64 {
        self.skip.max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Sort parameter, falling back to the endpoint's default
    pub fn sort<'a>(&'a self, default: &'a str) -> &'a str {
        self.sort.as_deref().unwrap_or(default)
    }
}
