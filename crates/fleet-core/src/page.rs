//! Offset/limit pagination shared by every listing operation
//!
//! A listing never returns an unbounded page: an omitted limit falls back to
//! the configured default and a requested limit is clamped to the maximum.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not supply a limit
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Largest page size a caller can request
pub const MAX_PAGE_LIMIT: u64 = 1000;

/// Raw pagination parameters as supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of entries to skip
    pub offset: Option<u64>,
    /// Maximum number of entries to return
    pub limit: Option<u64>,
}

impl PageRequest {
    /// Request with both bounds set
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    /// Resolve against the configured bounds
    pub fn resolve(&self, policy: &PagePolicy) -> Page {
        let limit = self
            .limit
            .unwrap_or(policy.default_limit)
            .min(policy.max_limit);
        Page {
            offset: self.offset.unwrap_or(0),
            limit,
        }
    }
}

/// Default/maximum page size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePolicy {
    /// Page size used when no limit is supplied
    pub default_limit: u64,
    /// Upper bound on any requested limit
    pub max_limit: u64,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Resolved, bounded page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Number of entries to skip
    pub offset: u64,
    /// Maximum number of entries to return
    pub limit: u64,
}

impl Page {
    /// Window covering everything. Only for internal full scans, never for caller input.
    pub const ALL: Page = Page {
        offset: 0,
        limit: u64::MAX,
    };

    /// Cut this window out of an already ordered sequence
    pub fn slice<T, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// One page of results plus the total size of the unpaginated result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Entries in this page
    pub values: Vec<T>,
    /// Total number of entries across all pages
    pub total: u64,
    /// Offset this page starts at
    pub offset: u64,
    /// Limit that was applied
    pub limit: u64,
}

impl<T> Paginated<T> {
    /// Paginate an ordered, fully materialized sequence
    pub fn from_ordered(items: Vec<T>, page: Page) -> Self {
        let total = items.len() as u64;
        Self {
            values: page.slice(items),
            total,
            offset: page.offset,
            limit: page.limit,
        }
    }

    /// Transform the entries, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            values: self.values.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }

    /// Whether more entries exist past this page
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.values.len() as u64) < self.total
    }
}
