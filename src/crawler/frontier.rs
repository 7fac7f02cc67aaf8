//! Frontier admission and deduplication
//!
//! The frontier owns the visited set. Every URL that will ever be fetched
//! passes through [`Frontier::try_admit`] (or [`Frontier::admit_seed`]) once,
//! and the key is recorded at that moment, so two workers discovering the
//! same link can never both enqueue it.
//!
//! A second set tracks the pages actually fetched, keyed by where each fetch
//! landed. A page reached through a redirect is not fetched again when its
//! own entry comes up later.

use crate::config::SeedConfig;
use crate::url::{in_scope, normalize_url, without_fragment, NormalizedUrl, QueryPolicy};
use crate::UrlError;
use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// A page that has been admitted and is waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Dedup key
    pub url: NormalizedUrl,

    /// URL to request; the resolved link without its fragment
    pub target: Url,

    /// Link distance from the seed (seed is 0)
    pub depth: u32,
}

/// Why a discovered link was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Following it would exceed the maximum depth
    DepthLimit,
    /// Its authority differs from the allowed domain
    OffDomain,
    /// Its key is already in the visited set
    Duplicate,
}

/// Result of offering a link to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(FrontierEntry),
    Rejected(SkipReason),
}

/// Single admission gate for the crawl
#[derive(Debug)]
pub struct Frontier {
    allowed_domain: String,
    max_depth: u32,
    policy: QueryPolicy,
    visited: Mutex<HashSet<NormalizedUrl>>,
    fetched: Mutex<HashSet<NormalizedUrl>>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new(allowed_domain: impl Into<String>, max_depth: u32, policy: QueryPolicy) -> Self {
        Self {
            allowed_domain: allowed_domain.into(),
            max_depth,
            policy,
            visited: Mutex::new(HashSet::new()),
            fetched: Mutex::new(HashSet::new()),
        }
    }

    /// Creates an empty frontier scoped to the seed's domain
    pub fn for_seed(seed: &SeedConfig) -> Self {
        Self::new(seed.allowed_domain.clone(), seed.max_depth, seed.query_policy)
    }

    /// Admits the seed URL at depth 0
    ///
    /// The seed bypasses the depth and scope checks; it defines the scope.
    pub fn admit_seed(&self, seed: &Url) -> Result<FrontierEntry, UrlError> {
        let key = normalize_url(seed, self.policy)?;
        self.lock().insert(key.clone());
        Ok(FrontierEntry {
            url: key,
            target: without_fragment(seed),
            depth: 0,
        })
    }

    /// Offers a link found on a page at `current_depth`
    ///
    /// Checks run in order:
    ///
    /// 1. Depth: the link would sit at `current_depth + 1`, which must not exceed the maximum
    /// 2. Scope: the link's authority must equal the allowed domain
    /// 3. Dedup: the normalized key must not be in the visited set
    ///
    /// The dedup check and the insert happen under one lock.
    ///
    /// # Arguments
    ///
    /// * `link` - Absolute URL, already joined against the page's final URL
    /// * `current_depth` - Depth of the page the link was found on
    ///
    /// # Returns
    ///
    /// * `Admission::Admitted(entry)` - The key was new and is now visited
    /// * `Admission::Rejected(reason)` - The link will not be followed
    pub fn try_admit(&self, link: &Url, current_depth: u32) -> Admission {
        let depth = current_depth.saturating_add(1);
        if depth > self.max_depth {
            return Admission::Rejected(SkipReason::DepthLimit);
        }

        if !in_scope(link, &self.allowed_domain) {
            return Admission::Rejected(SkipReason::OffDomain);
        }

        let key = match normalize_url(link, self.policy) {
            Ok(key) => key,
            Err(_) => return Admission::Rejected(SkipReason::OffDomain),
        };

        if !self.lock().insert(key.clone()) {
            return Admission::Rejected(SkipReason::Duplicate);
        }

        Admission::Admitted(FrontierEntry {
            url: key,
            target: without_fragment(link),
            depth,
        })
    }

    /// Claims an admitted page for fetching
    ///
    /// Returns false if an earlier fetch already landed on this key through a
    /// redirect, in which case the page must not be fetched again.
    pub fn claim_fetch(&self, key: &NormalizedUrl) -> bool {
        lock_set(&self.fetched).insert(key.clone())
    }

    /// Records where a fetch of `entry` ended up after redirects
    ///
    /// The final URL joins both sets, so later links to it are duplicates.
    ///
    /// # Returns
    ///
    /// * `true` - The page is new and should be counted and expanded
    /// * `false` - Another fetch already landed on the same page
    pub fn mark_landed(&self, entry: &FrontierEntry, final_url: &Url) -> bool {
        let Ok(key) = normalize_url(final_url, self.policy) else {
            return true;
        };
        if key == entry.url {
            return true;
        }

        self.lock().insert(key.clone());
        lock_set(&self.fetched).insert(key)
    }

    /// Returns true if the key has been admitted
    pub fn contains(&self, key: &NormalizedUrl) -> bool {
        self.lock().contains(key)
    }

    /// Number of keys admitted so far
    pub fn visited_len(&self) -> usize {
        self.lock().len()
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<NormalizedUrl>> {
        lock_set(&self.visited)
    }
}

fn lock_set(set: &Mutex<HashSet<NormalizedUrl>>) -> std::sync::MutexGuard<'_, HashSet<NormalizedUrl>> {
    // Both sets are only ever inserted into, so a poisoned guard is still consistent.
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
