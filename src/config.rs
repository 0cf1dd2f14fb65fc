//! Process-wide filter configuration.
//!
//! The host owns the actual settings store; this module only models the
//! snapshot the filter reads. Snapshots are immutable and shared through an
//! [`std::sync::Arc`], so checks never observe a half-applied settings
//! change and tests can run isolated configurations side by side.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// One immutable snapshot of the host's filter settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Master switch; when false every policy call permits.
    pub enabled: bool,
    /// Evaluate and report violations, but permit everything.
    pub report_only: bool,
    /// Treat every violation as a block, regardless of the response header.
    pub block_mode: bool,
    /// Whether scripts inserted by script (rather than markup) are checked.
    pub block_dynamic: bool,
    /// Registrable domains that are always permitted as external targets.
    pub whitelist: HashSet<String>,
}

impl Default for FilterConfig {
    fn default() -> FilterConfig {
        FilterConfig {
            enabled: true,
            report_only: false,
            block_mode: false,
            block_dynamic: true,
            whitelist: HashSet::new(),
        }
    }
}

impl FilterConfig {
    /// Rebuild the whitelist wholesale from the comma-separated domain list
    /// the host keeps in its settings.
    pub fn set_whitelist_pref(&mut self, pref: &str) {
        self.whitelist = pref
            .split(',')
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .map(str::to_owned)
            .collect();
    }

    pub fn with_whitelist_pref(mut self, pref: &str) -> FilterConfig {
        self.set_whitelist_pref(pref);
        self
    }
}

/// Holds the current [`FilterConfig`] snapshot for the process. Reads are
/// frequent (one per document filter construction or settings refresh) and
/// cheap; writes happen only on host setting changes and swap the whole
/// snapshot.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<FilterConfig>>,
}

impl ConfigStore {
    pub fn new(config: FilterConfig) -> ConfigStore {
        ConfigStore {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<FilterConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // a poisoned lock still holds a valid snapshot
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn update(&self, config: FilterConfig) {
        let next = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
