//! Configuration management for `mailscrub-core`.
//!
//! This module defines the rule-set data structures that describe which query
//! parameters each provider uses for tracking. It handles deserialization of
//! JSON rule sets, loading the embedded default rules, and merging a user rule
//! set over the defaults.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::errors::ScrubError;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// The reserved provider key whose rules apply to every URL.
pub const GLOBAL_PROVIDER_KEY: &str = "globalRules";

/// A single provider's URL pattern and tracking-parameter rules.
///
/// Field names follow the camelCase JSON layout used by public rule corpora.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRule {
    /// Regex matched case-insensitively against the full URL string.
    pub url_pattern: String,
    /// Parameter-name patterns whose parameters are removed.
    pub rules: Vec<String>,
    /// Parameter-name patterns that veto a removal.
    #[serde(default)]
    pub exceptions: Vec<String>,
    /// Parameter-name patterns whose value is itself a URL to follow.
    #[serde(default)]
    pub redirections: Vec<String>,
    /// Affiliate/referral parameter-name patterns, removed like `rules`.
    #[serde(default, alias = "referralMarketing")]
    pub referral: Vec<String>,
    /// Patterns matched against the whole URL string; matched text is deleted.
    #[serde(default)]
    pub raw_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An ordered mapping of provider key to [`ProviderRule`].
///
/// Order is the precedence order for provider selection: the first provider
/// whose `url_pattern` matches wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    pub providers: IndexMap<String, ProviderRule>,
}

impl RuleSet {
    /// Parses a rule set from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rule_set: RuleSet = json.parse().context("Failed to parse rule set JSON")?;
        debug!("Parsed rule set with {} providers.", rule_set.providers.len());
        Ok(rule_set)
    }

    /// Loads a rule set from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rule set from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule set file {}", path.display()))?;
        let rule_set: RuleSet = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse rule set file {}", path.display()))?;

        info!("Loaded {} providers from file {}.", rule_set.providers.len(), path.display());
        Ok(rule_set)
    }

    /// Loads the rule set embedded in the library.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_json = include_str!("../config/default_rules.json");
        let rule_set: RuleSet = serde_json::from_str(default_json)
            .context("Failed to parse default rules")?;

        debug!("Loaded {} default providers.", rule_set.providers.len());
        Ok(rule_set)
    }

    pub fn global(&self) -> Option<&ProviderRule> {
        self.providers.get(GLOBAL_PROVIDER_KEY)
    }

    /// Iterates the provider-specific rules in precedence order, skipping the global key.
    pub fn specific_providers(&self) -> impl Iterator<Item = (&String, &ProviderRule)> {
        self.providers.iter().filter(|(key, _)| key.as_str() != GLOBAL_PROVIDER_KEY)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromStr for RuleSet {
    type Err = ScrubError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(String, ProviderRule)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (String, ProviderRule)>>(iter: I) -> Self {
        Self { providers: iter.into_iter().collect() }
    }
}

/// Merges a user-defined rule set over the defaults.
///
/// A user provider with the same key replaces the default in place, keeping
/// the default's precedence slot. Providers only the user defines are placed
/// ahead of the defaults so they win first-match selection.
pub fn merge_rule_sets(default_rules: RuleSet, user_rules: Option<RuleSet>) -> RuleSet {
    debug!("merge_rule_sets called. Initial default providers count: {}", default_rules.len());

    let Some(mut user) = user_rules else {
        return default_rules;
    };

    debug!("User rule set provided. Merging {} user providers.", user.len());
    let mut defaults = default_rules.providers;
    for (key, rule) in defaults.iter_mut() {
        if let Some(user_rule) = user.providers.shift_remove(key) {
            debug!("Overriding provider '{}' with user definition.", key);
            *rule = user_rule;
        }
    }

    let mut merged = user.providers;
    merged.extend(defaults);
    debug!("Final total providers after merge: {}", merged.len());

    RuleSet { providers: merged }
}
