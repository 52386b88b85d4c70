//! link_cleaner.rs - Strips tracking parameters from URLs.
//!
//! `LinkCleaner` owns a compiled rule set and applies it to one URL at a
//! time:
//!
//! 1. the global provider's removal rules run against every URL,
//! 2. the first provider whose `urlPattern` matches is selected,
//! 3. a redirection parameter on that provider short-circuits into cleaning
//!    the embedded destination URL,
//! 4. otherwise the provider's `rules`/`referral` parameters are removed,
//!    minus anything protected by `exceptions`, and its raw rules applied.
//!
//! Retained parameters keep their original order and encoding.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::config::RuleSet;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::errors::ScrubError;
use crate::rules::compiler::{compile_rule_set, default_compiled_rules, CompiledProviderRule, CompiledRuleSet};

/// Maximum number of redirection hops followed for a single URL.
pub const MAX_REDIRECT_DEPTH: usize = 10;

/// How a provider's `exceptions` veto removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
    /// A parameter whose name matches an exception is kept.
    #[default]
    Parameter,
    /// An exception matching anywhere in the full URL disables the provider for that URL.
    WholeUrl,
}

/// Cleans tracking parameters out of URLs using a pre-compiled rule set.
#[derive(Debug, Clone)]
pub struct LinkCleaner {
    rules: Arc<CompiledRuleSet>,
    exception_policy: ExceptionPolicy,
}

impl LinkCleaner {
    /// Compiles `rule_set`, logging any dropped patterns.
    pub fn new(rule_set: &RuleSet) -> Self {
        Self::with_sink(rule_set, &LogSink)
    }

    /// Compiles `rule_set`, reporting dropped patterns to `sink`.
    pub fn with_sink(rule_set: &RuleSet, sink: &dyn DiagnosticSink) -> Self {
        Self::from_compiled(Arc::new(compile_rule_set(rule_set, sink)))
    }

    pub fn from_compiled(rules: Arc<CompiledRuleSet>) -> Self {
        Self { rules, exception_policy: ExceptionPolicy::default() }
    }

    /// A cleaner over the embedded default rules, shared process-wide.
    pub fn with_default_rules() -> Self {
        Self::from_compiled(default_compiled_rules())
    }

    pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.exception_policy = policy;
        self
    }

    pub fn exception_policy(&self) -> ExceptionPolicy {
        self.exception_policy
    }

    pub fn compiled_rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    /// Cleans a URL given as a string.
    ///
    /// # Errors
    /// Returns [`ScrubError::InvalidUrl`] when `url` is not an absolute URL.
    pub fn clean(&self, url: &str) -> Result<String, ScrubError> {
        let parsed = Url::parse(url).map_err(|source| ScrubError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(self.clean_url(&parsed).into())
    }

    /// Cleans an already-parsed URL. URLs that cannot carry a query
    /// (`mailto:`, `data:` and the like) come back unchanged.
    pub fn clean_url(&self, url: &Url) -> Url {
        if url.cannot_be_a_base() {
            return url.clone();
        }
        let mut visited = HashSet::new();
        self.clean_recursive(url.clone(), 0, &mut visited)
    }

    /// Cleans an `href` value for rewriting in place.
    ///
    /// Returns `Some(cleaned)` only for `http`/`https` links whose cleaned
    /// form differs from the normalized original, so untouched links are
    /// never rewritten or counted.
    pub fn clean_href(&self, href: &str) -> Option<String> {
        let original = Url::parse(href.trim()).ok()?;
        if !matches!(original.scheme(), "http" | "https") {
            return None;
        }
        let cleaned = self.clean_url(&original);
        if cleaned.as_str() == original.as_str() {
            None
        } else {
            Some(cleaned.into())
        }
    }

    fn clean_recursive(&self, mut url: Url, depth: usize, visited: &mut HashSet<String>) -> Url {
        visited.insert(url.as_str().to_string());

        if let Some(global) = self.rules.global() {
            if !self.vetoed_by_url(global, &url) {
                strip_params(&mut url, global, self.exception_policy);
            }
        }

        let Some(provider) = self.rules.select_provider(url.as_str()) else {
            return url;
        };
        debug!("Provider '{}' selected for {}", provider.name, url.host_str().unwrap_or(""));

        if self.vetoed_by_url(provider, &url) {
            debug!("Provider '{}' skipped: URL matches an exception.", provider.name);
            return url;
        }

        if provider.has_redirections() {
            if depth >= MAX_REDIRECT_DEPTH {
                debug!("Redirect depth limit ({}) reached; cleaning current URL.", MAX_REDIRECT_DEPTH);
            } else if let Some(target) = find_redirect_target(&url, provider) {
                if visited.contains(target.as_str()) {
                    debug!("Circular redirect to {} ignored.", target);
                } else {
                    return self.clean_recursive(target, depth + 1, visited);
                }
            }
        }

        strip_params(&mut url, provider, self.exception_policy);
        apply_raw_rules(&mut url, provider);
        url
    }

    fn vetoed_by_url(&self, provider: &CompiledProviderRule, url: &Url) -> bool {
        self.exception_policy == ExceptionPolicy::WholeUrl && provider.url_exceptions.is_match(url.as_str())
    }
}

/// Decodes a raw query-string component the way form encoding does.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Removes matching parameters from the query. Returns how many were removed.
fn strip_params(url: &mut Url, rule: &CompiledProviderRule, policy: ExceptionPolicy) -> usize {
    let Some(query) = url.query() else {
        return 0;
    };

    let mut removed = 0;
    let mut kept: Vec<String> = Vec::new();
    for segment in query.split('&') {
        if segment.is_empty() {
            continue;
        }
        let name = decode_component(segment.split('=').next().unwrap_or(segment));
        let protected = policy == ExceptionPolicy::Parameter && rule.exceptions.is_match(&name);
        if rule.removes_param(&name) && !protected {
            removed += 1;
        } else {
            kept.push(segment.to_string());
        }
    }

    if removed > 0 {
        let new_query = kept.join("&");
        url.set_query(if new_query.is_empty() { None } else { Some(&new_query) });
    }
    removed
}

/// Finds the first redirection parameter with a usable destination URL.
///
/// Values that do not decode as UTF-8 or do not parse as an `http`/`https`
/// URL are skipped; the caller then falls back to stripping the outer URL.
fn find_redirect_target(url: &Url, rule: &CompiledProviderRule) -> Option<Url> {
    let query = url.query()?;
    for segment in query.split('&') {
        let (raw_name, raw_value) = match segment.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        if raw_value.is_empty() || !rule.redirections.is_match(&decode_component(raw_name)) {
            continue;
        }

        let decoded = match percent_decode_str(raw_value).decode_utf8() {
            Ok(value) => value,
            Err(e) => {
                debug!("Redirection value for '{}' is not valid UTF-8: {}", raw_name, e);
                return None;
            }
        };
        return match Url::parse(&decoded) {
            Ok(target) if matches!(target.scheme(), "http" | "https") => Some(target),
            Ok(target) => {
                debug!("Redirection to non-web scheme '{}' ignored.", target.scheme());
                None
            }
            Err(e) => {
                debug!("Redirection value for '{}' is not a URL: {}", raw_name, e);
                None
            }
        };
    }
    None
}

fn apply_raw_rules(url: &mut Url, rule: &CompiledProviderRule) {
    if rule.raw_rules.is_empty() {
        return;
    }
    let mut text = url.as_str().to_string();
    for re in &rule.raw_rules {
        text = re.replace_all(&text, "").into_owned();
    }
    if text == url.as_str() {
        return;
    }
    match Url::parse(&text) {
        Ok(mut rewritten) => {
            if rewritten.query() == Some("") {
                rewritten.set_query(None);
            }
            *url = rewritten;
        }
        Err(e) => debug!("Raw rules for '{}' produced an unparseable URL, ignored: {}", rule.name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderRule, GLOBAL_PROVIDER_KEY};

    fn provider(url_pattern: &str, rules: &[&str]) -> ProviderRule {
        ProviderRule {
            url_pattern: url_pattern.to_string(),
            rules: rules.iter().map(|s| s.to_string()).collect(),
            ..ProviderRule::default()
        }
    }

    fn cleaner(providers: Vec<(&str, ProviderRule)>) -> LinkCleaner {
        let rules: RuleSet = providers.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        LinkCleaner::new(&rules)
    }

    #[test]
    fn strips_matching_params_and_keeps_order() {
        let c = cleaner(vec![("ex", provider("example\\.com", &["utm_[a-z]+", "ref"]))]);
        let out = c.clean("https://example.com/p?a=1&utm_source=x&b=2&ref=y&c=3").unwrap();
        assert_eq!(out, "https://example.com/p?a=1&b=2&c=3");
    }

    #[test]
    fn emptied_query_leaves_no_question_mark() {
        let c = cleaner(vec![("ex", provider("example\\.com", &["utm_[a-z]+"]))]);
        let out = c.clean("https://example.com/p?utm_source=x&utm_medium=y#top").unwrap();
        assert_eq!(out, "https://example.com/p#top");
    }

    #[test]
    fn retained_values_keep_their_encoding() {
        let c = cleaner(vec![("ex", provider("example\\.com", &["gclid"]))]);
        let out = c.clean("https://example.com/?q=a+b%20c&gclid=1").unwrap();
        assert_eq!(out, "https://example.com/?q=a+b%20c");
    }

    #[test]
    fn exception_keeps_parameter() {
        let mut rule = provider("example\\.com", &["[a-z]+id"]);
        rule.exceptions = vec!["productid".to_string()];
        let c = cleaner(vec![("ex", rule)]);
        let out = c.clean("https://example.com/?clickid=1&productid=2").unwrap();
        assert_eq!(out, "https://example.com/?productid=2");
    }

    #[test]
    fn whole_url_exception_policy_skips_provider() {
        let mut rule = provider("example\\.com", &["ref"]);
        rule.exceptions = vec!["example\\.com/keep".to_string()];
        let c = cleaner(vec![("ex", rule)]).with_exception_policy(ExceptionPolicy::WholeUrl);

        assert_eq!(c.clean("https://example.com/keep?ref=1").unwrap(), "https://example.com/keep?ref=1");
        assert_eq!(c.clean("https://example.com/drop?ref=1").unwrap(), "https://example.com/drop");
    }

    #[test]
    fn referral_params_are_removed_like_rules() {
        let mut rule = provider("shop\\.test", &[]);
        rule.referral = vec!["tag".to_string()];
        let c = cleaner(vec![("shop", rule)]);
        assert_eq!(c.clean("https://shop.test/item?tag=aff-20&id=9").unwrap(), "https://shop.test/item?id=9");
    }

    #[test]
    fn first_matching_provider_wins() {
        let c = cleaner(vec![
            ("first", provider("example\\.com", &["a"])),
            ("second", provider("example", &["b"])),
        ]);
        assert_eq!(c.clean("https://example.com/?a=1&b=2").unwrap(), "https://example.com/?b=2");
    }

    #[test]
    fn url_pattern_is_case_insensitive() {
        let c = cleaner(vec![("ex", provider("EXAMPLE\\.COM", &["a"]))]);
        assert_eq!(c.clean("https://example.com/?a=1").unwrap(), "https://example.com/");
    }

    #[test]
    fn global_rules_apply_before_provider_rules() {
        let c = cleaner(vec![
            (GLOBAL_PROVIDER_KEY, provider(".*", &["utm_source"])),
            ("ex", provider("example\\.com", &["ref"])),
        ]);
        assert_eq!(c.clean("https://other.org/?utm_source=x&id=1").unwrap(), "https://other.org/?id=1");
        assert_eq!(c.clean("https://example.com/?utm_source=x&ref=y&id=1").unwrap(), "https://example.com/?id=1");
    }

    #[test]
    fn redirection_returns_cleaned_inner_url() {
        let mut rule = provider("^https?://p\\.com", &["gclid"]);
        rule.redirections = vec!["url".to_string()];
        let c = cleaner(vec![
            (GLOBAL_PROVIDER_KEY, provider(".*", &["gclid"])),
            ("p", rule),
        ]);
        let out = c
            .clean("https://p.com/url?url=https%3A%2F%2Fq.com%2Ftarget%3Fgclid%3D1&gclid=2")
            .unwrap();
        assert_eq!(out, "https://q.com/target");
    }

    #[test]
    fn undecodable_redirection_falls_back_to_stripping() {
        let mut rule = provider("^https?://p\\.com", &["gclid"]);
        rule.redirections = vec!["url".to_string()];
        let c = cleaner(vec![("p", rule)]);
        assert_eq!(c.clean("https://p.com/r?url=not%20a%20url&gclid=2").unwrap(), "https://p.com/r?url=not%20a%20url");
        assert_eq!(c.clean("https://p.com/r?url=%FF%FE&gclid=2").unwrap(), "https://p.com/r?url=%FF%FE");
    }

    #[test]
    fn redirection_to_non_web_scheme_is_ignored() {
        let mut rule = provider("^https?://p\\.com", &[]);
        rule.redirections = vec!["url".to_string()];
        let c = cleaner(vec![("p", rule)]);
        let input = "https://p.com/r?url=javascript%3Aalert(1)";
        assert_eq!(c.clean(input).unwrap(), input);
    }

    #[test]
    fn raw_rules_edit_the_url_string() {
        let mut rule = provider("example\\.com", &[]);
        rule.raw_rules = vec!["/ref=[^/?]*".to_string()];
        let c = cleaner(vec![("ex", rule)]);
        assert_eq!(c.clean("https://example.com/dp/B01/ref=sr_1_1?th=1").unwrap(), "https://example.com/dp/B01?th=1");
    }

    #[test]
    fn invalid_string_is_an_error() {
        let c = cleaner(vec![]);
        assert!(matches!(c.clean("not a url"), Err(ScrubError::InvalidUrl { .. })));
    }

    #[test]
    fn cannot_be_a_base_url_is_returned_unchanged() {
        let c = cleaner(vec![(GLOBAL_PROVIDER_KEY, provider(".*", &["subject"]))]);
        let mail = Url::parse("mailto:a@b.c?subject=hi").unwrap();
        assert_eq!(c.clean_url(&mail), mail);
    }

    #[test]
    fn clean_href_reports_only_real_changes() {
        let c = cleaner(vec![(GLOBAL_PROVIDER_KEY, provider(".*", &["utm_source"]))]);
        assert_eq!(c.clean_href("https://a.com"), None);
        assert_eq!(c.clean_href("/relative?utm_source=x"), None);
        assert_eq!(c.clean_href("mailto:x@y.z"), None);
        assert_eq!(c.clean_href(" https://a.com/?utm_source=x "), Some("https://a.com/".to_string()));
    }
}
