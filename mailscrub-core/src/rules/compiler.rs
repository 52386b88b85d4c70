//! compiler.rs - Turns a `RuleSet` into pre-compiled matchers.
//!
//! Every pattern in a rule set is compiled exactly once, when the rule set is
//! loaded. Cleaning a URL afterwards only runs `RegexSet` tests. A bad
//! pattern never fails the whole compilation: it is dropped from its pattern
//! list (or, for a `urlPattern`, makes the provider unselectable) and
//! reported through the supplied `DiagnosticSink`.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ProviderRule, RuleSet, GLOBAL_PROVIDER_KEY, MAX_PATTERN_LENGTH};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink, RuleField};

/// 10 MB limit for any single compiled regex or regex set.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A list of patterns compiled into one `RegexSet`.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: RegexSet,
}

impl PatternSet {
    pub fn empty() -> Self {
        Self { set: RegexSet::empty() }
    }

    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        !self.set.is_empty() && self.set.is_match(haystack)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Number of patterns that survived compilation.
    pub fn len(&self) -> usize {
        self.set.len()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// A provider rule with every pattern pre-compiled.
///
/// Immutable once built; shared freely between threads and calls.
#[derive(Debug, Clone)]
pub struct CompiledProviderRule {
    pub name: String,
    /// `None` when the pattern failed to compile; such a provider never matches.
    pub url_pattern: Option<Regex>,
    /// Parameter-name patterns, anchored to the whole name.
    pub rules: PatternSet,
    pub referral: PatternSet,
    pub redirections: PatternSet,
    /// Exceptions tested against a parameter name.
    pub exceptions: PatternSet,
    /// The same exceptions tested anywhere in the full URL string.
    pub url_exceptions: PatternSet,
    pub raw_rules: Vec<Regex>,
}

impl CompiledProviderRule {
    /// True if this provider's `urlPattern` compiled and matches `url`.
    pub fn matches_url(&self, url: &str) -> bool {
        self.url_pattern.as_ref().map_or(false, |re| re.is_match(url))
    }

    /// True if a parameter with this (decoded) name is slated for removal.
    pub fn removes_param(&self, name: &str) -> bool {
        self.rules.is_match(name) || self.referral.is_match(name)
    }

    pub fn has_redirections(&self) -> bool {
        !self.redirections.is_empty()
    }
}

/// The runtime form of a whole rule set.
///
/// Providers are kept in precedence order, with a side index keyed by
/// provider identifier.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    global: Option<CompiledProviderRule>,
    providers: Vec<CompiledProviderRule>,
    index: HashMap<String, usize>,
}

impl CompiledRuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn global(&self) -> Option<&CompiledProviderRule> {
        self.global.as_ref()
    }

    /// Provider-specific rules in precedence order.
    pub fn providers(&self) -> &[CompiledProviderRule] {
        &self.providers
    }

    pub fn get(&self, key: &str) -> Option<&CompiledProviderRule> {
        if key == GLOBAL_PROVIDER_KEY {
            return self.global.as_ref();
        }
        self.index.get(key).map(|&i| &self.providers[i])
    }

    /// First provider whose `urlPattern` matches, in rule-set order.
    pub fn select_provider(&self, url: &str) -> Option<&CompiledProviderRule> {
        self.providers.iter().find(|p| p.matches_url(url))
    }

    pub fn len(&self) -> usize {
        self.providers.len() + usize::from(self.global.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ProviderCompiler<'a> {
    provider: &'a str,
    sink: &'a dyn DiagnosticSink,
}

impl ProviderCompiler<'_> {
    fn warn(&self, field: RuleField, pattern: &str, message: String) {
        self.sink.report(Diagnostic::RuleCompilationWarning {
            provider: self.provider.to_string(),
            field,
            pattern: pattern.to_string(),
            message,
        });
    }

    fn build_regex(&self, field: RuleField, pattern: &str, source: &str) -> Option<Regex> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            self.warn(
                field,
                pattern,
                format!("pattern length ({}) exceeds maximum allowed ({})", pattern.len(), MAX_PATTERN_LENGTH),
            );
            return None;
        }

        match RegexBuilder::new(source)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                self.warn(field, pattern, e.to_string());
                None
            }
        }
    }

    /// Returns the compilable subset of `patterns`, wrapped as full-name
    /// matchers when `anchored` is set.
    fn valid_sources(&self, field: RuleField, patterns: &[String], anchored: bool) -> Vec<String> {
        patterns
            .iter()
            .filter_map(|pattern| {
                let source = if anchored { format!("^(?:{})$", pattern) } else { pattern.clone() };
                self.build_regex(field, pattern, &source).map(|_| source)
            })
            .collect()
    }

    fn build_set(&self, field: RuleField, sources: &[String]) -> PatternSet {
        if sources.is_empty() {
            return PatternSet::empty();
        }
        match RegexSetBuilder::new(sources)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(set) => PatternSet { set },
            Err(e) => {
                self.warn(field, &sources.join("|"), e.to_string());
                PatternSet::empty()
            }
        }
    }

    fn param_set(&self, field: RuleField, patterns: &[String]) -> PatternSet {
        let sources = self.valid_sources(field, patterns, true);
        self.build_set(field, &sources)
    }

    fn compile(&self, rule: &ProviderRule) -> CompiledProviderRule {
        let url_pattern = self.build_regex(RuleField::UrlPattern, &rule.url_pattern, &rule.url_pattern);

        // Exceptions are validated once and then built in both forms.
        let exception_names = self.valid_sources(RuleField::Exceptions, &rule.exceptions, false);
        let anchored: Vec<String> = exception_names.iter().map(|p| format!("^(?:{})$", p)).collect();

        let raw_rules = rule
            .raw_rules
            .iter()
            .filter_map(|pattern| self.build_regex(RuleField::RawRules, pattern, pattern))
            .collect();

        CompiledProviderRule {
            name: self.provider.to_string(),
            url_pattern,
            rules: self.param_set(RuleField::Rules, &rule.rules),
            referral: self.param_set(RuleField::Referral, &rule.referral),
            redirections: self.param_set(RuleField::Redirections, &rule.redirections),
            exceptions: self.build_set(RuleField::Exceptions, &anchored),
            url_exceptions: self.build_set(RuleField::Exceptions, &exception_names),
            raw_rules,
        }
    }
}

/// Compiles a single provider rule.
pub fn compile_provider(name: &str, rule: &ProviderRule, sink: &dyn DiagnosticSink) -> CompiledProviderRule {
    let compiled = ProviderCompiler { provider: name, sink }.compile(rule);
    debug!(
        target: "mailscrub_core::rules::compiler",
        "Provider '{}' compiled: {} rules, {} referral, {} redirections, {} exceptions.",
        name,
        compiled.rules.len(),
        compiled.referral.len(),
        compiled.redirections.len(),
        compiled.exceptions.len()
    );
    compiled
}

/// Compiles a whole rule set, reporting every dropped pattern to `sink`.
pub fn compile_rule_set(rule_set: &RuleSet, sink: &dyn DiagnosticSink) -> CompiledRuleSet {
    debug!("Starting compilation of {} providers.", rule_set.len());

    let global = rule_set.global().map(|rule| compile_provider(GLOBAL_PROVIDER_KEY, rule, sink));

    let mut providers = Vec::with_capacity(rule_set.len());
    let mut index = HashMap::with_capacity(rule_set.len());
    for (key, rule) in rule_set.specific_providers() {
        index.insert(key.clone(), providers.len());
        providers.push(compile_provider(key, rule, sink));
    }

    debug!("Finished compiling rule set. Total providers: {}.", providers.len());
    CompiledRuleSet { global, providers, index }
}

static DEFAULT_COMPILED_RULES: Lazy<Arc<CompiledRuleSet>> = Lazy::new(|| {
    match RuleSet::load_default_rules() {
        Ok(rules) => Arc::new(compile_rule_set(&rules, &LogSink)),
        Err(e) => {
            error!("Embedded default rules could not be loaded: {:#}", e);
            Arc::new(CompiledRuleSet::empty())
        }
    }
});

/// The embedded default rule set, compiled on first use and shared afterwards.
pub fn default_compiled_rules() -> Arc<CompiledRuleSet> {
    Arc::clone(&DEFAULT_COMPILED_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    fn rule(url_pattern: &str, rules: &[&str]) -> ProviderRule {
        ProviderRule {
            url_pattern: url_pattern.to_string(),
            rules: rules.iter().map(|s| s.to_string()).collect(),
            ..ProviderRule::default()
        }
    }

    #[test]
    fn invalid_entries_are_dropped_and_reported() {
        let sink = CollectingSink::new();
        let compiled = compile_provider("p", &rule("example", &["utm_[a-z]+", "(", "ref"]), &sink);

        assert_eq!(compiled.rules.len(), 2);
        assert!(compiled.removes_param("utm_source"));
        assert!(compiled.removes_param("REF"));
        assert_eq!(sink.len(), 1);
        match &sink.diagnostics()[0] {
            Diagnostic::RuleCompilationWarning { provider, field, pattern, .. } => {
                assert_eq!(provider, "p");
                assert_eq!(*field, RuleField::Rules);
                assert_eq!(pattern, "(");
            }
        }
    }

    #[test]
    fn invalid_url_pattern_never_matches() {
        let sink = CollectingSink::new();
        let compiled = compile_provider("broken", &rule("[unclosed", &["x"]), &sink);
        assert!(compiled.url_pattern.is_none());
        assert!(!compiled.matches_url("https://[unclosed"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn parameter_patterns_match_whole_names_only() {
        let compiled = compile_provider("p", &rule(".*", &["ref"]), &LogSink);
        assert!(compiled.removes_param("ref"));
        assert!(!compiled.removes_param("preference"));
        assert!(!compiled.removes_param("ref_id"));
    }

    #[test]
    fn overlong_patterns_are_rejected() {
        let sink = CollectingSink::new();
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let compiled = compile_provider("p", &rule(".*", &[long.as_str()]), &sink);
        assert!(compiled.rules.is_empty());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn rule_set_keeps_order_and_index() {
        let rules: RuleSet = vec![
            (GLOBAL_PROVIDER_KEY.to_string(), rule(".*", &["utm_source"])),
            ("first".to_string(), rule("example\\.com", &["a"])),
            ("second".to_string(), rule("example", &["b"])),
        ]
        .into_iter()
        .collect();

        let compiled = compile_rule_set(&rules, &LogSink);
        assert_eq!(compiled.providers().len(), 2);
        assert!(compiled.global().is_some());
        assert_eq!(compiled.select_provider("https://EXAMPLE.com/x").map(|p| p.name.as_str()), Some("first"));
        assert_eq!(compiled.get("second").map(|p| p.name.as_str()), Some("second"));
        assert_eq!(compiled.len(), 3);
    }

    #[test]
    fn default_rules_compile_cleanly() {
        let sink = CollectingSink::new();
        let rules = RuleSet::load_default_rules().unwrap();
        let compiled = compile_rule_set(&rules, &sink);
        assert!(sink.is_empty(), "unexpected diagnostics: {:?}", sink.diagnostics());
        assert!(compiled.global().is_some());
        assert!(Arc::ptr_eq(&default_compiled_rules(), &default_compiled_rules()));
    }
}
