// mailscrub-core/tests/link_cleaner_tests.rs
use anyhow::Result;
use std::sync::Arc;
use std::thread;
use test_log::test;

use mailscrub_core::config::{ProviderRule, RuleSet, GLOBAL_PROVIDER_KEY};
use mailscrub_core::{CollectingSink, ExceptionPolicy, LinkCleaner, ScrubError};

fn rule(url_pattern: &str, rules: &[&str]) -> ProviderRule {
    ProviderRule {
        url_pattern: url_pattern.to_string(),
        rules: rules.iter().map(|s| s.to_string()).collect(),
        ..ProviderRule::default()
    }
}

/// A global `gclid` rule plus a `p.com` redirector that unwraps `url`.
fn redirect_rules() -> RuleSet {
    let mut redirector = rule(r"^https?://p\.com/", &["src"]);
    redirector.redirections = vec!["url".to_string()];
    vec![
        (GLOBAL_PROVIDER_KEY.to_string(), rule(".*", &["gclid", "utm_[a-z]+"])),
        ("redirector".to_string(), redirector),
    ]
    .into_iter()
    .collect()
}

#[test]
fn redirect_target_is_cleaned_and_outer_params_dropped() {
    let cleaner = LinkCleaner::new(&redirect_rules());
    let inner = "https%3A%2F%2Fq.com%2Ftarget%3Fgclid%3D1";
    let out = cleaner.clean(&format!("https://p.com/url?url={}&gclid=2", inner)).unwrap();
    assert_eq!(out, "https://q.com/target");
}

#[test]
fn undecodable_redirect_falls_back_to_outer_url() {
    let cleaner = LinkCleaner::new(&redirect_rules());
    let out = cleaner.clean("https://p.com/url?url=not%20a%20url&src=mail&keep=1").unwrap();
    assert_eq!(out, "https://p.com/url?url=not%20a%20url&keep=1");
}

#[test]
fn deeply_nested_redirects_terminate() {
    let cleaner = LinkCleaner::new(&redirect_rules());
    let mut url = "https://q.com/end?gclid=1".to_string();
    for _ in 0..1000 {
        url = format!("https://p.com/url?url={}", url);
    }

    let first = cleaner.clean(&url).unwrap();
    let second = cleaner.clean(&url).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("https://p.com/url?url="));
}

#[test]
fn redirect_hop_without_target_ends_the_chain() {
    let cleaner = LinkCleaner::new(&redirect_rules());
    let out = cleaner.clean("https://p.com/url?url=https%3A%2F%2Fp.com%2Furl&src=x").unwrap();
    assert_eq!(out, "https://p.com/url");
}

#[test]
fn empty_redirect_values_are_skipped() {
    let mut redirector = rule(r"^https?://p\.com/", &[]);
    redirector.redirections = vec!["url".to_string(), "q".to_string()];
    let rules: RuleSet = vec![("redirector".to_string(), redirector)].into_iter().collect();
    let cleaner = LinkCleaner::new(&rules);

    let empty = cleaner.clean("https://p.com/r?url=&q=https%3A%2F%2Fq.com%2F").unwrap();
    assert_eq!(empty, "https://q.com/");

    let bare = cleaner.clean("https://p.com/r?url&q=https%3A%2F%2Fq.com%2F").unwrap();
    assert_eq!(bare, "https://q.com/");
}

#[test]
fn unmatched_urls_pass_through() {
    let cleaner = LinkCleaner::new(&redirect_rules());
    let url = "https://plain.test/a/b?x=1&y=two#frag";
    assert_eq!(cleaner.clean(url).unwrap(), url);
}

#[test]
fn cleaning_is_idempotent_with_bundled_rules() {
    let cleaner = LinkCleaner::with_default_rules();
    let urls = [
        "https://www.google.com/url?q=https%3A%2F%2Fexample.org%2F%3Futm_source%3Dg&sa=D&ved=abc",
        "https://www.amazon.com/dp/B000?tag=aff-20&keywords=lamp&qid=123&th=1",
        "https://www.facebook.com/l.php?u=https%3A%2F%2Fnews.test%2Fstory%3Ffbclid%3Dx&h=AT0",
        "https://news.test/a?utm_source=mail&utm_medium=email&id=5",
        "https://twitter.com/someone/status/1?s=20&t=abc",
        "https://example.org/?q=a+b%20c&mc_eid=9",
        "mailto:someone@example.org?subject=hi",
    ];
    for url in urls {
        let once = cleaner.clean(url).unwrap();
        let twice = cleaner.clean(&once).unwrap();
        assert_eq!(once, twice, "not idempotent for {}", url);
    }
}

#[test]
fn bundled_rules_clean_common_providers() {
    let cleaner = LinkCleaner::with_default_rules();
    assert_eq!(
        cleaner.clean("https://www.google.com/url?q=https%3A%2F%2Fexample.org%2Fpage%3Futm_source%3Dg&sa=D").unwrap(),
        "https://example.org/page"
    );
    assert_eq!(
        cleaner.clean("https://www.amazon.com/dp/B000?tag=aff-20&keywords=lamp").unwrap(),
        "https://www.amazon.com/dp/B000?keywords=lamp"
    );
}

#[test]
fn whole_url_policy_leaves_excepted_urls_alone() {
    let mut shop = rule(r"shop\.test", &["ref"]);
    shop.exceptions = vec![r"shop\.test/checkout".to_string()];
    let rules: RuleSet = vec![("shop".to_string(), shop)].into_iter().collect();

    let parameter = LinkCleaner::new(&rules);
    let whole = LinkCleaner::new(&rules).with_exception_policy(ExceptionPolicy::WholeUrl);

    let url = "https://shop.test/checkout?ref=mail";
    assert_eq!(parameter.clean(url).unwrap(), "https://shop.test/checkout");
    assert_eq!(whole.clean(url).unwrap(), url);
}

#[test]
fn broken_patterns_are_reported_and_ignored() {
    let mut broken = rule(r"broken\.test", &["(unclosed", "ref"]);
    broken.exceptions = vec!["[".to_string()];
    let rules: RuleSet = vec![("broken".to_string(), broken)].into_iter().collect();

    let sink = CollectingSink::new();
    let cleaner = LinkCleaner::with_sink(&rules, &sink);

    assert_eq!(sink.len(), 2);
    assert_eq!(cleaner.clean("https://broken.test/?ref=1&x=2").unwrap(), "https://broken.test/?x=2");
}

#[test]
fn invalid_input_is_an_error() {
    let cleaner = LinkCleaner::with_default_rules();
    match cleaner.clean("::nope::") {
        Err(ScrubError::InvalidUrl { url, .. }) => assert_eq!(url, "::nope::"),
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
}

#[test]
fn a_cleaner_is_shared_across_threads() -> Result<()> {
    let cleaner = Arc::new(LinkCleaner::with_default_rules());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cleaner = Arc::clone(&cleaner);
            thread::spawn(move || cleaner.clean(&format!("https://site{}.test/?utm_source=x&n={}", i, i)))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().expect("worker panicked")?;
        assert_eq!(out, format!("https://site{}.test/?n={}", i, i));
    }
    Ok(())
}
