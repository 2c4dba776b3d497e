// tests/relevance_properties.rs
// Filter invariants over a small synthetic corpus.
// Deterministic LCG instead of a property-testing dev-dep.

mod common;

use std::collections::HashSet;

use arxiv_digest::relevance::{filter, RelevancePolicy, Verdict};
use arxiv_digest::Entry;
use chrono::{Duration, Utc};
use common::{entry, now};

struct Lcg(u64);
impl Lcg {
    fn next_usize(&mut self, n: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((self.0 >> 32) as usize) % n.max(1)
    }
}

const TITLES: &[&str] = &[
    "XENONnT results",
    "Direct detection of WIMPs",
    "Top quark mass",
    "Dark matter at the LHC",
    "Neutrino physics with reactors",
    "Calorimeter calibration",
];
const CATS: &[&str] = &["hep-ex", "hep-ph", "nucl-ex", "astro-ph.GA", "astro-ph.CO"];

fn corpus(seed: u64, n: usize) -> Vec<Entry> {
    let mut rng = Lcg(seed);
    (0..n)
        .map(|i| {
            let title = TITLES[rng.next_usize(TITLES.len())];
            let age = rng.next_usize(14) as i64;
            let cat = CATS[rng.next_usize(CATS.len())];
            entry(&format!("id-{i}"), title, "", age, &[cat])
        })
        .collect()
}

fn seen_every_third(entries: &[Entry]) -> HashSet<String> {
    entries.iter().step_by(3).map(|e| e.id.clone()).collect()
}

#[test]
fn no_selected_entry_breaks_a_rule() {
    let policy = RelevancePolicy::default();
    for seed in 1..20 {
        let entries = corpus(seed, 60);
        let seen = seen_every_third(&entries);
        let out = filter(&entries, &seen, &policy, now());

        for e in &out.relevant {
            assert!(!seen.contains(&e.id), "seen id selected: {}", e.id);
            let published = e.published_at().unwrap().with_timezone(&Utc);
            assert!(now().signed_duration_since(published) <= Duration::days(7));
            assert!(!e
                .categories
                .iter()
                .any(|c| policy.excluded_categories.contains(c)));
            let text = format!("{} {}", e.title, e.summary).to_lowercase();
            assert!(policy.keywords.iter().any(|k| text.contains(&k.to_lowercase())));
            assert!(!policy
                .excluded_keywords
                .iter()
                .any(|k| text.contains(&k.to_lowercase())));
        }
    }
}

#[test]
fn filter_is_idempotent_without_persisting() {
    let policy = RelevancePolicy::default();
    let entries = corpus(42, 80);
    let seen = seen_every_third(&entries);
    let a = filter(&entries, &seen, &policy, now());
    let b = filter(&entries, &seen, &policy, now());
    assert_eq!(a, b);
}

#[test]
fn relevant_keeps_fetch_order_and_matches_new_ids() {
    let entries = corpus(7, 80);
    let out = filter(&entries, &HashSet::new(), &RelevancePolicy::default(), now());
    let ids: Vec<String> = out.relevant.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, out.new_ids);

    let positions: Vec<usize> = ids
        .iter()
        .map(|id| entries.iter().position(|e| &e.id == id).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(out.decisions.len(), entries.len());
}

#[test]
fn fixed_cases_fresh_excluded_seen_old() {
    let policy = RelevancePolicy::default();
    let seen: HashSet<String> = ["dup".to_string()].into();
    let entries = vec![
        entry("fresh", "XENONnT results", "", 2, &[]),
        entry("galaxy", "Halo shapes", "dark matter profile", 1, &["astro-ph.GA"]),
        entry("dup", "XENONnT results", "", 0, &[]),
        entry("old", "XENONnT results", "dark matter", 10, &["hep-ex"]),
    ];
    let out = filter(&entries, &seen, &policy, now());

    assert_eq!(out.new_ids, vec!["fresh"]);
    assert!(out.decisions[0].verdict.is_match());
    assert_eq!(
        out.decisions[1].verdict,
        Verdict::ExcludedCategory {
            category: "astro-ph.GA".into()
        }
    );
    assert_eq!(out.decisions[2].verdict, Verdict::AlreadySeen);
    assert!(matches!(out.decisions[3].verdict, Verdict::TooOld { .. }));
}

#[test]
fn custom_window_and_lists_are_honoured() {
    let policy = RelevancePolicy {
        keywords: vec!["Axion".into()],
        excluded_keywords: vec![],
        categories: vec!["hep-ph".into()],
        excluded_categories: vec![],
        recency_window: Duration::days(1),
    };
    let entries = vec![
        entry("a", "AXION-like particles", "", 0, &["astro-ph.GA"]),
        entry("b", "axion dark matter", "", 2, &[]),
        entry("c", "XENONnT results", "", 0, &[]),
    ];
    let out = filter(&entries, &HashSet::new(), &policy, now());
    assert_eq!(out.new_ids, vec!["a"]);
}
