//! Vocabulary scan: the analysis every catalog agent performs.
//!
//! Matching is a case-insensitive substring test per line. Terms written with
//! underscores (`felt_sense`) also match their spaced form (`felt sense`).
//! The scan is stateless: patterns are derived from this call's findings only.

use super::profile::AgentProfile;
use super::result::{Finding, Pattern, PatternStrength};

/// Minimum occurrences before a `category:term` key is reported as a pattern.
pub const PATTERN_THRESHOLD: usize = 3;
/// Occurrences at which a pattern is considered strong.
pub const STRONG_PATTERN_THRESHOLD: usize = 5;

const EXACT_MATCH_CONFIDENCE: f64 = 1.0;
const SHORT_LINE_CONFIDENCE: f64 = 0.8;
const BASE_CONFIDENCE: f64 = 0.7;
const SHORT_LINE_WORDS: usize = 10;
const BOOST_PER_KEY: f64 = 0.02;
const MAX_BOOST: f64 = 0.2;

/// Findings, patterns and aggregate confidence of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub patterns: Vec<Pattern>,
    pub confidence: f64,
}

/// Scan `text` against the profile's vocabulary.
///
/// Findings are ordered by category, then line, then term.
pub fn scan_vocabulary(profile: &AgentProfile, text: &str) -> ScanOutcome {
    let lines: Vec<(String, &str)> = text
        .split('\n')
        .map(|line| (line.to_lowercase(), line.trim()))
        .collect();

    let mut findings = Vec::new();
    for category in &profile.vocabulary {
        for (index, (lowered, trimmed)) in lines.iter().enumerate() {
            for term in &category.terms {
                let needles = term_forms(term);
                if needles.iter().any(|n| lowered.contains(n.as_str())) {
                    findings.push(Finding {
                        line_number: index + 1,
                        category: category.name.clone(),
                        term: term.clone(),
                        context: trimmed.to_string(),
                        confidence: assess_confidence(&needles, trimmed),
                    });
                }
            }
        }
    }

    let counts = count_keys(&findings);
    let patterns = counts
        .iter()
        .filter(|(_, count)| *count >= PATTERN_THRESHOLD)
        .map(|(key, count)| Pattern {
            pattern: key.clone(),
            frequency: *count,
            strength: if *count >= STRONG_PATTERN_THRESHOLD {
                PatternStrength::Strong
            } else {
                PatternStrength::Moderate
            },
        })
        .collect();

    let confidence = aggregate_confidence(&findings, counts.len());

    ScanOutcome {
        findings,
        patterns,
        confidence,
    }
}

/// Lowercased forms a term may appear in.
fn term_forms(term: &str) -> Vec<String> {
    let lowered = term.to_lowercase();
    if lowered.contains('_') {
        let spaced = lowered.replace('_', " ");
        vec![lowered, spaced]
    } else {
        vec![lowered]
    }
}

fn assess_confidence(needles: &[String], trimmed_line: &str) -> f64 {
    let line = trimmed_line.to_lowercase();
    if needles.iter().any(|n| *n == line) {
        EXACT_MATCH_CONFIDENCE
    } else if trimmed_line.split_whitespace().count() < SHORT_LINE_WORDS {
        SHORT_LINE_CONFIDENCE
    } else {
        BASE_CONFIDENCE
    }
}

/// `category:term` occurrence counts in first-seen order.
fn count_keys(findings: &[Finding]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for finding in findings {
        let key = format!("{}:{}", finding.category, finding.term);
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

fn aggregate_confidence(findings: &[Finding], distinct_keys: usize) -> f64 {
    if findings.is_empty() {
        return 0.0;
    }
    let mean = findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64;
    let boost = (distinct_keys as f64 * BOOST_PER_KEY).min(MAX_BOOST);
    (mean + boost).min(1.0)
}
