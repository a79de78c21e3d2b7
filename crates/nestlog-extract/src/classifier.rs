//! Keyword classifier.
//!
//! Scores every category by the summed weight of its matched rules and picks
//! the best. Ties are broken in two steps: a candidate whose keywords are a
//! strict subset of another tied candidate's keywords drops out, then the
//! fixed priority order decides (health, measurement, feeding, diaper,
//! sleep, milestone).

use std::collections::BTreeSet;

use nestlog_core::{Category, CategoryMatch};
use tracing::trace;

use crate::rules::{CategoryRules, RuleSet, word_tokens};

/// Classifier over a shared rule set.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'r> {
    rules: &'r RuleSet,
}

/// Matches of one category before tie-breaking.
#[derive(Debug)]
struct Candidate {
    category: Category,
    score: u32,
    subtype: Option<&'static str>,
    /// `(first token index, phrase)` for every rule that matched.
    hits: Vec<(usize, &'static str)>,
}

impl Candidate {
    fn keywords(&self) -> BTreeSet<&'static str> {
        self.hits.iter().map(|(_, k)| *k).collect()
    }
}

impl Default for Classifier<'static> {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}

impl<'r> Classifier<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    /// Best category for `text`, or [`CategoryMatch::uncategorized`] when no
    /// rule matches.
    pub fn classify(&self, text: &str) -> CategoryMatch {
        let tokens = word_tokens(text);
        if tokens.is_empty() {
            return CategoryMatch::uncategorized();
        }

        let candidates: Vec<Candidate> = self
            .rules
            .categories()
            .iter()
            .filter_map(|table| self.score(table, &tokens))
            .collect();

        let Some(best) = pick(candidates) else {
            return CategoryMatch::uncategorized();
        };
        trace!(category = %best.category, score = best.score, "classified");

        let mut hits = best.hits;
        hits.sort_by_key(|(pos, _)| *pos);
        CategoryMatch {
            category: best.category,
            subtype: best.subtype.map(str::to_string),
            score: best.score,
            matched_keywords: hits.into_iter().map(|(_, k)| k.to_string()).collect(),
        }
    }

    /// Score one category. `None` when its total weight is zero.
    fn score(&self, table: &CategoryRules, tokens: &[String]) -> Option<Candidate> {
        let mut score = 0;
        let mut hits = Vec::new();
        // (weight, position, subtype) of the strongest subtype-bearing hit
        let mut strongest: Option<(u32, usize, &'static str)> = None;

        for compiled in &table.rules {
            let first = (0..tokens.len())
                .find(|&at| compiled.matches_at(tokens, at) && !self.negated(tokens, at));
            let Some(at) = first else { continue };

            score += compiled.rule.weight;
            hits.push((at, compiled.rule.phrase));
            if let Some(subtype) = compiled.rule.subtype {
                let better = strongest.is_none_or(|(w, pos, _)| {
                    compiled.rule.weight > w || (compiled.rule.weight == w && at < pos)
                });
                if better {
                    strongest = Some((compiled.rule.weight, at, subtype));
                }
            }
        }

        (score > 0).then(|| Candidate {
            category: table.category,
            score,
            subtype: strongest.map(|(_, _, s)| s),
            hits,
        })
    }

    /// A match is negated when the token right before it is a negator.
    fn negated(&self, tokens: &[String], at: usize) -> bool {
        at > 0 && self.rules.is_negator(&tokens[at - 1])
    }
}

/// Highest score, then subset elimination, then priority.
fn pick(candidates: Vec<Candidate>) -> Option<Candidate> {
    let top = candidates.iter().map(|c| c.score).max()?;
    let tied: Vec<Candidate> = candidates.into_iter().filter(|c| c.score == top).collect();

    let keyword_sets: Vec<BTreeSet<&'static str>> = tied.iter().map(Candidate::keywords).collect();
    let dominated = |i: usize| {
        keyword_sets.iter().enumerate().any(|(j, other)| {
            i != j && keyword_sets[i].len() < other.len() && keyword_sets[i].is_subset(other)
        })
    };

    tied.into_iter()
        .enumerate()
        .filter(|(i, _)| !dominated(*i))
        .map(|(_, c)| c)
        .min_by_key(|c| c.category.priority())
}

/// Classify with the standard rule set.
pub fn classify(text: &str) -> CategoryMatch {
    Classifier::default().classify(text)
}
