//! Keyword rule tables for the category classifier.
//!
//! Rules are data: each category owns an ordered list of `(phrase, weight)`
//! entries, optionally tagged with the subtype the phrase implies. The
//! standard table is built once per process and shared by reference.
//!
//! # Matching
//!
//! Text is split into lowercase word tokens. A phrase of one or more words
//! matches a run of tokens when every word is equal, except that the last
//! word also accepts a simple plural (`+s`, `+es`, `y` → `ies`). Stem rules
//! instead accept any token that starts with the phrase (`vaccin` matches
//! `vaccine`, `vaccinated`).
//!
//! Weight-zero rules are hints: they never make a category match on their
//! own, but can supply the subtype when the category matches through other
//! rules (`mummy` → breast).

use std::sync::LazyLock;

use nestlog_core::Category;

/// One classifier rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub phrase: &'static str,
    pub weight: u32,
    pub subtype: Option<&'static str>,
    pub stem: bool,
}

impl Rule {
    /// Whole-word rule, tolerant of simple plurals.
    pub const fn word(phrase: &'static str, weight: u32) -> Self {
        Self {
            phrase,
            weight,
            subtype: None,
            stem: false,
        }
    }

    /// Prefix rule: matches any token starting with `phrase`.
    pub const fn stem(phrase: &'static str, weight: u32) -> Self {
        Self {
            phrase,
            weight,
            subtype: None,
            stem: true,
        }
    }

    pub const fn subtype(self, subtype: &'static str) -> Self {
        Self {
            subtype: Some(subtype),
            ..self
        }
    }
}

/// The rule list owned by one category.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub category: Category,
    pub rules: Vec<CompiledRule>,
}

/// A rule with its phrase pre-split into words.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    pub words: Vec<&'static str>,
}

impl CompiledRule {
    fn new(rule: Rule) -> Self {
        Self {
            words: rule.phrase.split_whitespace().collect(),
            rule,
        }
    }

    /// Whether the rule matches the tokens starting at `at`.
    pub fn matches_at(&self, tokens: &[String], at: usize) -> bool {
        let n = self.words.len();
        if n == 0 || at + n > tokens.len() {
            return false;
        }
        let (head, last) = self.words.split_at(n - 1);
        let head_ok = head
            .iter()
            .zip(&tokens[at..at + n - 1])
            .all(|(w, t)| *w == t.as_str());
        head_ok && word_matches(last[0], &tokens[at + n - 1], self.rule.stem)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn word_matches(word: &str, token: &str, stem: bool) -> bool {
    if stem {
        return token.starts_with(word);
    }
    if token == word {
        return true;
    }
    if let Some(rest) = token.strip_prefix(word)
        && (rest == "s" || rest == "es")
    {
        return true;
    }
    match word.strip_suffix('y') {
        Some(base) => token.strip_prefix(base) == Some("ies"),
        None => false,
    }
}

/// All category rules plus the negation denylist.
#[derive(Debug, Clone)]
pub struct RuleSet {
    categories: Vec<CategoryRules>,
    negators: Vec<&'static str>,
}

/// Summary counts for a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    pub categories: usize,
    pub rules: usize,
    pub negators: usize,
}

static STANDARD: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        vec![
            (Category::Feeding, FEEDING),
            (Category::Diaper, DIAPER),
            (Category::Sleep, SLEEP),
            (Category::Health, HEALTH),
            (Category::Measurement, MEASUREMENT),
            (Category::Milestone, MILESTONE),
        ],
        NEGATORS,
    )
});

impl RuleSet {
    /// Build a rule set. `Uncategorized` entries are ignored.
    pub fn new(tables: Vec<(Category, &[Rule])>, negators: &[&'static str]) -> Self {
        let categories = tables
            .into_iter()
            .filter(|(c, _)| *c != Category::Uncategorized)
            .map(|(category, rules)| CategoryRules {
                category,
                rules: rules.iter().copied().map(CompiledRule::new).collect(),
            })
            .collect();
        Self {
            categories,
            negators: negators.to_vec(),
        }
    }

    /// The built-in English rule set, initialised on first use.
    pub fn standard() -> &'static RuleSet {
        &STANDARD
    }

    pub fn categories(&self) -> &[CategoryRules] {
        &self.categories
    }

    pub fn is_negator(&self, token: &str) -> bool {
        self.negators.contains(&token)
    }

    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            categories: self.categories.len(),
            rules: self.categories.iter().map(|c| c.rules.len()).sum(),
            negators: self.negators.len(),
        }
    }
}

/// Split text into lowercase word tokens. Apostrophes stay inside words so
/// `didn't` is one token; typographic apostrophes are folded to `'`.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Standard tables ──

const NEGATORS: &[&str] = &[
    "no", "not", "never", "without", "didn't", "didnt", "doesn't", "doesnt", "hasn't", "hasnt",
    "hadn't", "wasn't", "wasnt", "isn't", "won't", "wont", "can't", "cant", "cannot",
    "couldn't", "wouldn't",
];

const FEEDING: &[Rule] = &[
    Rule::word("fed", 2),
    Rule::word("feed", 2),
    Rule::word("feeding", 2),
    Rule::word("drank", 2),
    Rule::word("milk", 1),
    Rule::word("bottle", 3).subtype("bottle"),
    Rule::word("formula", 3).subtype("bottle"),
    Rule::word("ebm", 3).subtype("bottle"),
    Rule::word("top feed", 3).subtype("bottle"),
    Rule::word("topfeed", 3).subtype("bottle"),
    Rule::word("powder", 2).subtype("bottle"),
    Rule::word("breastfed", 4).subtype("breast"),
    Rule::word("breastfeed", 4).subtype("breast"),
    Rule::word("breastfeeding", 4).subtype("breast"),
    Rule::word("breast", 3).subtype("breast"),
    Rule::word("nursed", 3).subtype("breast"),
    Rule::word("nursing", 3).subtype("breast"),
    Rule::word("nurse", 2).subtype("breast"),
    Rule::word("bf", 2).subtype("breast"),
    Rule::word("latched", 2).subtype("breast"),
    Rule::word("left side", 2).subtype("breast"),
    Rule::word("right side", 2).subtype("breast"),
    Rule::word("mummy", 0).subtype("breast"),
    Rule::word("direct", 0).subtype("breast"),
    Rule::word("pumped", 3).subtype("pumped"),
    Rule::word("pumping", 3).subtype("pumped"),
    Rule::word("expressed", 3).subtype("pumped"),
    Rule::word("expressing", 3).subtype("pumped"),
    Rule::word("extracted", 3).subtype("pumped"),
    Rule::word("solid", 3).subtype("solid"),
    Rule::word("puree", 3).subtype("solid"),
    Rule::word("cereal", 3).subtype("solid"),
    Rule::word("mashed", 2).subtype("solid"),
    Rule::word("ate", 2).subtype("solid"),
    Rule::word("breakfast", 2).subtype("solid"),
    Rule::word("lunch", 2).subtype("solid"),
    Rule::word("dinner", 2).subtype("solid"),
    Rule::word("snack", 2).subtype("solid"),
];

const DIAPER: &[Rule] = &[
    Rule::word("diaper", 3),
    Rule::word("nappy", 3),
    Rule::word("wet", 2).subtype("wet"),
    Rule::word("pee", 2).subtype("wet"),
    Rule::word("peed", 2).subtype("wet"),
    Rule::word("wee", 2).subtype("wet"),
    Rule::word("urine", 2).subtype("wet"),
    Rule::word("poop", 3).subtype("dirty"),
    Rule::word("pooped", 3).subtype("dirty"),
    Rule::word("poopy", 3).subtype("dirty"),
    Rule::word("poo", 3).subtype("dirty"),
    Rule::word("dirty", 2).subtype("dirty"),
    Rule::word("soiled", 2).subtype("dirty"),
    Rule::word("bm", 2).subtype("dirty"),
    Rule::word("bowel movement", 3).subtype("dirty"),
    Rule::word("blowout", 3).subtype("dirty"),
    Rule::word("changed", 1).subtype("change"),
    Rule::word("change", 1).subtype("change"),
];

const SLEEP: &[Rule] = &[
    Rule::word("sleep", 3),
    Rule::word("slept", 3),
    Rule::word("sleeping", 3),
    Rule::word("asleep", 3),
    Rule::word("nap", 3).subtype("nap"),
    Rule::word("napped", 3).subtype("nap"),
    Rule::word("napping", 3).subtype("nap"),
    Rule::word("snooze", 2).subtype("nap"),
    Rule::word("dozed", 2).subtype("nap"),
    Rule::word("bedtime", 3).subtype("night"),
    Rule::word("went to bed", 3).subtype("night"),
    Rule::word("night sleep", 4).subtype("night"),
    Rule::word("slept through", 4).subtype("night"),
    Rule::word("down for the night", 4).subtype("night"),
    Rule::word("woke", 2).subtype("wake"),
    Rule::word("woke up", 3).subtype("wake"),
    Rule::word("awake", 2).subtype("wake"),
];

const HEALTH: &[Rule] = &[
    Rule::word("temperature", 4).subtype("temperature"),
    Rule::word("temp", 3).subtype("temperature"),
    Rule::word("fever", 4).subtype("temperature"),
    Rule::word("feverish", 3).subtype("temperature"),
    Rule::word("thermometer", 3).subtype("temperature"),
    Rule::stem("cough", 3).subtype("symptom"),
    Rule::word("rash", 3).subtype("symptom"),
    Rule::stem("vomit", 3).subtype("symptom"),
    Rule::word("threw up", 3).subtype("symptom"),
    Rule::word("spit up", 2).subtype("symptom"),
    Rule::word("sick", 2).subtype("symptom"),
    Rule::stem("congest", 2).subtype("symptom"),
    Rule::word("runny nose", 3).subtype("symptom"),
    Rule::word("diarrhea", 3).subtype("symptom"),
    Rule::word("constipated", 3).subtype("symptom"),
    Rule::word("colic", 3).subtype("symptom"),
    Rule::word("teething", 2).subtype("symptom"),
    Rule::word("fussy", 1).subtype("symptom"),
    Rule::word("medicine", 3).subtype("medication"),
    Rule::word("medication", 3).subtype("medication"),
    Rule::word("tylenol", 3).subtype("medication"),
    Rule::word("paracetamol", 3).subtype("medication"),
    Rule::word("ibuprofen", 3).subtype("medication"),
    Rule::word("calpol", 3).subtype("medication"),
    Rule::word("antibiotic", 3).subtype("medication"),
    Rule::word("vitamin", 3).subtype("medication"),
    Rule::word("dose", 2).subtype("medication"),
    Rule::word("drop", 1).subtype("medication"),
    Rule::stem("vaccin", 4).subtype("vaccination"),
    Rule::stem("immuni", 4).subtype("vaccination"),
    Rule::word("booster", 3).subtype("vaccination"),
    Rule::word("shot", 2).subtype("vaccination"),
    Rule::word("doctor", 3).subtype("doctor_visit"),
    Rule::word("pediatrician", 3).subtype("doctor_visit"),
    Rule::word("paediatrician", 3).subtype("doctor_visit"),
    Rule::word("checkup", 3).subtype("doctor_visit"),
    Rule::word("check up", 3).subtype("doctor_visit"),
    Rule::word("clinic", 2).subtype("doctor_visit"),
    Rule::word("gp", 2).subtype("doctor_visit"),
];

const MEASUREMENT: &[Rule] = &[
    Rule::word("weight", 4).subtype("weight"),
    Rule::word("weigh", 4).subtype("weight"),
    Rule::word("weighed", 4).subtype("weight"),
    Rule::word("weighing", 4).subtype("weight"),
    Rule::word("height", 4).subtype("length"),
    Rule::word("length", 4).subtype("length"),
    Rule::word("tall", 2).subtype("length"),
    Rule::word("head circumference", 5).subtype("head_circumference"),
    Rule::word("measured", 2),
    Rule::word("growth", 2),
    Rule::word("percentile", 2),
];

const MILESTONE: &[Rule] = &[
    Rule::word("rolled over", 4).subtype("motor"),
    Rule::word("rolled", 3).subtype("motor"),
    Rule::stem("crawl", 3).subtype("motor"),
    Rule::word("sat up", 3).subtype("motor"),
    Rule::word("sitting up", 3).subtype("motor"),
    Rule::word("stood", 3).subtype("motor"),
    Rule::word("first step", 4).subtype("motor"),
    Rule::word("walked", 3).subtype("motor"),
    Rule::word("smiled", 3).subtype("social"),
    Rule::word("laughed", 3).subtype("social"),
    Rule::stem("giggl", 2).subtype("social"),
    Rule::word("first word", 4).subtype("verbal"),
    Rule::stem("babbl", 2).subtype("verbal"),
    Rule::word("said", 2).subtype("verbal"),
    Rule::word("tooth", 3).subtype("tooth"),
    Rule::word("teeth", 2).subtype("tooth"),
    Rule::word("milestone", 3),
    Rule::word("first time", 2),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(rule: Rule) -> CompiledRule {
        CompiledRule::new(rule)
    }

    fn tokens(text: &str) -> Vec<String> {
        word_tokens(text)
    }

    #[test]
    fn tokens_keep_contractions() {
        assert_eq!(
            tokens("Baby didn\u{2019}t sleep, at ALL!"),
            vec!["baby", "didn't", "sleep", "at", "all"]
        );
        assert_eq!(tokens("150ml formula"), vec!["150ml", "formula"]);
        assert!(tokens("").is_empty());
        assert!(tokens("  ... ").is_empty());
    }

    #[test]
    fn single_word_accepts_simple_plurals() {
        let r = compiled(Rule::word("diaper", 3));
        assert!(r.matches_at(&tokens("diaper"), 0));
        assert!(r.matches_at(&tokens("diapers"), 0));
        assert!(!r.matches_at(&tokens("diaperbag"), 0));

        let r = compiled(Rule::word("rash", 3));
        assert!(r.matches_at(&tokens("rashes"), 0));

        let r = compiled(Rule::word("nappy", 3));
        assert!(r.matches_at(&tokens("nappies"), 0));
    }

    #[test]
    fn whole_word_does_not_match_inside_other_words() {
        let r = compiled(Rule::word("ate", 2));
        assert!(!r.matches_at(&tokens("temperature"), 0));
        assert!(!r.matches_at(&tokens("later"), 0));
    }

    #[test]
    fn stem_matches_prefix() {
        let r = compiled(Rule::stem("vaccin", 4));
        assert!(r.matches_at(&tokens("vaccinated"), 0));
        assert!(r.matches_at(&tokens("vaccines"), 0));
        assert!(!r.matches_at(&tokens("vac"), 0));
    }

    #[test]
    fn multi_word_phrase_needs_consecutive_tokens() {
        let r = compiled(Rule::word("first step", 4));
        let t = tokens("took her first steps today");
        assert!(r.matches_at(&t, 2));
        assert!(!r.matches_at(&t, 1));
        assert!(!r.matches_at(&tokens("first big step"), 0));
        assert!(!r.matches_at(&tokens("first"), 0));
    }

    #[test]
    fn standard_set_covers_every_category() {
        let set = RuleSet::standard();
        let summary = set.summary();
        assert_eq!(summary.categories, 6);
        assert!(summary.rules > 100);
        for c in Category::BY_PRIORITY {
            assert!(
                set.categories().iter().any(|r| r.category == c),
                "missing rules for {c}"
            );
        }
        assert!(set.is_negator("didn't"));
        assert!(!set.is_negator("baby"));
    }

    #[test]
    fn uncategorized_tables_are_dropped() {
        const R: &[Rule] = &[Rule::word("x", 1)];
        let set = RuleSet::new(vec![(Category::Uncategorized, R), (Category::Sleep, R)], &[]);
        assert_eq!(set.summary().categories, 1);
    }
}
