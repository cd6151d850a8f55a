//! Ordered literal rewrite rules.
//!
//! A [`RuleTable`] is applied to a file's full text one rule at a time, in
//! table order, and every rule sees the output of the rules before it.
//! Matching is exact substring matching with global replacement; there
//! are no regex semantics.
//!
//! ## Ordering
//!
//! Order is part of the table's meaning. Given
//! `damose.data.model.` → `damose.model.` followed by
//! `damose.data.model.Stop` → `X`, the second rule can never fire: the
//! first one has already consumed its target. Tables should list the more
//! specific pattern first. [`RuleTable::shadowed`] finds pairs where a
//! later rule contains the pattern of an earlier one.
//!
//! Identity rules (`X` → `X`) and rules with an empty pattern are legal
//! and skipped at apply time.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single literal substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewriteRule {
    /// Exact text to look for.
    #[serde(rename = "from")]
    pub match_text: String,
    /// Text written in place of every occurrence.
    #[serde(rename = "to")]
    pub replacement_text: String,
}

impl RewriteRule {
    /// Create a rule replacing `match_text` with `replacement_text`.
    pub fn new(match_text: impl Into<String>, replacement_text: impl Into<String>) -> Self {
        RewriteRule {
            match_text: match_text.into(),
            replacement_text: replacement_text.into(),
        }
    }

    /// `package <old>;` → `package <new>;`
    pub fn package_declaration(old_package: &str, new_package: &str) -> Self {
        RewriteRule::new(
            format!("package {};", old_package),
            format!("package {};", new_package),
        )
    }

    /// True if the rule replaces text with itself.
    pub fn is_identity(&self) -> bool {
        self.match_text == self.replacement_text
    }

    /// True if applying the rule can never change any text.
    ///
    /// Empty patterns count as inert: a literal replace of `""` would splice
    /// the replacement between every character.
    pub fn is_inert(&self) -> bool {
        self.match_text.is_empty() || self.is_identity()
    }
}

/// Record of a rule that changed the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    /// Position of the rule in the table that was applied.
    pub index: usize,
    /// The rule's pattern.
    pub pattern: String,
    /// Number of non-overlapping occurrences replaced.
    pub occurrences: usize,
}

/// A later rule whose pattern contains the pattern of an earlier rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shadowing {
    /// Index of the more general rule that runs first.
    pub earlier: usize,
    /// Index of the more specific rule that runs after it.
    pub later: usize,
}

/// An ordered sequence of [`RewriteRule`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
}

impl RuleTable {
    /// Create a table from rules in application order.
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        RuleTable { rules }
    }

    /// Build a table from `(from, to)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .map(|(from, to)| RewriteRule::new(*from, *to))
            .collect()
    }

    /// Append a rule at the end of the table.
    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RewriteRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order and return the rewritten text.
    pub fn apply(&self, content: &str) -> String {
        self.apply_traced(content).0
    }

    /// Apply every rule in order, also reporting which rules fired.
    pub fn apply_traced(&self, content: &str) -> (String, Vec<RuleHit>) {
        let mut text = content.to_string();
        let mut hits = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.is_inert() {
                continue;
            }
            let occurrences = text.matches(rule.match_text.as_str()).count();
            if occurrences == 0 {
                continue;
            }
            text = text.replace(&rule.match_text, &rule.replacement_text);
            debug!(
                index,
                occurrences,
                from = %rule.match_text,
                to = %rule.replacement_text,
                "rule fired"
            );
            hits.push(RuleHit {
                index,
                pattern: rule.match_text.clone(),
                occurrences,
            });
        }

        (text, hits)
    }

    /// Find rules that are reached only after a more general rule has run.
    ///
    /// Inert rules are ignored on both sides.
    pub fn shadowed(&self) -> Vec<Shadowing> {
        let mut found = Vec::new();
        for (later, rule) in self.rules.iter().enumerate() {
            if rule.is_inert() {
                continue;
            }
            for (earlier, prior) in self.rules[..later].iter().enumerate() {
                if !prior.is_inert() && rule.match_text.contains(&prior.match_text) {
                    found.push(Shadowing { earlier, later });
                    break;
                }
            }
        }
        found
    }
}

impl FromIterator<RewriteRule> for RuleTable {
    fn from_iter<I: IntoIterator<Item = RewriteRule>>(iter: I) -> Self {
        RuleTable {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Extend<RewriteRule> for RuleTable {
    fn extend<I: IntoIterator<Item = RewriteRule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a RewriteRule;
    type IntoIter = std::slice::Iter<'a, RewriteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Apply `rules` to `content` in order.
pub fn apply(content: &str, rules: &[RewriteRule]) -> String {
    rules
        .iter()
        .filter(|rule| !rule.is_inert())
        .fold(content.to_string(), |text, rule| {
            text.replace(&rule.match_text, &rule.replacement_text)
        })
}

// ============================================================================
// Tests
// ============================================================================
