//! Context-free input grammar.
//!
//! Rules map `<nonterminal>` symbols to alternative expansions written as
//! plain strings, e.g. `"<digit><int>"`. Inside an expansion, a `<...>`
//! run is a nonterminal only if the grammar defines it; anything else is
//! terminal text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::GrammarError;

/// Symbol every derivation starts from.
pub const START_SYMBOL: &str = "<start>";

/// One token of a tokenized expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

/// A validated context-free grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct Grammar {
    rules: BTreeMap<String, Vec<String>>,
}

impl Grammar {
    pub fn new(rules: BTreeMap<String, Vec<String>>) -> Result<Self, GrammarError> {
        for (nonterminal, alternatives) in &rules {
            if !is_bracketed(nonterminal) {
                return Err(GrammarError::InvalidNonterminal(nonterminal.clone()));
            }
            if alternatives.is_empty() {
                return Err(GrammarError::EmptyRule(nonterminal.clone()));
            }
        }
        if !rules.contains_key(START_SYMBOL) {
            return Err(GrammarError::MissingStart(START_SYMBOL.to_string()));
        }
        Ok(Self { rules })
    }

    /// Build a grammar from `(nonterminal, alternatives)` pairs.
    pub fn from_rules<K, V>(
        rules: impl IntoIterator<Item = (K, Vec<V>)>,
    ) -> Result<Self, GrammarError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(k, alts)| (k.into(), alts.into_iter().map(Into::into).collect()))
            .collect();
        Self::new(rules)
    }

    pub const fn start(&self) -> &'static str {
        START_SYMBOL
    }

    pub fn alternatives(&self, nonterminal: &str) -> Option<&[String]> {
        self.rules.get(nonterminal).map(Vec::as_slice)
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.rules.contains_key(symbol)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Split an expansion into terminal runs and defined nonterminals.
    pub fn tokenize(&self, expansion: &str) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        let mut text = String::new();
        let mut rest = expansion;

        while let Some(ch) = rest.chars().next() {
            if ch == '<' {
                if let Some(end) = rest.find('>') {
                    let candidate = &rest[..=end];
                    if self.is_nonterminal(candidate) {
                        if !text.is_empty() {
                            symbols.push(Symbol::Terminal(std::mem::take(&mut text)));
                        }
                        symbols.push(Symbol::Nonterminal(candidate.to_string()));
                        rest = &rest[end + 1..];
                        continue;
                    }
                }
            }
            text.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        if !text.is_empty() {
            symbols.push(Symbol::Terminal(text));
        }
        symbols
    }

    /// Minimal derivation depth of every nonterminal.
    ///
    /// Nonterminals without a finite derivation are absent from the map.
    pub fn min_depths(&self) -> BTreeMap<String, usize> {
        let mut depths: BTreeMap<String, usize> = BTreeMap::new();
        loop {
            let mut changed = false;
            for (nonterminal, alternatives) in &self.rules {
                let best = alternatives
                    .iter()
                    .filter_map(|alt| self.expansion_depth(alt, &depths))
                    .min();
                if let Some(best) = best {
                    if depths.get(nonterminal).is_none_or(|&current| best < current) {
                        depths.insert(nonterminal.clone(), best);
                        changed = true;
                    }
                }
            }
            if !changed {
                return depths;
            }
        }
    }

    /// Depth of deriving `expansion` given known nonterminal depths, or
    /// `None` if some nonterminal in it has no known derivation yet.
    pub fn expansion_depth(
        &self,
        expansion: &str,
        depths: &BTreeMap<String, usize>,
    ) -> Option<usize> {
        let mut deepest = 0;
        for symbol in self.tokenize(expansion) {
            if let Symbol::Nonterminal(name) = symbol {
                deepest = deepest.max(*depths.get(&name)?);
            }
        }
        Some(deepest + 1)
    }
}

fn is_bracketed(symbol: &str) -> bool {
    symbol.len() > 2 && symbol.starts_with('<') && symbol.ends_with('>')
}

impl TryFrom<BTreeMap<String, Vec<String>>> for Grammar {
    type Error = GrammarError;

    fn try_from(rules: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<Grammar> for BTreeMap<String, Vec<String>> {
    fn from(grammar: Grammar) -> Self {
        grammar.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_grammar() -> Grammar {
        Grammar::from_rules([
            ("<start>", vec!["<config>"]),
            ("<config>", vec!["<statement>", "<statement>; <config>"]),
            ("<statement>", vec!["<key>: <int>"]),
            ("<key>", vec!["name", "date", "time"]),
            ("<int>", vec!["<digit>", "<digit><int>"]),
            ("<digit>", vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_tokenize_mixes_terminals_and_nonterminals() {
        let grammar = config_grammar();
        assert_eq!(
            grammar.tokenize("<statement>; <config>"),
            vec![
                Symbol::Nonterminal("<statement>".to_string()),
                Symbol::Terminal("; ".to_string()),
                Symbol::Nonterminal("<config>".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_unknown_brackets_as_text() {
        let grammar = config_grammar();
        assert_eq!(
            grammar.tokenize("<tag><digit></tag>"),
            vec![
                Symbol::Terminal("<tag>".to_string()),
                Symbol::Nonterminal("<digit>".to_string()),
                Symbol::Terminal("</tag>".to_string()),
            ]
        );
    }

    #[test]
    fn test_min_depths() {
        let depths = config_grammar().min_depths();
        assert_eq!(depths["<digit>"], 1);
        assert_eq!(depths["<int>"], 2);
        assert_eq!(depths["<statement>"], 3);
        assert_eq!(depths["<start>"], 5);
    }

    #[test]
    fn test_validation() {
        let missing_start = Grammar::from_rules([("<a>", vec!["a"])]);
        assert!(matches!(missing_start, Err(GrammarError::MissingStart(_))));

        let empty = Grammar::from_rules([("<start>", Vec::<String>::new())]);
        assert!(matches!(empty, Err(GrammarError::EmptyRule(_))));

        let unbracketed = Grammar::from_rules([("<start>", vec!["x"]), ("a", vec!["a"])]);
        assert!(matches!(unbracketed, Err(GrammarError::InvalidNonterminal(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "<start>: ['<digit><digit>']\n<digit>: ['0', '1']\n";
        let grammar: Grammar = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(grammar.alternatives("<digit>").unwrap().len(), 2);

        let bad: Result<Grammar, _> = serde_yaml::from_str("<digit>: ['0']\n");
        assert!(bad.is_err());
    }
}
