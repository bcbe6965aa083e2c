//! Formulas over the input grammar.
//!
//! The harness treats formulas as opaque constraint text produced by the
//! learner and consumed by the solver. The only structure it relies on is
//! conjunction, used to constrain generation by a base formula and a
//! learned precondition at once.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constraint over samples of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// Constraint text in the solver's language.
    Atom(String),
    /// Conjunction of sub-formulas. Never nested after construction via
    /// [`Formula::and`].
    And(Vec<Formula>),
}

impl Formula {
    pub fn atom(text: impl Into<String>) -> Self {
        Self::Atom(text.into())
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let mut conjuncts: Vec<Self> = Vec::new();
        for formula in [self, other] {
            match formula {
                Self::And(parts) => conjuncts.extend(parts.iter().cloned()),
                atom @ Self::Atom(_) => conjuncts.push(atom.clone()),
            }
        }
        Self::And(conjuncts)
    }

    /// `precondition` constrained further by an optional base formula.
    pub fn constrain(base: Option<&Self>, precondition: &Self) -> Self {
        base.map_or_else(|| precondition.clone(), |base| base.and(precondition))
    }

    /// Leaf constraints of this formula, in order.
    pub fn atoms(&self) -> Vec<&str> {
        match self {
            Self::Atom(text) => vec![text.as_str()],
            Self::And(parts) => parts.iter().flat_map(Self::atoms).collect(),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(text) => f.write_str(text),
            Self::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                f.write_str(&rendered.join(" and "))
            }
        }
    }
}
