//! Named sample predicates backing formula atoms.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::error::SolverError;
use crate::domain::models::{DerivationTree, Formula};

/// Predicate over a sample.
pub type Constraint = Arc<dyn Fn(&DerivationTree) -> bool + Send + Sync>;

/// Registry resolving formula atoms to predicates by exact text.
#[derive(Clone, Default)]
pub struct ConstraintRegistry {
    constraints: BTreeMap<String, Constraint>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate over the derivation tree under `name`.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&DerivationTree) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Register a predicate over the rendered sample under `name`.
    #[must_use]
    pub fn with_text<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.with(name, move |sample: &DerivationTree| predicate(&sample.to_string()))
    }

    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&DerivationTree) -> bool + Send + Sync + 'static,
    {
        self.constraints.insert(name.into(), Arc::new(predicate));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    /// Resolve every atom of `formula`.
    ///
    /// # Errors
    ///
    /// `SolverError::UnsupportedFormula` naming the first unknown atom.
    pub fn compile(&self, formula: Option<&Formula>) -> Result<CompiledFormula, SolverError> {
        let Some(formula) = formula else {
            return Ok(CompiledFormula::default());
        };

        let checks = formula
            .atoms()
            .into_iter()
            .map(|atom| {
                self.constraints
                    .get(atom)
                    .cloned()
                    .ok_or_else(|| SolverError::UnsupportedFormula(atom.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFormula {
            text: Some(formula.to_string()),
            checks,
        })
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("names", &self.constraints.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A formula resolved to its predicates. Holds when every predicate does.
#[derive(Clone, Default)]
pub struct CompiledFormula {
    text: Option<String>,
    checks: Vec<Constraint>,
}

impl CompiledFormula {
    pub fn holds(&self, sample: &DerivationTree) -> bool {
        self.checks.iter().all(|check| check(sample))
    }

    pub fn is_trivial(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("true")
    }
}

impl fmt::Debug for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFormula")
            .field("text", &self.text())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConstraintRegistry {
        ConstraintRegistry::new()
            .with_text("long", |s| s.len() > 2)
            .with_text("starts with a", |s| s.starts_with('a'))
    }

    #[test]
    fn test_compile_conjunction() {
        let formula = Formula::atom("long").and(&Formula::atom("starts with a"));
        let compiled = registry().compile(Some(&formula)).unwrap();

        assert!(compiled.holds(&DerivationTree::terminal("abc")));
        assert!(!compiled.holds(&DerivationTree::terminal("ab")));
        assert!(!compiled.holds(&DerivationTree::terminal("bcd")));
    }

    #[test]
    fn test_no_formula_always_holds() {
        let compiled = registry().compile(None).unwrap();
        assert!(compiled.is_trivial());
        assert!(compiled.holds(&DerivationTree::terminal("")));
        assert_eq!(compiled.text(), "true");
    }

    #[test]
    fn test_unknown_atom_rejected() {
        let formula = Formula::atom("long").and(&Formula::atom("mystery"));
        let err = registry().compile(Some(&formula)).unwrap_err();
        assert_eq!(err, SolverError::UnsupportedFormula("mystery".to_string()));
    }
}
