//! Condition algebra.
//!
//! A [`Probe`] is a leaf trigger counter handed to the subject under test.
//! A [`Condition`] is a read view over probes, composable with `&`, `|` and
//! `!` into an expression tree. Composite conditions never hold state of
//! their own: their truth value is recomputed from the leaves on every read.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::error::ConditionError;

#[derive(Debug)]
struct ProbeState {
    description: String,
    count: AtomicUsize,
    observed: AtomicBool,
}

/// Leaf trigger counter passed into the subject's instrumentation points.
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct Probe {
    state: Arc<ProbeState>,
}

impl Probe {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ProbeState {
                description: description.into(),
                count: AtomicUsize::new(0),
                observed: AtomicBool::new(false),
            }),
        }
    }

    /// Record one occurrence of the event.
    pub fn trigger(&self) {
        self.state.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.state.count.store(0, Ordering::SeqCst);
    }

    pub fn was_triggered(&self) -> bool {
        self.count() > 0
    }

    pub fn count(&self) -> usize {
        self.state.count.load(Ordering::SeqCst)
    }

    pub fn description(&self) -> &str {
        &self.state.description
    }

    /// View this probe as a leaf condition.
    pub fn condition(&self) -> Condition {
        Condition::from(self.clone())
    }

    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn try_acquire(&self) -> bool {
        self.state
            .observed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.state.observed.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum ConditionKind {
    Leaf(Probe),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

/// A resettable boolean observation over one or more probes.
#[derive(Debug, Clone)]
pub struct Condition {
    kind: ConditionKind,
    label: Option<Arc<str>>,
}

impl Condition {
    /// Create a fresh leaf condition backed by a new probe.
    pub fn new(description: impl Into<String>) -> Self {
        Self::from(Probe::new(description))
    }

    /// Conjunction of one or more conditions.
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Result<Self, ConditionError> {
        let conditions: Vec<Self> = conditions.into_iter().collect();
        if conditions.is_empty() {
            return Err(ConditionError::EmptyComposite { operator: "and" });
        }
        Ok(Self::composite(ConditionKind::All(conditions)))
    }

    /// Disjunction of one or more conditions.
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Result<Self, ConditionError> {
        let conditions: Vec<Self> = conditions.into_iter().collect();
        if conditions.is_empty() {
            return Err(ConditionError::EmptyComposite { operator: "or" });
        }
        Ok(Self::composite(ConditionKind::Any(conditions)))
    }

    /// Negation of `condition`.
    pub fn negate(condition: Self) -> Self {
        Self::composite(ConditionKind::Not(Box::new(condition)))
    }

    fn composite(kind: ConditionKind) -> Self {
        Self { kind, label: None }
    }

    /// Replace the description of this handle.
    ///
    /// The label belongs to the handle, not to the underlying probes.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.label = Some(Arc::from(description.into()));
        self
    }

    pub fn description(&self) -> String {
        if let Some(label) = &self.label {
            return label.to_string();
        }
        match &self.kind {
            ConditionKind::Leaf(probe) => probe.description().to_string(),
            ConditionKind::All(conditions) => join_descriptions(conditions, " and "),
            ConditionKind::Any(conditions) => join_descriptions(conditions, " or "),
            ConditionKind::Not(inner) => format!("Not ({})", inner.description()),
        }
    }

    /// Trigger the underlying probe. Fails on derived conditions.
    pub fn trigger(&self) -> Result<(), ConditionError> {
        match &self.kind {
            ConditionKind::Leaf(probe) => {
                probe.trigger();
                Ok(())
            }
            _ => Err(ConditionError::InvalidOperation {
                description: self.description(),
            }),
        }
    }

    /// Reset every probe reachable from this condition.
    pub fn reset(&self) {
        match &self.kind {
            ConditionKind::Leaf(probe) => probe.reset(),
            ConditionKind::All(conditions) | ConditionKind::Any(conditions) => {
                conditions.iter().for_each(Self::reset);
            }
            ConditionKind::Not(inner) => inner.reset(),
        }
    }

    pub fn was_triggered(&self) -> bool {
        match &self.kind {
            ConditionKind::Leaf(probe) => probe.was_triggered(),
            ConditionKind::All(conditions) => conditions.iter().all(Self::was_triggered),
            ConditionKind::Any(conditions) => conditions.iter().any(Self::was_triggered),
            ConditionKind::Not(inner) => !inner.was_triggered(),
        }
    }

    /// Trigger count for leaves, `0`/`1` for derived conditions.
    pub fn count(&self) -> usize {
        match &self.kind {
            ConditionKind::Leaf(probe) => probe.count(),
            _ => usize::from(self.was_triggered()),
        }
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, ConditionKind::Leaf(_))
    }

    /// The probe behind a leaf condition.
    pub const fn probe(&self) -> Option<&Probe> {
        match &self.kind {
            ConditionKind::Leaf(probe) => Some(probe),
            _ => None,
        }
    }

    /// Distinct probes reachable from this condition, in first-seen order.
    pub fn probes(&self) -> Vec<Probe> {
        let mut probes = Vec::new();
        self.collect_probes(&mut probes);
        probes
    }

    fn collect_probes(&self, out: &mut Vec<Probe>) {
        match &self.kind {
            ConditionKind::Leaf(probe) => {
                if !out.iter().any(|seen| seen.same_as(probe)) {
                    out.push(probe.clone());
                }
            }
            ConditionKind::All(conditions) | ConditionKind::Any(conditions) => {
                for condition in conditions {
                    condition.collect_probes(out);
                }
            }
            ConditionKind::Not(inner) => inner.collect_probes(out),
        }
    }

    /// Start a single-flight observation.
    ///
    /// Claims every probe of the tree and resets it. Fails if any probe is
    /// already claimed by another observation. The claim is released when
    /// the returned guard is dropped.
    pub fn observe(&self) -> Result<Observation<'_>, ConditionError> {
        let mut claimed: Vec<Probe> = Vec::new();
        for probe in self.probes() {
            if !probe.try_acquire() {
                claimed.iter().for_each(Probe::release);
                return Err(ConditionError::ObservationInFlight {
                    description: probe.description().to_string(),
                });
            }
            claimed.push(probe);
        }
        self.reset();
        Ok(Observation {
            condition: self,
            probes: claimed,
        })
    }
}

fn join_descriptions(conditions: &[Condition], separator: &str) -> String {
    conditions
        .iter()
        .map(Condition::description)
        .collect::<Vec<_>>()
        .join(separator)
}

impl From<Probe> for Condition {
    fn from(probe: Probe) -> Self {
        Self {
            kind: ConditionKind::Leaf(probe),
            label: None,
        }
    }
}

impl From<&Probe> for Condition {
    fn from(probe: &Probe) -> Self {
        Self::from(probe.clone())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl BitAnd for Condition {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::composite(ConditionKind::All(vec![self, rhs]))
    }
}

impl BitAnd for &Condition {
    type Output = Condition;

    fn bitand(self, rhs: Self) -> Condition {
        self.clone() & rhs.clone()
    }
}

impl BitOr for Condition {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::composite(ConditionKind::Any(vec![self, rhs]))
    }
}

impl BitOr for &Condition {
    type Output = Condition;

    fn bitor(self, rhs: Self) -> Condition {
        self.clone() | rhs.clone()
    }
}

impl Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        Self::negate(self)
    }
}

impl Not for &Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::negate(self.clone())
    }
}

/// Guard for one in-flight observation. See [`Condition::observe`].
#[must_use = "dropping the observation releases the condition immediately"]
#[derive(Debug)]
pub struct Observation<'a> {
    condition: &'a Condition,
    probes: Vec<Probe>,
}

impl Observation<'_> {
    pub fn was_triggered(&self) -> bool {
        self.condition.was_triggered()
    }

    pub fn count(&self) -> usize {
        self.condition.count()
    }
}

impl Drop for Observation<'_> {
    fn drop(&mut self) {
        self.probes.iter().for_each(Probe::release);
    }
}
