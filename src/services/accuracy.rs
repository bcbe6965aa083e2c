//! Accuracy evaluation of learned preconditions.
//!
//! For every stored (test, precondition) pair two independent batches are
//! drawn: one under the suite's base formula alone ("raw") and one under the
//! base formula conjoined with the precondition ("constrained"). The share
//! of samples that trigger the condition in each batch gives the raw and
//! resulting precision. A pair whose batches cannot be generated is
//! reported as unmeasured.
//!
//! Evaluation batches are drawn with `distinct` off, so a precondition
//! whose language holds fewer than `sample_count` distinct samples is still
//! measured.

use tracing::{info, instrument, warn};

use crate::domain::error::ConditionError;
use crate::domain::models::{DerivationTree, Formula, ObservableTest, SolverOptions};

use super::context::SuiteContext;
use super::learning::TestResult;

/// Samples of one stream split by whether the condition triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSplit {
    pub passing: Vec<DerivationTree>,
    pub failing: Vec<DerivationTree>,
}

impl StreamSplit {
    pub fn len(&self) -> usize {
        self.passing.len() + self.failing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Share of passing samples, `0.0` for an empty stream.
    #[allow(clippy::cast_precision_loss)]
    pub fn precision(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.passing.len() as f64 / self.len() as f64
        }
    }
}

/// Both streams of one measured precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub raw: StreamSplit,
    pub constrained: StreamSplit,
}

impl Measurement {
    pub fn raw_precision(&self) -> f64 {
        self.raw.precision()
    }

    pub fn resulting_precision(&self) -> f64 {
        self.constrained.precision()
    }
}

/// Accuracy of one learned precondition.
#[derive(Debug, Clone)]
pub struct AccuracyRecord {
    pub test: ObservableTest,
    pub precondition: Formula,
    /// `None` when either stream could not be generated
    pub measurement: Option<Measurement>,
}

impl AccuracyRecord {
    pub const fn is_measured(&self) -> bool {
        self.measurement.is_some()
    }

    pub fn raw_precision(&self) -> Option<f64> {
        self.measurement.as_ref().map(Measurement::raw_precision)
    }

    pub fn resulting_precision(&self) -> Option<f64> {
        self.measurement.as_ref().map(Measurement::resulting_precision)
    }
}

/// Scores preconditions against fresh samples.
pub struct AccuracyEvaluator<'a> {
    context: &'a SuiteContext,
    sample_count: usize,
}

impl<'a> AccuracyEvaluator<'a> {
    pub const fn new(context: &'a SuiteContext, sample_count: usize) -> Self {
        Self {
            context,
            sample_count,
        }
    }

    /// Score every precondition of every result, in order.
    pub fn evaluate(&self, results: &[TestResult]) -> Result<Vec<AccuracyRecord>, ConditionError> {
        let mut records = Vec::new();
        for result in results {
            for precondition in &result.preconditions {
                records.push(AccuracyRecord {
                    test: result.test.clone(),
                    precondition: precondition.clone(),
                    measurement: self.measure(&result.test, precondition)?,
                });
            }
        }
        Ok(records)
    }

    /// Measure raw and resulting precision of `precondition` for `test`.
    #[instrument(skip_all, fields(test = %test.name(), precondition = %precondition))]
    pub fn measure(
        &self,
        test: &ObservableTest,
        precondition: &Formula,
    ) -> Result<Option<Measurement>, ConditionError> {
        let base = self.context.formula.as_ref();
        let constrained_formula = Formula::constrain(base, precondition);

        let Some(raw) = self.draw(test, base) else {
            warn!("could not generate the raw stream, precondition unmeasured");
            return Ok(None);
        };
        let Some(constrained) = self.draw(test, Some(&constrained_formula)) else {
            warn!("could not generate the constrained stream, precondition unmeasured");
            return Ok(None);
        };

        let measurement = Measurement {
            raw: self.split(test, raw)?,
            constrained: self.split(test, constrained)?,
        };
        info!(
            raw_precision = measurement.raw_precision(),
            resulting_precision = measurement.resulting_precision(),
            "measured precondition"
        );
        Ok(Some(measurement))
    }

    fn draw(&self, test: &ObservableTest, formula: Option<&Formula>) -> Option<Vec<DerivationTree>> {
        let options = SolverOptions {
            distinct: false,
            ..self.context.solver_options(test)
        };
        let built = self
            .context
            .solvers
            .create(&self.context.grammar, formula, &options);
        let mut solver = match built {
            Ok(solver) => solver,
            Err(err) => {
                warn!(error = %err, "could not build evaluation solver");
                return None;
            }
        };

        let mut samples = Vec::with_capacity(self.sample_count);
        for _ in 0..self.sample_count {
            match solver.solve() {
                Ok(sample) => samples.push(sample),
                Err(err) => {
                    warn!(error = %err, drawn = samples.len(), "evaluation stream failed");
                    return None;
                }
            }
        }
        Some(samples)
    }

    fn split(
        &self,
        test: &ObservableTest,
        samples: Vec<DerivationTree>,
    ) -> Result<StreamSplit, ConditionError> {
        let mut split = StreamSplit::default();
        for sample in samples {
            if self.context.classify(test, &sample)? {
                split.passing.push(sample);
            } else {
                split.failing.push(sample);
            }
        }
        Ok(split)
    }
}
