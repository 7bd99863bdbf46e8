//! Fixed-shape linear-regression fitting
//!
//! Full-batch gradient descent on `prediction = x · W + b` with
//! mean-squared-error loss. Every pipeline stage trains through the same
//! engine type; feature widths differ per stage but stay single-digit.

use opsdesk_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Why a fit loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// Ran the full epoch budget
    Completed,
    /// Loss delta stayed below the convergence threshold long enough
    Converged,
    /// Loss left the finite range; the last finite parameters are kept
    Diverged,
}

/// One training example
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub features: Vec<f32>,
    pub target: f32,
}

/// Hyper-parameters for one fit
#[derive(Debug, Clone)]
pub struct FitPlan {
    pub epochs: usize,
    pub learning_rate: f32,
    pub convergence_delta: f32,
    pub convergence_patience: usize,
}

/// Result of one fit
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Observed loss per epoch, including the non-finite one on divergence
    pub losses: Vec<f32>,
    pub weights: Vec<f32>,
    pub bias: f32,
    pub epochs_run: usize,
    pub stop: StopReason,
}

/// Epoch-loop stop control
///
/// Divergence (non-finite loss) ends the loop immediately and counts as a
/// normal exit, not an error. Convergence requires the epoch-to-epoch
/// loss delta to stay below `delta` for more than `patience` consecutive
/// epochs, so with a patience of 5 the sixth consecutive small delta
/// stops the loop.
#[derive(Debug)]
pub struct StopRule {
    delta: f32,
    patience: usize,
    prev_loss: Option<f32>,
    consecutive_small: usize,
}

impl StopRule {
    pub fn new(delta: f32, patience: usize) -> Self {
        Self {
            delta,
            patience,
            prev_loss: None,
            consecutive_small: 0,
        }
    }

    /// Feed the loss of the epoch that just ran
    ///
    /// Returns a stop reason once a rule fires; the caller must not apply
    /// further parameter updates after that.
    pub fn observe(&mut self, loss: f32) -> Option<StopReason> {
        if !loss.is_finite() {
            return Some(StopReason::Diverged);
        }

        if let Some(prev) = self.prev_loss {
            if (loss - prev).abs() < self.delta {
                self.consecutive_small += 1;
                if self.consecutive_small > self.patience {
                    return Some(StopReason::Converged);
                }
            } else {
                self.consecutive_small = 0;
            }
        }

        self.prev_loss = Some(loss);
        None
    }
}

/// One isolated fitting context
///
/// Owns its parameter and gradient buffers. The session registry hands an
/// engine to each concurrent branch and reclaims it when the run ends;
/// the bootstrap and finalize stages use short-lived local engines.
#[derive(Debug, Default)]
pub struct RegressionEngine {
    weights: Vec<f32>,
    bias: f32,
    grad: Vec<f32>,
}

impl RegressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the linear model to `rows` by full-batch gradient descent
    ///
    /// Parameters start from zero on every fit. Each epoch computes the
    /// loss first and shows it to the stop rule; when a rule fires the
    /// loop ends before that epoch's update, so no parameter changes are
    /// recorded past the stopping epoch.
    pub fn fit(&mut self, plan: &FitPlan, rows: &[TrainingRow]) -> Result<FitOutcome> {
        if rows.is_empty() {
            return Err(Error::InvalidInput(
                "fit requires at least one training row".to_string(),
            ));
        }
        let width = rows[0].features.len();
        if width == 0 {
            return Err(Error::InvalidInput(
                "training rows must have at least one feature".to_string(),
            ));
        }
        if let Some(bad) = rows.iter().find(|r| r.features.len() != width) {
            return Err(Error::InvalidInput(format!(
                "inconsistent feature width: expected {}, found {}",
                width,
                bad.features.len()
            )));
        }

        self.weights.clear();
        self.weights.resize(width, 0.0);
        self.grad.clear();
        self.grad.resize(width, 0.0);
        self.bias = 0.0;

        let inv_n = 1.0 / rows.len() as f32;
        let mut losses = Vec::with_capacity(plan.epochs);
        let mut rule = StopRule::new(plan.convergence_delta, plan.convergence_patience);
        let mut stop = StopReason::Completed;
        let mut epochs_run = plan.epochs;

        for epoch in 0..plan.epochs {
            let mut loss = 0.0f32;
            let mut grad_bias = 0.0f32;
            for g in self.grad.iter_mut() {
                *g = 0.0;
            }

            for row in rows {
                let mut prediction = self.bias;
                for (w, x) in self.weights.iter().zip(&row.features) {
                    prediction += w * x;
                }
                let residual = prediction - row.target;
                loss += residual * residual;

                let scaled = 2.0 * residual * inv_n;
                for (g, x) in self.grad.iter_mut().zip(&row.features) {
                    *g += scaled * x;
                }
                grad_bias += scaled;
            }
            loss *= inv_n;
            losses.push(loss);

            if let Some(reason) = rule.observe(loss) {
                stop = reason;
                epochs_run = epoch + 1;
                break;
            }

            for (w, g) in self.weights.iter_mut().zip(&self.grad) {
                *w -= plan.learning_rate * *g;
            }
            self.bias -= plan.learning_rate * grad_bias;
        }

        Ok(FitOutcome {
            losses,
            weights: self.weights.clone(),
            bias: self.bias,
            epochs_run,
            stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(epochs: usize) -> FitPlan {
        FitPlan {
            epochs,
            learning_rate: 1e-4,
            convergence_delta: 1e-6,
            convergence_patience: 5,
        }
    }

    fn scaled_rows() -> Vec<TrainingRow> {
        vec![
            TrainingRow {
                features: vec![0.1, 1.0, 0.0, 0.0],
                target: 0.1,
            },
            TrainingRow {
                features: vec![0.2, 0.0, 1.0, 0.0],
                target: 0.2,
            },
            TrainingRow {
                features: vec![0.3, 0.0, 0.0, 1.0],
                target: 0.3,
            },
        ]
    }

    #[test]
    fn test_fit_loss_finite_and_non_increasing_on_average() {
        let mut engine = RegressionEngine::new();
        let outcome = engine.fit(&plan(100), &scaled_rows()).expect("fit succeeds");

        assert!(!outcome.losses.is_empty());
        assert!(outcome.losses.iter().all(|l| l.is_finite()));
        assert_ne!(outcome.stop, StopReason::Diverged);

        // Moving-average comparison: last quarter must not exceed the first
        let quarter = (outcome.losses.len() / 4).max(1);
        let head: f32 = outcome.losses[..quarter].iter().sum::<f32>() / quarter as f32;
        let tail: f32 = outcome.losses[outcome.losses.len() - quarter..]
            .iter()
            .sum::<f32>()
            / quarter as f32;
        assert!(tail <= head, "loss grew: head avg {} tail avg {}", head, tail);
    }

    #[test]
    fn test_divergent_fit_stops_early_with_finite_parameters() {
        // Unscaled prices overshoot at this learning rate and blow up
        let rows = vec![
            TrainingRow {
                features: vec![100.0, 1.0, 0.0, 0.0],
                target: 100.0,
            },
            TrainingRow {
                features: vec![200.0, 0.0, 1.0, 0.0],
                target: 200.0,
            },
            TrainingRow {
                features: vec![300.0, 0.0, 0.0, 1.0],
                target: 300.0,
            },
        ];
        let mut engine = RegressionEngine::new();
        let outcome = engine.fit(&plan(100), &rows).expect("divergence is a normal exit");

        assert_eq!(outcome.stop, StopReason::Diverged);
        assert!(outcome.epochs_run < 100);
        assert_eq!(outcome.losses.len(), outcome.epochs_run);
        // The divergent loss itself is recorded, parameters stay finite
        assert!(!outcome.losses[outcome.epochs_run - 1].is_finite());
        assert!(outcome.weights.iter().all(|w| w.is_finite()));
        assert!(outcome.bias.is_finite());
    }

    #[test]
    fn test_fit_converges_on_flat_loss() {
        // Zero target with zero-initialized parameters never moves
        let rows = vec![TrainingRow {
            features: vec![1.0],
            target: 0.0,
        }];
        let mut engine = RegressionEngine::new();
        let outcome = engine.fit(&plan(100), &rows).expect("fit succeeds");

        assert_eq!(outcome.stop, StopReason::Converged);
        // One baseline epoch plus six consecutive flat deltas
        assert_eq!(outcome.epochs_run, 7);
    }

    #[test]
    fn test_fit_rejects_empty_and_ragged_input() {
        let mut engine = RegressionEngine::new();
        assert!(engine.fit(&plan(10), &[]).is_err());

        let ragged = vec![
            TrainingRow {
                features: vec![1.0, 2.0],
                target: 0.0,
            },
            TrainingRow {
                features: vec![1.0],
                target: 0.0,
            },
        ];
        assert!(engine.fit(&plan(10), &ragged).is_err());
    }

    #[test]
    fn test_stop_rule_diverges_immediately_on_nan() {
        let mut rule = StopRule::new(1e-6, 5);
        assert_eq!(rule.observe(1.0), None);
        assert_eq!(rule.observe(f32::NAN), Some(StopReason::Diverged));
    }

    #[test]
    fn test_stop_rule_diverges_on_infinity() {
        let mut rule = StopRule::new(1e-6, 5);
        assert_eq!(rule.observe(f32::INFINITY), Some(StopReason::Diverged));
    }

    #[test]
    fn test_stop_rule_converges_on_sixth_small_delta() {
        let mut rule = StopRule::new(1e-6, 5);
        assert_eq!(rule.observe(1.0), None, "first loss sets the baseline");

        let mut fired_at = 0;
        let mut result = None;
        for i in 1..=6 {
            result = rule.observe(1.0);
            fired_at = i;
            if result.is_some() {
                break;
            }
        }
        assert_eq!(result, Some(StopReason::Converged));
        assert_eq!(fired_at, 6, "sixth consecutive small delta must stop the loop");
    }

    #[test]
    fn test_stop_rule_resets_on_large_delta() {
        let mut rule = StopRule::new(1e-6, 5);
        rule.observe(1.0);
        for _ in 0..5 {
            assert_eq!(rule.observe(1.0), None);
        }
        // A large delta resets the streak
        assert_eq!(rule.observe(2.0), None);
        for _ in 0..5 {
            assert_eq!(rule.observe(2.0), None);
        }
        assert_eq!(rule.observe(2.0), Some(StopReason::Converged));
    }
}
