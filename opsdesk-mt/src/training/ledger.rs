//! Write-once result ledger kept per branch
//!
//! Each concurrent branch records its per-epoch losses and final
//! parameters into its own ledger; the finalize stage reads both. A key
//! can only be recorded once, later writes are refused rather than
//! replacing the stored value.

use std::collections::HashMap;

use crate::numeric::regression::FitOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerValue {
    Loss(f32),
    Weights(Vec<f32>),
    Bias(f32),
}

#[derive(Debug, Default)]
pub struct BranchLedger {
    entries: HashMap<String, LedgerValue>,
}

impl BranchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value unless the key is already present. Returns whether
    /// the write landed.
    pub fn record_once(&mut self, key: &str, value: LedgerValue) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), value);
        true
    }

    /// Records the per-epoch losses and final parameters of one fit.
    pub fn record_fit(&mut self, outcome: &FitOutcome) {
        for (epoch, loss) in outcome.losses.iter().enumerate() {
            self.record_once(&format!("epoch_{:03}", epoch), LedgerValue::Loss(*loss));
        }
        self.record_once(
            "final_weights",
            LedgerValue::Weights(outcome.weights.clone()),
        );
        self.record_once("final_bias", LedgerValue::Bias(outcome.bias));
    }

    pub fn get(&self, key: &str) -> Option<&LedgerValue> {
        self.entries.get(key)
    }

    pub fn final_weights(&self) -> Option<&[f32]> {
        match self.entries.get("final_weights") {
            Some(LedgerValue::Weights(weights)) => Some(weights),
            _ => None,
        }
    }

    pub fn final_bias(&self) -> Option<f32> {
        match self.entries.get("final_bias") {
            Some(LedgerValue::Bias(bias)) => Some(*bias),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::regression::StopReason;

    #[test]
    fn test_first_writer_wins() {
        let mut ledger = BranchLedger::new();

        assert!(ledger.record_once("final_bias", LedgerValue::Bias(1.0)));
        assert!(!ledger.record_once("final_bias", LedgerValue::Bias(2.0)));
        assert_eq!(ledger.final_bias(), Some(1.0));
    }

    #[test]
    fn test_record_fit_stores_epochs_and_parameters() {
        let outcome = FitOutcome {
            losses: vec![4.0, 2.0, 1.0],
            weights: vec![0.5, -0.5],
            bias: 0.25,
            epochs_run: 3,
            stop: StopReason::Completed,
        };

        let mut ledger = BranchLedger::new();
        ledger.record_fit(&outcome);

        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.get("epoch_000"), Some(&LedgerValue::Loss(4.0)));
        assert_eq!(ledger.get("epoch_002"), Some(&LedgerValue::Loss(1.0)));
        assert_eq!(ledger.final_weights(), Some(&[0.5, -0.5][..]));
        assert_eq!(ledger.final_bias(), Some(0.25));
    }

    #[test]
    fn test_accessors_miss_on_empty_ledger() {
        let ledger = BranchLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.final_weights(), None);
        assert_eq!(ledger.final_bias(), None);
    }
}
