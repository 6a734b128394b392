

use std::fmt;

use serde::Serialize;

use crate::core::error::{Result, SegError};


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn record(&mut self, truth: u8, prediction: u8) {
        match (prediction == 1, truth == 1) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }
}


fn percentage(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| 100.0 * numerator as f64 / denominator as f64)
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub counts: ConfusionCounts,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

impl EvaluationReport {
    pub fn from_counts(counts: ConfusionCounts) -> Self {
        let ConfusionCounts { tp, fp, tn, fn_ } = counts;
        Self {
            counts,
            accuracy: percentage(tp + tn, counts.total()),
            precision: percentage(tp, tp + fp),
            recall: percentage(tp, tp + fn_),
        }
    }

    pub fn f1(&self) -> Option<f64> {
        match (self.precision, self.recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        }
    }
}

fn write_metric(f: &mut fmt::Formatter<'_>, name: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "{}: {:.2}", name, v),
        None => writeln!(f, "{}: undefined", name),
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model statistics:")?;
        write_metric(f, "accuracy", self.accuracy)?;
        write_metric(f, "precision", self.precision)?;
        write_metric(f, "recall", self.recall)
    }
}


pub fn evaluate(truth: &[u8], predictions: &[u8]) -> Result<EvaluationReport> {
    if truth.len() != predictions.len() {
        return Err(SegError::ShapeMismatch {
            expected: truth.len(),
            actual: predictions.len(),
        });
    }

    let mut counts = ConfusionCounts::default();
    for (t, p) in truth.iter().zip(predictions) {
        counts.record(*t, *p);
    }
    Ok(EvaluationReport::from_counts(counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_predictions() {
        let report = evaluate(&[1, 1, 0, 0], &[1, 0, 0, 1]).unwrap();
        assert_eq!(
            report.counts,
            ConfusionCounts {
                tp: 1,
                fp: 1,
                tn: 1,
                fn_: 1
            }
        );
        assert_eq!(report.accuracy, Some(50.0));
        assert_eq!(report.precision, Some(50.0));
        assert_eq!(report.recall, Some(50.0));
        assert_eq!(report.f1(), Some(50.0));
    }

    #[test]
    fn test_perfect_predictions() {
        let report = evaluate(&[1, 0, 1], &[1, 0, 1]).unwrap();
        assert_eq!(report.accuracy, Some(100.0));
        assert_eq!(report.precision, Some(100.0));
        assert_eq!(report.recall, Some(100.0));
    }

    #[test]
    fn test_no_positive_predictions_leaves_precision_undefined() {
        let report = evaluate(&[1, 0], &[0, 0]).unwrap();
        assert_eq!(report.precision, None);
        assert_eq!(report.recall, Some(0.0));
        assert_eq!(report.f1(), None);
        assert!(report.to_string().contains("precision: undefined"));
    }

    #[test]
    fn test_empty_input() {
        let report = evaluate(&[], &[]).unwrap();
        assert_eq!(report.accuracy, None);
        assert_eq!(report.counts.total(), 0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            evaluate(&[1, 0, 1], &[1]),
            Err(SegError::ShapeMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_report_format() {
        let report = evaluate(&[1, 1, 0], &[1, 0, 0]).unwrap();
        assert_eq!(
            report.to_string(),
            "Model statistics:\naccuracy: 66.67\nprecision: 100.00\nrecall: 50.00\n"
        );
    }
}
