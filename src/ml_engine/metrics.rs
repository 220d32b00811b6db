//! Held-out evaluation: accuracy, per-label precision / recall / F1, and a
//! fixed-width text rendering of the classification report.
//!
//! Undefined ratios (a label never predicted, or absent from the test
//! partition) are reported as 0.0.

use crate::types::{AverageMetrics, ClassMetrics, ClassificationReport, MachineStatus};

/// Build the report from true and predicted label indices
pub fn classification_report(actual: &[usize], predicted: &[usize]) -> ClassificationReport {
    let mut confusion = [[0usize; 2]; 2];
    for (&a, &p) in actual.iter().zip(predicted) {
        if a < 2 && p < 2 {
            confusion[a][p] += 1;
        }
    }

    let total: usize = confusion.iter().flatten().sum();
    let correct = confusion[0][0] + confusion[1][1];
    let accuracy = ratio(correct, total);

    let classes: Vec<(MachineStatus, ClassMetrics)> = MachineStatus::ALL
        .iter()
        .map(|&status| {
            let k = status.label_index();
            let tp = confusion[k][k];
            let support = confusion[k].iter().sum::<usize>();
            let predicted_k = confusion[0][k] + confusion[1][k];
            let precision = ratio(tp, predicted_k);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            (
                status,
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                },
            )
        })
        .collect();

    let n_classes = classes.len() as f64;
    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / n_classes,
        recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / n_classes,
        f1: classes.iter().map(|(_, m)| m.f1).sum::<f64>() / n_classes,
        support: total,
    };

    let weighted = |f: fn(&ClassMetrics) -> f64| -> f64 {
        if total == 0 {
            return 0.0;
        }
        classes
            .iter()
            .map(|(_, m)| f(m) * m.support as f64)
            .sum::<f64>()
            / total as f64
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1: weighted(|m| m.f1),
        support: total,
    };

    ClassificationReport {
        classes,
        accuracy,
        macro_avg,
        weighted_avg,
        confusion,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Render the report as a fixed-width table
pub fn render_report(report: &ClassificationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>14} {:>9} {:>9} {:>9} {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    ));
    for (status, m) in &report.classes {
        out.push_str(&format!(
            "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            status.as_str(),
            m.precision,
            m.recall,
            m.f1,
            m.support
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>14} {:>9} {:>9} {:>9.2} {:>9}\n",
        "accuracy", "", "", report.accuracy, report.macro_avg.support
    ));
    for (name, avg) in [("macro avg", &report.macro_avg), ("weighted avg", &report.weighted_avg)] {
        out.push_str(&format!(
            "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            name, avg.precision, avg.recall, avg.f1, avg.support
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 1, 1, 0, 1];
        let r = classification_report(&y, &y);
        assert_eq!(r.accuracy, 1.0);
        for (_, m) in &r.classes {
            assert_eq!(m.precision, 1.0);
            assert_eq!(m.recall, 1.0);
            assert_eq!(m.f1, 1.0);
        }
        assert_eq!(r.for_status(MachineStatus::Normal).unwrap().support, 3);
        assert_eq!(r.for_status(MachineStatus::Critical).unwrap().support, 2);
    }

    #[test]
    fn test_known_confusion() {
        // actual:    C C C N N N N
        // predicted: C C N N N N C
        let actual = [0, 0, 0, 1, 1, 1, 1];
        let predicted = [0, 0, 1, 1, 1, 1, 0];
        let r = classification_report(&actual, &predicted);
        assert_eq!(r.confusion, [[2, 1], [1, 3]]);
        assert!((r.accuracy - 5.0 / 7.0).abs() < 1e-12);

        let c = r.for_status(MachineStatus::Critical).unwrap();
        assert!((c.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((c.recall - 2.0 / 3.0).abs() < 1e-12);

        let n = r.for_status(MachineStatus::Normal).unwrap();
        assert!((n.precision - 0.75).abs() < 1e-12);
        assert!((n.recall - 0.75).abs() < 1e-12);

        let expected_weighted = (2.0 / 3.0 * 3.0 + 0.75 * 4.0) / 7.0;
        assert!((r.weighted_avg.f1 - expected_weighted).abs() < 1e-12);
    }

    #[test]
    fn test_absent_label_reports_zero() {
        let actual = [1, 1, 1];
        let predicted = [1, 1, 1];
        let r = classification_report(&actual, &predicted);
        let c = r.for_status(MachineStatus::Critical).unwrap();
        assert_eq!((c.precision, c.recall, c.f1, c.support), (0.0, 0.0, 0.0, 0));
        assert_eq!(r.accuracy, 1.0);
    }

    #[test]
    fn test_render_lists_both_labels() {
        let r = classification_report(&[0, 1], &[0, 0]);
        let text = render_report(&r);
        assert!(text.contains("Critical"));
        assert!(text.contains("Normal"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("weighted avg"));
    }
}
