use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use serde::Serialize;

use super::{error::ClassificationError, labels::Target};

/// Precision, recall and F1 for one class or one average
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scores {
    /// Correct predictions of the class over all predictions of it
    pub precision: f64,

    /// Correct predictions of the class over all true occurrences of it
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1_score: f64,

    /// True occurrences of the class
    pub support: usize,
}

impl Scores {
    fn from_counts(counts: &Counts) -> Self {
        let predicted = counts.true_positives + counts.false_positives;
        let actual = counts.true_positives + counts.false_negatives;

        let precision = ratio(counts.true_positives, predicted);
        let recall = ratio(counts.true_positives, actual);

        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1_score,
            support: actual,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Per-class precision, recall and F1 with their averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Scores per class, sorted by label
    pub labels: Vec<(String, Scores)>,

    /// Exact-match accuracy, for single-label targets
    pub accuracy: Option<f64>,

    /// Scores over the pooled counts of every class, for multi-label targets
    pub micro_avg: Option<Scores>,

    /// Mean over examples of each example's own scores, for multi-label targets
    pub samples_avg: Option<Scores>,

    /// Unweighted mean over classes
    pub macro_avg: Scores,

    /// Mean over classes weighted by support
    pub weighted_avg: Scores,

    /// The number of examples
    pub examples: usize,
}

impl ClassificationReport {
    /// Score predicted targets against true ones
    ///
    /// Classes are the union of labels seen on either side. Targets are treated as multi-label
    /// when any of them carries a label tuple.
    pub fn new(y_true: &[Target], y_pred: &[Target]) -> Result<Self, ClassificationError> {
        if y_true.len() != y_pred.len() {
            return Err(ClassificationError::LengthMismatch {
                inputs: y_pred.len(),
                labels: y_true.len(),
            });
        }

        let mut counts = BTreeMap::<String, Counts>::new();
        let mut exact = 0;
        let mut per_sample = Scores::default();

        for (truth, prediction) in y_true.iter().zip(y_pred) {
            let truth = truth.labels().collect::<BTreeSet<_>>();
            let prediction = prediction.labels().collect::<BTreeSet<_>>();

            if truth == prediction {
                exact += 1;
            }

            let hits = truth.intersection(&prediction).count();
            per_sample.precision += ratio(hits, prediction.len());
            per_sample.recall += ratio(hits, truth.len());
            per_sample.f1_score += ratio(2 * hits, truth.len() + prediction.len());

            for &label in truth.union(&prediction) {
                let entry = counts.entry(label.to_string()).or_default();

                match (truth.contains(label), prediction.contains(label)) {
                    (true, true) => entry.true_positives += 1,
                    (true, false) => entry.false_negatives += 1,
                    (false, true) => entry.false_positives += 1,
                    (false, false) => {}
                }
            }
        }

        let labels = counts
            .iter()
            .map(|(label, counts)| (label.clone(), Scores::from_counts(counts)))
            .collect::<Vec<_>>();

        let support = labels.iter().map(|(_, scores)| scores.support).sum::<usize>();
        let mean = |metric: fn(&Scores) -> f64| {
            labels.iter().map(|(_, s)| metric(s)).sum::<f64>() / labels.len().max(1) as f64
        };
        let weighted = |metric: fn(&Scores) -> f64| {
            if support == 0 {
                0.0
            } else {
                labels
                    .iter()
                    .map(|(_, s)| metric(s) * s.support as f64)
                    .sum::<f64>()
                    / support as f64
            }
        };

        let macro_avg = Scores {
            precision: mean(|s| s.precision),
            recall: mean(|s| s.recall),
            f1_score: mean(|s| s.f1_score),
            support,
        };

        let weighted_avg = Scores {
            precision: weighted(|s| s.precision),
            recall: weighted(|s| s.recall),
            f1_score: weighted(|s| s.f1_score),
            support,
        };

        let multi_label = y_true.iter().chain(y_pred).any(Target::is_multi);

        let samples = y_true.len().max(1) as f64;
        let samples_avg = multi_label.then(|| Scores {
            precision: per_sample.precision / samples,
            recall: per_sample.recall / samples,
            f1_score: per_sample.f1_score / samples,
            support,
        });

        let (accuracy, micro_avg) = if multi_label {
            let pooled = counts.values().fold(Counts::default(), |acc, c| Counts {
                true_positives: acc.true_positives + c.true_positives,
                false_positives: acc.false_positives + c.false_positives,
                false_negatives: acc.false_negatives + c.false_negatives,
            });

            (None, Some(Scores::from_counts(&pooled)))
        } else {
            (Some(ratio(exact, y_true.len())), None)
        };

        Ok(Self {
            labels,
            accuracy,
            micro_avg,
            samples_avg,
            macro_avg,
            weighted_avg,
            examples: y_true.len(),
        })
    }

    /// Render the report as a text table with `digits` decimal places
    pub fn render(&self, digits: usize) -> String {
        let width = self
            .labels
            .iter()
            .map(|(label, _)| label.len())
            .chain([WEIGHTED_AVG.len(), digits])
            .max()
            .unwrap_or_default();

        let row = |name: &str, scores: &Scores| {
            format!(
                "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}\n",
                name,
                scores.precision,
                scores.recall,
                scores.f1_score,
                scores.support,
            )
        };

        let mut report = format!(
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );

        for (label, scores) in &self.labels {
            report.push_str(&row(label, scores));
        }

        report.push('\n');

        if let Some(accuracy) = self.accuracy {
            report.push_str(&format!(
                "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}\n",
                "accuracy", "", "", accuracy, self.examples
            ));
        }

        if let Some(micro_avg) = &self.micro_avg {
            report.push_str(&row("micro avg", micro_avg));
        }

        report.push_str(&row("macro avg", &self.macro_avg));
        report.push_str(&row(WEIGHTED_AVG, &self.weighted_avg));

        if let Some(samples_avg) = &self.samples_avg {
            report.push_str(&row("samples avg", samples_avg));
        }

        report
    }
}

const WEIGHTED_AVG: &str = "weighted avg";

impl Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(4))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn targets(labels: &[&str]) -> Vec<Target> {
        labels.iter().map(|&label| Target::from(label)).collect()
    }

    #[test]
    fn test_single_label_scores() -> anyhow::Result<()> {
        let y_true = targets(&["pos", "neg", "pos", "neutral"]);
        let y_pred = targets(&["pos", "pos", "pos", "neutral"]);

        let report = ClassificationReport::new(&y_true, &y_pred)?;

        let names = report
            .labels
            .iter()
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["neg", "neutral", "pos"]);

        let (_, pos) = &report.labels[2];
        assert!(close(pos.precision, 2.0 / 3.0));
        assert!(close(pos.recall, 1.0));
        assert!(close(pos.f1_score, 0.8));
        assert_eq!(pos.support, 2);

        assert_eq!(report.accuracy, Some(0.75));
        assert_eq!(report.micro_avg, None);
        assert!(close(report.macro_avg.f1_score, 0.6));
        assert!(close(report.weighted_avg.recall, 0.75));
        assert!(close(report.weighted_avg.f1_score, 0.65));
        assert_eq!(report.weighted_avg.support, 4);

        Ok(())
    }

    #[test]
    fn test_multi_label_uses_micro_average() -> anyhow::Result<()> {
        let y_true = vec![Target::from(&["x", "y"][..]), Target::from(&["z"][..])];
        let y_pred = vec![Target::from(&["x"][..]), Target::from(&["z", "y"][..])];

        let report = ClassificationReport::new(&y_true, &y_pred)?;

        assert_eq!(report.accuracy, None);

        let micro = report
            .micro_avg
            .ok_or_else(|| anyhow!("missing micro average"))?;

        // 2 true positives, 1 false positive, 1 false negative
        assert!(close(micro.precision, 2.0 / 3.0));
        assert!(close(micro.recall, 2.0 / 3.0));
        assert_eq!(micro.support, 3);

        let samples = report
            .samples_avg
            .ok_or_else(|| anyhow!("missing samples average"))?;

        // {x, y} vs {x}: 1, 1/2, 2/3 and {z} vs {z, y}: 1/2, 1, 2/3
        assert!(close(samples.precision, 0.75));
        assert!(close(samples.recall, 0.75));
        assert!(close(samples.f1_score, 2.0 / 3.0));
        assert!(report.to_string().ends_with(&format!(
            "{:>12}  {:>9.4} {:>9.4} {:>9.4} {:>9}\n",
            "samples avg", 0.75, 0.75, 2.0 / 3.0, 3
        )));

        Ok(())
    }

    #[test]
    fn test_render_layout() -> anyhow::Result<()> {
        let report = ClassificationReport::new(&targets(&["a", "b"]), &targets(&["a", "a"]))?;

        let expected = [
            "              precision    recall  f1-score   support",
            "",
            "           a     0.5000    1.0000    0.6667         1",
            "           b     0.0000    0.0000    0.0000         1",
            "",
            "    accuracy                         0.5000         2",
            "   macro avg     0.2500    0.5000    0.3333         2",
            "weighted avg     0.2500    0.5000    0.3333         2",
            "",
        ]
        .join("\n");

        assert_eq!(report.to_string(), expected);

        Ok(())
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let result = ClassificationReport::new(&targets(&["a"]), &targets(&[]));

        assert_eq!(
            result.err(),
            Some(ClassificationError::LengthMismatch {
                inputs: 0,
                labels: 1
            })
        );
    }
}
