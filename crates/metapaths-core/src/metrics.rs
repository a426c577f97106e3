//! Confusion-matrix statistics for 3-hop-predicts-1-hop scoring.
//!
//! Each overlap row is read as a binary predictor: "a 3-hop path exists
//! between this node pair" predicts "a direct edge exists". Counts derive
//! by inclusion-exclusion, clamped at zero because non-exhaustive
//! enumeration can otherwise double count.
//!
//! Every ratio defaults to 0.0 on a zero denominator, except the two
//! likelihood ratios: PLR and NLR yield +inf when their denominator is
//! zero and the numerator is not. Downstream consumers rely on the
//! infinity sentinel, so it is preserved, never clamped.

use crate::overlap::OverlapRow;
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::warn;

pub const CLASSIFICATION_HEADER: &str = "3hop_metapath\t3hop_count\t1hop_metapath\t1hop_count\t\
    overlap\ttotal_possible\tTP\tFP\tFN\tTN\tPrecision\tRecall\tSpecificity\tNPV\tAccuracy\t\
    Balanced_Accuracy\tF1\tMCC\tTPR\tFPR\tFNR\tPLR\tNLR";

/// Derived, read-only classification view of one overlap row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfusionMetrics {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
    pub total: u64,

    pub precision: f64,
    pub recall: f64,
    pub specificity: f64,
    pub npv: f64,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub f1: f64,
    pub mcc: f64,
    pub tpr: f64,
    pub fpr: f64,
    pub fnr: f64,
    pub plr: f64,
    pub nlr: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn likelihood_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else if numerator > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

impl ConfusionMetrics {
    pub fn from_counts(tp: u64, fp: u64, fn_count: u64, tn: u64) -> Self {
        let total = tp + fp + fn_count + tn;
        let (tpf, fpf, fnf, tnf) = (tp as f64, fp as f64, fn_count as f64, tn as f64);

        let precision = ratio(tpf, tpf + fpf);
        let recall = ratio(tpf, tpf + fnf);
        let specificity = ratio(tnf, tnf + fpf);
        let npv = ratio(tnf, tnf + fnf);
        let accuracy = ratio(tpf + tnf, total as f64);
        let f1 = ratio(2.0 * precision * recall, precision + recall);

        let mcc_numerator = tpf * tnf - fpf * fnf;
        let mcc_denominator = ((tpf + fpf) * (tpf + fnf) * (tnf + fpf) * (tnf + fnf)).sqrt();
        let mcc = ratio(mcc_numerator, mcc_denominator);

        let tpr = recall;
        let fpr = ratio(fpf, fpf + tnf);
        let fnr = ratio(fnf, fnf + tpf);
        let balanced_accuracy = (tpr + specificity) / 2.0;

        let plr = likelihood_ratio(tpr, fpr);
        let nlr = likelihood_ratio(fnr, specificity);

        Self {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_count,
            true_negatives: tn,
            total,
            precision,
            recall,
            specificity,
            npv,
            accuracy,
            balanced_accuracy,
            f1,
            mcc,
            tpr,
            fpr,
            fnr,
            plr,
            nlr,
        }
    }

    /// Derive counts from an overlap row by clamped inclusion-exclusion.
    pub fn from_overlap(row: &OverlapRow) -> Self {
        let a = row.three_hop_count;
        let b = row.one_hop_count;
        let o = row.overlap;
        let n = row.total_possible;

        let tp = o;
        let fp = a.saturating_sub(o);
        let fn_count = b.saturating_sub(o);
        let tn = (n as i128 - a as i128 - b as i128 + o as i128).max(0) as u64;

        Self::from_counts(tp, fp, fn_count, tn)
    }

    fn ratio_columns(&self) -> [f64; 13] {
        [
            self.precision,
            self.recall,
            self.specificity,
            self.npv,
            self.accuracy,
            self.balanced_accuracy,
            self.f1,
            self.mcc,
            self.tpr,
            self.fpr,
            self.fnr,
            self.plr,
            self.nlr,
        ]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClassificationStats {
    pub rows_written: u64,
    pub rows_skipped: u64,
}

/// Derive the classification table from an overlap TSV stream.
///
/// The header line is consumed; malformed data rows are skipped with a
/// warning, never fatal.
pub fn derive_classification_table<R: BufRead, W: Write>(
    input: R,
    output: W,
) -> Result<ClassificationStats> {
    let mut writer = std::io::BufWriter::new(output);
    writeln!(writer, "{CLASSIFICATION_HEADER}")?;

    let mut stats = ClassificationStats::default();
    for (line_number, line) in input.lines().enumerate() {
        let line = line?;
        if line_number == 0 || line.is_empty() {
            continue;
        }

        let Some(row) = OverlapRow::parse_tsv(&line) else {
            warn!(line = line_number + 1, "skipping malformed overlap row");
            stats.rows_skipped += 1;
            continue;
        };

        let metrics = ConfusionMetrics::from_overlap(&row);
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            row.to_tsv(),
            metrics.true_positives,
            metrics.false_positives,
            metrics.false_negatives,
            metrics.true_negatives
        )?;
        for value in metrics.ratio_columns() {
            write!(writer, "\t{value:.6}")?;
        }
        writeln!(writer)?;
        stats.rows_written += 1;
    }

    writer.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_predictor() {
        let m = ConfusionMetrics::from_counts(10, 0, 0, 90);
        assert_relative_eq!(m.precision, 1.0);
        assert_relative_eq!(m.recall, 1.0);
        assert_relative_eq!(m.f1, 1.0);
        assert_relative_eq!(m.mcc, 1.0);
        assert_relative_eq!(m.accuracy, 1.0);
        assert!(m.plr.is_infinite() && m.plr > 0.0);
        assert_relative_eq!(m.nlr, 0.0);
    }

    #[test]
    fn all_zero_counts_yield_zero_not_nan() {
        let m = ConfusionMetrics::from_counts(0, 0, 0, 0);
        assert_eq!(m.total, 0);
        for value in m.ratio_columns() {
            assert!(!value.is_nan());
        }
        assert_relative_eq!(m.f1, 0.0);
        assert_relative_eq!(m.mcc, 0.0);
        // Zero numerator with zero denominator stays at the default.
        assert_relative_eq!(m.plr, 0.0);
        assert_relative_eq!(m.nlr, 0.0);
    }

    #[test]
    fn likelihood_ratios_preserve_infinity_sentinel() {
        // FP = 0 and TN > 0: FPR = 0 with TPR > 0, so PLR is +inf.
        let m = ConfusionMetrics::from_counts(5, 0, 5, 10);
        assert!(m.plr.is_infinite() && m.plr > 0.0);

        // Specificity = 0 with FNR > 0: NLR is +inf.
        let m = ConfusionMetrics::from_counts(1, 3, 2, 0);
        assert!(m.nlr.is_infinite() && m.nlr > 0.0);
    }

    #[test]
    fn inclusion_exclusion_from_overlap() {
        let row = OverlapRow {
            three_hop: "A|p|F|B|p|F|C|p|F|A".to_string(),
            three_hop_count: 6,
            one_hop: "A|q|F|A".to_string(),
            one_hop_count: 4,
            overlap: 3,
            total_possible: 20,
        };
        let m = ConfusionMetrics::from_overlap(&row);
        assert_eq!(m.true_positives, 3);
        assert_eq!(m.false_positives, 3);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.true_negatives, 13);
        assert_eq!(
            m.true_positives + m.false_positives + m.false_negatives + m.true_negatives,
            row.total_possible
        );
    }

    #[test]
    fn inconsistent_counts_clamp_to_zero() {
        // Overlap larger than either side: inconsistent input, clamped.
        let row = OverlapRow {
            three_hop: "x".to_string(),
            three_hop_count: 1,
            one_hop: "y".to_string(),
            one_hop_count: 1,
            overlap: 5,
            total_possible: 2,
        };
        let m = ConfusionMetrics::from_overlap(&row);
        assert_eq!(m.false_positives, 0);
        assert_eq!(m.false_negatives, 0);
        assert_eq!(m.true_negatives, 5);
    }

    #[test]
    fn classification_table_skips_malformed_rows() {
        let input = format!(
            "{}\n{}\ngarbage line\n",
            crate::overlap::OVERLAP_HEADER,
            "A|p|F|B|p|F|C|p|F|A\t6\tA|q|F|A\t4\t3\t20"
        );
        let mut output = Vec::new();
        let stats =
            derive_classification_table(std::io::Cursor::new(input), &mut output).unwrap();

        assert_eq!(stats.rows_written, 1);
        assert_eq!(stats.rows_skipped, 1);

        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CLASSIFICATION_HEADER));
        let data = lines.next().unwrap();
        assert!(data.starts_with("A|p|F|B|p|F|C|p|F|A\t6\t"));
        assert!(data.contains("\t3\t3\t1\t13\t"));
    }
}
