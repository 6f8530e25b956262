//! Penalty weights and evaluation options.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Penalty weights of the AOGM measure.
///
/// Each weight is the cost of one graph edit operation. The default is the
/// Cell Tracking Challenge preset used for the TRA measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    /// Splitting operations (NS).
    pub split: f64,
    /// False negative vertices (FN).
    pub false_negative: f64,
    /// False positive vertices (FP).
    pub false_positive: f64,
    /// Redundant edges to be deleted (ED).
    pub edge_delete: f64,
    /// Edges to be added (EA).
    pub edge_add: f64,
    /// Edges with wrong semantics (EC).
    pub wrong_semantics: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self::cell_tracking_challenge()
    }
}

impl PenaltyConfig {
    /// Create a configuration from explicit weights.
    pub fn new(
        split: f64,
        false_negative: f64,
        false_positive: f64,
        edge_delete: f64,
        edge_add: f64,
        wrong_semantics: f64,
    ) -> Self {
        Self {
            split,
            false_negative,
            false_positive,
            edge_delete,
            edge_add,
            wrong_semantics,
        }
    }

    /// The Cell Tracking Challenge weights `(5, 10, 1, 1, 1.5, 1)`.
    pub fn cell_tracking_challenge() -> Self {
        Self::new(5.0, 10.0, 1.0, 1.0, 1.5, 1.0)
    }

    /// Weights in `[ns, fn, fp, ed, ea, ec]` order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.split,
            self.false_negative,
            self.false_positive,
            self.edge_delete,
            self.edge_add,
            self.wrong_semantics,
        ]
    }

    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        const NAMES: [&str; 6] = [
            "split",
            "false_negative",
            "false_positive",
            "edge_delete",
            "edge_add",
            "wrong_semantics",
        ];
        for (name, value) in NAMES.iter().zip(self.as_array()) {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "penalty '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// AOGM of building a graph with the given node and edge counts from an
    /// empty graph: every node is a false negative and every edge is added.
    pub fn aogm_empty(&self, node_count: u64, edge_count: u64) -> f64 {
        node_count as f64 * self.false_negative + edge_count as f64 * self.edge_add
    }

    /// Parse and validate a JSON configuration. Missing weights take their
    /// preset value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to read penalty config '{}': {}",
                    path.as_ref().display(),
                    e
                ),
            ))
        })?;
        Self::from_json_str(&content)
    }
}

/// Reporting switches forwarded to the metric engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Check consistency of both the result and ground-truth data.
    pub consistency_check: bool,
    /// Collect per-category reports of tracking errors.
    pub log_reports: bool,
    /// Report which result segment maps onto which ground-truth segment.
    pub matching_reports: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_ctc_preset() {
        let p = PenaltyConfig::default();
        assert_eq!(p.as_array(), [5.0, 10.0, 1.0, 1.0, 1.5, 1.0]);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_aogm_empty() {
        let p = PenaltyConfig::default();
        assert_eq!(p.aogm_empty(5, 4), 5.0 * 10.0 + 4.0 * 1.5);
        assert_eq!(p.aogm_empty(0, 0), 0.0);
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let mut p = PenaltyConfig::default();
        p.edge_add = -1.0;
        assert!(matches!(p.validate(), Err(Error::InvalidConfig(_))));

        p.edge_add = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let p = PenaltyConfig::from_json_str(r#"{"wrong_semantics": 1.35}"#).unwrap();
        assert_eq!(p.wrong_semantics, 1.35);
        assert_eq!(p.false_negative, 10.0);

        assert!(PenaltyConfig::from_json_str(r#"{"split": -5}"#).is_err());
        assert!(matches!(
            PenaltyConfig::from_json_str("{not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"split": 5, "false_negative": 10, "false_positive": 1, "edge_delete": 1, "edge_add": 1.5, "wrong_semantics": 1.35}}"#
        )
        .unwrap();
        let p = PenaltyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(p, PenaltyConfig::new(5.0, 10.0, 1.0, 1.0, 1.5, 1.35));
    }

    #[test]
    fn test_options_default_off() {
        let o: EvaluationOptions = serde_json::from_str(r#"{"log_reports": true}"#).unwrap();
        assert!(o.log_reports);
        assert!(!o.consistency_check);
        assert!(!o.matching_reports);
    }
}
