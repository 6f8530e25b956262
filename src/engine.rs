//! Seams to the external scoring collaborators.
//!
//! The penalty-weighted AOGM computation and fork detection are provided by
//! the caller. This module defines what they receive and return.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{EvaluationOptions, FrameClassification, PenaltyConfig, Result, TrackRecord};

/// Tracks that have child tracks, keyed by parent label.
pub type ForkSet = BTreeMap<i32, BTreeSet<i32>>;

/// Everything the metric engine needs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub ground_truth: &'a [TrackRecord],
    pub results: &'a [TrackRecord],
    /// Per-frame tables ordered by increasing time.
    pub levels: &'a [FrameClassification],
    pub ground_truth_forks: &'a ForkSet,
    pub result_forks: &'a ForkSet,
    pub penalty: &'a PenaltyConfig,
    pub options: &'a EvaluationOptions,
}

/// Number of edit operations of each kind found by the metric engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub split: usize,
    pub false_negative: usize,
    pub false_positive: usize,
    pub edge_delete: usize,
    pub edge_add: usize,
    pub wrong_semantics: usize,
}

impl ErrorCounts {
    /// Weighted sum of the counts.
    pub fn weighted(&self, penalty: &PenaltyConfig) -> f64 {
        self.split as f64 * penalty.split
            + self.false_negative as f64 * penalty.false_negative
            + self.false_positive as f64 * penalty.false_positive
            + self.edge_delete as f64 * penalty.edge_delete
            + self.edge_add as f64 * penalty.edge_add
            + self.wrong_semantics as f64 * penalty.wrong_semantics
    }
}

/// Result of one metric engine evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineReport {
    pub aogm: f64,
    /// Per-category counts, when the engine was asked for reports.
    pub counts: Option<ErrorCounts>,
}

impl EngineReport {
    pub fn new(aogm: f64) -> Self {
        Self { aogm, counts: None }
    }
}

/// Penalty-weighted AOGM scorer.
///
/// Implementations may keep diagnostic reports between calls; they are
/// reset before every evaluation.
pub trait MetricEngine {
    /// Discard reports collected by a previous evaluation.
    fn reset_reports(&mut self);

    /// Score the result tracks against the ground truth.
    fn compute(&mut self, input: &EngineInput<'_>) -> Result<EngineReport>;
}

impl<E: MetricEngine + ?Sized> MetricEngine for Box<E> {
    fn reset_reports(&mut self) {
        (**self).reset_reports()
    }

    fn compute(&mut self, input: &EngineInput<'_>) -> Result<EngineReport> {
        (**self).compute(input)
    }
}

impl<E: MetricEngine + ?Sized> MetricEngine for &mut E {
    fn reset_reports(&mut self) {
        (**self).reset_reports()
    }

    fn compute(&mut self, input: &EngineInput<'_>) -> Result<EngineReport> {
        (**self).compute(input)
    }
}

/// Detects tracks that split into child tracks.
pub trait ForkDetector: Send + Sync {
    fn detect(&self, tracks: &[TrackRecord]) -> ForkSet;
}

/// Fork detector that follows the parent field of every track.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentLinkForkDetector;

impl ForkDetector for ParentLinkForkDetector {
    fn detect(&self, tracks: &[TrackRecord]) -> ForkSet {
        let mut forks = ForkSet::new();
        for track in tracks.iter().filter(|t| t.has_parent()) {
            forks.entry(track.parent_id).or_default().insert(track.id);
        }
        forks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_link_forks() {
        let tracks = vec![
            TrackRecord::new(1, 0, 2, 0),
            TrackRecord::new(2, 3, 5, 1),
            TrackRecord::new(3, 3, 4, 1),
            TrackRecord::new(4, 5, 6, 3),
        ];
        let forks = ParentLinkForkDetector.detect(&tracks);
        assert_eq!(forks.len(), 2);
        assert_eq!(forks[&1], BTreeSet::from([2, 3]));
        assert_eq!(forks[&3], BTreeSet::from([4]));
    }

    #[test]
    fn test_no_forks_without_parents() {
        let tracks = vec![TrackRecord::new(5, 0, 0, 0)];
        assert!(ParentLinkForkDetector.detect(&tracks).is_empty());
    }

    #[test]
    fn test_weighted_counts() {
        let counts = ErrorCounts {
            false_negative: 1,
            wrong_semantics: 2,
            ..ErrorCounts::default()
        };
        let penalty = PenaltyConfig::new(5.0, 10.0, 1.0, 1.0, 1.5, 1.35);
        assert!((counts.weighted(&penalty) - 12.7).abs() < 1e-12);
    }
}
