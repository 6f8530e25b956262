//! Ground-truth track cache shared by every evaluation of a batch.

use std::path::Path;

use tracing::info;

use crate::engine::{ForkDetector, ForkSet, ParentLinkForkDetector};
use crate::records::{self, TEXT_SOURCE};
use crate::{Error, LabelSet, PenaltyConfig, Result, TrackRecord};

/// TRA score: `max(0, 1 - aogm / aogm_empty)`.
pub fn tra_score(aogm: f64, aogm_empty: f64) -> f64 {
    (1.0 - aogm / aogm_empty).max(0.0)
}

/// Parsed ground-truth tracks and their baseline edit statistics.
///
/// Read-only after loading, so one cache can back any number of
/// calculators.
#[derive(Debug, Clone)]
pub struct GroundTruthCache {
    source: String,
    tracks: Vec<TrackRecord>,
    forks: ForkSet,
    edge_units: u64,
    parent_link_count: u64,
    max_label: usize,
}

impl GroundTruthCache {
    /// Parse ground-truth tracks from text.
    pub fn load(text: &str) -> Result<Self> {
        Self::from_records(records::parse_track_records(text)?, TEXT_SOURCE)
    }

    /// Load a ground-truth track file (e.g. `TRA/man_track.txt`).
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let tracks = records::load_track_file(path.as_ref())?;
        Self::from_records(tracks, &path.as_ref().display().to_string())
    }

    /// Build the cache from parsed tracks, using parent links for forks.
    pub fn from_records(tracks: Vec<TrackRecord>, source: &str) -> Result<Self> {
        Self::with_fork_detector(tracks, source, &ParentLinkForkDetector)
    }

    /// Build the cache from parsed tracks with a custom fork detector.
    ///
    /// # Errors
    /// [`Error::EmptyGroundTruth`] if `tracks` is empty.
    pub fn with_fork_detector(
        tracks: Vec<TrackRecord>,
        source: &str,
        detector: &dyn ForkDetector,
    ) -> Result<Self> {
        if tracks.is_empty() {
            return Err(Error::EmptyGroundTruth {
                file: source.to_string(),
            });
        }

        let mut edge_units = 0u64;
        let mut parent_link_count = 0u64;
        for t in &tracks {
            if t.end_frame < t.start_frame {
                return Err(Error::Consistency {
                    file: source.to_string(),
                    time: t.start_frame,
                    detail: format!("track {} ends at {} before it starts", t.id, t.end_frame),
                });
            }
            edge_units += t.edge_units() as u64;
            if t.has_parent() {
                parent_link_count += 1;
            }
        }

        let max_label = tracks
            .iter()
            .filter_map(|t| usize::try_from(t.id).ok())
            .max()
            .unwrap_or(1);
        let forks = detector.detect(&tracks);

        let cache = Self {
            source: source.to_string(),
            tracks,
            forks,
            edge_units,
            parent_link_count,
            max_label,
        };
        info!(
            source = %cache.source,
            tracks = cache.tracks.len(),
            nodes = cache.node_count(),
            edges = cache.edge_count(),
            "loaded ground truth"
        );
        Ok(cache)
    }

    /// File the tracks were loaded from, or `<text>`.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    pub fn forks(&self) -> &ForkSet {
        &self.forks
    }

    /// Frame-to-frame links within tracks: `sum(end - start)`.
    pub fn edge_units(&self) -> u64 {
        self.edge_units
    }

    /// Tracks with a parent.
    pub fn parent_link_count(&self) -> u64 {
        self.parent_link_count
    }

    /// Ground-truth nodes: one per track per frame.
    pub fn node_count(&self) -> u64 {
        self.edge_units + self.tracks.len() as u64
    }

    /// Ground-truth edges: in-track links plus parent links.
    pub fn edge_count(&self) -> u64 {
        self.edge_units + self.parent_link_count
    }

    /// Largest non-negative ground-truth label.
    pub fn max_label(&self) -> usize {
        self.max_label
    }

    /// A scratch set able to hold every ground-truth label.
    pub fn new_scratch(&self) -> LabelSet {
        LabelSet::with_max_label(self.max_label)
    }

    /// AOGM of building this ground truth from nothing.
    pub fn aogm_empty(&self, penalty: &PenaltyConfig) -> f64 {
        penalty.aogm_empty(self.node_count(), self.edge_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node() {
        let cache = GroundTruthCache::load("5 0 0 0").unwrap();
        assert_eq!(cache.node_count(), 1);
        assert_eq!(cache.edge_count(), 0);
        assert_eq!(cache.max_label(), 5);
        assert!(cache.forks().is_empty());
    }

    #[test]
    fn test_counts_with_parent() {
        let cache = GroundTruthCache::load("1 0 2 0\n2 1 2 1").unwrap();
        assert_eq!(cache.edge_units(), 3);
        assert_eq!(cache.node_count(), 5);
        assert_eq!(cache.parent_link_count(), 1);
        assert_eq!(cache.edge_count(), 4);
        assert_eq!(cache.forks().len(), 1);
    }

    #[test]
    fn test_aogm_empty_and_tra() {
        let cache = GroundTruthCache::load("1 0 2 0\n2 1 2 1").unwrap();
        let aogme = cache.aogm_empty(&PenaltyConfig::default());
        assert_eq!(aogme, 5.0 * 10.0 + 4.0 * 1.5);

        assert_eq!(tra_score(0.0, aogme), 1.0);
        assert_eq!(tra_score(aogme * 2.0, aogme), 0.0);
        assert!((tra_score(28.0, aogme) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_ground_truth() {
        assert!(matches!(
            GroundTruthCache::load(""),
            Err(Error::EmptyGroundTruth { .. })
        ));
    }

    #[test]
    fn test_track_ending_before_start() {
        assert!(matches!(
            GroundTruthCache::load("1 4 2 0"),
            Err(Error::Consistency { time: 4, .. })
        ));
    }

    #[test]
    fn test_load_file_missing() {
        assert!(matches!(
            GroundTruthCache::load_file("/nonexistent/man_track.txt"),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn test_scratch_sized_to_labels() {
        let cache = GroundTruthCache::load("10 0 1 0\n12 2 5 10\n44 1 1 0").unwrap();
        let scratch = cache.new_scratch();
        assert!(scratch.max_label() >= 44);
        assert!(scratch.is_empty());
    }
}
