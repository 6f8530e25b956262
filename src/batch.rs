//! Batch evaluation of a folder of result sets against one ground truth.
//!
//! A result folder holds pairs of files:
//!
//! - `<name>.txt` - result tracks (`id start end parent`)
//! - `<name>.map.txt` - node mapping (`resId time gtId`)
//!
//! Failures of single result sets are recorded and the batch continues.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::engine::{ErrorCounts, MetricEngine};
use crate::{BatchCalculator, Error, PenaltyConfig, Result};

const MAPPING_SUFFIX: &str = ".map.txt";
const TRACKS_SUFFIX: &str = ".txt";

/// A node-mapping file and the result track file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPair {
    /// File name of the result tracks.
    pub name: String,
    pub tracks: PathBuf,
    pub mapping: PathBuf,
}

/// List every `<name>.map.txt` in `dir` with its `<name>.txt` sibling,
/// sorted by name. The track file is not required to exist.
pub fn discover_result_pairs<P: AsRef<Path>>(dir: P) -> Result<Vec<ResultPair>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to list result folder '{}': {}", dir.display(), e),
        ))
    })?;

    let mut pairs = Vec::new();
    for entry in entries {
        let mapping = entry?.path();
        let Some(file_name) = mapping.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = file_name.strip_suffix(MAPPING_SUFFIX) else {
            continue;
        };
        let name = format!("{}{}", stem, TRACKS_SUFFIX);
        pairs.push(ResultPair {
            tracks: mapping.with_file_name(&name),
            name,
            mapping,
        });
    }
    pairs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pairs)
}

/// Scores of one result set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredResult {
    pub aogm: f64,
    pub tra: f64,
    pub counts: Option<ErrorCounts>,
}

/// Outcome of one result set of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub outcome: Result<ScoredResult>,
}

/// Minimum, mean and maximum of a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ScoreStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, mean, max })
    }
}

/// Statistics over the successfully scored items of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub count: usize,
    pub aogm: ScoreStats,
    pub tra: ScoreStats,
}

/// Results of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub ground_truth: String,
    pub ground_truth_nodes: u64,
    pub ground_truth_edges: u64,
    pub penalty: PenaltyConfig,
    pub aogm_empty: f64,
    pub items: Vec<BatchItem>,
    /// Mapping files without a readable track file.
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    /// Items that were scored.
    pub fn scored(&self) -> impl Iterator<Item = (&str, &ScoredResult)> + '_ {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().ok().map(|s| (item.name.as_str(), s)))
    }

    /// Items that failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> + '_ {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().err().map(|e| (item.name.as_str(), e)))
    }

    /// Summary over scored items, `None` if nothing was scored.
    pub fn summary(&self) -> Option<BatchSummary> {
        let (aogm, tra): (Vec<f64>, Vec<f64>) = self.scored().map(|(_, s)| (s.aogm, s.tra)).unzip();
        Some(BatchSummary {
            count: aogm.len(),
            aogm: ScoreStats::from_values(&aogm)?,
            tra: ScoreStats::from_values(&tra)?,
        })
    }
}

impl<E: MetricEngine> BatchCalculator<'_, E> {
    /// Score every result pair found in `dir`.
    ///
    /// Only failing to list the folder aborts the batch; a result set that
    /// cannot be scored is recorded in the report.
    pub fn run_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<BatchReport> {
        let pairs = discover_result_pairs(dir.as_ref())?;
        Ok(self.run_pairs(&pairs))
    }

    /// Score the given result pairs in order.
    pub fn run_pairs(&mut self, pairs: &[ResultPair]) -> BatchReport {
        let mut items = Vec::with_capacity(pairs.len());
        let mut skipped = Vec::new();

        for pair in pairs {
            if !pair.tracks.is_file() {
                warn!(
                    mapping = %pair.mapping.display(),
                    tracks = %pair.tracks.display(),
                    "mapping file is missing its track file"
                );
                skipped.push(pair.mapping.clone());
                continue;
            }

            let outcome = self
                .calculate_files_report(&pair.tracks, &pair.mapping)
                .map(|report| ScoredResult {
                    aogm: report.aogm,
                    tra: self.tra(report.aogm),
                    counts: report.counts,
                });
            if let Err(e) = &outcome {
                warn!(name = %pair.name, error = %e, "failed to score result set");
            }
            items.push(BatchItem {
                name: pair.name.clone(),
                outcome,
            });
        }

        let report = BatchReport {
            ground_truth: self.cache().source().to_string(),
            ground_truth_nodes: self.gt_node_count(),
            ground_truth_edges: self.gt_edge_count(),
            penalty: *self.penalty(),
            aogm_empty: self.aogm_empty(),
            items,
            skipped,
        };
        match report.summary() {
            Some(s) => {
                info!(
                    n = s.count,
                    aogm_min = s.aogm.min,
                    aogm_mean = s.aogm.mean,
                    aogm_max = s.aogm.max,
                    tra_min = s.tra.min,
                    tra_mean = s.tra.mean,
                    tra_max = s.tra.max,
                    "batch complete"
                );
            }
            None => info!(n = 0, "batch complete"),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discover_pairs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "1 0 0 0\n").unwrap();
        fs::write(dir.path().join("b.map.txt"), "1 0 5\n").unwrap();
        fs::write(dir.path().join("a.map.txt"), "1 0 5\n").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();

        let pairs = discover_result_pairs(dir.path()).unwrap();
        let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(pairs[1].tracks, dir.path().join("b.txt"));
        assert_eq!(pairs[1].mapping, dir.path().join("b.map.txt"));
    }

    #[test]
    fn test_discover_missing_dir() {
        assert!(discover_result_pairs("/nonexistent/results").is_err());
    }

    #[test]
    fn test_score_stats() {
        let stats = ScoreStats::from_values(&[2.0, 4.0, 9.0]).unwrap();
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.mean, 5.0);
        assert!(ScoreStats::from_values(&[]).is_none());
    }
}
