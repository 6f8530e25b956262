//! AOGM evaluation of result tracks against ground truth via node mappings.

use std::path::Path;

use tracing::debug;

use crate::classification::build_classification_with;
use crate::engine::{EngineInput, EngineReport, ForkDetector, ForkSet, MetricEngine, ParentLinkForkDetector};
use crate::records::{self, TEXT_SOURCE};
use crate::{
    tra_score, Error, EvaluationOptions, FrameClassification, GroundTruthCache, LabelSet,
    NodeMapping, PenaltyConfig, Result, TrackRecord,
};

/// State derived from one result set. Rebuilt from scratch by every
/// evaluation.
#[derive(Debug, Clone)]
pub struct BatchRunState {
    /// Parsed result tracks.
    pub results: Vec<TrackRecord>,
    /// Per-frame tables ordered by increasing time.
    pub levels: Vec<FrameClassification>,
    /// Forks of the result tracks.
    pub result_forks: ForkSet,
    /// What the metric engine returned.
    pub report: EngineReport,
}

/// Scores many result sets against one cached ground truth.
///
/// The ground truth is parsed and its forks detected once; each
/// [`calculate`](Self::calculate) call only parses and classifies the
/// result set. One calculator must not be shared between threads; give each
/// worker its own calculator over the same [`GroundTruthCache`].
pub struct BatchCalculator<'a, E: MetricEngine> {
    cache: &'a GroundTruthCache,
    engine: E,
    penalty: PenaltyConfig,
    options: EvaluationOptions,
    fork_detector: Box<dyn ForkDetector>,
    scratch: LabelSet,
    aogm_empty: f64,
    last_run: Option<BatchRunState>,
}

impl<'a, E: MetricEngine> BatchCalculator<'a, E> {
    /// Create a calculator.
    ///
    /// # Arguments
    /// * `cache` - Ground truth shared by every evaluation
    /// * `engine` - Scorer invoked once per evaluation
    /// * `penalty` - Weights passed to the engine and used for TRA
    pub fn new(cache: &'a GroundTruthCache, engine: E, penalty: PenaltyConfig) -> Result<Self> {
        penalty.validate()?;
        Ok(Self {
            cache,
            engine,
            penalty,
            options: EvaluationOptions::default(),
            fork_detector: Box::new(ParentLinkForkDetector),
            scratch: cache.new_scratch(),
            aogm_empty: cache.aogm_empty(&penalty),
            last_run: None,
        })
    }

    /// Set the reporting options passed to the engine.
    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the fork detector used for result tracks.
    pub fn with_fork_detector(mut self, detector: Box<dyn ForkDetector>) -> Self {
        self.fork_detector = detector;
        self
    }

    /// Compute the AOGM of one result set given as text.
    ///
    /// # Arguments
    /// * `result_tracks` - `id start end parent` records
    /// * `mapping` - `resId time gtId` records
    pub fn calculate(&mut self, result_tracks: &str, mapping: &str) -> Result<f64> {
        self.last_run = None;
        let results = records::parse_track_records(result_tracks)?;
        let mappings = records::parse_node_mappings(mapping)?;
        Ok(self.evaluate(results, mappings, TEXT_SOURCE)?.aogm)
    }

    /// Compute the AOGM of one result set stored in files.
    pub fn calculate_files<P1: AsRef<Path>, P2: AsRef<Path>>(
        &mut self,
        result_tracks: P1,
        mapping: P2,
    ) -> Result<f64> {
        Ok(self.calculate_files_report(result_tracks, mapping)?.aogm)
    }

    /// Like [`calculate_files`](Self::calculate_files) but returns the full
    /// engine report.
    pub fn calculate_files_report<P1: AsRef<Path>, P2: AsRef<Path>>(
        &mut self,
        result_tracks: P1,
        mapping: P2,
    ) -> Result<EngineReport> {
        self.last_run = None;
        let results = records::load_track_file(result_tracks)?;
        let mappings = records::load_node_mapping_file(mapping.as_ref())?;
        self.evaluate(results, mappings, &mapping.as_ref().display().to_string())
    }

    /// Evaluate parsed records.
    ///
    /// # Errors
    /// [`Error::EmptyMapping`] if `mappings` is empty, consistency errors
    /// from classification, and any engine error. On error no run state is
    /// kept.
    pub fn evaluate(
        &mut self,
        results: Vec<TrackRecord>,
        mappings: Vec<NodeMapping>,
        mapping_source: &str,
    ) -> Result<EngineReport> {
        self.last_run = None;
        if mappings.is_empty() {
            return Err(Error::EmptyMapping {
                file: mapping_source.to_string(),
            });
        }

        let levels = build_classification_with(&mappings, self.cache.tracks(), &mut self.scratch)
            .map_err(|e| e.in_mapping_file(mapping_source))?;
        let result_forks = self.fork_detector.detect(&results);
        self.engine.reset_reports();

        let input = EngineInput {
            ground_truth: self.cache.tracks(),
            results: &results,
            levels: &levels,
            ground_truth_forks: self.cache.forks(),
            result_forks: &result_forks,
            penalty: &self.penalty,
            options: &self.options,
        };
        let report = self.engine.compute(&input)?;
        debug!(
            mapping = mapping_source,
            frames = levels.len(),
            aogm = report.aogm,
            "evaluated result set"
        );

        self.last_run = Some(BatchRunState {
            results,
            levels,
            result_forks,
            report,
        });
        Ok(report)
    }

    /// Ground-truth node count.
    pub fn gt_node_count(&self) -> u64 {
        self.cache.node_count()
    }

    /// Ground-truth edge count.
    pub fn gt_edge_count(&self) -> u64 {
        self.cache.edge_count()
    }

    /// AOGM of building the ground truth from nothing with this
    /// calculator's penalties.
    pub fn aogm_empty(&self) -> f64 {
        self.aogm_empty
    }

    /// TRA for an AOGM computed by this calculator.
    pub fn tra(&self, aogm: f64) -> f64 {
        tra_score(aogm, self.aogm_empty)
    }

    pub fn cache(&self) -> &GroundTruthCache {
        self.cache
    }

    pub fn penalty(&self) -> &PenaltyConfig {
        &self.penalty
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// State of the latest successful evaluation.
    pub fn last_run(&self) -> Option<&BatchRunState> {
        self.last_run.as_ref()
    }
}

/// Everything needed to score one result set, built without a long-lived
/// cache.
#[derive(Debug, Clone)]
pub struct MappedTrackData {
    pub ground_truth: GroundTruthCache,
    pub results: Vec<TrackRecord>,
    pub levels: Vec<FrameClassification>,
    pub result_forks: ForkSet,
}

impl MappedTrackData {
    /// Build from text inputs.
    ///
    /// The mapping is validated before the ground truth.
    pub fn from_text(ground_truth: &str, result_tracks: &str, mapping: &str) -> Result<Self> {
        let mappings = records::parse_node_mappings(mapping)?;
        if mappings.is_empty() {
            return Err(Error::EmptyMapping {
                file: TEXT_SOURCE.to_string(),
            });
        }
        let ground_truth = GroundTruthCache::load(ground_truth)?;
        let results = records::parse_track_records(result_tracks)?;
        Self::build(ground_truth, results, &mappings, TEXT_SOURCE)
    }

    /// Build from track and mapping files.
    pub fn load<P1, P2, P3>(ground_truth: P1, result_tracks: P2, mapping: P3) -> Result<Self>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let mappings = records::load_node_mapping_file(mapping.as_ref())?;
        if mappings.is_empty() {
            return Err(Error::EmptyMapping {
                file: mapping.as_ref().display().to_string(),
            });
        }
        let ground_truth = GroundTruthCache::load_file(ground_truth)?;
        let results = records::load_track_file(result_tracks)?;
        Self::build(ground_truth, results, &mappings, &mapping.as_ref().display().to_string())
    }

    fn build(
        ground_truth: GroundTruthCache,
        results: Vec<TrackRecord>,
        mappings: &[NodeMapping],
        mapping_source: &str,
    ) -> Result<Self> {
        let mut scratch = ground_truth.new_scratch();
        let levels = build_classification_with(mappings, ground_truth.tracks(), &mut scratch)
            .map_err(|e| e.in_mapping_file(mapping_source))?;
        let result_forks = ParentLinkForkDetector.detect(&results);
        Ok(Self {
            ground_truth,
            results,
            levels,
            result_forks,
        })
    }

    /// Engine input borrowing this data.
    pub fn input<'a>(&'a self, penalty: &'a PenaltyConfig, options: &'a EvaluationOptions) -> EngineInput<'a> {
        EngineInput {
            ground_truth: self.ground_truth.tracks(),
            results: &self.results,
            levels: &self.levels,
            ground_truth_forks: self.ground_truth.forks(),
            result_forks: &self.result_forks,
            penalty,
            options,
        }
    }

    /// Score with the given engine.
    pub fn evaluate<E: MetricEngine>(
        &self,
        engine: &mut E,
        penalty: &PenaltyConfig,
        options: &EvaluationOptions,
    ) -> Result<EngineReport> {
        penalty.validate()?;
        engine.reset_reports();
        engine.compute(&self.input(penalty, options))
    }
}
