//! # ctc-aogm - mapped AOGM/TRA tracking evaluation
//!
//! Computes the inputs of the Cell Tracking Challenge AOGM tracking measure
//! from an explicit mapping between result node IDs and ground-truth node
//! IDs, instead of from the overlap of label masks.
//!
//! ## Features
//!
//! - Parsers for CTC track files (`id start end parent`) and node-mapping
//!   files (`resId time gtId`)
//! - Per-frame label classification tables equivalent to a mask-overlap
//!   classifier
//! - A ground-truth cache and batch calculator that score many result sets
//!   against the same ground truth
//! - TRA normalisation against the cost of building the ground truth from
//!   an empty graph
//!
//! The penalty-weighted scoring itself is delegated to a [`MetricEngine`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use ctc_aogm::{BatchCalculator, GroundTruthCache, PenaltyConfig};
//!
//! let cache = GroundTruthCache::load_file("TRA/man_track.txt")?;
//! let mut calc = BatchCalculator::new(&cache, engine, PenaltyConfig::default())?;
//! let aogm = calc.calculate_files("res_track.txt", "res_track.map.txt")?;
//! println!("AOGM={} TRA={}", aogm, calc.tra(aogm));
//! ```

pub mod records;
pub mod classification;
pub mod config;
pub mod engine;
pub mod ground_truth;
pub mod calculator;
pub mod batch;

// Re-exports for convenience
pub use records::{NodeMapping, TrackRecord};
pub use classification::{build_classification, classify_frame, FrameClassification, LabelSet, ResMatch, NO_MATCH};
pub use config::{EvaluationOptions, PenaltyConfig};
pub use engine::{EngineInput, EngineReport, ErrorCounts, ForkDetector, ForkSet, MetricEngine, ParentLinkForkDetector};
pub use ground_truth::{tra_score, GroundTruthCache};
pub use calculator::{BatchCalculator, BatchRunState, MappedTrackData};
pub use batch::{discover_result_pairs, BatchItem, BatchReport, BatchSummary, ResultPair, ScoreStats, ScoredResult};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while building or scoring mapped track data
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Malformed record in {file} at line {line_number} ('{line}'): {reason}")]
        MalformedRecord {
            file: String,
            line_number: usize,
            line: String,
            reason: String,
        },

        #[error("No reference (GT) track was found in {file}")]
        EmptyGroundTruth { file: String },

        #[error("No result to GT mapping was found in {file}")]
        EmptyMapping { file: String },

        #[error("Inconsistent mapping and ground truth in {file} at time {time}: {detail}")]
        Consistency {
            file: String,
            time: i32,
            detail: String,
        },

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Metric engine error: {0}")]
        Engine(String),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),
    }

    impl Error {
        /// Attribute a mapping error to `file`.
        ///
        /// Replaces the file of [`Error::Consistency`] and
        /// [`Error::EmptyMapping`]; other errors are returned unchanged.
        pub fn in_mapping_file(self, file: &str) -> Self {
            match self {
                Error::Consistency { time, detail, .. } => Error::Consistency {
                    file: file.to_string(),
                    time,
                    detail,
                },
                Error::EmptyMapping { .. } => Error::EmptyMapping {
                    file: file.to_string(),
                },
                other => other,
            }
        }
    }

    /// Result type for ctc-aogm operations
    pub type Result<T> = std::result::Result<T, Error>;
}
