//! Per-frame label classification.
//!
//! A mask-overlap classifier produces, for every frame, the ground-truth
//! labels and result labels present in that frame and the matches between
//! them. This module builds the same tables from a node mapping:
//!
//! - `FrameClassification` - the classification table of one frame
//! - `classify_frame` - build one table from the mappings of a single frame
//! - `build_classification` - group a full mapping by frame and classify each
//! - `LabelSet` - reusable scratch set of observed ground-truth labels

mod frame;
mod grouping;
mod label_set;

use std::collections::btree_set;
use std::collections::BTreeSet;

use crate::records::TEXT_SOURCE;
use crate::{Error, Result};

pub use frame::classify_frame;
pub use grouping::{build_classification, build_classification_with};
pub use label_set::LabelSet;

/// Value of a [`FrameClassification::gt_match`] entry whose ground-truth
/// label has no matching result label.
pub const NO_MATCH: Option<usize> = None;

/// Ground-truth indices matched by one result label.
///
/// Nearly every slot holds a single index, but a result label may match
/// zero or several ground-truth labels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResMatch {
    #[default]
    Empty,
    Single(usize),
    Multi(BTreeSet<usize>),
}

impl ResMatch {
    pub fn len(&self) -> usize {
        match self {
            ResMatch::Empty => 0,
            ResMatch::Single(_) => 1,
            ResMatch::Multi(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        match self {
            ResMatch::Empty => false,
            ResMatch::Single(v) => *v == index,
            ResMatch::Multi(set) => set.contains(&index),
        }
    }

    /// Add an index, promoting the slot to the next variant when needed.
    ///
    /// Returns `false` if the index was already present.
    pub fn insert(&mut self, index: usize) -> bool {
        match self {
            ResMatch::Empty => {
                *self = ResMatch::Single(index);
                true
            }
            ResMatch::Single(v) if *v == index => false,
            ResMatch::Single(v) => {
                let set: BTreeSet<usize> = [*v, index].into_iter().collect();
                *self = ResMatch::Multi(set);
                true
            }
            ResMatch::Multi(set) => set.insert(index),
        }
    }

    /// Iterate the indices in ascending order.
    pub fn iter(&self) -> ResMatchIter<'_> {
        match self {
            ResMatch::Empty => ResMatchIter::Single(None),
            ResMatch::Single(v) => ResMatchIter::Single(Some(*v)),
            ResMatch::Multi(set) => ResMatchIter::Multi(set.iter()),
        }
    }
}

impl FromIterator<usize> for ResMatch {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut slot = ResMatch::Empty;
        for index in iter {
            slot.insert(index);
        }
        slot
    }
}

/// Iterator over the indices of a [`ResMatch`].
#[derive(Debug, Clone)]
pub enum ResMatchIter<'a> {
    Single(Option<usize>),
    Multi(btree_set::Iter<'a, usize>),
}

impl Iterator for ResMatchIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            ResMatchIter::Single(v) => v.take(),
            ResMatchIter::Multi(it) => it.next().copied(),
        }
    }
}

impl<'a> IntoIterator for &'a ResMatch {
    type Item = usize;
    type IntoIter = ResMatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Classification table of the labels present in one frame.
///
/// `gt_match[i]` is the index into `res_labels` matched by `gt_labels[i]`,
/// and `res_match[j]` holds the indices into `gt_labels` matched by
/// `res_labels[j]`. Labels built from a node mapping occupy the same slot on
/// both sides; unmapped ground-truth labels follow them with
/// [`NO_MATCH`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameClassification {
    /// Frame index.
    pub time: i32,
    /// Ground-truth labels present in the frame.
    pub gt_labels: Vec<i32>,
    /// Result labels present in the frame.
    pub res_labels: Vec<i32>,
    /// Matching result index for each ground-truth label.
    pub gt_match: Vec<Option<usize>>,
    /// Matching ground-truth indices for each result label.
    pub res_match: Vec<ResMatch>,
}

impl FrameClassification {
    /// Create an empty table for a frame.
    pub fn new(time: i32) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// Ground-truth labels with no matching result label.
    pub fn unmatched_gt_labels(&self) -> impl Iterator<Item = i32> + '_ {
        self.gt_labels
            .iter()
            .zip(&self.gt_match)
            .filter(|(_, m)| m.is_none())
            .map(|(&label, _)| label)
    }

    /// Check the table shape and that every match index points at a valid
    /// slot on the other side.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |detail: String| Error::Consistency {
            file: TEXT_SOURCE.to_string(),
            time: self.time,
            detail,
        };

        if self.gt_match.len() != self.gt_labels.len() {
            return Err(inconsistent(format!(
                "{} ground-truth matches for {} ground-truth labels",
                self.gt_match.len(),
                self.gt_labels.len()
            )));
        }
        if self.res_match.len() != self.res_labels.len() {
            return Err(inconsistent(format!(
                "{} result matches for {} result labels",
                self.res_match.len(),
                self.res_labels.len()
            )));
        }
        for (i, m) in self.gt_match.iter().enumerate() {
            if let Some(j) = *m {
                if j >= self.res_labels.len() {
                    return Err(inconsistent(format!(
                        "ground-truth label {} matches result index {} out of {}",
                        self.gt_labels[i],
                        j,
                        self.res_labels.len()
                    )));
                }
            }
        }
        for (j, slot) in self.res_match.iter().enumerate() {
            if let Some(i) = slot.iter().find(|&i| i >= self.gt_labels.len()) {
                return Err(inconsistent(format!(
                    "result label {} matches ground-truth index {} out of {}",
                    self.res_labels[j],
                    i,
                    self.gt_labels.len()
                )));
            }
        }
        Ok(())
    }
}
