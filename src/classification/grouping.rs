//! Grouping of a node mapping into per-frame runs.

use std::borrow::Cow;

use super::{classify_frame, FrameClassification, LabelSet};
use crate::records::TEXT_SOURCE;
use crate::{Error, NodeMapping, Result, TrackRecord};

/// Classify every frame of a node mapping.
///
/// Records are ordered by time (stable, so records of one frame keep their
/// input order) and each maximal run sharing a time is classified once. The
/// output is ordered by strictly increasing time.
///
/// # Errors
/// [`Error::EmptyMapping`] for an empty mapping, otherwise any error of
/// [`classify_frame`].
pub fn build_classification(
    mappings: &[NodeMapping],
    ground_truth: &[TrackRecord],
) -> Result<Vec<FrameClassification>> {
    let max_label = ground_truth
        .iter()
        .filter_map(|t| usize::try_from(t.id).ok())
        .max()
        .unwrap_or(1);
    let mut scratch = LabelSet::with_max_label(max_label);
    build_classification_with(mappings, ground_truth, &mut scratch)
}

/// [`build_classification`] using a caller-owned scratch set.
pub fn build_classification_with(
    mappings: &[NodeMapping],
    ground_truth: &[TrackRecord],
    scratch: &mut LabelSet,
) -> Result<Vec<FrameClassification>> {
    if mappings.is_empty() {
        return Err(Error::EmptyMapping {
            file: TEXT_SOURCE.to_string(),
        });
    }

    // Mapping files are usually written in time order already
    let sorted: Cow<'_, [NodeMapping]> = if mappings.windows(2).all(|w| w[0].time <= w[1].time) {
        Cow::Borrowed(mappings)
    } else {
        let mut owned = mappings.to_vec();
        owned.sort_by_key(|m| m.time);
        Cow::Owned(owned)
    };

    sorted
        .chunk_by(|a, b| a.time == b.time)
        .map(|run| classify_frame(run, ground_truth, run[0].time, scratch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::NO_MATCH;
    use crate::records::{parse_node_mappings, parse_track_records};

    #[test]
    fn test_empty_mapping() {
        let gt = vec![TrackRecord::new(1, 0, 0, 0)];
        assert!(matches!(
            build_classification(&[], &gt),
            Err(Error::EmptyMapping { .. })
        ));
    }

    #[test]
    fn test_groups_unsorted_records_by_time() {
        let gt = parse_track_records("10 0 1 0\n12 2 5 10\n44 1 1 0").unwrap();
        let maps = parse_node_mappings("1 2 12\n1 0 10\n2 3 12\n1 1 10").unwrap();

        let levels = build_classification(&maps, &gt).unwrap();
        let times: Vec<i32> = levels.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![0, 1, 2, 3]);

        assert_eq!(levels[1].gt_labels, vec![10, 44]);
        assert_eq!(levels[1].gt_match, vec![Some(0), NO_MATCH]);
        assert_eq!(levels[3].res_labels, vec![2]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let gt = parse_track_records("1 0 3 0\n2 0 3 0").unwrap();
        let maps = parse_node_mappings("9 1 2\n5 0 1\n8 1 1").unwrap();

        let levels = build_classification(&maps, &gt).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].res_labels, vec![9, 8]);
        assert_eq!(levels[1].gt_labels, vec![2, 1]);
    }

    #[test]
    fn test_frame_error_aborts() {
        let gt = parse_track_records("1 0 0 0").unwrap();
        let maps = parse_node_mappings("1 0 1\n1 1 1").unwrap();
        assert!(matches!(
            build_classification(&maps, &gt),
            Err(Error::Consistency { time: 1, .. })
        ));
    }
}
