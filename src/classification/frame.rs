//! Classification of a single frame from its node mappings.

use tracing::debug;

use super::{FrameClassification, LabelSet, ResMatch, NO_MATCH};
use crate::records::TEXT_SOURCE;
use crate::{Error, NodeMapping, Result, TrackRecord};

/// Build the classification table of one frame.
///
/// Each mapping record is one matched pair occupying the same slot on both
/// sides: `gt_labels[i]`/`res_labels[i]` with `gt_match[i] == Some(i)` and
/// `res_match[i] == {i}`. Every ground-truth track alive at `time` that no
/// record refers to is then appended, in ground-truth order, with
/// [`NO_MATCH`] so the scorer counts it as a false negative.
///
/// Two records naming the same ground-truth label produce two slots holding
/// that label; they are not merged into one slot with two result matches.
/// The table can then hold more ground-truth slots than there are tracks
/// alive at `time`.
///
/// # Arguments
/// * `mappings` - Mapping records of this frame, in input order
/// * `ground_truth` - All ground-truth tracks
/// * `time` - The frame
/// * `scratch` - Reusable set; cleared on entry and grown only to fit the
///   largest ground-truth label alive at `time`
///
/// # Errors
/// [`Error::Consistency`] if a record belongs to another frame, there are
/// more records than ground-truth tracks alive at `time`, or a record names
/// a ground-truth label that is not alive at `time`.
pub fn classify_frame(
    mappings: &[NodeMapping],
    ground_truth: &[TrackRecord],
    time: i32,
    scratch: &mut LabelSet,
) -> Result<FrameClassification> {
    let inconsistent = |detail: String| Error::Consistency {
        file: TEXT_SOURCE.to_string(),
        time,
        detail,
    };

    let (active_count, max_active_label) = ground_truth
        .iter()
        .filter(|t| t.is_active_at(time))
        .fold((0usize, 0usize), |(count, max), t| {
            (count + 1, max.max(usize::try_from(t.id).unwrap_or(0)))
        });
    if mappings.len() > active_count {
        return Err(inconsistent(format!(
            "{} mapping records but only {} ground-truth tracks are alive",
            mappings.len(),
            active_count
        )));
    }

    let mut level = FrameClassification {
        time,
        gt_labels: Vec::with_capacity(active_count),
        res_labels: Vec::with_capacity(mappings.len()),
        gt_match: Vec::with_capacity(active_count),
        res_match: Vec::with_capacity(mappings.len()),
    };

    scratch.ensure_max_label(max_active_label);
    scratch.clear();
    let mut distinct_mapped = 0usize;
    for (i, m) in mappings.iter().enumerate() {
        if m.time != time {
            return Err(inconsistent(format!(
                "record '{} {} {}' belongs to time {}",
                m.result_id, m.time, m.ground_truth_id, m.time
            )));
        }
        let label = usize::try_from(m.ground_truth_id).map_err(|_| {
            inconsistent(format!(
                "record '{} {} {}' names a negative ground-truth label",
                m.result_id, m.time, m.ground_truth_id
            ))
        })?;

        // Anything the scratch cannot hold is above every alive label
        let newly_mapped = scratch.insert(label).ok_or_else(|| {
            inconsistent(format!("mapped ground-truth label {} is not alive", label))
        })?;
        if newly_mapped {
            distinct_mapped += 1;
        }

        level.gt_labels.push(m.ground_truth_id);
        level.res_labels.push(m.result_id);
        level.gt_match.push(Some(i));
        level.res_match.push(ResMatch::Single(i));
    }

    let mut active_mapped = 0usize;
    for track in ground_truth.iter().filter(|t| t.is_active_at(time)) {
        let observed = usize::try_from(track.id).is_ok_and(|label| scratch.contains(label));
        if observed {
            active_mapped += 1;
        } else {
            level.gt_labels.push(track.id);
            level.gt_match.push(NO_MATCH);
        }
    }

    if active_mapped < distinct_mapped {
        let offending = mappings
            .iter()
            .find(|m| {
                !ground_truth
                    .iter()
                    .any(|t| t.id == m.ground_truth_id && t.is_active_at(time))
            })
            .map(|m| m.ground_truth_id);
        return Err(inconsistent(match offending {
            Some(label) => format!("mapped ground-truth label {} is not alive", label),
            None => format!(
                "{} mapped ground-truth labels but {} alive tracks matched",
                distinct_mapped, active_mapped
            ),
        }));
    }

    debug!(
        time,
        mapped = mappings.len(),
        unmatched_gt = level.gt_labels.len() - mappings.len(),
        "classified frame"
    );

    Ok(level)
}
