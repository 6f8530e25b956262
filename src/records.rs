//! Parsers for Cell Tracking Challenge track files and node-mapping files.
//!
//! Both formats are line-oriented with single-space separated integers:
//!
//! ```text
//! # track file: id start end parent
//! 1 0 2 0
//! 2 3 5 1
//!
//! # node mapping: result_id time ground_truth_id
//! 1 0 10
//! 1 1 10
//! ```
//!
//! Parsing preserves input order and never deduplicates. An empty input is
//! a valid empty sequence; callers decide whether that is acceptable.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Error, Result};

/// Source name used in errors for input that did not come from a file.
pub const TEXT_SOURCE: &str = "<text>";

/// One track record: `id start end parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackRecord {
    /// Track label.
    pub id: i32,
    /// First frame the label exists in (inclusive).
    pub start_frame: i32,
    /// Last frame the label exists in (inclusive).
    pub end_frame: i32,
    /// Label of the track this one split from, or [`TrackRecord::NO_PARENT`].
    pub parent_id: i32,
}

impl TrackRecord {
    /// Parent value for a root track.
    pub const NO_PARENT: i32 = 0;

    pub fn new(id: i32, start_frame: i32, end_frame: i32, parent_id: i32) -> Self {
        Self {
            id,
            start_frame,
            end_frame,
            parent_id,
        }
    }

    /// True if the track exists at `time`.
    #[inline]
    pub fn is_active_at(&self, time: i32) -> bool {
        self.start_frame <= time && time <= self.end_frame
    }

    /// True if the parent field references another track.
    #[inline]
    pub fn has_parent(&self) -> bool {
        self.parent_id > Self::NO_PARENT
    }

    /// Number of frame-to-frame links inside the track.
    #[inline]
    pub fn edge_units(&self) -> i64 {
        i64::from(self.end_frame) - i64::from(self.start_frame)
    }
}

/// One node mapping: the result label `result_id` at `time` corresponds to
/// the ground-truth label `ground_truth_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeMapping {
    pub result_id: i32,
    pub time: i32,
    pub ground_truth_id: i32,
}

impl NodeMapping {
    pub fn new(result_id: i32, time: i32, ground_truth_id: i32) -> Self {
        Self {
            result_id,
            time,
            ground_truth_id,
        }
    }
}

/// Split a line into exactly `N` integer fields.
fn parse_fields<const N: usize>(
    line: &str,
    line_number: usize,
    source: &str,
    layout: &str,
) -> Result<[i32; N]> {
    let malformed = |reason: String| Error::MalformedRecord {
        file: source.to_string(),
        line_number,
        line: line.to_string(),
        reason,
    };

    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() != N {
        return Err(malformed(format!(
            "expected {} fields [{}], found {}",
            N,
            layout,
            parts.len()
        )));
    }

    let mut fields = [0i32; N];
    for (field, part) in fields.iter_mut().zip(parts) {
        *field = part
            .parse()
            .map_err(|e| malformed(format!("field '{}' is not an integer: {}", part, e)))?;
    }
    Ok(fields)
}

/// Parse track records from a reader.
///
/// # Arguments
/// * `reader` - Line source
/// * `source` - File identity reported in errors
pub fn read_track_records<R: BufRead>(reader: R, source: &str) -> Result<Vec<TrackRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let [id, start, end, parent] = parse_fields::<4>(&line, idx + 1, source, "id start end parent")?;
        records.push(TrackRecord::new(id, start, end, parent));
    }
    Ok(records)
}

/// Parse node mappings from a reader.
///
/// # Arguments
/// * `reader` - Line source
/// * `source` - File identity reported in errors
pub fn read_node_mappings<R: BufRead>(reader: R, source: &str) -> Result<Vec<NodeMapping>> {
    let mut mappings = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let [result_id, time, gt_id] = parse_fields::<3>(&line, idx + 1, source, "resId time gtId")?;
        mappings.push(NodeMapping::new(result_id, time, gt_id));
    }
    Ok(mappings)
}

/// Parse track records from in-memory text.
pub fn parse_track_records(text: &str) -> Result<Vec<TrackRecord>> {
    read_track_records(text.as_bytes(), TEXT_SOURCE)
}

/// Parse node mappings from in-memory text.
pub fn parse_node_mappings(text: &str) -> Result<Vec<NodeMapping>> {
    read_node_mappings(text.as_bytes(), TEXT_SOURCE)
}

fn open<P: AsRef<Path>>(path: P, kind: &str) -> Result<(BufReader<File>, String)> {
    let name = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to open {} file '{}': {}", kind, name, e),
        ))
    })?;
    Ok((BufReader::new(file), name))
}

/// Load a track file (`id start end parent` records).
pub fn load_track_file<P: AsRef<Path>>(path: P) -> Result<Vec<TrackRecord>> {
    let (reader, name) = open(path, "track")?;
    read_track_records(reader, &name)
}

/// Load a node-mapping file (`resId time gtId` records).
pub fn load_node_mapping_file<P: AsRef<Path>>(path: P) -> Result<Vec<NodeMapping>> {
    let (reader, name) = open(path, "node mapping")?;
    read_node_mappings(reader, &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_node_mappings() {
        assert!(parse_node_mappings("").unwrap().is_empty());

        let list = parse_node_mappings("0 1 2\n3 5 7\n").unwrap();
        assert_eq!(list, vec![NodeMapping::new(0, 1, 2), NodeMapping::new(3, 5, 7)]);
    }

    #[test]
    fn test_parse_node_mappings_malformed() {
        for text in ["0\n", "0 1\n", "0 a 2\n", "0 1 2 3\n", "0  1 2\n"] {
            let err = parse_node_mappings(text).unwrap_err();
            assert!(
                matches!(err, Error::MalformedRecord { .. }),
                "expected malformed record for {:?}, got {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_parse_track_records() {
        assert!(parse_track_records("").unwrap().is_empty());

        let list = parse_track_records("0 1 2 0\n3 5 7 2\n").unwrap();
        assert_eq!(
            list,
            vec![TrackRecord::new(0, 1, 2, 0), TrackRecord::new(3, 5, 7, 2)]
        );
    }

    #[test]
    fn test_parse_track_records_malformed() {
        for text in ["0\n", "0 1\n", "0 1 2\n", "0 a 2 3\n", "0 1 2 3 4\n"] {
            assert!(parse_track_records(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_malformed_error_context() {
        let err = parse_track_records("1 0 2 0\n2 x 5 1\n").unwrap_err();
        match err {
            Error::MalformedRecord {
                file,
                line_number,
                line,
                ..
            } => {
                assert_eq!(file, TEXT_SOURCE);
                assert_eq!(line_number, 2);
                assert_eq!(line, "2 x 5 1");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_input_order_preserved() {
        let list = parse_node_mappings("2 5 12\n1 0 10\n2 5 12\n").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], list[2]);
        assert_eq!(list[1].time, 0);
    }

    #[test]
    fn test_load_files() {
        let mut tracks = NamedTempFile::new().unwrap();
        writeln!(tracks, "10 0 1 0").unwrap();
        writeln!(tracks, "12 2 5 10").unwrap();
        let mut map = NamedTempFile::new().unwrap();
        writeln!(map, "1 0 10").unwrap();

        let records = load_track_file(tracks.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].has_parent());
        assert_eq!(load_node_mapping_file(map.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_load_reports_path() {
        let mut map = NamedTempFile::new().unwrap();
        writeln!(map, "1 0").unwrap();
        let err = load_node_mapping_file(map.path()).unwrap_err();
        assert!(err.to_string().contains(&map.path().display().to_string()));

        assert!(matches!(
            load_track_file("/nonexistent/man_track.txt"),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn test_track_helpers() {
        let t = TrackRecord::new(2, 1, 2, 1);
        assert!(t.is_active_at(1));
        assert!(t.is_active_at(2));
        assert!(!t.is_active_at(0));
        assert!(!t.is_active_at(3));
        assert_eq!(t.edge_units(), 1);
        assert!(!TrackRecord::new(5, 0, 0, 0).has_parent());
    }
}
