use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use crate::labels::LabelSet;

const HEADER_FIRST_FIELD: &str = "TRACK_ID";
const PATH_COLUMN: usize = 3;
const TAGS_COLUMN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub mel_path: PathBuf,
    /// Active label indices, ascending.
    pub labels: Vec<usize>,
}

/// Parses a tab-separated split file:
/// `TRACK_ID ARTIST_ID ALBUM_ID PATH DURATION TAG...`.
///
/// The mel spectrogram of a track is `<mel_root>/<PATH>` with an `.npy`
/// extension. Tags outside the active label set are ignored.
pub fn read_manifest<R: BufRead>(
    reader: R,
    labels: &LabelSet,
    mel_root: &Path,
) -> io::Result<Vec<Track>> {
    let mut tracks = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields[0] == HEADER_FIRST_FIELD {
            continue;
        }

        if fields.len() < TAGS_COLUMN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "line {}: expected at least {} columns, found {}",
                    line_no + 1,
                    TAGS_COLUMN,
                    fields.len()
                ),
            ));
        }

        let mut track_labels: Vec<usize> = fields[TAGS_COLUMN..]
            .iter()
            .filter_map(|tag| labels.index_of(tag))
            .collect();
        track_labels.sort_unstable();
        track_labels.dedup();

        tracks.push(Track {
            id: fields[0].to_string(),
            mel_path: mel_root.join(fields[PATH_COLUMN]).with_extension("npy"),
            labels: track_labels,
        });
    }

    Ok(tracks)
}
