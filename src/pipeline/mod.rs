// End-to-end runs
// file -> raw onsets -> filtered onsets -> serialized result

pub mod analyze;
pub mod beatmap;

pub use analyze::{analyze_clip, analyze_file, detect_combined, onset_report, DetectionOutcome};
pub use beatmap::{run_beatmap, stream_onsets, BeatmapOutcome};

use std::path::Path;

use crate::error::OnsetError;

/// Fail with `MissingInputFile` before any work is done
pub fn ensure_input_exists(path: &Path) -> Result<(), OnsetError> {
    if path.exists() {
        Ok(())
    } else {
        Err(OnsetError::MissingInputFile(path.to_path_buf()))
    }
}
