// Streaming onset detection over ./results.wav, written to ./results.beatmap.txt

use clap::Parser;
use std::process::ExitCode;

use fretmark::{init_logging, run_beatmap, BeatmapConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of notes the exercise expects
    #[arg(default_value_t = 14, allow_negative_numbers = true)]
    expected_notes: i64,

    /// Minimum detector hops between kept onsets
    #[arg(default_value_t = 30, allow_negative_numbers = true)]
    min_wait_frames: i64,
}

impl Args {
    fn beatmap_config(&self) -> BeatmapConfig {
        BeatmapConfig {
            expected_notes: self.expected_notes,
            min_wait_frames: self.min_wait_frames,
            ..BeatmapConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = args.beatmap_config();

    match run_beatmap(&config) {
        Ok(outcome) => {
            println!(
                "\nDetected {} onsets (expected: {})",
                outcome.onsets.len(),
                config.expected_notes
            );
            println!("Onset times: {:?}", outcome.onsets);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
