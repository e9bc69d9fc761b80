// Audio ingestion module
// Reads WAV files, extracts metadata, and normalizes audio samples

use hound::{SampleFormat, WavReader, WavSpec};
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid audio data")]
    InvalidData,
}

/// How raw WAV samples map onto the normalized [-1.0, 1.0] range
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SampleScale {
    /// Integer PCM, divided by 2^(bits - 1)
    Int(f32),

    /// 32-bit float, used as-is
    Float,
}

impl SampleScale {
    pub(crate) fn from_spec(spec: &WavSpec) -> Result<Self, AudioError> {
        match (spec.sample_format, spec.bits_per_sample) {
            // hound already re-centers unsigned 8-bit PCM around zero
            (SampleFormat::Int, 8) => Ok(SampleScale::Int(128.0)),
            (SampleFormat::Int, 16) => Ok(SampleScale::Int(32768.0)),
            (SampleFormat::Int, 24) => Ok(SampleScale::Int(8388608.0)),
            (SampleFormat::Int, 32) => Ok(SampleScale::Int(2147483648.0)),
            (SampleFormat::Float, 32) => Ok(SampleScale::Float),
            (format, bits) => Err(AudioError::UnsupportedFormat(format!(
                "{:?} bit {}-bit audio",
                format, bits
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples normalized to f32 in range [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Bit depth of original audio (8, 16, 24, 32)
    pub bit_depth: u16,

    /// Duration in milliseconds
    pub duration_ms: i64,

    /// Total number of frames (samples / channels)
    pub frame_count: usize,
}

impl AudioData {
    /// Get duration in seconds as f64
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Mono view of the recording used by the detectors
    pub fn to_clip(&self) -> AudioClip {
        AudioClip {
            samples: self.to_mono(),
            sample_rate: self.sample_rate,
        }
    }
}

/// Mono recording handed to the onset and beat detectors
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioClip {
            samples,
            sample_rate,
        }
    }
}

/// Ingest a WAV file from raw bytes
/// Returns AudioData with normalized samples and metadata
pub fn ingest_wav(data: &[u8]) -> Result<AudioData, AudioError> {
    let reader = WavReader::new(Cursor::new(data))?;
    decode(reader)
}

/// Load a WAV file from disk
pub fn load_wav(path: &Path) -> Result<AudioData, AudioError> {
    let reader = WavReader::open(path)?;
    decode(reader)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioData, AudioError> {
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;
    let bit_depth = spec.bits_per_sample;

    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::InvalidData);
    }

    // Read and normalize samples to f32 [-1.0, 1.0]
    let samples: Vec<f32> = match SampleScale::from_spec(&spec)? {
        SampleScale::Int(scale) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / scale))
            .collect::<Result<Vec<_>, _>>()?,
        SampleScale::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
    };

    let frame_count = samples.len() / channels as usize;

    // Calculate duration
    let duration_secs = frame_count as f64 / sample_rate as f64;
    let duration_ms = (duration_secs * 1000.0) as i64;

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        bit_depth,
        duration_ms,
        frame_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavWriter;

    fn wav_bytes(spec: WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_audio_data_to_mono() {
        // Create stereo audio: [L, R, L, R, L, R]
        let stereo = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let audio_data = AudioData {
            samples: stereo,
            sample_rate: 44100,
            channels: 2,
            bit_depth: 16,
            duration_ms: 1,
            frame_count: 3,
        };

        let mono = audio_data.to_mono();

        assert_eq!(mono.len(), 3);
        // Use approximate equality for floating point
        assert!((mono[0] - 0.15).abs() < 1e-6); // (0.1 + 0.2) / 2
        assert!((mono[1] - 0.35).abs() < 1e-6); // (0.3 + 0.4) / 2
        assert!((mono[2] - 0.55).abs() < 1e-6); // (0.5 + 0.6) / 2
    }

    #[test]
    fn test_audio_data_duration_secs() {
        let audio_data = AudioData {
            samples: vec![],
            sample_rate: 44100,
            channels: 1,
            bit_depth: 16,
            duration_ms: 5000,
            frame_count: 0,
        };

        assert_eq!(audio_data.duration_secs(), 5.0);
    }

    #[test]
    fn test_ingest_16bit_stereo() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[16384, -16384, 8192, 8192]);

        let audio = ingest_wav(&bytes).unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frame_count, 2);
        assert!((audio.samples[0] - 0.5).abs() < 1e-6);
        assert!((audio.samples[1] + 0.5).abs() < 1e-6);

        let clip = audio.to_clip();
        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(clip.samples.len(), 2);
        assert!(clip.samples[0].abs() < 1e-6);
        assert!((clip.samples[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_ingest_rejects_garbage() {
        let result = ingest_wav(b"definitely not a wav file");
        assert!(matches!(result, Err(AudioError::WavReadError(_))));
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 12,
            sample_format: SampleFormat::Int,
        };
        assert!(matches!(
            SampleScale::from_spec(&spec),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_wav_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        std::fs::write(&path, wav_bytes(spec, &[0; 22050])).unwrap();

        let audio = load_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.duration_ms, 1000);
    }
}
