// Block-based WAV reader for streaming onset detection
// Yields fixed-size mono blocks until the file is exhausted

use hound::WavReader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::ingest::{AudioError, SampleScale};

/// Streams a WAV file as hop-sized mono blocks
/// The file handle is released when the source is dropped
pub struct BlockSource {
    reader: WavReader<BufReader<File>>,
    scale: SampleScale,
    channels: usize,
    sample_rate: u32,
    block_size: usize,
    interleaved: Vec<f32>,
}

impl BlockSource {
    /// Open `path` for reading in blocks of `block_size` frames
    pub fn open(path: &Path, block_size: usize) -> Result<Self, AudioError> {
        if block_size == 0 {
            return Err(AudioError::InvalidData);
        }

        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let scale = SampleScale::from_spec(&spec)?;

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(AudioError::InvalidData);
        }

        Ok(BlockSource {
            reader,
            scale,
            channels: spec.channels as usize,
            sample_rate: spec.sample_rate,
            block_size,
            interleaved: Vec::with_capacity(block_size * spec.channels as usize),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Read the next block
    ///
    /// Returns the block (always `block_size` samples, zero-padded at the tail)
    /// and the number of frames actually read. Fewer frames than `block_size`
    /// means the stream is exhausted.
    pub fn read_block(&mut self) -> Result<(Vec<f32>, usize), AudioError> {
        let wanted = self.block_size * self.channels;
        self.interleaved.clear();

        match self.scale {
            SampleScale::Int(scale) => {
                for sample in self.reader.samples::<i32>().take(wanted) {
                    self.interleaved.push(sample? as f32 / scale);
                }
            }
            SampleScale::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    self.interleaved.push(sample?);
                }
            }
        }

        let frames_read = self.interleaved.len() / self.channels;
        let mut block: Vec<f32> = self
            .interleaved
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect();
        block.resize(self.block_size, 0.0);

        Ok((block, frames_read))
    }
}
