use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use rubato::{FftFixedInOut, ResampleError, Resampler};
use serde::{Deserialize, Serialize};

use crate::audio::block::AudioBlock;

#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Oversampling {
    #[default]
    None,
    #[value(name = "2x")]
    #[serde(rename = "2x")]
    X2,
    #[value(name = "4x")]
    #[serde(rename = "4x")]
    X4,
}

impl std::fmt::Display for Oversampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::X2 => write!(f, "2x"),
            Self::X4 => write!(f, "4x"),
        }
    }
}

impl Oversampling {
    pub const CHOICES: &'static [&'static str] = &["None", "2x", "4x"];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::X2),
            2 => Some(Self::X4),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn factor(self) -> usize {
        match self {
            Self::None => 1,
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }
}

/// Up/down sampler pair for running the nonlinear section at a higher rate.
///
/// All buffers are allocated up front; the processing methods only copy and
/// resample into them.
pub struct Samplers {
    upsampler: FftFixedInOut<f32>,
    downsampler: FftFixedInOut<f32>,
    input_buffer: Vec<Vec<f32>>,
    upsampled_buffer: Vec<Vec<f32>>,
    downsampled_buffer: Vec<Vec<f32>>,
    oversample_factor: usize,
    sample_rate: usize,
}

impl Samplers {
    pub fn new(
        buffer_size: usize,
        oversample_factor: usize,
        sample_rate: usize,
        channels: usize,
    ) -> Result<Self> {
        let (upsampler, downsampler) =
            build_resamplers(buffer_size, oversample_factor, sample_rate, channels)?;

        let input_buffer = vec![vec![0.0; buffer_size]; channels];
        let upsampled_buffer = upsampler.output_buffer_allocate(true);
        let downsampled_buffer = downsampler.output_buffer_allocate(true);

        Ok(Self {
            upsampler,
            downsampler,
            input_buffer,
            upsampled_buffer,
            downsampled_buffer,
            oversample_factor,
            sample_rate,
        })
    }

    pub const fn oversample_factor(&self) -> usize {
        self.oversample_factor
    }

    pub fn buffer_size(&self) -> usize {
        self.input_buffer.first().map_or(0, Vec::len)
    }

    pub fn channels(&self) -> usize {
        self.input_buffer.len()
    }

    /// Combined delay of the resampler pair, in base-rate frames.
    pub fn latency(&self) -> usize {
        let factor = self.oversample_factor.max(1);
        let upsampler_delay = (self.upsampler.output_delay() + factor / 2) / factor;
        upsampler_delay + self.downsampler.output_delay()
    }

    /// Whether a block of this geometry can go through the resamplers.
    pub fn accepts(&self, len: usize, input_channels: usize) -> bool {
        len == self.buffer_size() && input_channels <= self.channels()
    }

    /// Copy the block's input channels in; unused resampler channels get silence.
    pub fn load_input(&mut self, block: &mut AudioBlock<'_, '_>) {
        let mut inputs = block.inputs_mut();
        for buffer in &mut self.input_buffer {
            match inputs.next() {
                Some(channel) if channel.len() == buffer.len() => buffer.copy_from_slice(channel),
                _ => buffer.fill(0.0),
            }
        }
    }

    pub fn upsample(&mut self) -> Result<usize, ResampleError> {
        let (_, upsampled_frames) =
            self.upsampler
                .process_into_buffer(&self.input_buffer, &mut self.upsampled_buffer, None)?;
        Ok(upsampled_frames)
    }

    /// The upsampled signal, one buffer per resampler channel.
    pub fn upsampled_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.upsampled_buffer.iter_mut().map(Vec::as_mut_slice)
    }

    pub fn downsample(&mut self) -> Result<usize, ResampleError> {
        let (_, downsampled_frames) = self.downsampler.process_into_buffer(
            &self.upsampled_buffer,
            &mut self.downsampled_buffer,
            None,
        )?;
        Ok(downsampled_frames)
    }

    /// Copy the downsampled signal back over the block's input channels.
    pub fn store_output(&self, block: &mut AudioBlock<'_, '_>) {
        for (channel, downsampled) in block.inputs_mut().zip(&self.downsampled_buffer) {
            let n = channel.len().min(downsampled.len());
            channel[..n].copy_from_slice(&downsampled[..n]);
        }
    }

    /// Drop the filter history, e.g. when the transport restarts.
    pub fn reset(&mut self) {
        self.upsampler.reset();
        self.downsampler.reset();
    }

    pub fn resize_buffers(&mut self, new_size: usize) -> Result<()> {
        if self.buffer_size() == new_size {
            return Ok(());
        }

        info!(
            "Resizing {}x oversampling buffers from {} to {}",
            self.oversample_factor,
            self.buffer_size(),
            new_size
        );

        let (upsampler, downsampler) = build_resamplers(
            new_size,
            self.oversample_factor,
            self.sample_rate,
            self.channels(),
        )?;

        for buffer in &mut self.input_buffer {
            buffer.resize(new_size, 0.0);
        }
        self.upsampled_buffer = upsampler.output_buffer_allocate(true);
        self.downsampled_buffer = downsampler.output_buffer_allocate(true);
        self.upsampler = upsampler;
        self.downsampler = downsampler;

        Ok(())
    }
}

fn build_resamplers(
    buffer_size: usize,
    oversample_factor: usize,
    sample_rate: usize,
    channels: usize,
) -> Result<(FftFixedInOut<f32>, FftFixedInOut<f32>)> {
    let upsampler = FftFixedInOut::new(
        sample_rate,
        sample_rate * oversample_factor,
        buffer_size,
        channels,
    )
    .context("failed to create upsampler")?;

    let downsampler = FftFixedInOut::new(
        sample_rate * oversample_factor,
        sample_rate,
        buffer_size * oversample_factor,
        channels,
    )
    .context("failed to create downsampler")?;

    if upsampler.input_frames_next() != buffer_size
        || downsampler.output_frames_next() != buffer_size
    {
        anyhow::bail!(
            "block size {buffer_size} is not supported for {oversample_factor}x oversampling at {sample_rate} Hz"
        );
    }

    Ok((upsampler, downsampler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversampling_factors() {
        assert_eq!(Oversampling::None.factor(), 1);
        assert_eq!(Oversampling::X2.factor(), 2);
        assert_eq!(Oversampling::X4.factor(), 4);
        assert_eq!(Oversampling::from_index(2), Some(Oversampling::X4));
        assert_eq!(Oversampling::from_index(3), None);
        assert_eq!(Oversampling::X2.to_string(), "2x");
    }

    #[test]
    fn test_samplers_geometry() {
        let samplers = Samplers::new(128, 4, 48_000, 2).unwrap();
        assert_eq!(samplers.buffer_size(), 128);
        assert_eq!(samplers.channels(), 2);
        assert_eq!(samplers.oversample_factor(), 4);
        assert!(samplers.accepts(128, 2));
        assert!(samplers.accepts(128, 1));
        assert!(!samplers.accepts(64, 2));
        assert!(!samplers.accepts(128, 3));
    }

    #[test]
    fn test_upsampled_length() {
        let mut samplers = Samplers::new(128, 2, 48_000, 1).unwrap();
        let frames = samplers.upsample().unwrap();
        assert_eq!(frames, 256);
        assert_eq!(samplers.downsample().unwrap(), 128);
    }

    #[test]
    fn test_latency_is_reported() {
        let samplers = Samplers::new(256, 2, 48_000, 1).unwrap();
        assert!(samplers.latency() > 0);
        assert!(samplers.latency() <= 2 * 256);
    }

    #[test]
    fn test_resize_buffers() {
        let mut samplers = Samplers::new(128, 2, 48_000, 1).unwrap();
        samplers.resize_buffers(256).unwrap();
        assert_eq!(samplers.buffer_size(), 256);
        assert_eq!(samplers.upsample().unwrap(), 512);
    }
}
