use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::audio::block::AudioBlock;
use crate::audio::engine::SaturationEngine;
use crate::params::{ParameterSnapshot, ParameterStore, SaturatorParams};
use crate::state;

pub const PLUGIN_NAME: &str = "CanvasClipper";

/// Stream geometry the host announces before processing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessConfig {
    pub sample_rate: usize,
    pub block_size: usize,
    pub channels: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 128,
            channels: 2,
        }
    }
}

/// Main bus channel sets a host may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSet {
    Disabled,
    Mono,
    Stereo,
    Discrete(usize),
}

impl ChannelSet {
    pub const fn from_count(channels: usize) -> Self {
        match channels {
            0 => Self::Disabled,
            1 => Self::Mono,
            2 => Self::Stereo,
            n => Self::Discrete(n),
        }
    }

    pub const fn channels(self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Discrete(n) => n,
        }
    }
}

/// Mono or stereo output, fed by the same layout on the input.
pub fn is_layout_supported(input: ChannelSet, output: ChannelSet) -> bool {
    matches!(output, ChannelSet::Mono | ChannelSet::Stereo) && input == output
}

/// Host-facing wrapper tying the parameter store to the engine.
///
/// The store is shared with the control side through [`Processor::parameters`];
/// everything else belongs to the audio thread.
pub struct Processor {
    store: Arc<ParameterStore>,
    params: SaturatorParams,
    engine: SaturationEngine,
}

impl Processor {
    pub fn new() -> Result<Self> {
        let (store, params) =
            SaturatorParams::new_store().context("failed to declare saturator parameters")?;
        info!("{PLUGIN_NAME} created with {} parameters", store.len());

        Ok(Self {
            store: Arc::new(store),
            params,
            engine: SaturationEngine::new(),
        })
    }

    pub fn parameters(&self) -> Arc<ParameterStore> {
        Arc::clone(&self.store)
    }

    pub const fn handles(&self) -> &SaturatorParams {
        &self.params
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.params.snapshot(&self.store)
    }

    pub fn prepare(&mut self, config: ProcessConfig) -> Result<()> {
        self.engine
            .prepare(config.sample_rate, config.block_size, config.channels)
            .context("failed to prepare saturation engine")
    }

    pub fn release_resources(&mut self) {
        self.engine.reset();
    }

    /// Snapshot the parameters and run one block through the engine.
    pub fn process(&mut self, block: &mut AudioBlock<'_, '_>) {
        let snapshot = self.params.snapshot(&self.store);
        self.engine.process(block, &snapshot);
    }

    /// Frames of delay the current oversampling setting adds.
    pub fn latency_samples(&self) -> usize {
        self.engine.latency(self.snapshot().oversampling)
    }

    /// Process whole signals offline, one `block_size` block at a time.
    ///
    /// The last block is zero padded and the resampler delay is flushed and
    /// trimmed, so every output frame lines up with its input frame.
    pub fn render(&mut self, channels: &mut [Vec<f32>], block_size: usize) -> Result<()> {
        let block_size = block_size.max(1);
        self.engine
            .update_buffer_size(block_size)
            .context("failed to size oversampling buffers for rendering")?;
        self.engine.reset();

        let frames = channels.first().map_or(0, Vec::len);
        let latency = self.latency_samples();
        let mut buffers = vec![vec![0.0f32; block_size]; channels.len()];

        for start in (0..frames + latency).step_by(block_size) {
            for (buffer, channel) in buffers.iter_mut().zip(channels.iter()) {
                let remaining = channel.get(start..).unwrap_or_default();
                let available = remaining.len().min(buffer.len());
                buffer[..available].copy_from_slice(&remaining[..available]);
                buffer[available..].fill(0.0);
            }

            let mut views: Vec<&mut [f32]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
            let input_channels = views.len();
            let mut block = AudioBlock::new(&mut views, input_channels)?;
            self.process(&mut block);

            // frame `start + i` of the output belongs to input frame `start + i - latency`
            for (buffer, channel) in buffers.iter().zip(channels.iter_mut()) {
                for (i, &sample) in buffer.iter().enumerate() {
                    if let Some(target) = (start + i).checked_sub(latency)
                        && let Some(slot) = channel.get_mut(target)
                    {
                        *slot = sample;
                    }
                }
            }
        }

        Ok(())
    }

    pub const fn oversampling_factor(&self) -> usize {
        self.engine.oversampling_factor()
    }

    pub const fn engine(&self) -> &SaturationEngine {
        &self.engine
    }

    pub fn export_state(&self) -> Result<Vec<u8>> {
        state::encode(self.store.export_all())
    }

    /// Restore a blob from [`Processor::export_state`].
    ///
    /// A blob that does not parse leaves every parameter untouched.
    pub fn import_state(&self, blob: &[u8]) -> Result<()> {
        let pairs = state::decode(blob)?;
        let total = pairs.len();
        let applied = self.store.import_all(pairs);
        info!("Restored {applied} of {total} parameters from state");
        Ok(())
    }

    // Fixed host queries.

    pub const fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub const fn accepts_midi(&self) -> bool {
        false
    }

    pub const fn produces_midi(&self) -> bool {
        false
    }

    pub const fn is_midi_effect(&self) -> bool {
        false
    }

    pub const fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    pub const fn num_programs(&self) -> usize {
        1
    }

    pub const fn current_program(&self) -> usize {
        0
    }

    pub const fn set_current_program(&mut self, _index: usize) {}

    pub const fn program_name(&self, _index: usize) -> &'static str {
        ""
    }

    pub const fn change_program_name(&mut self, _index: usize, _name: &str) {}
}
