use anyhow::{Context, Result};
use log::{debug, info};

use crate::audio::block::AudioBlock;
use crate::audio::samplers::{Oversampling, Samplers};
use crate::params::ParameterSnapshot;
use crate::saturator::stages::Stage;
use crate::saturator::{LevelStage, SaturationChain};

pub struct SaturationEngine {
    input_gain: LevelStage,
    chain: SaturationChain,
    output_gain: LevelStage,
    samplers_2x: Option<Samplers>,
    samplers_4x: Option<Samplers>,
    /// Rate the nonlinear section actually ran at for the last block.
    oversampling: Oversampling,
    fallback_blocks: u64,
}

impl Default for SaturationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturationEngine {
    pub fn new() -> Self {
        Self {
            input_gain: LevelStage::input(),
            chain: SaturationChain::new(),
            output_gain: LevelStage::output(),
            samplers_2x: None,
            samplers_4x: None,
            oversampling: Oversampling::None,
            fallback_blocks: 0,
        }
    }

    /// Build the oversampling resamplers for the host's stream geometry.
    ///
    /// This is the only place the engine allocates. Filter history from a
    /// previous stream is discarded.
    pub fn prepare(&mut self, sample_rate: usize, block_size: usize, channels: usize) -> Result<()> {
        info!(
            "Preparing saturation engine: {sample_rate} Hz, {block_size} frames, {channels} channels"
        );

        self.samplers_2x = Some(
            Samplers::new(block_size, Oversampling::X2.factor(), sample_rate, channels)
                .context("failed to create 2x samplers")?,
        );
        self.samplers_4x = Some(
            Samplers::new(block_size, Oversampling::X4.factor(), sample_rate, channels)
                .context("failed to create 4x samplers")?,
        );
        self.oversampling = Oversampling::None;
        self.fallback_blocks = 0;

        Ok(())
    }

    pub fn update_buffer_size(&mut self, new_size: usize) -> Result<()> {
        for samplers in [&mut self.samplers_2x, &mut self.samplers_4x]
            .into_iter()
            .flatten()
        {
            samplers.resize_buffers(new_size)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        debug!("Resetting saturation engine");
        for samplers in [&mut self.samplers_2x, &mut self.samplers_4x]
            .into_iter()
            .flatten()
        {
            samplers.reset();
        }
    }

    pub const fn is_prepared(&self) -> bool {
        self.samplers_2x.is_some() && self.samplers_4x.is_some()
    }

    /// Oversampling factor the last block was processed at.
    pub const fn oversampling_factor(&self) -> usize {
        self.oversampling.factor()
    }

    /// Delay in base-rate frames added by the resamplers for a given rate.
    ///
    /// Zero at the base rate or while the engine is unprepared, since those
    /// blocks never go through the resamplers.
    pub fn latency(&self, oversampling: Oversampling) -> usize {
        let samplers = match oversampling {
            Oversampling::None => None,
            Oversampling::X2 => self.samplers_2x.as_ref(),
            Oversampling::X4 => self.samplers_4x.as_ref(),
        };
        samplers.map_or(0, Samplers::latency)
    }

    /// Blocks that asked for oversampling but ran at the base rate.
    pub const fn fallback_blocks(&self) -> u64 {
        self.fallback_blocks
    }

    /// Run one block in place: input gain, clipper, analog, output gain.
    ///
    /// Real-time safe: no allocation, locking or logging, and nothing to
    /// report back. Channels past the block's inputs come out silent.
    pub fn process(&mut self, block: &mut AudioBlock<'_, '_>, snapshot: &ParameterSnapshot) {
        self.input_gain.configure(snapshot);
        self.chain.configure(snapshot);
        self.output_gain.configure(snapshot);

        let requested = snapshot.oversampling;
        let previous = self.oversampling;
        let (len, inputs) = (block.len(), block.input_channels());
        let samplers = match requested {
            Oversampling::None => None,
            Oversampling::X2 => self.samplers_2x.as_mut(),
            Oversampling::X4 => self.samplers_4x.as_mut(),
        }
        .filter(|samplers| samplers.accepts(len, inputs));

        self.oversampling = if let Some(samplers) = samplers {
            // history left from an earlier run at this rate is stale
            if previous != requested {
                samplers.reset();
            }

            for channel in block.inputs_mut() {
                self.input_gain.process_block(channel);
            }

            let resampled = process_oversampled(samplers, &mut self.chain, block).is_ok();
            for channel in block.inputs_mut() {
                if !resampled {
                    // the block still holds the gained input
                    self.chain.process_block(channel);
                }
                self.output_gain.process_block(channel);
            }

            if resampled {
                requested
            } else {
                self.fallback_blocks += 1;
                Oversampling::None
            }
        } else {
            self.process_base_rate(block);
            if requested != Oversampling::None {
                self.fallback_blocks += 1;
            }
            Oversampling::None
        };

        block.clear_extra_outputs();
    }

    fn process_base_rate(&mut self, block: &mut AudioBlock<'_, '_>) {
        for channel in block.inputs_mut() {
            for sample in channel.iter_mut() {
                let gained = self.input_gain.process(*sample);
                let saturated = self.chain.process(gained);
                *sample = self.output_gain.process(saturated);
            }
        }
    }
}

fn process_oversampled(
    samplers: &mut Samplers,
    chain: &mut SaturationChain,
    block: &mut AudioBlock<'_, '_>,
) -> Result<(), rubato::ResampleError> {
    samplers.load_input(block);
    samplers.upsample()?;
    for channel in samplers.upsampled_mut() {
        chain.process_block(channel);
    }
    samplers.downsample()?;
    samplers.store_output(block);
    Ok(())
}
