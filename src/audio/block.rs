use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{inputs} input channels declared but the block only has {channels}")]
    TooManyInputs { inputs: usize, channels: usize },
}

/// Channel-major view over the host's buffers for one processing call.
///
/// The first `input_channels` channels carry signal; the remaining ones are
/// output-only and get silenced by the engine. Every channel has the same
/// length, which is checked once when the view is built.
pub struct AudioBlock<'a, 'b> {
    channels: &'a mut [&'b mut [f32]],
    input_channels: usize,
    len: usize,
}

impl<'a, 'b> AudioBlock<'a, 'b> {
    pub fn new(
        channels: &'a mut [&'b mut [f32]],
        input_channels: usize,
    ) -> Result<Self, BlockError> {
        if input_channels > channels.len() {
            return Err(BlockError::TooManyInputs {
                inputs: input_channels,
                channels: channels.len(),
            });
        }

        let len = channels.first().map_or(0, |c| c.len());
        if let Some((channel, actual)) = channels
            .iter()
            .map(|c| c.len())
            .enumerate()
            .find(|&(_, l)| l != len)
        {
            return Err(BlockError::ChannelLengthMismatch {
                channel,
                expected: len,
                actual,
            });
        }

        Ok(Self {
            channels,
            input_channels,
            len,
        })
    }

    /// Samples per channel.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub const fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|c| &**c)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.channels.get_mut(index).map(|c| &mut **c)
    }

    /// The channels that carry input signal.
    pub fn inputs_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels[..self.input_channels]
            .iter_mut()
            .map(|c| &mut **c)
    }

    /// Zero every channel past the input channels.
    pub fn clear_extra_outputs(&mut self) {
        for channel in &mut self.channels[self.input_channels..] {
            channel.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_channels() {
        let mut a = [0.0f32; 4];
        let mut b = [0.0f32; 3];
        let mut channels: [&mut [f32]; 2] = [&mut a, &mut b];

        let err = AudioBlock::new(&mut channels, 2).err();
        assert_eq!(
            err,
            Some(BlockError::ChannelLengthMismatch {
                channel: 1,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_rejects_too_many_inputs() {
        let mut a = [0.0f32; 4];
        let mut channels: [&mut [f32]; 1] = [&mut a];
        assert!(matches!(
            AudioBlock::new(&mut channels, 2),
            Err(BlockError::TooManyInputs {
                inputs: 2,
                channels: 1
            })
        ));
    }

    #[test]
    fn test_clear_extra_outputs() {
        let mut a = [1.0f32; 8];
        let mut b = [1.0f32; 8];
        let mut c = [1.0f32; 8];
        let mut channels: [&mut [f32]; 3] = [&mut a, &mut b, &mut c];

        let mut block = AudioBlock::new(&mut channels, 1).unwrap();
        assert_eq!(block.len(), 8);
        assert_eq!(block.num_channels(), 3);
        assert_eq!(block.inputs_mut().count(), 1);

        block.clear_extra_outputs();
        assert!(block.channel(0).unwrap().iter().all(|&s| s == 1.0));
        assert!(block.channel(1).unwrap().iter().all(|&s| s == 0.0));
        assert!(block.channel(2).unwrap().iter().all(|&s| s == 0.0));
        assert!(block.channel(3).is_none());
    }

    #[test]
    fn test_empty_block() {
        let mut channels: [&mut [f32]; 0] = [];
        let block = AudioBlock::new(&mut channels, 0).unwrap();
        assert!(block.is_empty());
        assert_eq!(block.num_channels(), 0);
    }
}
