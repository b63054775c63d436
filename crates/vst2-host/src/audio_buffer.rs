use std::ops::{Index, IndexMut};

/// Sample formats the protocol can process.
pub trait Sample: Copy + Default + PartialEq + Send + 'static {}

impl Sample for f32 {}
impl Sample for f64 {}

/// Channel-major audio block handed to a hosted plug-in.
///
/// Every channel holds exactly `frames` samples, which is what the process
/// calls require. The plug-in only ever sees borrowed pointers into these
/// vectors for the duration of a single call.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer<T: Sample = f32> {
    channels: Vec<Vec<T>>,
    frames: usize,
}

impl<T: Sample> AudioBuffer<T> {
    /// Creates a silent buffer.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![T::default(); frames]; channels],
            frames,
        }
    }

    /// Builds a buffer from per-channel data; shorter channels are padded
    /// with silence up to the longest one.
    pub fn from_channels(mut channels: Vec<Vec<T>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(frames, T::default());
        }
        Self { channels, frames }
    }

    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(T::default());
        }
    }

    /// Resizes while preserving existing samples; new samples are silent.
    pub fn resize(&mut self, channels: usize, frames: usize) {
        self.channels.resize_with(channels, Vec::new);
        for channel in &mut self.channels {
            channel.resize(frames, T::default());
        }
        self.frames = frames;
    }

    pub fn channel_slices(&self) -> impl Iterator<Item = &[T]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn channel_slices_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }
}

impl<T: Sample> Index<usize> for AudioBuffer<T> {
    type Output = [T];

    fn index(&self, index: usize) -> &Self::Output {
        self.channels[index].as_slice()
    }
}

impl<T: Sample> IndexMut<usize> for AudioBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.channels[index].as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_channels_pads_to_longest() {
        let buffer = AudioBuffer::from_channels(vec![vec![1.0f32, 2.0], vec![3.0]]);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(&buffer[1], &[3.0, 0.0]);
    }

    #[test]
    fn resize_preserves_existing_samples() {
        let mut buffer = AudioBuffer::<f64>::new(1, 2);
        buffer[0][1] = 0.5;
        buffer.resize(2, 3);
        assert_eq!(&buffer[0], &[0.0, 0.5, 0.0]);
        assert_eq!(&buffer[1], &[0.0, 0.0, 0.0]);
    }
}
