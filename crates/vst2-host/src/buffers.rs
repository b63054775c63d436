use crate::audio_buffer::Sample;
use crate::effect::{Capability, EffectProcs, EffectRef};
use crate::error::HostError;

/// Scratch channel-pointer arrays for one sample format.
///
/// The vectors keep their capacity between blocks but are emptied after
/// every call so no pointer outlives the buffers it was taken from.
struct PointerTable<T> {
    inputs: Vec<*mut T>,
    outputs: Vec<*mut T>,
}

impl<T: Sample> PointerTable<T> {
    fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn fill(
        &mut self,
        effect: EffectRef<'_>,
        inputs: &[&[T]],
        outputs: &mut [&mut [T]],
        frames: usize,
    ) -> Result<i32, HostError> {
        let frame_arg = i32::try_from(frames).map_err(|_| HostError::FrameCount(frames))?;
        check_channels("input", effect.num_inputs(), inputs.len())?;
        check_channels("output", effect.num_outputs(), outputs.len())?;
        for (channel, buffer) in inputs.iter().enumerate() {
            check_len("input", channel, buffer.len(), frames)?;
        }
        for (channel, buffer) in outputs.iter().enumerate() {
            check_len("output", channel, buffer.len(), frames)?;
        }

        self.inputs.clear();
        self.outputs.clear();
        self.inputs
            .extend(inputs.iter().map(|buffer| buffer.as_ptr().cast_mut()));
        self.outputs
            .extend(outputs.iter_mut().map(|buffer| buffer.as_mut_ptr()));
        Ok(frame_arg)
    }

    fn release(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }
}

fn check_channels(direction: &'static str, declared: i32, actual: usize) -> Result<(), HostError> {
    let expected = usize::try_from(declared).unwrap_or(0);
    if expected != actual {
        return Err(HostError::ChannelCount {
            direction,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_len(
    direction: &'static str,
    channel: usize,
    len: usize,
    frames: usize,
) -> Result<(), HostError> {
    if len < frames {
        return Err(HostError::BufferTooShort {
            direction,
            channel,
            len,
            frames,
        });
    }
    Ok(())
}

/// Turns channel slices into the pointer arrays the process calls expect and
/// invokes the replacing process functions directly, without the dispatcher.
pub struct BufferMarshaler {
    single: PointerTable<f32>,
    double: PointerTable<f64>,
}

impl BufferMarshaler {
    pub fn new() -> Self {
        Self {
            single: PointerTable::new(),
            double: PointerTable::new(),
        }
    }

    /// Runs `processReplacing`; outputs are overwritten, not mixed into.
    pub fn process(
        &mut self,
        effect: EffectRef<'_>,
        procs: &EffectProcs,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> Result<(), HostError> {
        let frame_arg = self.single.fill(effect, inputs, outputs, frames)?;
        unsafe {
            procs.process_replacing(
                effect.as_ptr(),
                self.single.inputs.as_mut_ptr(),
                self.single.outputs.as_mut_ptr(),
                frame_arg,
            );
        }
        self.single.release();
        Ok(())
    }

    /// Runs `processDoubleReplacing`. Fails before touching the plug-in when
    /// the descriptor does not provide it.
    pub fn process_double(
        &mut self,
        effect: EffectRef<'_>,
        procs: &EffectProcs,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        frames: usize,
    ) -> Result<(), HostError> {
        if !procs.supports(Capability::DoublePrecision) {
            return Err(HostError::Unsupported(Capability::DoublePrecision));
        }
        let frame_arg = self.double.fill(effect, inputs, outputs, frames)?;
        let result = unsafe {
            procs.process_double_replacing(
                effect.as_ptr(),
                self.double.inputs.as_mut_ptr(),
                self.double.outputs.as_mut_ptr(),
                frame_arg,
            )
        };
        self.double.release();
        result
    }
}

impl Default for BufferMarshaler {
    fn default() -> Self {
        Self::new()
    }
}
