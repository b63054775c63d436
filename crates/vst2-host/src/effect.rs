use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use vst2_sys::{
    AEffect, DispatcherProc, GetParameterProc, ProcessDoubleReplacingProc, ProcessReplacingProc,
    SetParameterProc,
};

use crate::error::{HostError, InitError};

/// Borrowed view of the plugin-owned effect descriptor.
///
/// Fields are read through the raw pointer on every access because the
/// plugin may update counts or latency from inside any call.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EffectRef<'a> {
    ptr: NonNull<AEffect>,
    _module: PhantomData<&'a AEffect>,
}

impl<'a> EffectRef<'a> {
    /// # Safety
    /// `ptr` must point at a live descriptor for the whole of `'a`.
    pub unsafe fn from_raw(ptr: NonNull<AEffect>) -> Self {
        Self {
            ptr,
            _module: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut AEffect {
        self.ptr.as_ptr()
    }

    fn raw(&self) -> *const AEffect {
        self.ptr.as_ptr()
    }

    pub fn magic(&self) -> i32 {
        unsafe { (*self.raw()).magic }
    }

    pub fn num_inputs(&self) -> i32 {
        unsafe { (*self.raw()).num_inputs }
    }

    pub fn num_outputs(&self) -> i32 {
        unsafe { (*self.raw()).num_outputs }
    }

    pub fn num_params(&self) -> i32 {
        unsafe { (*self.raw()).num_params }
    }

    pub fn num_programs(&self) -> i32 {
        unsafe { (*self.raw()).num_programs }
    }

    pub fn flags(&self) -> EffectFlags {
        EffectFlags(unsafe { (*self.raw()).flags })
    }

    /// Initial delay in samples.
    pub fn latency(&self) -> i32 {
        unsafe { (*self.raw()).initial_delay }
    }

    pub fn unique_id(&self) -> i32 {
        unsafe { (*self.raw()).unique_id }
    }

    pub fn version(&self) -> i32 {
        unsafe { (*self.raw()).version }
    }

    pub(crate) fn set_user(&self, user: *mut c_void) {
        unsafe { (*self.ptr.as_ptr()).user = user }
    }
}

impl fmt::Debug for EffectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRef")
            .field("ptr", &self.ptr)
            .field("unique_id", &self.unique_id())
            .finish()
    }
}

/// Flag bits advertised in the effect descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectFlags(pub i32);

impl EffectFlags {
    pub const HAS_EDITOR: i32 = vst2_sys::effFlagsHasEditor;
    pub const CAN_REPLACING: i32 = vst2_sys::effFlagsCanReplacing;
    pub const PROGRAM_CHUNKS: i32 = vst2_sys::effFlagsProgramChunks;
    pub const IS_SYNTH: i32 = vst2_sys::effFlagsIsSynth;
    pub const NO_SOUND_IN_STOP: i32 = vst2_sys::effFlagsNoSoundInStop;
    pub const CAN_DOUBLE_REPLACING: i32 = vst2_sys::effFlagsCanDoubleReplacing;

    pub fn contains(self, bit: i32) -> bool {
        self.0 & bit == bit
    }

    pub fn has_editor(self) -> bool {
        self.contains(Self::HAS_EDITOR)
    }

    pub fn is_synth(self) -> bool {
        self.contains(Self::IS_SYNTH)
    }

    pub fn no_sound_in_stop(self) -> bool {
        self.contains(Self::NO_SOUND_IN_STOP)
    }

    pub fn can_double_replacing(self) -> bool {
        self.contains(Self::CAN_DOUBLE_REPLACING)
    }

    pub fn program_chunks(self) -> bool {
        self.contains(Self::PROGRAM_CHUNKS)
    }
}

/// Optional plug-in entry points that callers may query before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    DoublePrecision,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::DoublePrecision => f.write_str("double precision processing"),
        }
    }
}

/// Function pointers captured from the descriptor once, at load time.
///
/// Call sites never look at the descriptor's pointer fields again; the
/// optional double precision path is an `Option` resolved here.
#[derive(Clone, Copy)]
pub struct EffectProcs {
    dispatcher: DispatcherProc,
    process_replacing: ProcessReplacingProc,
    process_double_replacing: Option<ProcessDoubleReplacingProc>,
    set_parameter: SetParameterProc,
    get_parameter: GetParameterProc,
}

impl EffectProcs {
    pub fn capture(effect: EffectRef<'_>) -> Result<Self, InitError> {
        let raw = unsafe { &*effect.raw() };
        Ok(Self {
            dispatcher: raw
                .dispatcher
                .ok_or(InitError::MissingFunction("dispatcher"))?,
            process_replacing: raw
                .process_replacing
                .ok_or(InitError::MissingFunction("processReplacing"))?,
            process_double_replacing: raw.process_double_replacing,
            set_parameter: raw
                .set_parameter
                .ok_or(InitError::MissingFunction("setParameter"))?,
            get_parameter: raw
                .get_parameter
                .ok_or(InitError::MissingFunction("getParameter"))?,
        })
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::DoublePrecision => self.process_double_replacing.is_some(),
        }
    }

    /// # Safety
    /// `effect` must be the descriptor these pointers were captured from and
    /// `ptr` must satisfy the opcode's contract.
    pub unsafe fn dispatch(
        &self,
        effect: *mut AEffect,
        opcode: i32,
        index: i32,
        value: isize,
        ptr: *mut c_void,
        opt: f32,
    ) -> isize {
        (self.dispatcher)(effect, opcode, index, value, ptr, opt)
    }

    /// # Safety
    /// The pointer arrays must hold the descriptor's channel counts, each
    /// channel valid for `frames` samples.
    pub unsafe fn process_replacing(
        &self,
        effect: *mut AEffect,
        inputs: *mut *mut f32,
        outputs: *mut *mut f32,
        frames: i32,
    ) {
        (self.process_replacing)(effect, inputs, outputs, frames)
    }

    /// # Safety
    /// Same contract as [`EffectProcs::process_replacing`].
    pub unsafe fn process_double_replacing(
        &self,
        effect: *mut AEffect,
        inputs: *mut *mut f64,
        outputs: *mut *mut f64,
        frames: i32,
    ) -> Result<(), HostError> {
        let process = self
            .process_double_replacing
            .ok_or(HostError::Unsupported(Capability::DoublePrecision))?;
        process(effect, inputs, outputs, frames);
        Ok(())
    }

    /// # Safety
    /// `effect` must be the descriptor these pointers were captured from.
    pub unsafe fn set_parameter(&self, effect: *mut AEffect, index: i32, value: f32) {
        (self.set_parameter)(effect, index, value)
    }

    /// # Safety
    /// `effect` must be the descriptor these pointers were captured from.
    pub unsafe fn get_parameter(&self, effect: *mut AEffect, index: i32) -> f32 {
        (self.get_parameter)(effect, index)
    }
}

impl fmt::Debug for EffectProcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectProcs")
            .field(
                "double_precision",
                &self.supports(Capability::DoublePrecision),
            )
            .finish()
    }
}
