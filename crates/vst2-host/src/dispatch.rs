use std::ffi::c_void;
use std::fmt;
use std::ptr;

use tracing::trace;
use vst2_sys as ffi;

use crate::effect::{EffectProcs, EffectRef};

/// Host to plug-in opcodes used by the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Opcode {
    Open = ffi::effOpen,
    Close = ffi::effClose,
    SetProgram = ffi::effSetProgram,
    GetProgram = ffi::effGetProgram,
    SetProgramName = ffi::effSetProgramName,
    GetProgramName = ffi::effGetProgramName,
    GetParamLabel = ffi::effGetParamLabel,
    GetParamDisplay = ffi::effGetParamDisplay,
    GetParamName = ffi::effGetParamName,
    SetSampleRate = ffi::effSetSampleRate,
    SetBlockSize = ffi::effSetBlockSize,
    MainsChanged = ffi::effMainsChanged,
    EditGetRect = ffi::effEditGetRect,
    EditOpen = ffi::effEditOpen,
    EditClose = ffi::effEditClose,
    EditIdle = ffi::effEditIdle,
    GetChunk = ffi::effGetChunk,
    SetChunk = ffi::effSetChunk,
    ProcessEvents = ffi::effProcessEvents,
    CanBeAutomated = ffi::effCanBeAutomated,
    GetProgramNameIndexed = ffi::effGetProgramNameIndexed,
    GetPlugCategory = ffi::effGetPlugCategory,
    SetBypass = ffi::effSetBypass,
    GetEffectName = ffi::effGetEffectName,
    GetVendorString = ffi::effGetVendorString,
    GetProductString = ffi::effGetProductString,
    GetVendorVersion = ffi::effGetVendorVersion,
    VendorSpecific = ffi::effVendorSpecific,
    CanDo = ffi::effCanDo,
    GetTailSize = ffi::effGetTailSize,
    GetVstVersion = ffi::effGetVstVersion,
    StartProcess = ffi::effStartProcess,
    StopProcess = ffi::effStopProcess,
}

impl Opcode {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// The single call path for control operations.
///
/// Arguments are forwarded untouched; interpreting the return value is left
/// to the caller because its meaning differs per opcode.
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    effect: EffectRef<'a>,
    procs: EffectProcs,
}

impl<'a> Dispatcher<'a> {
    pub fn new(effect: EffectRef<'a>, procs: &EffectProcs) -> Self {
        Self {
            effect,
            procs: *procs,
        }
    }

    pub fn effect(&self) -> EffectRef<'a> {
        self.effect
    }

    /// # Safety
    /// `ptr` must satisfy whatever the plug-in expects for `opcode` (a
    /// writable buffer of the right capacity, a NUL terminated string, ...)
    /// and the plug-in must not be in use from another thread.
    pub unsafe fn dispatch(
        &self,
        opcode: Opcode,
        index: i32,
        value: isize,
        ptr: *mut c_void,
        opt: f32,
    ) -> isize {
        self.dispatch_raw(opcode.code(), index, value, ptr, opt)
    }

    /// Variant of [`Dispatcher::dispatch`] for opcodes the [`Opcode`] table
    /// does not name, such as vendor specific extensions.
    ///
    /// # Safety
    /// Same contract as [`Dispatcher::dispatch`].
    pub unsafe fn dispatch_raw(
        &self,
        opcode: i32,
        index: i32,
        value: isize,
        ptr: *mut c_void,
        opt: f32,
    ) -> isize {
        trace!(opcode, index, value, opt, "dispatch");
        self.procs
            .dispatch(self.effect.as_ptr(), opcode, index, value, ptr, opt)
    }

    /// Dispatch for opcodes that carry no data pointer.
    pub(crate) fn call(&self, opcode: Opcode, index: i32, value: isize, opt: f32) -> isize {
        unsafe { self.dispatch(opcode, index, value, ptr::null_mut(), opt) }
    }
}

impl fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("effect", &self.effect)
            .finish()
    }
}
