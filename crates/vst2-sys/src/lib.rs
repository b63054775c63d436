#![no_std]
#![allow(non_upper_case_globals)]

//! Raw VST 2.4 ABI definitions.
//!
//! Only the plugin-owned effect descriptor is described with a native
//! `repr(C)` aggregate, because the host reads it in place. Records that the
//! host builds itself (MIDI events and the events table) are described by
//! byte offsets so they can be serialized explicitly; the `repr(C)` mirrors of
//! those records exist for plugin-side decoding and are checked against the
//! offsets at compile time.

use core::ffi::c_void;
use core::mem::{offset_of, size_of};

/// 32-bit integer as used throughout the protocol.
pub type VstInt32 = i32;
/// Pointer-sized integer used for the `value` argument and return values.
pub type VstIntPtr = cty::intptr_t;

/// Protocol version reported by hosts and plugins implementing VST 2.4.
pub const kVstVersion: VstInt32 = 2400;

/// `'VstP'`, stored in [`AEffect::magic`].
pub const kEffectMagic: VstInt32 = 0x5673_7450;

/// Host callback handed to the plugin entry point.
pub type HostCallbackProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    opcode: VstInt32,
    index: VstInt32,
    value: VstIntPtr,
    ptr: *mut c_void,
    opt: f32,
) -> VstIntPtr;

/// Plugin dispatcher; same shape as the host callback, invoked host to plugin.
pub type DispatcherProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    opcode: VstInt32,
    index: VstInt32,
    value: VstIntPtr,
    ptr: *mut c_void,
    opt: f32,
) -> VstIntPtr;

/// Deprecated accumulating process call.
pub type ProcessProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    inputs: *mut *mut f32,
    outputs: *mut *mut f32,
    sample_frames: VstInt32,
);

/// Single precision replacing process call.
pub type ProcessReplacingProc = ProcessProc;

/// Double precision replacing process call.
pub type ProcessDoubleReplacingProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    inputs: *mut *mut f64,
    outputs: *mut *mut f64,
    sample_frames: VstInt32,
);

pub type SetParameterProc = unsafe extern "C" fn(effect: *mut AEffect, index: VstInt32, value: f32);

pub type GetParameterProc = unsafe extern "C" fn(effect: *mut AEffect, index: VstInt32) -> f32;

/// Signature shared by `VSTPluginMain` and the legacy `main` export.
pub type PluginEntryProc = unsafe extern "C" fn(host: HostCallbackProc) -> *mut AEffect;

/// Canonical entry symbol, NUL terminated for dynamic lookup.
pub const VST_ENTRY_SYMBOL: &[u8] = b"VSTPluginMain\0";
/// Legacy entry symbol exported by older plugins.
pub const VST_LEGACY_ENTRY_SYMBOL: &[u8] = b"main\0";

/// Effect descriptor populated by the plugin.
#[repr(C)]
pub struct AEffect {
    pub magic: VstInt32,
    pub dispatcher: Option<DispatcherProc>,
    pub process: Option<ProcessProc>,
    pub set_parameter: Option<SetParameterProc>,
    pub get_parameter: Option<GetParameterProc>,
    pub num_programs: VstInt32,
    pub num_params: VstInt32,
    pub num_inputs: VstInt32,
    pub num_outputs: VstInt32,
    pub flags: VstInt32,
    pub reserved1: VstIntPtr,
    pub reserved2: VstIntPtr,
    pub initial_delay: VstInt32,
    pub real_qualities: VstInt32,
    pub off_qualities: VstInt32,
    pub io_ratio: f32,
    /// Plugin private pointer.
    pub object: *mut c_void,
    /// Host private pointer.
    pub user: *mut c_void,
    pub unique_id: VstInt32,
    pub version: VstInt32,
    pub process_replacing: Option<ProcessReplacingProc>,
    pub process_double_replacing: Option<ProcessDoubleReplacingProc>,
    pub future: [u8; 56],
}

/// Editor rectangle returned through `effEditGetRect`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ERect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

// Plugin opcodes (`AEffectOpcodes` followed by `AEffectXOpcodes`).
pub const effOpen: VstInt32 = 0;
pub const effClose: VstInt32 = 1;
pub const effSetProgram: VstInt32 = 2;
pub const effGetProgram: VstInt32 = 3;
pub const effSetProgramName: VstInt32 = 4;
pub const effGetProgramName: VstInt32 = 5;
pub const effGetParamLabel: VstInt32 = 6;
pub const effGetParamDisplay: VstInt32 = 7;
pub const effGetParamName: VstInt32 = 8;
pub const effSetSampleRate: VstInt32 = 10;
pub const effSetBlockSize: VstInt32 = 11;
pub const effMainsChanged: VstInt32 = 12;
pub const effEditGetRect: VstInt32 = 13;
pub const effEditOpen: VstInt32 = 14;
pub const effEditClose: VstInt32 = 15;
pub const effEditIdle: VstInt32 = 19;
pub const effGetChunk: VstInt32 = 23;
pub const effSetChunk: VstInt32 = 24;
pub const effProcessEvents: VstInt32 = 25;
pub const effCanBeAutomated: VstInt32 = 26;
pub const effString2Parameter: VstInt32 = 27;
pub const effGetProgramNameIndexed: VstInt32 = 29;
pub const effGetInputProperties: VstInt32 = 33;
pub const effGetOutputProperties: VstInt32 = 34;
pub const effGetPlugCategory: VstInt32 = 35;
pub const effSetSpeakerArrangement: VstInt32 = 42;
pub const effSetBypass: VstInt32 = 44;
pub const effGetEffectName: VstInt32 = 45;
pub const effGetVendorString: VstInt32 = 47;
pub const effGetProductString: VstInt32 = 48;
pub const effGetVendorVersion: VstInt32 = 49;
pub const effVendorSpecific: VstInt32 = 50;
pub const effCanDo: VstInt32 = 51;
pub const effGetTailSize: VstInt32 = 52;
pub const effGetParameterProperties: VstInt32 = 56;
pub const effGetVstVersion: VstInt32 = 58;
pub const effBeginSetProgram: VstInt32 = 67;
pub const effEndSetProgram: VstInt32 = 68;
pub const effShellGetNextPlugin: VstInt32 = 70;
pub const effStartProcess: VstInt32 = 71;
pub const effStopProcess: VstInt32 = 72;
pub const effBeginLoadBank: VstInt32 = 75;
pub const effBeginLoadProgram: VstInt32 = 76;
pub const effSetProcessPrecision: VstInt32 = 77;
pub const effGetNumMidiInputChannels: VstInt32 = 78;
pub const effGetNumMidiOutputChannels: VstInt32 = 79;

// Host opcodes (`AudioMasterOpcodes` followed by `AudioMasterOpcodesX`).
pub const audioMasterAutomate: VstInt32 = 0;
pub const audioMasterVersion: VstInt32 = 1;
pub const audioMasterCurrentId: VstInt32 = 2;
pub const audioMasterIdle: VstInt32 = 3;
pub const audioMasterGetTime: VstInt32 = 7;
pub const audioMasterProcessEvents: VstInt32 = 8;
pub const audioMasterIOChanged: VstInt32 = 13;
pub const audioMasterSizeWindow: VstInt32 = 15;
pub const audioMasterGetSampleRate: VstInt32 = 16;
pub const audioMasterGetBlockSize: VstInt32 = 17;
pub const audioMasterGetInputLatency: VstInt32 = 18;
pub const audioMasterGetOutputLatency: VstInt32 = 19;
pub const audioMasterGetCurrentProcessLevel: VstInt32 = 23;
pub const audioMasterGetAutomationState: VstInt32 = 24;
pub const audioMasterGetVendorString: VstInt32 = 32;
pub const audioMasterGetProductString: VstInt32 = 33;
pub const audioMasterGetVendorVersion: VstInt32 = 34;
pub const audioMasterVendorSpecific: VstInt32 = 35;
pub const audioMasterCanDo: VstInt32 = 37;
pub const audioMasterGetLanguage: VstInt32 = 38;
pub const audioMasterGetDirectory: VstInt32 = 41;
pub const audioMasterUpdateDisplay: VstInt32 = 42;
pub const audioMasterBeginEdit: VstInt32 = 43;
pub const audioMasterEndEdit: VstInt32 = 44;

// `VstAEffectFlags`.
pub const effFlagsHasEditor: VstInt32 = 1 << 0;
pub const effFlagsCanReplacing: VstInt32 = 1 << 4;
pub const effFlagsProgramChunks: VstInt32 = 1 << 5;
pub const effFlagsIsSynth: VstInt32 = 1 << 8;
pub const effFlagsNoSoundInStop: VstInt32 = 1 << 9;
pub const effFlagsCanDoubleReplacing: VstInt32 = 1 << 12;

// `VstStringConstants` and their extended counterparts.
pub const kVstMaxProgNameLen: usize = 24;
pub const kVstMaxParamStrLen: usize = 8;
pub const kVstMaxVendorStrLen: usize = 64;
pub const kVstMaxProductStrLen: usize = 64;
pub const kVstMaxEffectNameLen: usize = 32;
pub const kVstExtMaxParamStrLen: usize = 32;

// `VstEventTypes`.
pub const kVstMidiType: VstInt32 = 1;
pub const kVstSysExType: VstInt32 = 6;

/// `kVstMidiEventIsRealtime`.
pub const kVstMidiEventIsRealtime: VstInt32 = 1 << 0;

/// Size in bytes of a serialized MIDI event record.
pub const MIDI_EVENT_SIZE: usize = 32;

/// Field offsets inside a serialized MIDI event record.
pub mod midi_event_offsets {
    pub const TYPE: usize = 0;
    pub const BYTE_SIZE: usize = 4;
    pub const DELTA_FRAMES: usize = 8;
    pub const FLAGS: usize = 12;
    pub const NOTE_LENGTH: usize = 16;
    pub const NOTE_OFFSET: usize = 20;
    pub const MIDI_DATA: usize = 24;
    pub const DETUNE: usize = 28;
    pub const NOTE_OFF_VELOCITY: usize = 29;
    pub const RESERVED1: usize = 30;
    pub const RESERVED2: usize = 31;
}

/// Field offsets inside a serialized events table (`VstEvents`).
///
/// The count is a 32-bit integer padded to pointer width, followed by a
/// pointer-sized reserved field and the event pointer slots.
pub mod events_table_offsets {
    use core::mem::size_of;

    pub const NUM_EVENTS: usize = 0;
    pub const RESERVED: usize = size_of::<usize>();
    pub const SLOTS: usize = 2 * size_of::<usize>();
    pub const SLOT_STRIDE: usize = size_of::<usize>();
}

/// Pointer slots carried inline by a `VstEvents` table.
pub const EVENTS_TABLE_SLOTS: usize = 2;

/// Size in bytes of a serialized events table with its inline slots.
pub const EVENTS_TABLE_SIZE: usize =
    events_table_offsets::SLOTS + EVENTS_TABLE_SLOTS * events_table_offsets::SLOT_STRIDE;

/// Generic event header shared by every event type.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct VstEvent {
    pub event_type: VstInt32,
    pub byte_size: VstInt32,
    pub delta_frames: VstInt32,
    pub flags: VstInt32,
    pub data: [u8; 16],
}

/// Native mirror of a serialized MIDI event record.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct VstMidiEvent {
    pub event_type: VstInt32,
    pub byte_size: VstInt32,
    pub delta_frames: VstInt32,
    pub flags: VstInt32,
    pub note_length: VstInt32,
    pub note_offset: VstInt32,
    pub midi_data: [u8; 4],
    pub detune: i8,
    pub note_off_velocity: u8,
    pub reserved1: u8,
    pub reserved2: u8,
}

/// Native mirror of a serialized events table.
#[repr(C)]
pub struct VstEvents {
    pub num_events: VstInt32,
    pub reserved: VstIntPtr,
    pub events: [*mut VstEvent; EVENTS_TABLE_SLOTS],
}

const _: () = {
    assert!(size_of::<VstMidiEvent>() == MIDI_EVENT_SIZE);
    assert!(size_of::<VstEvent>() == MIDI_EVENT_SIZE);
    assert!(offset_of!(VstMidiEvent, delta_frames) == midi_event_offsets::DELTA_FRAMES);
    assert!(offset_of!(VstMidiEvent, midi_data) == midi_event_offsets::MIDI_DATA);
    assert!(offset_of!(VstMidiEvent, reserved2) == midi_event_offsets::RESERVED2);
    assert!(size_of::<VstEvents>() == EVENTS_TABLE_SIZE);
    assert!(offset_of!(VstEvents, reserved) == events_table_offsets::RESERVED);
    assert!(offset_of!(VstEvents, events) == events_table_offsets::SLOTS);
};
