//! In-process stub plug-in exposed through the real C ABI.
//!
//! Each test installs a [`StubConfig`] on its own thread before calling
//! [`stub_entry`]; the stub records everything it sees into a shared log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::ptr;
use std::slice;
use std::sync::Arc;

use parking_lot::Mutex;
use vst2_host::ffi::{self, AEffect, ERect, HostCallbackProc, VstEvents, VstMidiEvent};

#[derive(Clone, Debug)]
pub struct StubConfig {
    pub magic: i32,
    pub inputs: i32,
    pub outputs: i32,
    pub params: Vec<f32>,
    pub programs: Vec<String>,
    pub flags: i32,
    pub unique_id: i32,
    pub double_precision: bool,
    pub get_parameter: bool,
    pub name: String,
    pub vendor: String,
    pub product: String,
    pub vendor_version: String,
    /// Fill the effect name buffer completely, without a terminator.
    pub unterminated_name: bool,
    pub can_do: Vec<(&'static str, isize)>,
    pub set_chunk_result: isize,
    pub editor_rect: Option<ERect>,
    /// Opcodes answered with a fixed value, bypassing the stub's own handling.
    pub programmed: Vec<(i32, isize)>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            magic: ffi::kEffectMagic,
            inputs: 2,
            outputs: 2,
            params: vec![0.5, 0.25],
            programs: vec!["Init".into(), "Bright".into(), "Dark".into()],
            flags: ffi::effFlagsCanReplacing,
            unique_id: 0x5374_7562,
            double_precision: false,
            get_parameter: true,
            name: "Stub".into(),
            vendor: "Stub Audio".into(),
            product: "Stub Product".into(),
            vendor_version: "1.2.3".into(),
            unterminated_name: false,
            can_do: Vec::new(),
            set_chunk_result: 0,
            editor_rect: None,
            programmed: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispatch {
    pub opcode: i32,
    pub index: i32,
    pub value: isize,
    pub ptr: usize,
    pub opt: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedEvent {
    pub num_events: i32,
    pub terminated: bool,
    pub event_type: i32,
    pub byte_size: i32,
    pub delta_frames: i32,
    pub flags: i32,
    pub midi_data: [u8; 4],
}

#[derive(Debug, Default)]
pub struct StubLog {
    pub dispatches: Vec<Dispatch>,
    /// Host callbacks issued by the stub: `(opcode, answer, had_effect)`.
    pub host_answers: Vec<(i32, isize, bool)>,
    pub events: Vec<ReceivedEvent>,
    pub process_calls: usize,
    pub double_calls: usize,
    pub last_frames: i32,
    /// Bytes handed to `effSetChunk`, including the trailing pad byte.
    pub staged_chunks: Vec<Vec<u8>>,
    pub editor_parent: Option<usize>,
    pub closed: bool,
}

impl StubLog {
    pub fn opcodes(&self) -> Vec<i32> {
        self.dispatches.iter().map(|d| d.opcode).collect()
    }

    pub fn count(&self, opcode: i32) -> usize {
        self.dispatches.iter().filter(|d| d.opcode == opcode).count()
    }
}

pub type SharedLog = Arc<Mutex<StubLog>>;

thread_local! {
    static PENDING: RefCell<Option<(StubConfig, SharedLog)>> = const { RefCell::new(None) };
}

/// Arms the next [`stub_entry`] call on this thread.
pub fn install(config: StubConfig) -> SharedLog {
    let log = SharedLog::default();
    PENDING.with(|slot| *slot.borrow_mut() = Some((config, log.clone())));
    log
}

#[repr(C)]
struct Stub {
    effect: AEffect,
    host: HostCallbackProc,
    config: StubConfig,
    log: SharedLog,
    params: Vec<f32>,
    program: i32,
    chunk: Vec<u8>,
    rect: ERect,
}

unsafe fn stub<'a>(effect: *mut AEffect) -> &'a mut Stub {
    &mut *effect.cast::<Stub>()
}

unsafe fn write_c(ptr: *mut c_void, capacity: usize, text: &str) {
    let len = text.len().min(capacity - 1);
    let dst = ptr.cast::<u8>();
    ptr::copy_nonoverlapping(text.as_ptr(), dst, len);
    *dst.add(len) = 0;
}

/// Entry point with the `VSTPluginMain` signature.
pub unsafe extern "C" fn stub_entry(host: HostCallbackProc) -> *mut AEffect {
    let Some((config, log)) = PENDING.with(|slot| slot.borrow_mut().take()) else {
        return ptr::null_mut();
    };

    let version = host(ptr::null_mut(), ffi::audioMasterVersion, 0, 0, ptr::null_mut(), 0.0);
    log.lock()
        .host_answers
        .push((ffi::audioMasterVersion, version, false));

    let mut flags = config.flags;
    if config.double_precision {
        flags |= ffi::effFlagsCanDoubleReplacing;
    }
    let effect = AEffect {
        magic: config.magic,
        dispatcher: Some(stub_dispatch),
        process: Some(stub_process),
        set_parameter: Some(stub_set_parameter),
        get_parameter: if config.get_parameter {
            Some(stub_get_parameter)
        } else {
            None
        },
        num_programs: config.programs.len() as i32,
        num_params: config.params.len() as i32,
        num_inputs: config.inputs,
        num_outputs: config.outputs,
        flags,
        reserved1: 0,
        reserved2: 0,
        initial_delay: 64,
        real_qualities: 0,
        off_qualities: 0,
        io_ratio: 1.0,
        object: ptr::null_mut(),
        user: ptr::null_mut(),
        unique_id: config.unique_id,
        version: 1100,
        process_replacing: Some(stub_process),
        process_double_replacing: if config.double_precision {
            Some(stub_process_double)
        } else {
            None
        },
        future: [0; 56],
    };
    let stub = Box::new(Stub {
        effect,
        host,
        params: config.params.clone(),
        rect: config.editor_rect.unwrap_or_default(),
        config,
        log,
        program: 0,
        chunk: Vec::new(),
    });
    let raw = Box::into_raw(stub);
    (*raw).effect.object = raw.cast();
    raw.cast()
}

unsafe extern "C" fn stub_dispatch(
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize {
    let log = stub(effect).log.clone();
    log.lock().dispatches.push(Dispatch {
        opcode,
        index,
        value,
        ptr: ptr as usize,
        opt,
    });
    let programmed = stub(effect)
        .config
        .programmed
        .iter()
        .find(|(code, _)| *code == opcode)
        .map(|(_, result)| *result);
    if let Some(result) = programmed {
        return result;
    }

    match opcode {
        ffi::effOpen => {
            let host = stub(effect).host;
            for query in [ffi::audioMasterVersion, ffi::audioMasterGetSampleRate] {
                let answer = host(effect, query, 0, 0, ptr::null_mut(), 0.0);
                log.lock().host_answers.push((query, answer, true));
            }
            0
        }
        ffi::effClose => {
            drop(Box::from_raw(effect.cast::<Stub>()));
            log.lock().closed = true;
            0
        }
        ffi::effSetProgram => {
            stub(effect).program = value as i32;
            0
        }
        ffi::effGetProgram => stub(effect).program as isize,
        ffi::effGetProgramName => {
            let this = stub(effect);
            let name = this
                .config
                .programs
                .get(this.program as usize)
                .cloned()
                .unwrap_or_default();
            write_c(ptr, ffi::kVstMaxProgNameLen, &name);
            0
        }
        ffi::effGetProgramNameIndexed => {
            let this = stub(effect);
            match this.config.programs.get(index as usize) {
                Some(name) if index >= 0 => {
                    write_c(ptr, ffi::kVstMaxProgNameLen, name);
                    0
                }
                _ => 1,
            }
        }
        ffi::effGetParamName => {
            write_c(ptr, ffi::kVstExtMaxParamStrLen, &format!("Param {index}"));
            0
        }
        ffi::effGetParamLabel => {
            write_c(ptr, ffi::kVstExtMaxParamStrLen, "dB");
            0
        }
        ffi::effGetParamDisplay => {
            let value = stub(effect).params.get(index as usize).copied();
            write_c(
                ptr,
                ffi::kVstExtMaxParamStrLen,
                &format!("{:.2}", value.unwrap_or_default()),
            );
            0
        }
        ffi::effGetEffectName => {
            let this = stub(effect);
            if this.config.unterminated_name {
                slice::from_raw_parts_mut(ptr.cast::<u8>(), ffi::kVstMaxEffectNameLen).fill(b'A');
            } else {
                write_c(ptr, ffi::kVstMaxEffectNameLen, &this.config.name);
            }
            1
        }
        ffi::effGetVendorString => {
            write_c(ptr, ffi::kVstMaxVendorStrLen, &stub(effect).config.vendor);
            1
        }
        ffi::effGetProductString => {
            write_c(ptr, ffi::kVstMaxProductStrLen, &stub(effect).config.product);
            1
        }
        ffi::effGetVendorVersion => {
            write_c(
                ptr,
                ffi::kVstMaxVendorStrLen,
                &stub(effect).config.vendor_version,
            );
            1
        }
        ffi::effCanDo => {
            let what = CStr::from_ptr(ptr.cast()).to_string_lossy();
            stub(effect)
                .config
                .can_do
                .iter()
                .find(|(name, _)| *name == what)
                .map_or(0, |(_, answer)| *answer)
        }
        ffi::effGetChunk => {
            let this = stub(effect);
            this.chunk = this.params.iter().flat_map(|p| p.to_le_bytes()).collect();
            *ptr.cast::<*mut c_void>() = this.chunk.as_mut_ptr().cast();
            this.chunk.len() as isize
        }
        ffi::effSetChunk => {
            let this = stub(effect);
            let staged = slice::from_raw_parts(ptr.cast::<u8>(), value as usize + 1).to_vec();
            let result = this.config.set_chunk_result;
            if result >= 0 {
                this.params = staged[..value as usize]
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
            }
            log.lock().staged_chunks.push(staged);
            result
        }
        ffi::effProcessEvents => {
            let table = &*ptr.cast::<VstEvents>();
            let first = &*table.events[0].cast::<VstMidiEvent>();
            log.lock().events.push(ReceivedEvent {
                num_events: table.num_events,
                terminated: table.events[1].is_null(),
                event_type: first.event_type,
                byte_size: first.byte_size,
                delta_frames: first.delta_frames,
                flags: first.flags,
                midi_data: first.midi_data,
            });
            1
        }
        ffi::effEditGetRect => {
            let this = stub(effect);
            if this.config.editor_rect.is_none() {
                return 0;
            }
            *ptr.cast::<*mut ERect>() = &mut this.rect;
            1
        }
        ffi::effEditOpen => {
            log.lock().editor_parent = Some(ptr as usize);
            1
        }
        _ => 0,
    }
}

/// Outputs are `2 * input` (or `1.0` without inputs), overwriting whatever
/// the buffers held.
unsafe extern "C" fn stub_process(
    effect: *mut AEffect,
    inputs: *mut *mut f32,
    outputs: *mut *mut f32,
    frames: i32,
) {
    let this = stub(effect);
    {
        let mut log = this.log.lock();
        log.process_calls += 1;
        log.last_frames = frames;
    }
    let frames = frames as usize;
    for ch in 0..this.effect.num_outputs as usize {
        let out = slice::from_raw_parts_mut(*outputs.add(ch), frames);
        if this.effect.num_inputs > 0 {
            let src = ch % this.effect.num_inputs as usize;
            let input = slice::from_raw_parts(*inputs.add(src), frames);
            for (o, i) in out.iter_mut().zip(input) {
                *o = i * 2.0;
            }
        } else {
            out.fill(1.0);
        }
    }
}

unsafe extern "C" fn stub_process_double(
    effect: *mut AEffect,
    inputs: *mut *mut f64,
    outputs: *mut *mut f64,
    frames: i32,
) {
    let this = stub(effect);
    {
        let mut log = this.log.lock();
        log.double_calls += 1;
        log.last_frames = frames;
    }
    let frames = frames as usize;
    for ch in 0..this.effect.num_outputs as usize {
        let out = slice::from_raw_parts_mut(*outputs.add(ch), frames);
        if this.effect.num_inputs > 0 {
            let src = ch % this.effect.num_inputs as usize;
            let input = slice::from_raw_parts(*inputs.add(src), frames);
            for (o, i) in out.iter_mut().zip(input) {
                *o = i * 2.0;
            }
        } else {
            out.fill(1.0);
        }
    }
}

unsafe extern "C" fn stub_set_parameter(effect: *mut AEffect, index: i32, value: f32) {
    if let Some(slot) = stub(effect).params.get_mut(index as usize) {
        *slot = value;
    }
}

unsafe extern "C" fn stub_get_parameter(effect: *mut AEffect, index: i32) -> f32 {
    stub(effect).params.get(index as usize).copied().unwrap_or(-1.0)
}
