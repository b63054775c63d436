use std::ffi::{c_void, CString};
use std::fmt;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;
use vst2_sys::{AEffect, ERect, PluginEntryProc};

use crate::audio_buffer::AudioBuffer;
use crate::buffers::BufferMarshaler;
use crate::callback::{DefaultHost, HostCallback, HostSlot, SharedHost};
use crate::chunk::{self, ChunkScope};
use crate::config::HostConfig;
use crate::dispatch::{Dispatcher, Opcode};
use crate::effect::{Capability, EffectFlags, EffectProcs, EffectRef};
use crate::error::HostError;
use crate::events::{EventMarshaler, MidiMessage};
use crate::loader::{self, PluginModule};
use crate::properties::{PluginProperties, SnapshotOptions};
use crate::strings::{self, StringField};

/// Editor window bounds reported by `effEditGetRect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EditorRect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl EditorRect {
    pub fn width(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top)
    }
}

impl From<ERect> for EditorRect {
    fn from(rect: ERect) -> Self {
        Self {
            top: rect.top,
            left: rect.left,
            bottom: rect.bottom,
            right: rect.right,
        }
    }
}

/// A loaded VST 2.4 plug-in instance.
///
/// The instance is `Send` but not `Sync`: every call into the plug-in is a
/// blocking foreign call and mutating operations take `&mut self`, so access
/// to one instance is serialized by the borrow checker. Dropping the instance
/// suspends it if needed, dispatches `effClose` and only then unloads the
/// module.
pub struct Vst2Plugin {
    effect: NonNull<AEffect>,
    procs: EffectProcs,
    buffers: BufferMarshaler,
    events: EventMarshaler,
    resumed: bool,
    closed: bool,
    host: HostSlot,
    module: Option<PluginModule>,
}

unsafe impl Send for Vst2Plugin {}

impl Vst2Plugin {
    /// Loads the module at `path` with the minimal [`DefaultHost`] callback.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        Self::load_with_host(path, DefaultHost)
    }

    /// Loads the module at `path`, answering plug-in callbacks with `host`.
    pub fn load_with_host<H>(path: impl AsRef<Path>, host: H) -> Result<Self, HostError>
    where
        H: HostCallback + 'static,
    {
        let module = PluginModule::load(path)?;
        let entry = module.resolve_entry()?;
        unsafe { Self::instantiate(entry, Arc::new(host), Some(module)) }
    }

    /// Instantiates a plug-in from an entry point that is already mapped into
    /// the process, e.g. a statically linked plug-in.
    ///
    /// # Safety
    /// `entry` must be a VST 2.4 entry point that stays callable, together
    /// with everything it returns, for the lifetime of the instance.
    pub unsafe fn from_entry<H>(entry: PluginEntryProc, host: H) -> Result<Self, HostError>
    where
        H: HostCallback + 'static,
    {
        Self::instantiate(entry, Arc::new(host), None)
    }

    unsafe fn instantiate(
        entry: PluginEntryProc,
        host: SharedHost,
        module: Option<PluginModule>,
    ) -> Result<Self, HostError> {
        let effect = loader::invoke_entry(entry, &host)?;
        let effect_ref = EffectRef::from_raw(effect);
        let procs = EffectProcs::capture(effect_ref)?;
        debug!(
            unique_id = effect_ref.unique_id(),
            inputs = effect_ref.num_inputs(),
            outputs = effect_ref.num_outputs(),
            params = effect_ref.num_params(),
            double_precision = procs.supports(Capability::DoublePrecision),
            "instantiated plug-in"
        );
        let plugin = Self {
            effect,
            procs,
            buffers: BufferMarshaler::new(),
            events: EventMarshaler::new(),
            resumed: false,
            closed: false,
            host: HostSlot::new(host),
            module,
        };
        plugin.effect().set_user(plugin.host.user_ptr());
        Ok(plugin)
    }

    pub fn effect(&self) -> EffectRef<'_> {
        unsafe { EffectRef::from_raw(self.effect) }
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.effect(), &self.procs)
    }

    pub fn procs(&self) -> &EffectProcs {
        &self.procs
    }

    pub fn module_path(&self) -> Option<&Path> {
        self.module.as_ref().map(PluginModule::path)
    }

    // lifecycle --------------------------------------------------------------

    pub fn open(&mut self) {
        self.dispatcher().call(Opcode::Open, 0, 0, 0.0);
    }

    /// Closes the plug-in. The descriptor is gone afterwards, hence `self`.
    pub fn close(mut self) {
        self.shutdown();
    }

    pub fn suspend(&mut self) {
        self.dispatcher().call(Opcode::MainsChanged, 0, 0, 0.0);
        self.resumed = false;
    }

    pub fn resume(&mut self) {
        self.dispatcher().call(Opcode::MainsChanged, 0, 1, 0.0);
        self.resumed = true;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.dispatcher()
            .call(Opcode::SetSampleRate, 0, 0, sample_rate);
    }

    pub fn set_block_size(&mut self, block_size: usize) {
        let block_size = isize::try_from(block_size).unwrap_or(isize::MAX);
        self.dispatcher()
            .call(Opcode::SetBlockSize, 0, block_size, 0.0);
    }

    /// Standard start-up: open, configure sample rate and block size, resume.
    pub fn activate(&mut self, config: &HostConfig) {
        self.open();
        self.set_sample_rate(config.sample_rate);
        self.set_block_size(config.block_size);
        self.resume();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        if self.resumed {
            self.suspend();
        }
        self.dispatcher().call(Opcode::Close, 0, 0, 0.0);
        self.closed = true;
        debug!("closed plug-in");
    }

    // descriptor -------------------------------------------------------------

    pub fn num_inputs(&self) -> i32 {
        self.effect().num_inputs()
    }

    pub fn num_outputs(&self) -> i32 {
        self.effect().num_outputs()
    }

    pub fn num_params(&self) -> i32 {
        self.effect().num_params()
    }

    pub fn num_programs(&self) -> i32 {
        self.effect().num_programs()
    }

    pub fn latency(&self) -> i32 {
        self.effect().latency()
    }

    pub fn version(&self) -> i32 {
        self.effect().version()
    }

    pub fn unique_id(&self) -> i32 {
        self.effect().unique_id()
    }

    pub fn flags(&self) -> EffectFlags {
        self.effect().flags()
    }

    pub fn has_editor(&self) -> bool {
        self.flags().has_editor()
    }

    pub fn is_synth(&self) -> bool {
        self.flags().is_synth()
    }

    pub fn no_tail(&self) -> bool {
        self.flags().no_sound_in_stop()
    }

    pub fn program_chunks(&self) -> bool {
        self.flags().program_chunks()
    }

    /// What the plug-in advertises in its flags.
    pub fn can_process_double(&self) -> bool {
        self.flags().can_double_replacing()
    }

    /// Whether the double precision entry point actually exists.
    pub fn supports(&self, capability: Capability) -> bool {
        self.procs.supports(capability)
    }

    // names ------------------------------------------------------------------

    fn text(&self, opcode: Opcode, index: i32, field: StringField) -> String {
        strings::get_text(&self.dispatcher(), opcode, index, field).text
    }

    pub fn name(&self) -> String {
        self.text(Opcode::GetEffectName, 0, StringField::EffectName)
    }

    pub fn vendor(&self) -> String {
        self.text(Opcode::GetVendorString, 0, StringField::VendorString)
    }

    pub fn product(&self) -> String {
        self.text(Opcode::GetProductString, 0, StringField::ProductString)
    }

    pub fn vendor_version(&self) -> String {
        self.text(Opcode::GetVendorVersion, 0, StringField::VendorVersion)
    }

    // capabilities -----------------------------------------------------------

    /// Only an answer of exactly 1 counts as support.
    pub fn can_do(&self, what: &str) -> bool {
        let Ok(query) = CString::new(what) else {
            return false;
        };
        let answer = unsafe {
            self.dispatcher()
                .dispatch(Opcode::CanDo, 0, 0, query.as_ptr().cast_mut().cast(), 0.0)
        };
        answer == 1
    }

    pub fn can_receive_events(&self) -> bool {
        self.can_do("receiveVstEvents") && self.can_do("receiveVstMidiEvent")
    }

    pub fn can_receive_time_info(&self) -> bool {
        self.can_do("receiveVstTimeInfo")
    }

    // processing -------------------------------------------------------------

    pub fn process(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> Result<(), HostError> {
        let effect = unsafe { EffectRef::from_raw(self.effect) };
        self.buffers
            .process(effect, &self.procs, inputs, outputs, frames)
    }

    pub fn process_double(
        &mut self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        frames: usize,
    ) -> Result<(), HostError> {
        let effect = unsafe { EffectRef::from_raw(self.effect) };
        self.buffers
            .process_double(effect, &self.procs, inputs, outputs, frames)
    }

    /// Processes a whole [`AudioBuffer`]; the block length is the input's.
    pub fn process_buffers(
        &mut self,
        inputs: &AudioBuffer<f32>,
        outputs: &mut AudioBuffer<f32>,
    ) -> Result<(), HostError> {
        let frames = inputs.frames();
        let inputs: Vec<&[f32]> = inputs.channel_slices().collect();
        let mut outputs: Vec<&mut [f32]> = outputs.channel_slices_mut().collect();
        self.process(&inputs, &mut outputs, frames)
    }

    /// Double precision counterpart of [`Vst2Plugin::process_buffers`].
    pub fn process_buffers_double(
        &mut self,
        inputs: &AudioBuffer<f64>,
        outputs: &mut AudioBuffer<f64>,
    ) -> Result<(), HostError> {
        let frames = inputs.frames();
        let inputs: Vec<&[f64]> = inputs.channel_slices().collect();
        let mut outputs: Vec<&mut [f64]> = outputs.channel_slices_mut().collect();
        self.process_double(&inputs, &mut outputs, frames)
    }

    /// Sends every event as-is, one `effProcessEvents` call per event.
    pub fn process_events(&mut self, events: &[MidiMessage]) -> usize {
        let effect = unsafe { EffectRef::from_raw(self.effect) };
        let dispatcher = Dispatcher::new(effect, &self.procs);
        self.events.send(&dispatcher, events)
    }

    /// Sends the events that fall inside the next `block_len` frames and
    /// returns the remainder rebased for the following block.
    pub fn process_note_events(
        &mut self,
        events: &[MidiMessage],
        block_len: u32,
    ) -> Vec<MidiMessage> {
        let effect = unsafe { EffectRef::from_raw(self.effect) };
        let dispatcher = Dispatcher::new(effect, &self.procs);
        self.events.send_block(&dispatcher, events, block_len)
    }

    // parameters -------------------------------------------------------------

    fn check_param(&self, index: i32) -> Result<(), HostError> {
        let count = self.num_params();
        if index < 0 || index >= count {
            return Err(HostError::InvalidParameterIndex { index, count });
        }
        Ok(())
    }

    pub fn set_parameter(&mut self, index: i32, value: f32) -> Result<(), HostError> {
        self.check_param(index)?;
        unsafe { self.procs.set_parameter(self.effect.as_ptr(), index, value) };
        Ok(())
    }

    pub fn get_parameter(&self, index: i32) -> Result<f32, HostError> {
        self.check_param(index)?;
        Ok(unsafe { self.procs.get_parameter(self.effect.as_ptr(), index) })
    }

    pub fn parameter_name(&self, index: i32) -> String {
        self.text(Opcode::GetParamName, index, StringField::ParamName)
    }

    pub fn parameter_label(&self, index: i32) -> String {
        self.text(Opcode::GetParamLabel, index, StringField::ParamLabel)
    }

    pub fn parameter_display(&self, index: i32) -> String {
        self.text(Opcode::GetParamDisplay, index, StringField::ParamDisplay)
    }

    // programs ---------------------------------------------------------------

    pub fn program(&self) -> isize {
        self.dispatcher().call(Opcode::GetProgram, 0, 0, 0.0)
    }

    pub fn set_program(&mut self, index: i32) {
        self.dispatcher()
            .call(Opcode::SetProgram, 0, index as isize, 0.0);
    }

    pub fn program_name(&self) -> String {
        self.text(Opcode::GetProgramName, 0, StringField::ProgramName)
    }

    /// A nonzero dispatch result means the plug-in has no such program.
    pub fn program_name_indexed(&self, index: i32) -> Result<String, HostError> {
        let reply = strings::get_text(
            &self.dispatcher(),
            Opcode::GetProgramNameIndexed,
            index,
            StringField::ProgramName,
        );
        if reply.result != 0 {
            return Err(HostError::InvalidProgramIndex(index));
        }
        Ok(reply.text)
    }

    // state ------------------------------------------------------------------

    pub fn get_chunk(&mut self) -> Vec<u8> {
        self.get_chunk_scoped(ChunkScope::Bank)
    }

    pub fn get_chunk_scoped(&mut self, scope: ChunkScope) -> Vec<u8> {
        chunk::get_chunk(&self.dispatcher(), scope)
    }

    pub fn set_chunk(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        self.set_chunk_scoped(ChunkScope::Bank, bytes)
    }

    pub fn set_chunk_scoped(&mut self, scope: ChunkScope, bytes: &[u8]) -> Result<(), HostError> {
        chunk::set_chunk(&self.dispatcher(), scope, bytes)
    }

    /// Snapshot of names, counts, flags, programs and parameters.
    pub fn properties(&mut self, options: SnapshotOptions) -> PluginProperties {
        PluginProperties::collect(self, options)
    }

    // editor -----------------------------------------------------------------

    /// Size of the editor, if the plug-in reports one.
    pub fn editor_rect(&mut self) -> Option<EditorRect> {
        let mut rect: *mut ERect = ptr::null_mut();
        unsafe {
            self.dispatcher().dispatch(
                Opcode::EditGetRect,
                0,
                0,
                (&mut rect as *mut *mut ERect).cast(),
                0.0,
            );
            rect.as_ref().copied().map(EditorRect::from)
        }
    }

    /// Attaches the editor to a native parent window.
    ///
    /// # Safety
    /// `parent` must be a valid window handle for the platform (`HWND`,
    /// `NSView*` or an X11 window id) that outlives the open editor.
    pub unsafe fn open_editor(&mut self, parent: NonNull<c_void>) -> bool {
        self.dispatcher()
            .dispatch(Opcode::EditOpen, 0, 0, parent.as_ptr(), 0.0)
            != 0
    }

    pub fn close_editor(&mut self) {
        self.dispatcher().call(Opcode::EditClose, 0, 0, 0.0);
    }
}

impl Drop for Vst2Plugin {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Vst2Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vst2Plugin")
            .field("effect", &self.effect())
            .field("procs", &self.procs)
            .field("module", &self.module)
            .field("resumed", &self.resumed)
            .finish()
    }
}
