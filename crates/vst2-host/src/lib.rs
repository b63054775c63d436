//! Host-side bridge for VST 2.4 plug-in modules.
//!
//! The crate loads a plug-in binary, hands it the host callback, validates the
//! effect descriptor it returns and then drives it: control opcodes go through
//! the [`Dispatcher`], audio through [`BufferMarshaler`], MIDI through
//! [`EventMarshaler`], text through the fixed-capacity readers in [`strings`]
//! and opaque state through [`chunk`]. [`Vst2Plugin`] ties these together and
//! owns the module for as long as the instance is alive.
//!
//! Calls into a plug-in are synchronous and not thread safe; an instance may
//! move between threads but is only ever driven from one at a time.

pub mod audio_buffer;
pub mod buffers;
pub mod callback;
pub mod chunk;
pub mod config;
pub mod dispatch;
pub mod effect;
mod error;
pub mod events;
pub mod loader;
mod plugin;
pub mod properties;
pub mod strings;

pub use vst2_sys as ffi;

pub use audio_buffer::{AudioBuffer, Sample};
pub use buffers::BufferMarshaler;
pub use callback::{
    host_callback, CallbackRequest, DefaultHost, HostCallback, HostOpcode, StandardHost,
};
pub use chunk::ChunkScope;
pub use config::HostConfig;
pub use dispatch::{Dispatcher, Opcode};
pub use effect::{Capability, EffectFlags, EffectProcs, EffectRef};
pub use error::{HostError, InitError, LoadError};
pub use events::{EventBlock, EventMarshaler, EventSplit, MidiMessage};
pub use loader::PluginModule;
pub use plugin::{EditorRect, Vst2Plugin};
pub use properties::{ParameterInfo, PluginProperties, ProgramInfo, SnapshotOptions};
pub use strings::{StringField, TextReply};
