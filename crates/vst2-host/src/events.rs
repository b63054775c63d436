//! MIDI event marshaling for `effProcessEvents`.
//!
//! Records and the surrounding events table are serialized at fixed byte
//! offsets into aligned storage instead of relying on a Rust aggregate
//! layout. Each table carries exactly one record followed by a null slot,
//! so a batch of N events costs N dispatch calls.

use std::ffi::c_void;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vst2_sys::{self as ffi, events_table_offsets as table, midi_event_offsets as midi};

use crate::dispatch::{Dispatcher, Opcode};

/// A short MIDI message scheduled at a frame offset within the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MidiMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
    pub delta_frames: u32,
}

impl MidiMessage {
    pub const fn new(status: u8, data1: u8, data2: u8, delta_frames: u32) -> Self {
        Self {
            status,
            data1,
            data2,
            delta_frames,
        }
    }

    pub const fn note_on(channel: u8, note: u8, velocity: u8, delta_frames: u32) -> Self {
        Self::new(0x90 | (channel & 0x0f), note, velocity, delta_frames)
    }

    pub const fn note_off(channel: u8, note: u8, velocity: u8, delta_frames: u32) -> Self {
        Self::new(0x80 | (channel & 0x0f), note, velocity, delta_frames)
    }
}

impl From<(u8, u8, u8, u32)> for MidiMessage {
    fn from((status, data1, data2, delta_frames): (u8, u8, u8, u32)) -> Self {
        Self::new(status, data1, data2, delta_frames)
    }
}

/// Result of splitting a batch against one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSplit {
    /// Events inside the block, in their original order.
    pub now: Vec<MidiMessage>,
    /// Events for later blocks, rebased to the start of the next block.
    pub deferred: Vec<MidiMessage>,
}

pub fn partition(events: &[MidiMessage], block_len: u32) -> EventSplit {
    let mut split = EventSplit::default();
    for event in events {
        if event.delta_frames < block_len {
            split.now.push(*event);
        } else {
            split.deferred.push(MidiMessage {
                delta_frames: event.delta_frames - block_len,
                ..*event
            });
        }
    }
    split
}

#[repr(C, align(8))]
struct RecordBytes([u8; ffi::MIDI_EVENT_SIZE]);

#[repr(C, align(8))]
struct TableBytes([u8; ffi::EVENTS_TABLE_SIZE]);

fn put_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_usize(bytes: &mut [u8], offset: usize, value: usize) {
    bytes[offset..offset + table::SLOT_STRIDE].copy_from_slice(&value.to_ne_bytes());
}

/// An events table wired to a single MIDI record.
///
/// Both parts are boxed so the table's pointer slot stays valid when the
/// block itself moves.
pub struct EventBlock {
    record: Box<RecordBytes>,
    table: Box<TableBytes>,
}

impl EventBlock {
    pub fn new() -> Self {
        let record = Box::new(RecordBytes([0; ffi::MIDI_EVENT_SIZE]));
        let mut table = Box::new(TableBytes([0; ffi::EVENTS_TABLE_SIZE]));
        let record_addr = &*record as *const RecordBytes as usize;
        put_i32(&mut table.0, table::NUM_EVENTS, 1);
        put_usize(&mut table.0, table::RESERVED, 0);
        put_usize(&mut table.0, table::SLOTS, record_addr);
        put_usize(&mut table.0, table::SLOTS + table::SLOT_STRIDE, 0);
        Self { record, table }
    }

    pub fn from_message(message: &MidiMessage) -> Self {
        let mut block = Self::new();
        block.encode(message);
        block
    }

    /// Rewrites the record in place; the table keeps pointing at it.
    pub fn encode(&mut self, message: &MidiMessage) {
        let bytes = &mut self.record.0;
        bytes.fill(0);
        put_i32(bytes, midi::TYPE, ffi::kVstMidiType);
        put_i32(bytes, midi::BYTE_SIZE, ffi::MIDI_EVENT_SIZE as i32);
        put_i32(
            bytes,
            midi::DELTA_FRAMES,
            i32::try_from(message.delta_frames).unwrap_or(i32::MAX),
        );
        put_i32(bytes, midi::FLAGS, 0);
        put_i32(bytes, midi::NOTE_LENGTH, 0);
        put_i32(bytes, midi::NOTE_OFFSET, 0);
        bytes[midi::MIDI_DATA..midi::MIDI_DATA + 4].copy_from_slice(&[
            message.status,
            message.data1,
            message.data2,
            0,
        ]);
        bytes[midi::DETUNE] = 0;
        bytes[midi::NOTE_OFF_VELOCITY] = 0;
        bytes[midi::RESERVED1] = 0;
        bytes[midi::RESERVED2] = 0;
    }

    pub fn record_bytes(&self) -> &[u8] {
        &self.record.0
    }

    pub fn table_bytes(&self) -> &[u8] {
        &self.table.0
    }

    /// Pointer passed as the data argument of `effProcessEvents`.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.table.0.as_mut_ptr().cast()
    }
}

impl Default for EventBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// One block per event, ready to dispatch in order.
pub fn build(events: &[MidiMessage]) -> Vec<EventBlock> {
    events.iter().map(EventBlock::from_message).collect()
}

/// Sends events through a reusable block, one dispatch per event.
#[derive(Default)]
pub struct EventMarshaler {
    block: EventBlock,
}

impl EventMarshaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches every event in order and returns how many were sent.
    pub fn send(&mut self, dispatcher: &Dispatcher<'_>, events: &[MidiMessage]) -> usize {
        for event in events {
            self.block.encode(event);
            unsafe {
                dispatcher.dispatch(Opcode::ProcessEvents, 0, 0, self.block.as_mut_ptr(), 0.0);
            }
        }
        events.len()
    }

    /// Sends the part of `events` that falls inside a block of `block_len`
    /// frames and returns the rest, rebased for the next block.
    pub fn send_block(
        &mut self,
        dispatcher: &Dispatcher<'_>,
        events: &[MidiMessage],
        block_len: u32,
    ) -> Vec<MidiMessage> {
        let split = partition(events, block_len);
        self.send(dispatcher, &split.now);
        split.deferred
    }
}
