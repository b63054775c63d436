use std::ffi::c_void;
use std::ptr;
use std::slice;

use tracing::{debug, warn};

use crate::dispatch::{Dispatcher, Opcode};
use crate::error::HostError;

/// Which state a chunk carries, passed as the dispatch index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChunkScope {
    /// Whole bank of programs.
    #[default]
    Bank,
    /// Current program only.
    Program,
}

impl ChunkScope {
    fn index(self) -> i32 {
        match self {
            ChunkScope::Bank => 0,
            ChunkScope::Program => 1,
        }
    }
}

/// Reads the plug-in's state chunk.
///
/// The plug-in keeps ownership of the returned memory and may reuse it on the
/// next call, so the bytes are copied before returning.
pub fn get_chunk(dispatcher: &Dispatcher<'_>, scope: ChunkScope) -> Vec<u8> {
    let mut data: *mut c_void = ptr::null_mut();
    let size = unsafe {
        dispatcher.dispatch(
            Opcode::GetChunk,
            scope.index(),
            0,
            (&mut data as *mut *mut c_void).cast(),
            0.0,
        )
    };
    if size <= 0 || data.is_null() {
        debug!(size, ?scope, "plug-in returned an empty chunk");
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(data.cast::<u8>(), size as usize) }.to_vec()
}

/// Hands a state chunk to the plug-in.
///
/// The bytes are staged in a host-owned buffer with one trailing zero byte
/// that lives until the dispatch returns. A negative return value means the
/// plug-in refused the data.
pub fn set_chunk(
    dispatcher: &Dispatcher<'_>,
    scope: ChunkScope,
    bytes: &[u8],
) -> Result<(), HostError> {
    let mut staged = Vec::with_capacity(bytes.len() + 1);
    staged.extend_from_slice(bytes);
    staged.push(0);
    let result = unsafe {
        dispatcher.dispatch(
            Opcode::SetChunk,
            scope.index(),
            bytes.len() as isize,
            staged.as_mut_ptr().cast(),
            0.0,
        )
    };
    if result < 0 {
        warn!(result, len = bytes.len(), "plug-in rejected state chunk");
        return Err(HostError::ChunkRejected(result));
    }
    Ok(())
}
