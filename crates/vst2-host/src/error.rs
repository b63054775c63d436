use std::path::PathBuf;

use thiserror::Error;

use crate::effect::Capability;

/// Failures while bringing a plugin module into the process.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("plugin binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("failed to load plugin library {path}: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("plugin library {0} exports neither `VSTPluginMain` nor `main`")]
    MissingEntry(PathBuf),
}

/// Failures while turning the entry point's result into a usable effect.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("plug-in entry returned a null effect")]
    NullEffect,
    #[error("effect magic {0:#010x} does not match 'VstP'")]
    BadMagic(i32),
    #[error("effect is missing the mandatory `{0}` function")]
    MissingFunction(&'static str),
}

/// Errors surfaced by the host bridge.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("plug-in does not provide {0}")]
    Unsupported(Capability),
    #[error("no program with this index ({0})")]
    InvalidProgramIndex(i32),
    #[error("no parameter with this index ({index}), plug-in has {count}")]
    InvalidParameterIndex { index: i32, count: i32 },
    #[error("plug-in rejected state chunk (code {0})")]
    ChunkRejected(isize),
    #[error("expected {expected} {direction} channels, got {actual}")]
    ChannelCount {
        direction: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{direction} channel {channel} holds {len} samples, block needs {frames}")]
    BufferTooShort {
        direction: &'static str,
        channel: usize,
        len: usize,
        frames: usize,
    },
    #[error("block of {0} frames exceeds the protocol frame range")]
    FrameCount(usize),
}
