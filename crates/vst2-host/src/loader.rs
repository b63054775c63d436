use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libloading::Library;
use tracing::debug;
use vst2_sys::{self as ffi, AEffect, PluginEntryProc};

use crate::callback::{host_callback, LoadScope, SharedHost};
use crate::error::{InitError, LoadError};

/// Anything that can look up an exported entry symbol.
pub trait EntrySource {
    /// Returns the function exported as `symbol` (NUL terminated), if any.
    ///
    /// # Safety
    /// The symbol, when present, must have the [`PluginEntryProc`] signature.
    unsafe fn entry(&self, symbol: &[u8]) -> Option<PluginEntryProc>;
}

impl EntrySource for Library {
    unsafe fn entry(&self, symbol: &[u8]) -> Option<PluginEntryProc> {
        self.get::<PluginEntryProc>(symbol)
            .ok()
            .map(|entry| *entry)
    }
}

/// Tries `VSTPluginMain` first and falls back to the legacy `main` export.
///
/// # Safety
/// See [`EntrySource::entry`].
pub unsafe fn resolve_entry<S>(source: &S, path: &Path) -> Result<PluginEntryProc, LoadError>
where
    S: EntrySource + ?Sized,
{
    if let Some(entry) = source.entry(ffi::VST_ENTRY_SYMBOL) {
        return Ok(entry);
    }
    debug!(path = %path.display(), "`VSTPluginMain` not exported, trying legacy `main`");
    source
        .entry(ffi::VST_LEGACY_ENTRY_SYMBOL)
        .ok_or_else(|| LoadError::MissingEntry(path.to_path_buf()))
}

/// Calls the entry point with the bridge's host callback and validates the
/// returned descriptor.
///
/// Callbacks the plug-in makes before returning are routed to `host`.
///
/// # Safety
/// `entry` must be a VST 2.4 entry point whose module stays loaded for as
/// long as the returned descriptor is used.
pub unsafe fn invoke_entry(
    entry: PluginEntryProc,
    host: &SharedHost,
) -> Result<NonNull<AEffect>, InitError> {
    let effect = {
        let _scope = LoadScope::enter(host.clone());
        entry(host_callback)
    };
    let effect = NonNull::new(effect).ok_or(InitError::NullEffect)?;
    let magic = effect.as_ref().magic;
    if magic != ffi::kEffectMagic {
        return Err(InitError::BadMagic(magic));
    }
    Ok(effect)
}

/// A plug-in binary kept resident while an instance created from it is alive.
pub struct PluginModule {
    path: PathBuf,
    library: Library,
}

impl PluginModule {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::MissingBinary(path.to_path_buf()));
        }

        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded plug-in module");

        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn resolve_entry(&self) -> Result<PluginEntryProc, LoadError> {
        unsafe { resolve_entry(&self.library, &self.path) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("path", &self.path)
            .finish()
    }
}
