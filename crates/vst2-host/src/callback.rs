//! Plug-in to host direction of the protocol.
//!
//! The plug-in receives a single C function pointer, [`host_callback`], which
//! routes every call to the [`HostCallback`] owned by the instance. The host
//! object is found through the descriptor's `user` field once the entry point
//! has returned; calls made from inside the entry point itself (before the
//! descriptor exists) are routed through a thread-local slot that is armed for
//! the duration of that call.

use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use tracing::{error, trace};
use vst2_sys::{self as ffi, AEffect};

use crate::config::HostConfig;

/// Host opcodes recognised by the bundled callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOpcode {
    Automate,
    Version,
    CurrentId,
    Idle,
    GetTime,
    ProcessEvents,
    IoChanged,
    SizeWindow,
    GetSampleRate,
    GetBlockSize,
    GetInputLatency,
    GetOutputLatency,
    GetCurrentProcessLevel,
    GetAutomationState,
    GetVendorString,
    GetProductString,
    GetVendorVersion,
    VendorSpecific,
    CanDo,
    GetLanguage,
    GetDirectory,
    UpdateDisplay,
    BeginEdit,
    EndEdit,
}

impl HostOpcode {
    pub fn from_code(code: i32) -> Option<Self> {
        let opcode = match code {
            ffi::audioMasterAutomate => Self::Automate,
            ffi::audioMasterVersion => Self::Version,
            ffi::audioMasterCurrentId => Self::CurrentId,
            ffi::audioMasterIdle => Self::Idle,
            ffi::audioMasterGetTime => Self::GetTime,
            ffi::audioMasterProcessEvents => Self::ProcessEvents,
            ffi::audioMasterIOChanged => Self::IoChanged,
            ffi::audioMasterSizeWindow => Self::SizeWindow,
            ffi::audioMasterGetSampleRate => Self::GetSampleRate,
            ffi::audioMasterGetBlockSize => Self::GetBlockSize,
            ffi::audioMasterGetInputLatency => Self::GetInputLatency,
            ffi::audioMasterGetOutputLatency => Self::GetOutputLatency,
            ffi::audioMasterGetCurrentProcessLevel => Self::GetCurrentProcessLevel,
            ffi::audioMasterGetAutomationState => Self::GetAutomationState,
            ffi::audioMasterGetVendorString => Self::GetVendorString,
            ffi::audioMasterGetProductString => Self::GetProductString,
            ffi::audioMasterGetVendorVersion => Self::GetVendorVersion,
            ffi::audioMasterVendorSpecific => Self::VendorSpecific,
            ffi::audioMasterCanDo => Self::CanDo,
            ffi::audioMasterGetLanguage => Self::GetLanguage,
            ffi::audioMasterGetDirectory => Self::GetDirectory,
            ffi::audioMasterUpdateDisplay => Self::UpdateDisplay,
            ffi::audioMasterBeginEdit => Self::BeginEdit,
            ffi::audioMasterEndEdit => Self::EndEdit,
            _ => return None,
        };
        Some(opcode)
    }
}

/// Arguments of a single plug-in to host call.
#[derive(Clone, Copy, Debug)]
pub struct CallbackRequest {
    /// `None` while the entry point is still constructing the effect.
    pub effect: Option<NonNull<AEffect>>,
    pub opcode: i32,
    pub index: i32,
    pub value: isize,
    pub ptr: *mut c_void,
    pub opt: f32,
}

impl CallbackRequest {
    pub fn host_opcode(&self) -> Option<HostOpcode> {
        HostOpcode::from_code(self.opcode)
    }

    /// Reads `ptr` as a NUL terminated string, as passed with `audioMasterCanDo`.
    ///
    /// # Safety
    /// `ptr` must be null or point at a NUL terminated string that outlives
    /// the request.
    pub unsafe fn ptr_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        CStr::from_ptr(self.ptr.cast()).to_str().ok()
    }

    /// Copies `text` into the plug-in supplied buffer, truncating to
    /// `capacity - 1` bytes and terminating with NUL.
    ///
    /// # Safety
    /// `ptr` must be null or writable for `capacity` bytes.
    pub unsafe fn write_str(&self, text: &str, capacity: usize) -> bool {
        if self.ptr.is_null() || capacity == 0 {
            return false;
        }
        let len = text.len().min(capacity - 1);
        let dst = self.ptr.cast::<u8>();
        ptr::copy_nonoverlapping(text.as_ptr(), dst, len);
        *dst.add(len) = 0;
        true
    }
}

/// Host side of the callback protocol.
///
/// Implementations are invoked synchronously from inside any outward call
/// (dispatch, process, parameter access) and possibly from plug-in owned
/// threads, so they take `&self` and must not hold a lock that the code
/// driving the plug-in may also take.
pub trait HostCallback: Send + Sync {
    fn callback(&self, request: &CallbackRequest) -> isize;
}

impl<F> HostCallback for F
where
    F: Fn(&CallbackRequest) -> isize + Send + Sync,
{
    fn callback(&self, request: &CallbackRequest) -> isize {
        self(request)
    }
}

/// Minimal callback: reports protocol version 2400 and answers 0 to everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHost;

impl HostCallback for DefaultHost {
    fn callback(&self, request: &CallbackRequest) -> isize {
        default_answer(request.opcode)
    }
}

pub fn default_answer(opcode: i32) -> isize {
    if opcode == ffi::audioMasterVersion {
        ffi::kVstVersion as isize
    } else {
        0
    }
}

/// Callback answering the common host queries from a [`HostConfig`].
#[derive(Clone, Debug, Default)]
pub struct StandardHost {
    config: HostConfig,
}

impl StandardHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

impl HostCallback for StandardHost {
    fn callback(&self, request: &CallbackRequest) -> isize {
        match request.host_opcode() {
            Some(HostOpcode::Version) => ffi::kVstVersion as isize,
            Some(HostOpcode::GetSampleRate) => self.config.sample_rate as isize,
            Some(HostOpcode::GetBlockSize) => self.config.block_size as isize,
            Some(HostOpcode::GetVendorString) => unsafe {
                request.write_str(&self.config.vendor, ffi::kVstMaxVendorStrLen) as isize
            },
            Some(HostOpcode::GetProductString) => unsafe {
                request.write_str(&self.config.product, ffi::kVstMaxProductStrLen) as isize
            },
            Some(HostOpcode::GetVendorVersion) => self.config.vendor_version as isize,
            Some(HostOpcode::CanDo) => match unsafe { request.ptr_str() } {
                Some(what) if self.config.supports(what) => 1,
                _ => 0,
            },
            Some(HostOpcode::Automate) => {
                trace!(index = request.index, value = request.opt, "parameter automated");
                0
            }
            _ => 0,
        }
    }
}

pub type SharedHost = Arc<dyn HostCallback>;

thread_local! {
    static LOADING: RefCell<Option<SharedHost>> = const { RefCell::new(None) };
}

/// Arms the thread-local routing slot for callbacks issued from inside the
/// entry point. Restores the previous occupant on drop so nested loads work.
pub(crate) struct LoadScope {
    previous: Option<SharedHost>,
}

impl LoadScope {
    pub(crate) fn enter(host: SharedHost) -> Self {
        let previous = LOADING.with(|slot| slot.replace(Some(host)));
        Self { previous }
    }
}

impl Drop for LoadScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        LOADING.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Heap slot whose address is stored in the descriptor's `user` field.
pub(crate) struct HostSlot {
    host: Box<SharedHost>,
}

impl HostSlot {
    pub(crate) fn new(host: SharedHost) -> Self {
        Self {
            host: Box::new(host),
        }
    }

    pub(crate) fn user_ptr(&self) -> *mut c_void {
        (&*self.host as *const SharedHost).cast_mut().cast()
    }
}

/// The function pointer handed to the plug-in entry point.
pub extern "C" fn host_callback(
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize {
    let request = CallbackRequest {
        effect: NonNull::new(effect),
        opcode,
        index,
        value,
        ptr,
        opt,
    };
    trace!(opcode, index, value, "host callback");

    // While an entry point runs, its descriptor may still hold garbage in
    // `user`, so the armed load scope wins.
    if let Some(host) = LOADING.with(|slot| slot.borrow().clone()) {
        return invoke(host.as_ref(), &request);
    }
    match unsafe { installed_host(effect) } {
        Some(host) => invoke(host.as_ref(), &request),
        None => default_answer(opcode),
    }
}

unsafe fn installed_host<'a>(effect: *mut AEffect) -> Option<&'a SharedHost> {
    if effect.is_null() {
        return None;
    }
    let user = (*effect).user.cast::<SharedHost>().cast_const();
    user.as_ref()
}

fn invoke(host: &dyn HostCallback, request: &CallbackRequest) -> isize {
    match catch_unwind(AssertUnwindSafe(|| host.callback(request))) {
        Ok(result) => result,
        Err(_) => {
            error!(opcode = request.opcode, "host callback panicked, answering 0");
            0
        }
    }
}
