use tracing::debug;
use vst2_sys as ffi;

use crate::dispatch::{Dispatcher, Opcode};

/// Kinds of plug-in reported text, each with its own buffer capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringField {
    EffectName,
    VendorString,
    ProductString,
    VendorVersion,
    ParamName,
    ParamLabel,
    ParamDisplay,
    ProgramName,
}

impl StringField {
    /// Buffer size handed to the plug-in, terminator included.
    ///
    /// Parameter strings use the extended 32 byte limit; the legacy 8 byte
    /// limit is routinely exceeded by real plug-ins.
    pub const fn capacity(self) -> usize {
        match self {
            StringField::EffectName => ffi::kVstMaxEffectNameLen,
            StringField::VendorString | StringField::VendorVersion => ffi::kVstMaxVendorStrLen,
            StringField::ProductString => ffi::kVstMaxProductStrLen,
            StringField::ParamName | StringField::ParamLabel | StringField::ParamDisplay => {
                ffi::kVstExtMaxParamStrLen
            }
            StringField::ProgramName => ffi::kVstMaxProgNameLen,
        }
    }

    /// Opcode that fills this field, for fields with a single source.
    pub const fn opcode(self) -> Opcode {
        match self {
            StringField::EffectName => Opcode::GetEffectName,
            StringField::VendorString => Opcode::GetVendorString,
            StringField::ProductString => Opcode::GetProductString,
            StringField::VendorVersion => Opcode::GetVendorVersion,
            StringField::ParamName => Opcode::GetParamName,
            StringField::ParamLabel => Opcode::GetParamLabel,
            StringField::ParamDisplay => Opcode::GetParamDisplay,
            StringField::ProgramName => Opcode::GetProgramName,
        }
    }
}

/// Text read back from the plug-in along with the dispatch return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextReply {
    pub result: isize,
    pub text: String,
}

/// Issues `opcode` with a zeroed buffer sized for `field` and decodes the reply.
pub fn get_text(
    dispatcher: &Dispatcher<'_>,
    opcode: Opcode,
    index: i32,
    field: StringField,
) -> TextReply {
    let mut buffer = vec![0u8; field.capacity()];
    let result = unsafe { dispatcher.dispatch(opcode, index, 0, buffer.as_mut_ptr().cast(), 0.0) };
    if !buffer.contains(&0) {
        debug!(?field, %opcode, "plug-in filled string buffer without terminator");
    }
    TextReply {
        result,
        text: decode_fixed(&buffer),
    }
}

/// Decodes up to the first NUL, or the whole slice when none is present.
pub fn decode_fixed(buffer: &[u8]) -> String {
    let end = buffer
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}
