//! Typed value codec for variable slots.
//!
//! Fixed-width kinds are stored raw in native byte order. Strings and byte
//! arrays are stored as `[length][payload]`; a zero length decodes as
//! `None`, so a null and an empty value share one encoding.

use crate::error::{IpcError, IpcResult};
use crate::schema::{LengthPrefix, ValueKind, VariableDescriptor};
use serde::Serialize;

/// A decoded variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Value {
    /// Kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Long(_) => ValueKind::Long,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Payload length in bytes once encoded, prefix excluded.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::String(s) => s.len(),
            Self::Bytes(b) => b.len(),
            other => other.kind().fixed_width().unwrap_or(0),
        }
    }
}

/// Map empty strings and byte arrays to `None`.
pub fn normalize(value: Option<Value>) -> Option<Value> {
    match value {
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Bytes(b)) if b.is_empty() => None,
        other => other,
    }
}

/// Rust types that can be stored in a shared variable.
pub trait SharedValue: Sized {
    /// Kind the variable must be declared with.
    const KIND: ValueKind;

    /// Convert into a cacheable value.
    fn into_value(self) -> Option<Value>;

    /// Convert back from a cached value; `None` yields the type's default.
    fn from_value(value: Option<&Value>) -> Self;
}

macro_rules! impl_fixed_shared_value {
    ($ty:ty, $variant:ident) => {
        impl SharedValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn into_value(self) -> Option<Value> {
                Some(Value::$variant(self))
            }

            fn from_value(value: Option<&Value>) -> Self {
                match value {
                    Some(Value::$variant(v)) => *v,
                    _ => <$ty>::default(),
                }
            }
        }
    };
}

impl_fixed_shared_value!(i32, Int);
impl_fixed_shared_value!(i64, Long);
impl_fixed_shared_value!(f32, Float);
impl_fixed_shared_value!(bool, Bool);

impl SharedValue for Option<String> {
    const KIND: ValueKind = ValueKind::String;

    fn into_value(self) -> Option<Value> {
        normalize(self.map(Value::String))
    }

    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

impl SharedValue for Option<Vec<u8>> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn into_value(self) -> Option<Value> {
        normalize(self.map(Value::Bytes))
    }

    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bytes(b)) => Some(b.clone()),
            _ => None,
        }
    }
}

/// Check that `kind` matches the descriptor.
pub fn check_kind(descriptor: &VariableDescriptor, kind: ValueKind) -> IpcResult<()> {
    if descriptor.kind() != kind {
        return Err(IpcError::TypeMismatch {
            name: descriptor.name().to_string(),
            declared: descriptor.kind(),
            requested: kind,
        });
    }
    Ok(())
}

/// Check that `value` can be written to the descriptor's slot.
pub fn check_value(descriptor: &VariableDescriptor, value: Option<&Value>) -> IpcResult<()> {
    let Some(value) = value else {
        return Ok(());
    };
    check_kind(descriptor, value.kind())?;
    let len = value.encoded_len();
    let limit = descriptor.capacity().min(match descriptor.prefix() {
        LengthPrefix::None => usize::MAX,
        prefix => prefix.max_len(),
    });
    if len > limit {
        return Err(IpcError::ValueTooLarge {
            name: descriptor.name().to_string(),
            len,
            capacity: descriptor.capacity(),
        });
    }
    Ok(())
}

/// Encode `value` into `slot`.
///
/// The value is validated before the first byte is written, so a rejected
/// value leaves the slot untouched. `slot` must be the descriptor's full
/// slot.
pub fn encode_slot(
    descriptor: &VariableDescriptor,
    value: Option<&Value>,
    slot: &mut [u8],
) -> IpcResult<()> {
    check_value(descriptor, value)?;
    debug_assert_eq!(slot.len(), descriptor.slot_size());

    match value {
        None => write_prefix(descriptor.prefix(), slot, 0),
        Some(Value::Int(v)) => slot[..4].copy_from_slice(&v.to_ne_bytes()),
        Some(Value::Long(v)) => slot[..8].copy_from_slice(&v.to_ne_bytes()),
        Some(Value::Float(v)) => slot[..4].copy_from_slice(&v.to_ne_bytes()),
        Some(Value::Bool(v)) => slot[0] = u8::from(*v),
        Some(Value::String(s)) => write_prefixed(descriptor.prefix(), slot, s.as_bytes()),
        Some(Value::Bytes(b)) => write_prefixed(descriptor.prefix(), slot, b),
    }
    Ok(())
}

/// Decode the value stored in `slot`.
pub fn decode_slot(descriptor: &VariableDescriptor, slot: &[u8]) -> IpcResult<Option<Value>> {
    let value = match descriptor.kind() {
        ValueKind::Int => Value::Int(i32::from_ne_bytes(fixed(slot))),
        ValueKind::Long => Value::Long(i64::from_ne_bytes(fixed(slot))),
        ValueKind::Float => Value::Float(f32::from_ne_bytes(fixed(slot))),
        ValueKind::Bool => Value::Bool(slot[0] != 0),
        ValueKind::String => {
            let Some(payload) = read_prefixed(descriptor, slot)? else {
                return Ok(None);
            };
            Value::String(String::from_utf8_lossy(payload).into_owned())
        }
        ValueKind::Bytes => {
            let Some(payload) = read_prefixed(descriptor, slot)? else {
                return Ok(None);
            };
            Value::Bytes(payload.to_vec())
        }
    };
    Ok(Some(value))
}

fn fixed<const N: usize>(slot: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&slot[..N]);
    bytes
}

fn write_prefix(prefix: LengthPrefix, slot: &mut [u8], len: usize) {
    match prefix {
        LengthPrefix::None => slot.fill(0),
        LengthPrefix::U16 => slot[..2].copy_from_slice(&(len as u16).to_ne_bytes()),
        LengthPrefix::U32 => slot[..4].copy_from_slice(&(len as u32).to_ne_bytes()),
    }
}

fn write_prefixed(prefix: LengthPrefix, slot: &mut [u8], payload: &[u8]) {
    write_prefix(prefix, slot, payload.len());
    let start = prefix.bytes();
    slot[start..start + payload.len()].copy_from_slice(payload);
}

fn read_prefixed<'a>(descriptor: &VariableDescriptor, slot: &'a [u8]) -> IpcResult<Option<&'a [u8]>> {
    let prefix = descriptor.prefix();
    let len = match prefix {
        LengthPrefix::None => return Ok(None),
        LengthPrefix::U16 => usize::from(u16::from_ne_bytes(fixed(slot))),
        LengthPrefix::U32 => u32::from_ne_bytes(fixed(slot)) as usize,
    };
    if len == 0 {
        return Ok(None);
    }
    if len > descriptor.capacity() {
        return Err(IpcError::CorruptEntry {
            name: descriptor.name().to_string(),
            len,
            capacity: descriptor.capacity(),
        });
    }
    let start = prefix.bytes();
    Ok(Some(&slot[start..start + len]))
}
