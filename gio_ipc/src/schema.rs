//! Variable descriptor registry.
//!
//! Declares the fixed schema of shared variables and computes their byte
//! ranges inside the data region. Every process attaching to one shared
//! file must declare the same variables in the same order; the registry is
//! frozen by [`VariableRegistry::finalize`] before the store maps the file.

use crate::error::{IpcError, IpcResult};
use crate::layout::{COUNTER_SIZE, HEADER_SIZE};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;

/// Bytes reserved per declared character of a string variable.
///
/// Worst-case UTF-8 width, so capacity never depends on content.
pub const STRING_BYTES_PER_CHAR: usize = 4;

/// Kind of value stored in a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueKind {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit float
    Float,
    /// Boolean, one byte
    Bool,
    /// UTF-8 string, length prefixed
    String,
    /// Raw bytes, length prefixed
    Bytes,
}

impl ValueKind {
    /// Payload width of fixed-width kinds, `None` for length-prefixed kinds.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int | Self::Float => Some(4),
            Self::Long => Some(8),
            Self::Bool => Some(1),
            Self::String | Self::Bytes => None,
        }
    }
}

/// Width of the length prefix stored in front of a variable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LengthPrefix {
    /// Fixed-width kinds carry no prefix
    None,
    /// 2-byte length
    U16,
    /// 4-byte length
    U32,
}

impl LengthPrefix {
    /// Number of bytes the prefix occupies.
    pub const fn bytes(self) -> usize {
        match self {
            Self::None => 0,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Largest payload length the prefix can express.
    pub const fn max_len(self) -> usize {
        match self {
            Self::None => 0,
            Self::U16 => u16::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }
}

/// Index of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarIndex(usize);

impl VarIndex {
    /// Raw descriptor index.
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Declaration of one shared variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDescriptor {
    name: String,
    kind: ValueKind,
    capacity: usize,
    prefix: LengthPrefix,
    index: usize,
    range: Range<usize>,
}

impl VariableDescriptor {
    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value kind.
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Maximum payload size in bytes, excluding the length prefix.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length prefix width.
    pub const fn prefix(&self) -> LengthPrefix {
        self.prefix
    }

    /// Position in declaration order.
    pub const fn index(&self) -> VarIndex {
        VarIndex(self.index)
    }

    /// Slot range relative to the data region base.
    pub fn byte_range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Slot size: prefix plus capacity.
    pub const fn slot_size(&self) -> usize {
        self.prefix.bytes() + self.capacity
    }
}

/// Append-only list of variable declarations.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    descriptors: Vec<VariableDescriptor>,
    cursor: usize,
    frozen: Option<SchemaLayout>,
}

impl VariableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable with the default prefix for its kind.
    ///
    /// Fixed-width kinds must pass their exact width as `capacity`.
    /// Length-prefixed kinds get a 2-byte prefix when the capacity fits
    /// in `u16`, otherwise a 4-byte prefix.
    pub fn declare(&mut self, name: &str, kind: ValueKind, capacity: usize) -> IpcResult<VarIndex> {
        let prefix = match kind.fixed_width() {
            Some(_) => LengthPrefix::None,
            None if capacity <= LengthPrefix::U16.max_len() => LengthPrefix::U16,
            None => LengthPrefix::U32,
        };
        self.declare_with_prefix(name, kind, capacity, prefix)
    }

    /// Declare a variable with an explicit length prefix width.
    pub fn declare_with_prefix(
        &mut self,
        name: &str,
        kind: ValueKind,
        capacity: usize,
        prefix: LengthPrefix,
    ) -> IpcResult<VarIndex> {
        if self.frozen.is_some() {
            return Err(IpcError::SchemaFrozen {
                name: name.to_string(),
            });
        }

        let invalid = |reason: String| IpcError::InvalidDescriptor {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("name cannot be empty".to_string()));
        }
        if self.descriptors.iter().any(|d| d.name == name) {
            return Err(invalid("name already declared".to_string()));
        }
        match kind.fixed_width() {
            Some(width) => {
                if capacity != width {
                    return Err(invalid(format!("{kind:?} takes exactly {width} bytes")));
                }
                if prefix != LengthPrefix::None {
                    return Err(invalid(format!("{kind:?} takes no length prefix")));
                }
            }
            None => {
                if prefix == LengthPrefix::None {
                    return Err(invalid(format!("{kind:?} needs a length prefix")));
                }
                if capacity > prefix.max_len() {
                    return Err(invalid(format!(
                        "capacity {capacity} exceeds {}-byte prefix",
                        prefix.bytes()
                    )));
                }
            }
        }

        let index = self.descriptors.len();
        let start = self.cursor;
        let end = start + prefix.bytes() + capacity;
        self.cursor = end;
        self.descriptors.push(VariableDescriptor {
            name: name.to_string(),
            kind,
            capacity,
            prefix,
            index,
            range: start..end,
        });
        Ok(VarIndex(index))
    }

    /// Declare a 32-bit integer.
    pub fn declare_int(&mut self, name: &str) -> IpcResult<VarIndex> {
        self.declare(name, ValueKind::Int, 4)
    }

    /// Declare a 64-bit integer.
    pub fn declare_long(&mut self, name: &str) -> IpcResult<VarIndex> {
        self.declare(name, ValueKind::Long, 8)
    }

    /// Declare a 32-bit float.
    pub fn declare_float(&mut self, name: &str) -> IpcResult<VarIndex> {
        self.declare(name, ValueKind::Float, 4)
    }

    /// Declare a boolean.
    pub fn declare_bool(&mut self, name: &str) -> IpcResult<VarIndex> {
        self.declare(name, ValueKind::Bool, 1)
    }

    /// Declare a string of at most `chars` characters, 2-byte prefix.
    pub fn declare_string(&mut self, name: &str, chars: usize) -> IpcResult<VarIndex> {
        self.declare_with_prefix(
            name,
            ValueKind::String,
            chars * STRING_BYTES_PER_CHAR,
            LengthPrefix::U16,
        )
    }

    /// Declare a byte array of at most `capacity` bytes.
    pub fn declare_bytes(&mut self, name: &str, capacity: usize) -> IpcResult<VarIndex> {
        self.declare(name, ValueKind::Bytes, capacity)
    }

    /// Freeze the registry and return the resulting layout.
    ///
    /// Calling it again returns the same layout.
    pub fn finalize(&mut self) -> SchemaLayout {
        self.frozen
            .get_or_insert_with(|| SchemaLayout {
                descriptors: self.descriptors.clone().into(),
                data_size: self.cursor,
            })
            .clone()
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Declarations so far.
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }
}

/// Frozen schema with the sizes and offsets derived from it.
#[derive(Debug, Clone)]
pub struct SchemaLayout {
    descriptors: Arc<[VariableDescriptor]>,
    data_size: usize,
}

impl SchemaLayout {
    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no variable was declared.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in index order.
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    /// Descriptor for `index`.
    pub fn descriptor(&self, index: VarIndex) -> IpcResult<&VariableDescriptor> {
        self.descriptors
            .get(index.0)
            .ok_or(IpcError::UnknownVariable { index: index.0 })
    }

    /// Look a variable up by name.
    pub fn index_of(&self, name: &str) -> Option<VarIndex> {
        self.descriptors
            .iter()
            .position(|d| d.name == name)
            .map(VarIndex)
    }

    /// Meta region size: global counter plus one counter per variable.
    pub fn meta_size(&self) -> usize {
        COUNTER_SIZE + COUNTER_SIZE * self.descriptors.len()
    }

    /// Data region size.
    pub const fn data_size(&self) -> usize {
        self.data_size
    }

    /// Absolute offset of the meta region.
    pub const fn meta_base(&self) -> usize {
        HEADER_SIZE
    }

    /// Absolute offset of the data region.
    pub fn data_base(&self) -> usize {
        HEADER_SIZE + self.meta_size()
    }

    /// Total mapped size.
    pub fn total_size(&self) -> usize {
        self.data_base() + self.data_size
    }

    /// Absolute range of the meta region.
    pub fn meta_range(&self) -> Range<usize> {
        self.meta_base()..self.data_base()
    }

    /// Absolute offset of the global modification counter.
    pub const fn global_counter_offset(&self) -> usize {
        HEADER_SIZE
    }

    /// Absolute offset of a variable's modification counter.
    pub const fn counter_offset(&self, descriptor: &VariableDescriptor) -> usize {
        HEADER_SIZE + COUNTER_SIZE * (descriptor.index + 1)
    }

    /// Absolute range of a variable's slot.
    pub fn slot_range(&self, descriptor: &VariableDescriptor) -> Range<usize> {
        let base = self.data_base();
        base + descriptor.range.start..base + descriptor.range.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_assigns_sequential_indices() {
        let mut registry = VariableRegistry::new();
        let session = registry.declare_string("sessionId", 10).unwrap();
        let pause = registry.declare_long("lastPauseTime").unwrap();
        assert_eq!(session.get(), 0);
        assert_eq!(pause.get(), 1);

        let session = &registry.descriptors()[0];
        assert_eq!(session.capacity(), 40);
        assert_eq!(session.prefix(), LengthPrefix::U16);
        assert_eq!(session.byte_range(), 0..42);

        let pause = &registry.descriptors()[1];
        assert_eq!(pause.prefix(), LengthPrefix::None);
        assert_eq!(pause.byte_range(), 42..50);
    }

    #[test]
    fn test_declare_after_finalize_fails() {
        let mut registry = VariableRegistry::new();
        registry.declare_int("count").unwrap();
        let layout = registry.finalize();
        assert!(registry.is_frozen());

        let result = registry.declare_int("late");
        assert!(matches!(result, Err(IpcError::SchemaFrozen { name }) if name == "late"));

        // Layout is unchanged and finalize stays idempotent.
        assert_eq!(registry.finalize().len(), layout.len());
    }

    #[test]
    fn test_invalid_descriptors_rejected() {
        let mut registry = VariableRegistry::new();
        registry.declare_int("a").unwrap();

        assert!(matches!(
            registry.declare_int("a"),
            Err(IpcError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            registry.declare("wide", ValueKind::Long, 4),
            Err(IpcError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            registry.declare_with_prefix("blob", ValueKind::Bytes, 70_000, LengthPrefix::U16),
            Err(IpcError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            registry.declare_with_prefix("s", ValueKind::String, 8, LengthPrefix::None),
            Err(IpcError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_large_capacity_gets_wide_prefix() {
        let mut registry = VariableRegistry::new();
        registry.declare_bytes("blob", 70_000).unwrap();
        assert_eq!(registry.descriptors()[0].prefix(), LengthPrefix::U32);
        assert_eq!(registry.descriptors()[0].slot_size(), 70_004);
    }

    #[test]
    fn test_layout_offsets() {
        let mut registry = VariableRegistry::new();
        registry.declare_string("sessionId", 10).unwrap();
        registry.declare_string("userId", 1000).unwrap();
        registry.declare_long("lastPauseTime").unwrap();
        registry.declare_long("lastResumeTime").unwrap();
        let layout = registry.finalize();

        assert_eq!(layout.meta_base(), 44);
        assert_eq!(layout.meta_size(), 4 + 4 * 4);
        assert_eq!(layout.data_base(), 64);
        assert_eq!(layout.data_size(), 42 + 4002 + 8 + 8);
        assert_eq!(layout.total_size(), 64 + 4060);

        let user = layout.descriptor(layout.index_of("userId").unwrap()).unwrap();
        assert_eq!(layout.counter_offset(user), 52);
        assert_eq!(layout.slot_range(user), 64 + 42..64 + 42 + 4002);
        assert!(layout.index_of("missing").is_none());
    }
}
