//! Layout specialization.
//!
//! Specializing a descriptor computes its packed storage plan once, so every
//! owning container of that layout can keep scalar fields bit-packed in a
//! flat word array instead of one tagged slot per field.
//!
//! # Packing
//!
//! Fixed-width fields are placed widest first. All widths are powers of two
//! no larger than a word (128-bit values take two whole words), so with this
//! ordering every slot starts at a multiple of its own width and no slot
//! straddles a word boundary:
//!
//! ```text
//! (bool, bigint, int, smallint, string)
//!
//! word 0: [ bigint                                     ]
//! word 1: [ int            | smallint | bool | unused  ]
//! objects: [ string ]
//! ```
//!
//! Decimals and reference kinds live in the object slot array.

use std::sync::Arc;

use tessera_common::{FieldKind, FieldType, TupleError, TupleResult, WORD_BITS};

use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::value::Value;

/// The storage plan chosen for a descriptor.
#[derive(Debug, Clone)]
pub enum Specialization {
    /// Bit-packed storage.
    Packed(Arc<PackedLayout>),
    /// Layout wider than the maximum specialized width: a head of exactly the
    /// maximum width followed by the remaining fields.
    Split {
        /// The first `max_specialized_width` fields.
        head: Descriptor,
        /// The remaining fields, specialized recursively.
        tail: Descriptor,
    },
    /// Specialization failed; containers use one tagged slot per field.
    Generic {
        /// Why specialization failed.
        reason: String,
    },
}

impl Specialization {
    /// Returns a short name for the plan.
    pub fn name(&self) -> &'static str {
        match self {
            Specialization::Packed(_) => "packed",
            Specialization::Split { .. } => "split",
            Specialization::Generic { .. } => "generic",
        }
    }
}

/// Where one field lives in packed storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedSlot {
    /// `width` bits starting at bit `shift` of `word`.
    Bits {
        /// Word index.
        word: usize,
        /// Bit offset within the word.
        shift: u32,
        /// Width in bits (1 to 64).
        width: u32,
    },
    /// Two consecutive words, low word first.
    Wide {
        /// Index of the low word.
        word: usize,
    },
    /// Index into the object slot array.
    Object {
        /// Object slot index.
        index: usize,
    },
}

/// A precomputed packing plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLayout {
    slots: Box<[PackedSlot]>,
    value_words: usize,
    object_slots: usize,
}

impl PackedLayout {
    /// The plan of the zero-field layout.
    pub fn empty() -> Self {
        Self {
            slots: Box::new([]),
            value_words: 0,
            object_slots: 0,
        }
    }

    /// Computes the plan for `fields`.
    ///
    /// # Errors
    ///
    /// Fails if the packed values would need more than `max_words` words.
    pub fn build(fields: &[FieldType], max_words: usize) -> TupleResult<Self> {
        let mut slots = vec![PackedSlot::Object { index: 0 }; fields.len()];
        let mut object_slots = 0;
        let mut packed: Vec<(usize, usize)> = Vec::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            match field.kind().bit_width() {
                Some(width) => packed.push((index, width)),
                None => {
                    slots[index] = PackedSlot::Object {
                        index: object_slots,
                    };
                    object_slots += 1;
                }
            }
        }

        // Widest first keeps every slot aligned to its own width.
        packed.sort_by(|a, b| b.1.cmp(&a.1));

        let mut offset = 0usize;
        for (index, width) in packed {
            debug_assert_eq!(offset % width.min(WORD_BITS), 0);
            slots[index] = if width > WORD_BITS {
                PackedSlot::Wide {
                    word: offset / WORD_BITS,
                }
            } else {
                PackedSlot::Bits {
                    word: offset / WORD_BITS,
                    shift: (offset % WORD_BITS) as u32,
                    width: width as u32,
                }
            };
            offset += width;
        }

        let value_words = (offset + WORD_BITS - 1) / WORD_BITS;
        if value_words > max_words {
            return Err(TupleError::specialization_failed(
                describe(fields),
                format!("packed values need {value_words} words (max: {max_words})"),
            ));
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            value_words,
            object_slots,
        })
    }

    /// Returns the slot of the field at `index`.
    #[inline]
    pub fn slot(&self, index: usize) -> PackedSlot {
        self.slots[index]
    }

    /// Returns all slots in field order.
    pub fn slots(&self) -> &[PackedSlot] {
        &self.slots
    }

    /// Returns the number of value words.
    pub fn value_words(&self) -> usize {
        self.value_words
    }

    /// Returns the number of object slots.
    pub fn object_slots(&self) -> usize {
        self.object_slots
    }

    /// Reads the fixed-width field in `slot` as a value of `kind`.
    pub(crate) fn read(words: &[u64], slot: PackedSlot, kind: FieldKind) -> Value {
        match slot {
            PackedSlot::Bits { word, shift, width } => {
                let bits = (words[word] >> shift) & mask(width);
                Value::from_bits(kind, u128::from(bits))
            }
            PackedSlot::Wide { word } => {
                let bits = u128::from(words[word]) | (u128::from(words[word + 1]) << 64);
                Value::from_bits(kind, bits)
            }
            PackedSlot::Object { .. } => Value::Null,
        }
    }

    /// Writes a fixed-width bit pattern into `slot`.
    pub(crate) fn write(words: &mut [u64], slot: PackedSlot, bits: u128) {
        match slot {
            PackedSlot::Bits { word, shift, width } => {
                let mask = mask(width);
                let bits = (bits as u64) & mask;
                words[word] = (words[word] & !(mask << shift)) | (bits << shift);
            }
            PackedSlot::Wide { word } => {
                words[word] = bits as u64;
                words[word + 1] = (bits >> 64) as u64;
            }
            PackedSlot::Object { .. } => {}
        }
    }
}

#[inline]
fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn describe(fields: &[FieldType]) -> String {
    let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
    format!("({})", names.join(", "))
}

/// Computes the storage plan for a descriptor.
///
/// Implementations run inside [`DescriptorRegistry::drain`] and
/// [`DescriptorRegistry::specialize`]; they may create further descriptors
/// through the registry.
pub trait Specializer: Send + Sync {
    /// Produces the specialization of `descriptor`.
    ///
    /// # Errors
    ///
    /// An error leaves the descriptor on the generic storage path.
    fn specialize(
        &self,
        descriptor: &Descriptor,
        registry: &DescriptorRegistry,
    ) -> TupleResult<Specialization>;
}

/// The default specializer: bit-packed layouts, split at the configured
/// maximum width.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackedSpecializer;

impl Specializer for PackedSpecializer {
    fn specialize(
        &self,
        descriptor: &Descriptor,
        registry: &DescriptorRegistry,
    ) -> TupleResult<Specialization> {
        let config = registry.config();
        let width = config.max_specialized_width;

        if descriptor.len() > width {
            let head = registry.create(&descriptor.fields()[..width]);
            let tail = registry.create(&descriptor.fields()[width..]);
            // A failed half stays generic and is reported when its own queue
            // entry drains; the split itself is still valid.
            let _ = registry.specialize(&head);
            let _ = registry.specialize(&tail);
            return Ok(Specialization::Split { head, tail });
        }

        let layout = PackedLayout::build(descriptor.fields(), config.max_packed_words)?;
        Ok(Specialization::Packed(Arc::new(layout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_order() {
        let fields = [
            FieldType::BOOL,
            FieldType::BIGINT,
            FieldType::INT,
            FieldType::SMALLINT,
            FieldType::TEXT,
        ];
        let layout = PackedLayout::build(&fields, 8).unwrap();

        assert_eq!(layout.value_words(), 2);
        assert_eq!(layout.object_slots(), 1);
        assert_eq!(
            layout.slot(1),
            PackedSlot::Bits {
                word: 0,
                shift: 0,
                width: 64
            }
        );
        assert_eq!(
            layout.slot(2),
            PackedSlot::Bits {
                word: 1,
                shift: 0,
                width: 32
            }
        );
        assert_eq!(
            layout.slot(3),
            PackedSlot::Bits {
                word: 1,
                shift: 32,
                width: 16
            }
        );
        assert_eq!(
            layout.slot(0),
            PackedSlot::Bits {
                word: 1,
                shift: 48,
                width: 1
            }
        );
        assert_eq!(layout.slot(4), PackedSlot::Object { index: 0 });
    }

    #[test]
    fn test_wide_slots() {
        let fields = [FieldType::INT, FieldType::UUID, FieldType::DECIMAL];
        let layout = PackedLayout::build(&fields, 8).unwrap();

        assert_eq!(layout.slot(1), PackedSlot::Wide { word: 0 });
        assert_eq!(
            layout.slot(0),
            PackedSlot::Bits {
                word: 2,
                shift: 0,
                width: 32
            }
        );
        assert_eq!(layout.slot(2), PackedSlot::Object { index: 0 });
        assert_eq!(layout.value_words(), 3);
    }

    #[test]
    fn test_word_limit() {
        let fields = vec![FieldType::BIGINT; 3];
        let err = PackedLayout::build(&fields, 2).unwrap_err();
        assert!(err.to_string().contains("3 words"));
    }

    #[test]
    fn test_read_write_neighbours() {
        let fields = [FieldType::TINYINT, FieldType::TINYINT, FieldType::BOOL];
        let layout = PackedLayout::build(&fields, 1).unwrap();
        let mut words = vec![0u64; layout.value_words()];

        PackedLayout::write(&mut words, layout.slot(0), Value::TinyInt(-1).to_bits().unwrap());
        PackedLayout::write(&mut words, layout.slot(1), Value::TinyInt(5).to_bits().unwrap());
        PackedLayout::write(&mut words, layout.slot(2), 1);
        PackedLayout::write(&mut words, layout.slot(0), Value::TinyInt(7).to_bits().unwrap());

        assert_eq!(
            PackedLayout::read(&words, layout.slot(0), FieldKind::TinyInt),
            Value::TinyInt(7)
        );
        assert_eq!(
            PackedLayout::read(&words, layout.slot(1), FieldKind::TinyInt),
            Value::TinyInt(5)
        );
        assert_eq!(
            PackedLayout::read(&words, layout.slot(2), FieldKind::Boolean),
            Value::Boolean(true)
        );
    }
}
