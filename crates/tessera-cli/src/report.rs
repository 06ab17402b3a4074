//! Text rendering of storage plans.

use std::fmt::Write;

use tessera_tuple::{Descriptor, PackedSlot, Specialization};

/// Renders the storage plan of `descriptor` and, for split layouts, of its
/// head and tail.
pub fn render(descriptor: &Descriptor) -> String {
    let mut out = String::new();
    render_into(&mut out, descriptor, 0, 0);
    out
}

fn render_into(out: &mut String, descriptor: &Descriptor, first_field: usize, indent: usize) {
    let pad = "  ".repeat(indent);
    let _ = writeln!(out, "{pad}layout {descriptor} ({} fields)", descriptor.len());

    match descriptor.specialization() {
        Some(Specialization::Packed(layout)) => {
            let _ = writeln!(
                out,
                "{pad}  packed: {} words, {} object slots",
                layout.value_words(),
                layout.object_slots()
            );
            for (i, (slot, ty)) in layout.slots().iter().zip(descriptor.fields()).enumerate() {
                let _ = writeln!(out, "{pad}  [{}] {ty:<12} {}", first_field + i, describe(*slot));
            }
        }
        Some(Specialization::Split { head, tail }) => {
            let _ = writeln!(out, "{pad}  split at {}", head.len());
            render_into(out, head, first_field, indent + 1);
            render_into(out, tail, first_field + head.len(), indent + 1);
        }
        Some(Specialization::Generic { reason }) => {
            let _ = writeln!(out, "{pad}  generic: {reason}");
        }
        None => {
            let _ = writeln!(out, "{pad}  pending");
        }
    }
}

fn describe(slot: PackedSlot) -> String {
    match slot {
        PackedSlot::Bits { word, shift, width } => {
            format!("word {word} bits {shift}..{}", shift + width)
        }
        PackedSlot::Wide { word } => format!("words {word}..{}", word + 2),
        PackedSlot::Object { index } => format!("object {index}"),
    }
}
