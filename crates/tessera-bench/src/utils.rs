//! Benchmark utilities and helpers.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_common::{FieldKind, FieldType, TupleResult};
use tessera_tuple::{Descriptor, OwnedTuple, Tuple, Value};

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a random list of field types.
pub fn random_fields(rng: &mut StdRng, count: usize) -> Vec<FieldType> {
    (0..count)
        .map(|_| {
            let kind = FieldKind::ALL[rng.gen_range(0..FieldKind::ALL.len())];
            let ty = FieldType::new(kind);
            if rng.gen_bool(0.25) {
                ty.nullable()
            } else {
                ty
            }
        })
        .collect()
}

/// Generates `count` distinct layouts of `width` fields each.
pub fn generate_layouts(count: usize, width: usize) -> Vec<Vec<FieldType>> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut layouts: Vec<Vec<FieldType>> = Vec::with_capacity(count);
    while layouts.len() < count {
        let fields = random_fields(&mut rng, width);
        if !layouts.contains(&fields) {
            layouts.push(fields);
        }
    }
    layouts
}

/// Generates a random value for a field of type `ty`.
pub fn random_value(rng: &mut StdRng, ty: FieldType) -> Value {
    if ty.is_nullable() && rng.gen_bool(0.1) {
        return Value::Null;
    }
    match ty.kind() {
        FieldKind::Boolean => Value::Boolean(rng.gen()),
        FieldKind::TinyInt => Value::TinyInt(rng.gen()),
        FieldKind::SmallInt => Value::SmallInt(rng.gen()),
        FieldKind::Int => Value::Int(rng.gen()),
        FieldKind::BigInt => Value::BigInt(rng.gen()),
        FieldKind::Float => Value::Float(rng.gen()),
        FieldKind::Double => Value::Double(rng.gen()),
        FieldKind::Decimal => Value::decimal(rng.gen_range(-1_000_000..1_000_000), 2),
        FieldKind::Date => Value::Date(rng.gen_range(0..40_000)),
        FieldKind::Time => Value::Time(rng.gen_range(0..86_400_000_000)),
        FieldKind::Timestamp => Value::Timestamp(rng.gen()),
        FieldKind::Uuid => Value::Uuid(rng.gen()),
        FieldKind::Text => Value::text(random_string(rng, 16)),
        FieldKind::Bytes => Value::bytes((0..16).map(|_| rng.gen()).collect::<Vec<u8>>()),
    }
}

/// Builds a row of `descriptor` filled with random values.
pub fn random_row(rng: &mut StdRng, descriptor: &Descriptor) -> TupleResult<OwnedTuple> {
    let mut row = OwnedTuple::new(descriptor.clone());
    for (i, ty) in descriptor.fields().iter().enumerate() {
        row.set_value(i, random_value(rng, *ty))?;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::TupleConfig;
    use tessera_tuple::DescriptorRegistry;

    #[test]
    fn test_generate_layouts_distinct() {
        let layouts = generate_layouts(20, 3);
        assert_eq!(layouts.len(), 20);
        for (i, a) in layouts.iter().enumerate() {
            assert!(layouts[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn test_random_row_matches_layout() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let descriptor = registry.create(&random_fields(&mut rng, 12));
        let row = random_row(&mut rng, &descriptor).unwrap();
        for i in 0..row.count() {
            assert!(row.field_state(i).unwrap().is_available());
        }
    }
}
