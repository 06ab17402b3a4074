use std::cmp::Ordering;

use tessera_common::{FieldType, TupleConfig};
use tessera_tuple::{
    DescriptorRegistry, OwnedTuple, SharedTuple, StructuralComparer, Tuple, TupleComparer, Value,
};

/// Creates a registry that specializes layouts as soon as they are created.
pub fn eager_registry() -> DescriptorRegistry {
    DescriptorRegistry::new(TupleConfig::for_testing()).expect("testing config is valid")
}

/// Creates a registry with default settings; layouts stay pending until a
/// drain.
pub fn lazy_registry() -> DescriptorRegistry {
    DescriptorRegistry::new(TupleConfig::default()).expect("default config is valid")
}

/// Builds an owned row with a layout inferred from `values`.
pub fn row(registry: &DescriptorRegistry, values: Vec<Value>) -> OwnedTuple {
    OwnedTuple::from_values(registry, values).expect("values infer a layout")
}

/// Builds a shared row with a layout inferred from `values`.
pub fn shared_row(registry: &DescriptorRegistry, values: Vec<Value>) -> SharedTuple {
    SharedTuple::new(row(registry, values))
}

/// The segment fixture source: `(3, 4.0, "5")`.
pub fn segment_source(registry: &DescriptorRegistry) -> OwnedTuple {
    row(registry, vec![Value::int(3), Value::double(4.0), Value::text("5")])
}

/// The cut-in fixture outer source: `(1, "2", 3, 4.0)`.
pub fn cut_in_outer(registry: &DescriptorRegistry) -> OwnedTuple {
    row(
        registry,
        vec![Value::int(1), Value::text("2"), Value::int(3), Value::double(4.0)],
    )
}

/// A layout wide enough to exercise every field kind.
pub fn all_kinds() -> Vec<FieldType> {
    tessera_common::FieldKind::ALL.iter().map(|kind| kind.into_type()).collect()
}

/// Asserts two rows are structurally equal.
#[track_caller]
pub fn assert_rows_eq(a: &dyn Tuple, b: &dyn Tuple) {
    let comparer = StructuralComparer::new();
    assert!(
        comparer.equals(a, b).expect("rows are readable"),
        "rows differ: {a:?} vs {b:?}"
    );
    assert_eq!(comparer.compare(a, b).expect("rows are readable"), Ordering::Equal);
    assert_eq!(
        comparer.hash(a).expect("rows are readable"),
        comparer.hash(b).expect("rows are readable")
    );
}
