//! Property-based test generators using proptest.

use jongo_client::{Record, Value};
use proptest::prelude::*;

/// Strategy for domain field names that never collide with bookkeeping
/// names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("f_[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for scalar cell values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        1 => any::<bool>().prop_map(Value::Bool),
        3 => any::<i64>().prop_map(Value::Int),
        1 => (-1.0e9f64..1.0e9).prop_map(Value::Float),
        3 => "[ -~]{0,24}".prop_map(Value::Text),
    ]
}

/// Strategy for text that exercises percent-encoding.
pub fn path_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /?&=%#+\u{e9}\u{4e2d}]{1,16}"
}

/// Strategy for wire records with an integer identity in `identity_field`.
pub fn record_strategy(identity_field: &'static str) -> impl Strategy<Value = Record> {
    (
        0i64..1_000_000,
        prop::collection::btree_map(field_name_strategy(), value_strategy(), 0..8),
    )
        .prop_map(move |(id, fields)| {
            let mut record = Record::new();
            record.insert(identity_field.to_string(), id.into());
            for (name, value) in fields {
                record.insert(name, value.to_json());
            }
            record
        })
}

/// Local operations applied to a store before a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Add a new ghost.
    Add,
    /// Edit the entity at the index, modulo the store size.
    Edit(usize),
    /// Remove the entity at the index, modulo the store size.
    Remove(usize),
}

/// Strategy for a single store operation.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        2 => Just(StoreOperation::Add),
        3 => any::<usize>().prop_map(StoreOperation::Edit),
        2 => any::<usize>().prop_map(StoreOperation::Remove),
    ]
}

/// Strategy for a sequence of store operations.
pub fn store_operations_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
