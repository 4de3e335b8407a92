//! Display grouping of argument keys.
//!
//! Keys are bucketed by the floor of their order. A bucket with one key is a
//! standalone unit; a bucket with several keys renders as one visual group.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::args_spec::{ArgsSpec, InputKind};

/// One display unit of the arg tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgGroup {
    /// Floor of the members' order.
    pub group: i64,
    pub members: Vec<ArgLeaf>,
}

/// A key inside a display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgLeaf {
    pub key: String,
    pub order: f64,
    pub input: InputKind,
}

impl ArgGroup {
    pub fn is_standalone(&self) -> bool {
        self.members.len() == 1
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|leaf| leaf.key.as_str())
    }
}

/// Arrange every managed key into ordered display groups.
///
/// Groups ascend by group number; members ascend by exact order, with ties
/// kept in spec order.
pub fn build_arg_tree(spec: &ArgsSpec) -> Vec<ArgGroup> {
    let mut buckets: BTreeMap<i64, Vec<ArgLeaf>> = BTreeMap::new();

    for key in spec.managed_keys() {
        let Some(arg) = spec.get(key) else { continue };
        let order = arg.order();
        buckets.entry(order.floor() as i64).or_default().push(ArgLeaf {
            key: key.to_string(),
            order,
            input: arg.arg_type.input_kind(),
        });
    }

    buckets
        .into_iter()
        .map(|(group, mut members)| {
            members.sort_by(|a, b| a.order.total_cmp(&b.order));
            ArgGroup { group, members }
        })
        .collect()
}

/// Flatten the tree back into display order.
pub fn display_order(tree: &[ArgGroup]) -> Vec<&str> {
    tree.iter().flat_map(ArgGroup::keys).collect()
}
