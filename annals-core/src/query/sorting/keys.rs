//! Sort key values extracted from entities
//!
//! Every sortable column maps an entity onto a [`SortValue`]. The derived
//! ordering compares values of the same variant naturally; `Null` sorts before
//! everything else so that a descending sort is the exact reverse of an
//! ascending one.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SortValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
}

impl SortValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        SortValue::Bool(value)
    }
}

impl From<i32> for SortValue {
    fn from(value: i32) -> Self {
        SortValue::Int(i64::from(value))
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        SortValue::Int(value)
    }
}

impl From<u32> for SortValue {
    fn from(value: u32) -> Self {
        SortValue::Int(i64::from(value))
    }
}

impl From<f32> for SortValue {
    fn from(value: f32) -> Self {
        SortValue::Float(OrderedFloat(f64::from(value)))
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        SortValue::Float(OrderedFloat(value))
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        SortValue::Text(value)
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        SortValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for SortValue {
    fn from(value: DateTime<Utc>) -> Self {
        SortValue::Timestamp(value)
    }
}

impl From<Uuid> for SortValue {
    fn from(value: Uuid) -> Self {
        SortValue::Id(value)
    }
}

impl<V: Into<SortValue>> From<Option<V>> for SortValue {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(SortValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_before_values() {
        assert!(SortValue::Null < SortValue::from(0));
        assert!(SortValue::Null < SortValue::from("a"));
        assert!(SortValue::from(None::<i32>).is_null());
    }

    #[test]
    fn same_variant_orders_naturally() {
        assert!(SortValue::from(1) < SortValue::from(2));
        assert!(SortValue::from("apple") < SortValue::from("banana"));
        assert!(SortValue::from(1.5_f64) < SortValue::from(10.0_f64));

        let earlier = Utc::now();
        let later = earlier + chrono::Duration::seconds(5);
        assert!(SortValue::from(earlier) < SortValue::from(later));
    }
}
