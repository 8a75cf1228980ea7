//! FILENAME: core/report-engine/src/totals.rs
//! Aggregators for computed totals rows.
//!
//! When a report configures `auto_totals`, the totals row is computed
//! per field from the full column of evaluated result values instead of
//! being split off the tail of the raw dataset.

use crate::definition::FieldDescriptor;
use crate::value::{Record, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Supported aggregation functions for totals fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Sum,
    Count,
    Average,
    Min,
    Max,
}

/// Accumulator for computing one aggregate incrementally.
/// Non-numeric values only increment the row count.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    sum: f64,
    count: u64,
    count_numbers: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator::default()
    }

    pub fn add(&mut self, value: &Value) {
        self.count += 1;
        if let Value::Number(n) = value {
            self.count_numbers += 1;
            self.sum += n;
            self.min = Some(self.min.map_or(*n, |m| m.min(*n)));
            self.max = Some(self.max.map_or(*n, |m| m.max(*n)));
        }
    }

    /// Computes the final aggregate value. Aggregates that need at least
    /// one numeric input yield `Empty` when none was seen.
    pub fn compute(&self, aggregation: Aggregation) -> Value {
        match aggregation {
            Aggregation::Sum => Value::Number(self.sum),
            Aggregation::Count => Value::Number(self.count as f64),
            Aggregation::Average => {
                if self.count_numbers > 0 {
                    Value::Number(self.sum / self.count_numbers as f64)
                } else {
                    Value::Empty
                }
            }
            Aggregation::Min => self.min.map(Value::Number).unwrap_or(Value::Empty),
            Aggregation::Max => self.max.map(Value::Number).unwrap_or(Value::Empty),
        }
    }
}

/// Computes the totals row for `fields`, in field order. Fields without
/// an aggregator yield an empty placeholder.
pub fn compute_auto_totals(
    fields: &[FieldDescriptor],
    rows: &[Record],
    table: &FxHashMap<String, Aggregation>,
) -> Record {
    fields
        .iter()
        .map(|field| {
            let value = match table.get(&field.name) {
                Some(aggregation) => {
                    let mut acc = Accumulator::new();
                    for row in rows {
                        acc.add(row.get(&field.name).unwrap_or(&Value::EMPTY));
                    }
                    acc.compute(*aggregation)
                }
                None => Value::Empty,
            };
            (field.name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record;

    fn rows() -> Vec<Record> {
        vec![
            record([("a", Value::from(1)), ("b", Value::from("x"))]),
            record([("a", Value::from(2)), ("b", Value::from("y"))]),
            record([("a", Value::from(4)), ("b", Value::from("z"))]),
        ]
    }

    #[test]
    fn test_accumulator_basic() {
        let mut acc = Accumulator::new();
        acc.add(&Value::from(1));
        acc.add(&Value::from(2));
        acc.add(&Value::from("text"));
        assert_eq!(acc.compute(Aggregation::Sum), Value::Number(3.0));
        assert_eq!(acc.compute(Aggregation::Count), Value::Number(3.0));
        assert_eq!(acc.compute(Aggregation::Average), Value::Number(1.5));
        assert_eq!(acc.compute(Aggregation::Min), Value::Number(1.0));
        assert_eq!(acc.compute(Aggregation::Max), Value::Number(2.0));
    }

    #[test]
    fn test_accumulator_no_numbers() {
        let mut acc = Accumulator::new();
        acc.add(&Value::from("only"));
        assert_eq!(acc.compute(Aggregation::Sum), Value::Number(0.0));
        assert_eq!(acc.compute(Aggregation::Average), Value::Empty);
        assert_eq!(acc.compute(Aggregation::Min), Value::Empty);
    }

    #[test]
    fn test_auto_totals_placeholders() {
        let fields = vec![
            FieldDescriptor::from_name("a"),
            FieldDescriptor::from_name("b"),
        ];
        let mut table = FxHashMap::default();
        table.insert("a".to_string(), Aggregation::Sum);
        let totals = compute_auto_totals(&fields, &rows(), &table);
        assert_eq!(totals["a"], Value::Number(7.0));
        assert_eq!(totals["b"], Value::Empty);
        let keys: Vec<&String> = totals.keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
