use anyhow::Result;
use polars::prelude::{DataType, IntoLazy};

use crate::filter::predicate::{FilterError, Predicate};
use crate::layer::Layer;

/// Check that `field` exists on the layer and is numeric.
fn validate_field(layer: &Layer, field: &str) -> Result<(), FilterError> {
    let column = layer
        .data
        .get_columns()
        .iter()
        .find(|column| column.name().as_str() == field)
        .ok_or_else(|| FilterError::UnknownField { kind: layer.kind, field: field.to_string() })?;
    match column.dtype() {
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        | DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        | DataType::Float32 | DataType::Float64 => Ok(()),
        other => Err(FilterError::NonNumericField {
            field: field.to_string(),
            dtype: other.to_string(),
        }),
    }
}

/// Keep the records satisfying every predicate.
///
/// All predicate fields are validated up front, so a bad predicate can never
/// half-apply. The result is an order-preserving derived layer; the input is
/// untouched. An empty predicate list keeps every record.
pub fn filter_attributes(layer: &Layer, predicates: &[Predicate]) -> Result<Layer> {
    for predicate in predicates {
        validate_field(layer, &predicate.field)?;
    }

    let Some(mask) = predicates.iter().map(Predicate::expr).reduce(|a, b| a.and(b)) else {
        return layer.select(&(0..layer.len() as u32).collect::<Vec<_>>());
    };

    // Row positions relative to this layer, not load-order idx values.
    let filtered = layer
        .data
        .clone()
        .with_row_index("__row".into(), None)?
        .lazy()
        .filter(mask)
        .collect()?;
    let rows: Vec<u32> = filtered.column("__row")?.u32()?.into_no_null_iter().collect();
    layer.select(&rows)
}
