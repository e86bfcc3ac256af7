use anyhow::Result;
use polars::prelude::Column;

use geoframe::{Frame, FrameError};

use crate::filter::predicate::FilterError;
use crate::layer::Layer;

fn check_frames(left: Frame, right: Frame) -> Result<(), FrameError> {
    if left == right {
        Ok(())
    } else {
        Err(FrameError::Mismatch { left, right })
    }
}

/// Keep the records of `inner` covered by at least one record of `outer`
/// (boundary inclusive), annotating each survivor with the covering record's
/// name in a `region` column.
///
/// Each survivor appears exactly once however many records cover it; when
/// covering records overlap, the first in load order wins. Both layers must
/// already be projected into the same frame.
pub fn filter_contained(inner: &Layer, outer: &Layer) -> Result<Layer> {
    let inner_geoms = inner.projected()?;
    let outer_geoms = outer.projected()?;
    check_frames(inner_geoms.frame(), outer_geoms.frame())?;

    let mut rows: Vec<u32> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    for (row, shape) in inner_geoms.shapes().iter().enumerate() {
        if let Some(parent) = outer_geoms.find_covering(shape, inner_geoms.frame())? {
            rows.push(row as u32);
            labels.push(outer.name_of(parent as u32));
        }
    }

    let mut selected = inner.select(&rows)?;
    selected.data.with_column(Column::new("region".into(), labels))?;
    Ok(selected)
}

/// Keep the records of `inner` lying within `threshold` of at least one
/// record of `other` (inclusive). Existence only: no annotation, and each
/// survivor appears exactly once however many records are near it.
///
/// The threshold is a distance in the projected frame's linear unit and must
/// be positive and finite.
pub fn filter_within(inner: &Layer, other: &Layer, threshold: f64) -> Result<Layer> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(FilterError::InvalidThreshold { value: threshold }.into());
    }
    let inner_geoms = inner.projected()?;
    let other_geoms = other.projected()?;
    check_frames(inner_geoms.frame(), other_geoms.frame())?;

    let mut rows: Vec<u32> = Vec::new();
    for (row, shape) in inner_geoms.shapes().iter().enumerate() {
        if other_geoms.any_within(shape, inner_geoms.frame(), threshold)? {
            rows.push(row as u32);
        }
    }
    inner.select(&rows)
}
