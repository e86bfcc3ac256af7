use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use polars::{frame::DataFrame, prelude::Column};
use serde_json::Value;

use geoframe::{Datum, Frame, Geometries};

use crate::layer::{FeatureId, Layer, LayerKind};

/// Read a GeoJSON FeatureCollection at `path` into a layer of `kind`.
///
/// Every feature needs an id (feature member or property) and a geometry of
/// the kind the layer expects. Numeric properties become nullable Float64
/// columns; a `name` property becomes the name column.
pub fn read_layer(kind: LayerKind, path: &Path) -> Result<Layer> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    layer_from_value(kind, &value).with_context(|| format!("loading {} layer from {}", kind, path.display()))
}

/// Build a layer of `kind` from a parsed GeoJSON value.
pub fn layer_from_value(kind: LayerKind, value: &Value) -> Result<Layer> {
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("expected a FeatureCollection");
    }
    let frame = source_frame(value)?;
    let features = value["features"]
        .as_array()
        .ok_or_else(|| anyhow!("missing features array"))?;

    let mut ids: Vec<FeatureId> = Vec::with_capacity(features.len());
    let mut id_text: Vec<String> = Vec::with_capacity(features.len());
    let mut names: Vec<Option<String>> = Vec::with_capacity(features.len());
    let mut props: Vec<BTreeMap<String, f64>> = Vec::with_capacity(features.len());
    let mut shapes: Vec<Geometry<f64>> = Vec::with_capacity(features.len());
    let mut keys: BTreeSet<String> = BTreeSet::new();

    for (row, feature) in features.iter().enumerate() {
        let parsed = parse_feature(kind, feature)
            .with_context(|| format!("feature {row}"))?;
        keys.extend(parsed.props.keys().cloned());
        ids.push(FeatureId::new(kind, &parsed.id));
        id_text.push(parsed.id);
        names.push(parsed.name);
        props.push(parsed.props);
        shapes.push(parsed.shape);
    }

    let mut columns = vec![
        Column::new("id".into(), id_text),
        Column::new("name".into(), names),
    ];
    for key in &keys {
        let values: Vec<Option<f64>> = props.iter().map(|row| row.get(key).copied()).collect();
        columns.push(Column::new(key.as_str().into(), values));
    }
    let data = DataFrame::new(columns)?.with_row_index("idx".into(), None)?;

    let source = Geometries::new(shapes, frame)?;
    Layer::from_parts(kind, ids, data, source)
}

struct ParsedFeature {
    id: String,
    name: Option<String>,
    props: BTreeMap<String, f64>,
    shape: Geometry<f64>,
}

fn parse_feature(kind: LayerKind, feature: &Value) -> Result<ParsedFeature> {
    if feature["type"].as_str() != Some("Feature") {
        bail!("expected a Feature");
    }
    let properties = feature["properties"].as_object();

    // The id lives on the feature itself or among its properties.
    let id_value = match feature.get("id") {
        Some(value) if !value.is_null() => Some(value),
        _ => properties.and_then(|props| props.get("id")),
    };
    let id = match id_value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => bail!("missing feature id"),
    };

    let mut name = None;
    let mut props = BTreeMap::new();
    if let Some(object) = properties {
        for (key, value) in object {
            match (key.as_str(), value) {
                ("id", _) => {}
                ("name", Value::String(s)) => name = Some(s.clone()),
                (_, Value::Number(n)) => {
                    let number = n
                        .as_f64()
                        .ok_or_else(|| anyhow!("property {key:?} is not representable as f64"))?;
                    props.insert(key.clone(), number);
                }
                _ => {} // non-numeric properties carry no filterable data
            }
        }
    }

    let shape = parse_geometry(kind, &feature["geometry"])
        .with_context(|| format!("record {id:?}"))?;
    Ok(ParsedFeature { id, name, props, shape })
}

/// Parse a GeoJSON geometry, insisting on the type the layer kind expects.
fn parse_geometry(kind: LayerKind, geometry: &Value) -> Result<Geometry<f64>> {
    let ty = geometry["type"]
        .as_str()
        .ok_or_else(|| anyhow!("missing geometry type"))?;
    let coords = geometry["coordinates"]
        .as_array()
        .ok_or_else(|| anyhow!("missing geometry coordinates"))?;

    match (kind, ty) {
        (LayerKind::Site, "Point") => Ok(Geometry::Point(Point(parse_position(coords)?))),
        (LayerKind::Linear, "LineString") => {
            Ok(Geometry::MultiLineString(MultiLineString(vec![parse_line(coords)?])))
        }
        (LayerKind::Linear, "MultiLineString") => {
            let lines = coords
                .iter()
                .map(|line| parse_line(as_array(line)?))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiLineString(MultiLineString(lines)))
        }
        (LayerKind::Region | LayerKind::Area, "Polygon") => {
            Ok(Geometry::MultiPolygon(MultiPolygon(vec![parse_polygon(coords)?])))
        }
        (LayerKind::Region | LayerKind::Area, "MultiPolygon") => {
            let polygons = coords
                .iter()
                .map(|polygon| parse_polygon(as_array(polygon)?))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        _ => bail!("unexpected {ty} geometry in a {kind} layer"),
    }
}

#[inline]
fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("expected a coordinate array"))
}

/// Parse a single `[x, y]` position.
fn parse_position(coords: &[Value]) -> Result<Coord<f64>> {
    if coords.len() < 2 {
        bail!("position needs at least two coordinates");
    }
    let x = coords[0].as_f64().ok_or_else(|| anyhow!("x must be a number"))?;
    let y = coords[1].as_f64().ok_or_else(|| anyhow!("y must be a number"))?;
    Ok(Coord { x, y })
}

/// Parse a `[[x, y], ...]` coordinate sequence.
fn parse_line(coords: &[Value]) -> Result<LineString<f64>> {
    let points = coords
        .iter()
        .map(|pair| parse_position(as_array(pair)?))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString(points))
}

/// Parse a polygon as `[exterior, interior, ...]` rings, closing unclosed rings.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut parsed = rings
        .iter()
        .map(|ring| {
            let mut line = parse_line(as_array(ring)?)?;
            if line.0.len() < 3 {
                bail!("ring needs at least three positions");
            }
            if line.0.first() != line.0.last() {
                let first = line.0[0];
                line.0.push(first);
            }
            Ok(line)
        })
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        bail!("polygon has no rings");
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

/// Source frame from the legacy `crs` member, defaulting to WGS84 per the
/// GeoJSON spec. Only the geographic frames the projector can consume are
/// accepted; projected inputs must say so via an analysis frame instead.
fn source_frame(value: &Value) -> Result<Frame> {
    let Some(crs) = value.get("crs") else {
        return Ok(Frame::Geographic(Datum::Wgs84));
    };
    let name = crs["properties"]["name"]
        .as_str()
        .ok_or_else(|| anyhow!("crs member without a name"))?;
    if name.contains("CRS84") || name.ends_with("4326") {
        Ok(Frame::Geographic(Datum::Wgs84))
    } else if name.ends_with("4269") {
        Ok(Frame::Geographic(Datum::Nad83))
    } else {
        bail!("unsupported crs {name:?}")
    }
}
