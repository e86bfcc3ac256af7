use std::fmt;

use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::frame::{Datum, Frame, FrameError, LinearUnit};

/// PROJ.4 string for a geographic source frame (degrees → radians handled in code).
#[inline]
fn geog_proj4(datum: Datum) -> &'static str {
    match datum {
        Datum::Nad83 => "+proj=longlat +datum=NAD83 +no_defs +type=crs",
        Datum::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
    }
}

/// PROJ.4 string for a target UTM frame, with the datum chosen from the source.
/// - WGS84: 326zz (north) / 327zz (south)
/// - NAD83: 269zz (north only; if south, fall back to WGS84 UTM-S)
#[inline]
fn utm_proj4(source: Datum, zone: u8, north: bool) -> String {
    let datum = if source == Datum::Nad83 && north { "NAD83" } else { "WGS84" };
    let south = if north { "" } else { " +south" };
    format!("+proj=utm +zone={zone}{south} +datum={datum} +units=m +no_defs +type=crs")
}

struct Pipeline {
    from: Proj4,
    to: Proj4,
    scale: f64, // meters → target unit
}

/// A reusable coordinate transform between two frames.
///
/// Identical frames give an identity projector; geographic → UTM goes through
/// proj4rs. No other pair is supported.
pub struct Projector {
    source: Frame,
    target: Frame,
    pipeline: Option<Pipeline>,
}

// Manual impl: proj4rs's `Proj` is not `Debug`, so the pipeline is elided.
impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Projector {
    pub fn new(source: Frame, target: Frame) -> Result<Self, FrameError> {
        if source == target {
            return Ok(Self { source, target, pipeline: None });
        }
        let (datum, zone, north, unit) = match (source, target) {
            (Frame::Geographic(datum), Frame::Utm { zone, north, unit }) => {
                (datum, zone, north, unit)
            }
            _ => return Err(FrameError::Unsupported { source, target }),
        };

        let from = {
            let def = geog_proj4(datum);
            Proj4::from_proj_string(def)
                .map_err(|err| FrameError::BadDefinition(format!("{def}: {err}")))?
        };
        let to = {
            let def = utm_proj4(datum, zone, north);
            Proj4::from_proj_string(&def)
                .map_err(|err| FrameError::BadDefinition(format!("{def}: {err}")))?
        };

        let scale = 1.0 / unit.meters_per_unit();
        Ok(Self { source, target, pipeline: Some(Pipeline { from, to, scale }) })
    }

    #[inline] pub fn source(&self) -> Frame { self.source }

    #[inline] pub fn target(&self) -> Frame { self.target }

    /// Whether projecting is a no-op.
    #[inline] pub fn is_identity(&self) -> bool { self.pipeline.is_none() }

    /// Project a geometry into the target frame.
    ///
    /// Coordinates map degrees → radians in, frame units out. A failure on any
    /// coordinate aborts the whole geometry.
    pub fn project<G>(&self, shape: &G) -> Result<G, FrameError>
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        let Some(pipeline) = &self.pipeline else {
            return Ok(shape.clone());
        };
        shape.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
            transform(&pipeline.from, &pipeline.to, &mut point).map_err(|err| {
                FrameError::Transform { x: coord.x, y: coord.y, reason: err.to_string() }
            })?;
            Ok(Coord { x: point.0 * pipeline.scale, y: point.1 * pipeline.scale })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Point};

    #[test]
    fn identity_when_frames_match() {
        let frame = Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter };
        let projector = Projector::new(frame, frame).unwrap();
        assert!(projector.is_identity());
        let p: Point<f64> = point!(x: 500000.0, y: 4262000.0);
        assert_eq!(projector.project(&p).unwrap(), p);
    }

    #[test]
    fn rejects_unsupported_pairs() {
        let utm = Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter };
        let err = Projector::new(utm, Frame::WGS84).unwrap_err();
        assert!(matches!(err, FrameError::Unsupported { .. }));
        let other = Frame::Utm { zone: 15, north: true, unit: LinearUnit::Meter };
        assert!(matches!(Projector::new(utm, other), Err(FrameError::Unsupported { .. })));
    }

    #[test]
    fn wgs84_to_utm_lands_near_zone_center() {
        // Lon -99 is the central meridian of zone 14; easting ≈ 500 km there.
        let target = Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter };
        let projector = Projector::new(Frame::WGS84, target).unwrap();
        let p: Point<f64> = point!(x: -99.0, y: 38.5);
        let out = projector.project(&p).unwrap();
        assert!((out.x() - 500_000.0).abs() < 1.0, "easting {}", out.x());
        assert!(out.y() > 4_000_000.0 && out.y() < 4_500_000.0, "northing {}", out.y());
    }

    #[test]
    fn feet_scale_against_meters() {
        let meters = Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter };
        let feet = Frame::Utm { zone: 14, north: true, unit: LinearUnit::Foot };
        let in_m = Projector::new(Frame::WGS84, meters).unwrap();
        let in_ft = Projector::new(Frame::WGS84, feet).unwrap();
        let p: Point<f64> = point!(x: -98.5, y: 38.5);
        let m = in_m.project(&p).unwrap();
        let ft = in_ft.project(&p).unwrap();
        assert!((ft.x() * 0.3048 - m.x()).abs() < 1e-6);
        assert!((ft.y() * 0.3048 - m.y()).abs() < 1e-6);
    }
}
