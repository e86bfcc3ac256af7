use std::fmt;
use std::str::FromStr;

use geo::Coord;

/// Errors produced by frame parsing, projection, and frame-tagged queries.
///
/// `Display` and `Error` are implemented by hand: thiserror's derive would
/// treat the `source` frame field of `Unsupported` as an error source, but it
/// is plain data (the frame being projected *from*).
#[derive(Debug)]
pub enum FrameError {
    /// No transform path between the two frames.
    Unsupported { source: Frame, target: Frame },

    /// A PROJ.4 definition was rejected by the projection backend.
    BadDefinition(String),

    /// A coordinate failed to transform into the target frame.
    Transform { x: f64, y: f64, reason: String },

    /// Two geometry collections were combined across different frames.
    Mismatch { left: Frame, right: Frame },

    /// A linear frame was required, but the given frame measures angles.
    NotLinear(Frame),

    /// A geometry with no spatial extent.
    InvalidGeometry(String),

    /// An unrecognized frame spelling.
    Parse(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { source, target } => {
                write!(f, "no projection from {source} to {target}")
            }
            Self::BadDefinition(detail) => write!(f, "bad projection definition: {detail}"),
            Self::Transform { x, y, reason } => {
                write!(f, "cannot transform ({x}, {y}): {reason}")
            }
            Self::Mismatch { left, right } => write!(f, "frame mismatch: {left} vs {right}"),
            Self::NotLinear(frame) => write!(f, "frame {frame} is not linear"),
            Self::InvalidGeometry(detail) => write!(f, "invalid geometry: {detail}"),
            Self::Parse(text) => write!(f, "unrecognized frame: {text:?}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Geodetic datum of a geographic (lon/lat) frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Datum {
    Wgs84,
    Nad83,
}

/// Exact length of the international foot in meters.
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Unit of measure for planar coordinates and distance thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinearUnit {
    Meter,
    Foot,
}

impl LinearUnit {
    /// Length of one unit in meters.
    #[inline]
    pub fn meters_per_unit(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Foot => METERS_PER_FOOT,
        }
    }

    /// Convert a value in this unit to meters.
    #[inline] pub fn to_meters(self, value: f64) -> f64 { value * self.meters_per_unit() }

    /// Convert a value in meters to this unit.
    #[inline] pub fn from_meters(self, meters: f64) -> f64 { meters / self.meters_per_unit() }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Foot => "ft",
        }
    }
}

/// A coordinate reference frame.
///
/// Coordinates are either angular lon/lat degrees on a geodetic datum, or
/// planar easting/northing in a UTM zone, expressed in a linear unit.
/// Distance and containment predicates are only meaningful in linear frames;
/// geographic collections must be projected before querying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Lon/lat degrees (angular; no linear unit).
    Geographic(Datum),
    /// UTM zone `1..=60`, northern or southern hemisphere, in `unit`.
    Utm { zone: u8, north: bool, unit: LinearUnit },
}

impl Frame {
    pub const WGS84: Self = Self::Geographic(Datum::Wgs84);
    pub const NAD83: Self = Self::Geographic(Datum::Nad83);

    /// The UTM frame (in meters) covering a lon/lat center, using the
    /// standard 6-degree zones.
    pub fn utm_for(center: Coord<f64>) -> Self {
        let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8;
        Self::Utm { zone, north: center.y >= 0.0, unit: LinearUnit::Meter }
    }

    /// The frame for a recognized EPSG code: 4326/4269 geographic,
    /// 326zz/327zz (WGS84 UTM N/S) and 269zz (NAD83 UTM) planar.
    pub fn from_epsg(code: u32) -> Option<Self> {
        let utm = |zone: u32, north| Self::Utm { zone: zone as u8, north, unit: LinearUnit::Meter };
        match code {
            4326 => Some(Self::WGS84),
            4269 => Some(Self::NAD83),
            32601..=32660 => Some(utm(code - 32600, true)),
            32701..=32760 => Some(utm(code - 32700, false)),
            26901..=26923 => Some(utm(code - 26900, true)),
            _ => None,
        }
    }

    #[inline] pub fn is_geographic(self) -> bool { matches!(self, Self::Geographic(_)) }

    /// Whether distances are meaningful in this frame.
    #[inline] pub fn is_linear(self) -> bool { matches!(self, Self::Utm { .. }) }

    /// The linear unit of a planar frame, if any.
    #[inline]
    pub fn linear_unit(self) -> Option<LinearUnit> {
        match self {
            Self::Utm { unit, .. } => Some(unit),
            Self::Geographic(_) => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geographic(Datum::Wgs84) => write!(f, "wgs84"),
            Self::Geographic(Datum::Nad83) => write!(f, "nad83"),
            Self::Utm { zone, north, unit } => {
                let hemi = if *north { 'n' } else { 's' };
                match unit {
                    LinearUnit::Meter => write!(f, "utm:{zone}{hemi}"),
                    LinearUnit::Foot => write!(f, "utm:{zone}{hemi}:ft"),
                }
            }
        }
    }
}

impl FromStr for Frame {
    type Err = FrameError;

    /// Accepted spellings: `wgs84`, `nad83`, `utm:14n`, `utm:14n:ft`,
    /// `utm:33s:m`, and `epsg:<code>` for the codes `from_epsg` knows.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        match text.as_str() {
            "wgs84" => return Ok(Self::WGS84),
            "nad83" => return Ok(Self::NAD83),
            _ => {}
        }
        if let Some(code) = text.strip_prefix("epsg:") {
            let code = code.parse::<u32>().map_err(|_| FrameError::Parse(s.into()))?;
            return Self::from_epsg(code).ok_or_else(|| FrameError::Parse(s.into()));
        }
        if let Some(rest) = text.strip_prefix("utm:") {
            let mut parts = rest.split(':');
            let zone_part = parts.next().unwrap_or_default();
            let unit = match parts.next() {
                None | Some("m") => LinearUnit::Meter,
                Some("ft") => LinearUnit::Foot,
                Some(_) => return Err(FrameError::Parse(s.into())),
            };
            if parts.next().is_some() {
                return Err(FrameError::Parse(s.into()));
            }
            let (digits, hemi) = zone_part.split_at(zone_part.len().saturating_sub(1));
            let north = match hemi {
                "n" => true,
                "s" => false,
                _ => return Err(FrameError::Parse(s.into())),
            };
            let zone = digits.parse::<u8>().map_err(|_| FrameError::Parse(s.into()))?;
            if !(1..=60).contains(&zone) {
                return Err(FrameError::Parse(s.into()));
            }
            return Ok(Self::Utm { zone, north, unit });
        }
        Err(FrameError::Parse(s.into()))
    }
}
