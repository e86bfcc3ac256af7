use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{anyhow, Context, Result};
use geo::Rect;
use serde::{Deserialize, Serialize};

use geoframe::{Frame, FrameError};

use crate::filter::{FilterError, Predicate};

/// Which linear frame an analysis projects into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FrameSpec {
    /// Derive a UTM frame from the center of the study area's extent.
    Auto,
    /// Use this frame for every layer. Must be linear.
    Fixed(Frame),
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self::Auto
    }
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(frame) => frame.fmt(f),
        }
    }
}

impl FromStr for FrameSpec {
    type Err = FrameError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text == "auto" { Ok(Self::Auto) } else { Ok(Self::Fixed(text.parse()?)) }
    }
}

impl TryFrom<String> for FrameSpec {
    type Error = FrameError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<FrameSpec> for String {
    fn from(spec: FrameSpec) -> String {
        spec.to_string()
    }
}

/// Declarative description of a full five-stage analysis.
///
/// Reads from JSON. Predicates are written as strings (`"farms > 500"`) and
/// thresholds as distances in the analysis frame's linear unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Frame to run in. Defaults to picking a UTM zone from the study extent.
    #[serde(default)]
    pub target_frame: FrameSpec,
    /// Attribute predicates a region must satisfy.
    #[serde(default)]
    pub region_predicates: Vec<Predicate>,
    /// Attribute predicates a site must satisfy.
    #[serde(default)]
    pub site_predicates: Vec<Predicate>,
    /// Maximum distance from a site to the nearest linear feature.
    pub linear_threshold: f64,
    /// Maximum distance from a site to the nearest area feature.
    pub area_threshold: f64,
}

impl AnalysisConfig {
    /// Read and validate a config from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check what the types can't: thresholds positive and finite, fixed
    /// frames linear.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("linear_threshold", self.linear_threshold),
            ("area_threshold", self.area_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FilterError::InvalidThreshold { value })
                    .with_context(|| format!("config field {name}"));
            }
        }
        if let FrameSpec::Fixed(frame) = self.target_frame {
            if !frame.is_linear() {
                return Err(FrameError::NotLinear(frame).into());
            }
        }
        Ok(())
    }

    /// The concrete frame this config runs in, given the study area's
    /// geographic extent.
    pub fn resolve(&self, bounds: Option<Rect<f64>>) -> Result<Frame> {
        match self.target_frame {
            FrameSpec::Fixed(frame) if frame.is_linear() => Ok(frame),
            FrameSpec::Fixed(frame) => Err(FrameError::NotLinear(frame).into()),
            FrameSpec::Auto => {
                let bounds =
                    bounds.ok_or_else(|| anyhow!("study area has no geometry to pick a frame from"))?;
                Ok(Frame::utm_for(bounds.center()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use geoframe::LinearUnit;

    use crate::filter::Comparator;

    const BASE: &str = r#"{
        "target_frame": "utm:14n",
        "region_predicates": ["farms > 500", "workforce >= 25000"],
        "site_predicates": ["pop < 40000"],
        "linear_threshold": 105600.0,
        "area_threshold": 10.0
    }"#;

    #[test]
    fn parses_predicates_and_frame() {
        let config: AnalysisConfig = serde_json::from_str(BASE).unwrap();
        assert_eq!(
            config.target_frame,
            FrameSpec::Fixed(Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter })
        );
        assert_eq!(config.region_predicates.len(), 2);
        assert_eq!(config.region_predicates[0].field, "farms");
        assert_eq!(config.region_predicates[1].cmp, Comparator::Ge);
        assert_eq!(config.site_predicates[0].value, 40000.0);
        config.validate().unwrap();
    }

    #[test]
    fn frame_and_predicates_have_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"linear_threshold": 1.0, "area_threshold": 2.0}"#).unwrap();
        assert_eq!(config.target_frame, FrameSpec::Auto);
        assert!(config.region_predicates.is_empty());
        assert!(config.site_predicates.is_empty());
    }

    #[test]
    fn validate_rejects_nonpositive_thresholds() {
        for bad in ["0.0", "-3.0"] {
            let text = format!(r#"{{"linear_threshold": {bad}, "area_threshold": 2.0}}"#);
            let config: AnalysisConfig = serde_json::from_str(&text).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FilterError>(),
                Some(FilterError::InvalidThreshold { .. })
            ));
        }
    }

    #[test]
    fn validate_rejects_geographic_fixed_frames() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{"target_frame": "wgs84", "linear_threshold": 1.0, "area_threshold": 2.0}"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<FrameError>(), Some(FrameError::NotLinear(_))));
    }

    #[test]
    fn bad_predicate_strings_fail_to_parse() {
        let text = r#"{"region_predicates": ["farms >"], "linear_threshold": 1.0, "area_threshold": 2.0}"#;
        assert!(serde_json::from_str::<AnalysisConfig>(text).is_err());
    }

    #[test]
    fn frame_spec_serializes_as_text() {
        assert_eq!(serde_json::to_string(&FrameSpec::Auto).unwrap(), r#""auto""#);
        let fixed = FrameSpec::Fixed(Frame::Utm { zone: 14, north: true, unit: LinearUnit::Foot });
        assert_eq!(serde_json::to_string(&fixed).unwrap(), r#""utm:14n:ft""#);
        assert_eq!(serde_json::from_str::<FrameSpec>(r#""utm:14n:ft""#).unwrap(), fixed);
    }

    #[test]
    fn resolve_auto_picks_a_utm_zone() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"linear_threshold": 1.0, "area_threshold": 2.0}"#).unwrap();
        let bounds = Rect::new(Coord { x: -100.0, y: 38.0 }, Coord { x: -98.0, y: 39.0 });
        assert_eq!(
            config.resolve(Some(bounds)).unwrap(),
            Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter }
        );
        assert!(config.resolve(None).is_err());
    }

    #[test]
    fn from_path_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, BASE).unwrap();
        let config = AnalysisConfig::from_path(&path).unwrap();
        assert_eq!(config.linear_threshold, 105600.0);

        std::fs::write(&path, r#"{"linear_threshold": -1.0, "area_threshold": 2.0}"#).unwrap();
        assert!(AnalysisConfig::from_path(&path).is_err());
        assert!(AnalysisConfig::from_path(&dir.path().join("missing.json")).is_err());
    }
}
