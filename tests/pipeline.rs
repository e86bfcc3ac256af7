// Integration tests for the full pipeline: load a study directory from
// GeoJSON + CSV, resolve a frame, and run the five-stage funnel.

use std::fs;
use std::path::Path;

use geoframe::{Frame, LinearUnit, METERS_PER_FOOT};
use openlocate::{Analysis, AnalysisConfig, FilterError, FrameSpec, Stage, StudyArea};

const REGIONS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "R1",
      "properties": {"name": "Harvest County", "farms": 847, "workforce": 71214, "density": 96.2},
      "geometry": {"type": "Polygon", "coordinates": [[
        [-100.0, 38.0], [-99.5, 38.0], [-99.5, 38.5], [-100.0, 38.5], [-100.0, 38.0]
      ]]}
    },
    {
      "type": "Feature",
      "id": "R2",
      "properties": {"name": "Dust County", "farms": 312, "workforce": 9400, "density": 210},
      "geometry": {"type": "Polygon", "coordinates": [[
        [-99.4, 38.0], [-98.9, 38.0], [-98.9, 38.5], [-99.4, 38.5], [-99.4, 38.0]
      ]]}
    }
  ]
}"#;

const SITES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "S1",
      "properties": {"name": "Fairview"},
      "geometry": {"type": "Point", "coordinates": [-99.75, 38.25]}
    },
    {
      "type": "Feature",
      "id": "S2",
      "properties": {"name": "Midvale"},
      "geometry": {"type": "Point", "coordinates": [-99.6, 38.4]}
    },
    {
      "type": "Feature",
      "id": "S3",
      "properties": {"name": "Drytown"},
      "geometry": {"type": "Point", "coordinates": [-99.15, 38.25]}
    }
  ]
}"#;

const SITES_CSV: &str = "id,pop\nS1,18000\nS2,52000\nS3,25000\n";

const LINEAR: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "I-80",
      "properties": {"name": "Interstate 80"},
      "geometry": {"type": "LineString", "coordinates": [[-99.8, 37.8], [-99.8, 38.7]]}
    }
  ]
}"#;

const AREAS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "P1",
      "properties": {"name": "Lakeside Park"},
      "geometry": {"type": "Polygon", "coordinates": [[
        [-99.72, 38.24], [-99.70, 38.24], [-99.70, 38.26], [-99.72, 38.26], [-99.72, 38.24]
      ]]}
    }
  ]
}"#;

/// Kansas-ish study in plain WGS84 lon/lat. R1 passes the region
/// predicates; S1 and S2 sit in R1 but only S1 passes the site predicate.
/// S1 lies ~4.4 km from the interstate and ~2.6 km from the park.
fn write_study(dir: &Path) {
    fs::write(dir.join("regions.geojson"), REGIONS).unwrap();
    fs::write(dir.join("sites.geojson"), SITES).unwrap();
    fs::write(dir.join("sites.csv"), SITES_CSV).unwrap();
    fs::write(dir.join("linear.geojson"), LINEAR).unwrap();
    fs::write(dir.join("areas.geojson"), AREAS).unwrap();
}

fn config(frame: FrameSpec, linear_threshold: f64, area_threshold: f64) -> AnalysisConfig {
    AnalysisConfig {
        target_frame: frame,
        region_predicates: vec![
            "farms > 500".parse().unwrap(),
            "workforce >= 25000".parse().unwrap(),
            "density < 150".parse().unwrap(),
        ],
        site_predicates: vec!["pop < 40000".parse().unwrap()],
        linear_threshold,
        area_threshold,
    }
}

fn final_ids(analysis: &Analysis) -> Vec<String> {
    analysis
        .final_candidates()
        .unwrap()
        .ids
        .iter()
        .map(|id| id.id.to_string())
        .collect()
}

#[test]
fn analyzes_a_study_directory_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());

    let study = StudyArea::load(dir.path()).unwrap();
    assert_eq!(study.regions.len(), 2);
    assert_eq!(study.sites.len(), 3);

    // CSV attributes merged into the site table
    let pop: Vec<i64> = study.sites.data.column("pop").unwrap().i64().unwrap()
        .into_no_null_iter().collect();
    assert_eq!(pop, vec![18000, 52000, 25000]);

    let mut analysis = Analysis::new(study, config(FrameSpec::Auto, 10_000.0, 5_000.0)).unwrap();
    assert_eq!(
        analysis.frame(),
        Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter },
        "auto frame should be the UTM zone at the study center"
    );
    analysis.run().unwrap();

    let counts: Vec<usize> = analysis.stages().map(|(_, layer)| layer.len()).collect();
    assert_eq!(counts, vec![1, 2, 1, 1, 1]);
    assert_eq!(final_ids(&analysis), ["S1"]);

    let finals = analysis.final_candidates().unwrap();
    let regions: Vec<&str> = finals.data.column("region").unwrap().str().unwrap()
        .into_no_null_iter().collect();
    assert_eq!(regions, ["Harvest County"]);
}

#[test]
fn tight_thresholds_cut_the_candidate() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());
    let study = StudyArea::load(dir.path()).unwrap();

    // S1 is ~4.4 km from the interstate; a 2 km threshold excludes it.
    let mut analysis = Analysis::new(study, config(FrameSpec::Auto, 2_000.0, 5_000.0)).unwrap();
    analysis.run().unwrap();
    assert_eq!(analysis.stage(Stage::SitesNearLinear).unwrap().len(), 0);
    assert!(final_ids(&analysis).is_empty());
}

#[test]
fn feet_frame_agrees_with_meters_when_thresholds_convert() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());

    let meters = FrameSpec::Fixed(Frame::Utm { zone: 14, north: true, unit: LinearUnit::Meter });
    let feet = FrameSpec::Fixed(Frame::Utm { zone: 14, north: true, unit: LinearUnit::Foot });

    let mut in_meters =
        Analysis::new(StudyArea::load(dir.path()).unwrap(), config(meters, 10_000.0, 5_000.0))
            .unwrap();
    in_meters.run().unwrap();

    let mut in_feet = Analysis::new(
        StudyArea::load(dir.path()).unwrap(),
        config(feet, 10_000.0 / METERS_PER_FOOT, 5_000.0 / METERS_PER_FOOT),
    )
    .unwrap();
    in_feet.run().unwrap();

    assert_eq!(final_ids(&in_meters), final_ids(&in_feet));
    for stage in Stage::ALL {
        assert_eq!(
            in_meters.stage(stage).unwrap().len(),
            in_feet.stage(stage).unwrap().len(),
            "{stage} disagrees between unit frames"
        );
    }
}

#[test]
fn unknown_predicate_field_fails_with_no_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());
    let study = StudyArea::load(dir.path()).unwrap();

    let mut config = config(FrameSpec::Auto, 10_000.0, 5_000.0);
    config.region_predicates.push("acreage > 10".parse().unwrap());
    let mut analysis = Analysis::new(study, config).unwrap();

    let err = analysis.run().unwrap_err();
    match err.downcast_ref::<FilterError>() {
        Some(FilterError::UnknownField { field, .. }) => assert_eq!(field, "acreage"),
        other => panic!("expected UnknownField, got {other:?}"),
    }
    assert_eq!(analysis.stages().count(), 0);
    assert!(analysis.final_candidates().is_err());
}

#[test]
fn load_rejects_mismatched_geometry_kinds() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());
    // A point feature in the regions layer
    fs::write(
        dir.path().join("regions.geojson"),
        r#"{
          "type": "FeatureCollection",
          "features": [
            {
              "type": "Feature",
              "id": "R1",
              "properties": {"name": "Harvest County"},
              "geometry": {"type": "Point", "coordinates": [-99.75, 38.25]}
            }
          ]
        }"#,
    )
    .unwrap();

    let err = StudyArea::load(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("unexpected Point"), "got: {err:#}");
}

#[test]
fn load_requires_every_layer_file() {
    let dir = tempfile::tempdir().unwrap();
    write_study(dir.path());
    fs::remove_file(dir.path().join("areas.geojson")).unwrap();
    assert!(StudyArea::load(dir.path()).is_err());
}
