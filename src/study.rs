use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, Rect};

use geoframe::Frame;

use crate::io::{csv, geojson};
use crate::layer::{Layer, LayerKind};

/// The four datasets an analysis runs over.
#[derive(Debug, Clone)]
pub struct StudyArea {
    pub regions: Layer,
    pub sites: Layer,
    pub linear: Layer,
    pub areas: Layer,
}

impl StudyArea {
    /// Load a study from a directory of `<kind>.geojson` files, merging an
    /// optional `<kind>.csv` attribute table into each layer.
    pub fn load(dir: &Path) -> Result<Self> {
        let load_layer = |kind: LayerKind| -> Result<Layer> {
            let mut layer = geojson::read_layer(kind, &dir.join(format!("{kind}.geojson")))?;
            let csv_path = dir.join(format!("{kind}.csv"));
            if csv_path.exists() {
                let df = csv::read_from_csv(&csv_path)?;
                layer
                    .merge_attributes(df, "id")
                    .with_context(|| format!("merging {}", csv_path.display()))?;
            }
            Ok(layer)
        };
        Ok(Self {
            regions: load_layer(LayerKind::Region)?,
            sites: load_layer(LayerKind::Site)?,
            linear: load_layer(LayerKind::Linear)?,
            areas: load_layer(LayerKind::Area)?,
        })
    }

    /// Get a reference to the layer of the given kind.
    pub fn layer(&self, kind: LayerKind) -> &Layer {
        match kind {
            LayerKind::Region => &self.regions,
            LayerKind::Site => &self.sites,
            LayerKind::Linear => &self.linear,
            LayerKind::Area => &self.areas,
        }
    }

    /// Get a mutable reference to the layer of the given kind.
    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut Layer {
        match kind {
            LayerKind::Region => &mut self.regions,
            LayerKind::Site => &mut self.sites,
            LayerKind::Linear => &mut self.linear,
            LayerKind::Area => &mut self.areas,
        }
    }

    /// Project all four layers into `target`. Any failure aborts the whole
    /// projection, so no query ever sees a half-projected study.
    pub fn project_to(&mut self, target: Frame) -> Result<()> {
        for kind in LayerKind::ALL {
            self.layer_mut(kind).project_to(target)?;
        }
        Ok(())
    }

    /// Union bounding box of all source geometries.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        LayerKind::ALL
            .iter()
            .filter_map(|&kind| self.layer(kind).source.bounds())
            .reduce(|a, b| {
                Rect::new(
                    Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
    }
}
