use std::{fmt, sync::Arc};

use ahash::AHashMap;
use anyhow::{anyhow, ensure, Context, Result};
use polars::{
    frame::DataFrame,
    prelude::{DataFrameJoinOps, IdxCa, SortMultipleOptions},
};

use geoframe::{Frame, Geometries};

/// The four record collections a study area is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Region, // Polygonal administrative units (e.g. counties)
    Site,   // Point locations under consideration (e.g. cities)
    Linear, // Linear transportation features (e.g. interstates)
    Area,   // Polygonal amenity features (e.g. recreation areas)
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [Self::Region, Self::Site, Self::Linear, Self::Area];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "regions",
            Self::Site => "sites",
            Self::Linear => "linear",
            Self::Area => "areas",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable key for a record in any layer.
/// Keeps the original id text but avoids repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureId {
    pub kind: LayerKind,
    pub id: Arc<str>,
}

impl FeatureId {
    pub fn new(kind: LayerKind, id: &str) -> Self {
        Self { kind, id: Arc::from(id) }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A single record collection: parallel ids, attribute table, and geometry.
///
/// The attribute table always carries an `idx` column (load-order row), an
/// `id` column, and whatever numeric columns the source data provides.
/// Geometry lives in the declared source frame; `project_to` fills the
/// `projected` cache once and spatial queries only ever read that.
#[derive(Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub ids: Vec<FeatureId>,
    pub index: AHashMap<FeatureId, u32>, // Map between ids and contiguous row indices
    pub data: DataFrame,                 // Record attributes (idx, id, name, numeric columns)
    pub source: Geometries,              // Geometry as loaded, in the source frame
    pub projected: Option<Geometries>,   // Geometry in the analysis frame
}

impl Layer {
    /// Build a layer from parallel parts, checking their alignment.
    pub fn from_parts(
        kind: LayerKind,
        ids: Vec<FeatureId>,
        data: DataFrame,
        source: Geometries,
    ) -> Result<Self> {
        ensure!(
            ids.len() == source.len(),
            "{kind}: {} ids but {} shapes",
            ids.len(),
            source.len()
        );
        ensure!(
            ids.len() == data.height(),
            "{kind}: {} ids but {} data rows",
            ids.len(),
            data.height()
        );
        let index: AHashMap<FeatureId, u32> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();
        ensure!(index.len() == ids.len(), "{kind}: duplicate record ids");
        Ok(Self { kind, ids, index, data, source, projected: None })
    }

    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Display name of the record at `row`, falling back to its id.
    pub fn name_of(&self, row: u32) -> String {
        self.data
            .column("name")
            .ok()
            .and_then(|col| col.str().ok())
            .and_then(|names| names.get(row as usize))
            .map(str::to_string)
            .unwrap_or_else(|| self.ids[row as usize].id.to_string())
    }

    /// The projected geometries. Errors if the layer has not been projected,
    /// so a spatial query can never silently run in the source frame.
    pub fn projected(&self) -> Result<&Geometries> {
        self.projected
            .as_ref()
            .ok_or_else(|| anyhow!("{} layer has not been projected", self.kind))
    }

    /// Project source geometries into `target`, replacing any previous projection.
    pub fn project_to(&mut self, target: Frame) -> Result<()> {
        let projected = self
            .source
            .project_to(target)
            .with_context(|| format!("projecting {} layer", self.kind))?;
        self.projected = Some(projected);
        Ok(())
    }

    /// Derived layer keeping the records at `rows` (strictly increasing).
    ///
    /// The subset preserves load order, so stage outputs stay ordered subsets
    /// of their inputs. Both source and projected geometries come along; the
    /// parent layer is never touched.
    pub fn select(&self, rows: &[u32]) -> Result<Layer> {
        ensure!(
            rows.windows(2).all(|pair| pair[0] < pair[1]),
            "{}: selection must be strictly increasing",
            self.kind
        );
        if let Some(&last) = rows.last() {
            ensure!((last as usize) < self.len(), "{}: row {last} out of range", self.kind);
        }

        let ids: Vec<FeatureId> = rows.iter().map(|&row| self.ids[row as usize].clone()).collect();
        let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i as u32)).collect();
        let data = self.data.take(&IdxCa::from_vec("rows".into(), rows.to_vec()))?;
        let source = self.source.subset(rows)?;
        let projected = self.projected.as_ref().map(|geoms| geoms.subset(rows)).transpose()?;
        Ok(Layer { kind: self.kind, ids, index, data, source, projected })
    }

    /// Merge extra attribute columns into the layer by id, preserving row order.
    pub fn merge_attributes(&mut self, df: DataFrame, id_col: &str) -> Result<()> {
        ensure!(
            df.height() == self.data.height(),
            "{}: attribute table has {} rows, layer has {}",
            self.kind,
            df.height(),
            self.data.height()
        );
        df.column(id_col)
            .with_context(|| format!("{}: missing id column {id_col:?}", self.kind))?
            .str()
            .with_context(|| format!("{}: id column {id_col:?} must be of type String", self.kind))?;

        let merged = self
            .data
            .inner_join(&df, ["id"], [id_col])?
            .sort(["idx"], SortMultipleOptions::default())?;
        ensure!(
            merged.height() == self.data.height(),
            "{}: attribute ids do not line up with layer ids",
            self.kind
        );
        self.data = merged;
        Ok(())
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &self.kind)
            .field("records", &self.ids.len())
            .field("data_cols", &self.data.width())
            .field("source_frame", &self.source.frame())
            .field("projected", &self.projected.as_ref().map(|geoms| geoms.frame()))
            .finish()
    }
}
