//! Readers for the on-disk study formats: GeoJSON layers and CSV attribute
//! tables. Loading is fail-fast; a malformed record aborts the whole load.

pub mod csv;
pub mod geojson;
