#![doc = "OpenLocate public API"]
pub mod cli;
pub mod commands;
mod filter;
mod io;
mod layer;
mod pipeline;
mod study;

#[doc(inline)]
pub use layer::{FeatureId, Layer, LayerKind};

#[doc(inline)]
pub use study::StudyArea;

#[doc(inline)]
pub use filter::{
    filter_attributes, filter_contained, filter_within, Comparator, FilterError, Predicate,
};

#[doc(inline)]
pub use pipeline::{Analysis, AnalysisConfig, FrameSpec, Stage};
