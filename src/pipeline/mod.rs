//! The five-stage site-selection funnel.
//!
//! A [`StudyArea`](crate::study::StudyArea) plus an [`AnalysisConfig`] make
//! an [`Analysis`]; running it narrows regions by attribute, sites by
//! containment, attribute, and two proximity checks, caching every stage
//! output under its [`Stage`] name.

pub mod analysis;
pub mod config;
pub mod stage;

pub use analysis::Analysis;
pub use config::{AnalysisConfig, FrameSpec};
pub use stage::Stage;
