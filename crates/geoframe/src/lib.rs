pub mod dist;
pub mod frame;
pub mod geom;
pub mod proj;

pub use dist::shape_distance;
pub use frame::{Datum, Frame, FrameError, LinearUnit, METERS_PER_FOOT};
pub use geom::Geometries;
pub use proj::Projector;
