use geo::{BoundingRect, Coord, Geometry, Rect, Relate};
use rstar::{RTree, RTreeObject, AABB};

use crate::dist::shape_distance;
use crate::frame::{Frame, FrameError};
use crate::proj::Projector;

/// A bounding box in an R-tree, associated with a shape by index.
#[derive(Debug, Clone)]
struct BoundingBox {
    idx: usize, // Index of corresponding shape in Geometries
    bbox: Rect<f64>,
}

impl BoundingBox {
    fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Geometries represents a collection of shapes expressed in a single frame,
/// indexed by an R-tree over their bounding boxes.
///
/// Containment and distance queries require the caller's frame to match the
/// collection's; a mismatch is an error, never a silent unit bug.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<Geometry<f64>>,
    frame: Frame,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a collection of shapes expressed in `frame`.
    ///
    /// Every shape must have a spatial extent; a degenerate shape fails the
    /// whole construction rather than being skipped.
    pub fn new(shapes: Vec<Geometry<f64>>, frame: Frame) -> Result<Self, FrameError> {
        let boxes = shapes
            .iter()
            .enumerate()
            .map(|(idx, shape)| {
                let bbox = shape.bounding_rect().ok_or_else(|| {
                    FrameError::InvalidGeometry(format!("shape {idx} has no extent"))
                })?;
                Ok(BoundingBox::new(idx, bbox))
            })
            .collect::<Result<Vec<_>, FrameError>>()?;
        Ok(Self { rtree: RTree::bulk_load(boxes), shapes, frame })
    }

    /// Get the number of shapes.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no shapes.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get the frame the coordinates are expressed in.
    #[inline] pub fn frame(&self) -> Frame { self.frame }

    /// Get a reference to the list of shapes.
    #[inline] pub fn shapes(&self) -> &Vec<Geometry<f64>> { &self.shapes }

    /// Get the shape at `idx`.
    #[inline] pub fn get(&self, idx: usize) -> Option<&Geometry<f64>> { self.shapes.get(idx) }

    /// Union bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let mut rects = self.shapes.iter().filter_map(|shape| shape.bounding_rect());
        let first = rects.next()?;
        Some(rects.fold(first, |acc, rect| {
            Rect::new(
                Coord { x: acc.min().x.min(rect.min().x), y: acc.min().y.min(rect.min().y) },
                Coord { x: acc.max().x.max(rect.max().x), y: acc.max().y.max(rect.max().y) },
            )
        }))
    }

    /// Derived collection holding the shapes at `rows`, in the given order.
    pub fn subset(&self, rows: &[u32]) -> Result<Self, FrameError> {
        let shapes = rows
            .iter()
            .map(|&row| {
                self.shapes.get(row as usize).cloned().ok_or_else(|| {
                    FrameError::InvalidGeometry(format!("shape index {row} out of range"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes, self.frame)
    }

    /// Project every shape into `target`, returning a new collection.
    /// Identical frames return a copy without touching coordinates.
    pub fn project_to(&self, target: Frame) -> Result<Self, FrameError> {
        if target == self.frame {
            return Ok(self.clone());
        }
        let projector = Projector::new(self.frame, target)?;
        let shapes = self
            .shapes
            .iter()
            .map(|shape| projector.project(shape))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes, target)
    }

    /// Find a shape covering `shape`, boundary inclusive.
    ///
    /// Returns the lowest matching index, so the result is deterministic even
    /// when covering shapes overlap. `frame` declares the frame `shape` is
    /// expressed in and must match the collection's.
    pub fn find_covering(
        &self,
        shape: &Geometry<f64>,
        frame: Frame,
    ) -> Result<Option<usize>, FrameError> {
        self.check_frame(frame)?;
        let rect = shape.bounding_rect().ok_or_else(|| {
            FrameError::InvalidGeometry("query shape has no extent".into())
        })?;
        let search = AABB::from_corners(rect.min().into(), rect.max().into());
        Ok(self
            .rtree
            .locate_in_envelope_intersecting(&search)
            .filter(|cand| self.shapes[cand.idx()].relate(shape).is_covers())
            .map(|cand| cand.idx())
            .min())
    }

    /// Test whether any shape lies within `threshold` of `shape`, inclusive.
    /// The threshold is expressed in the frame's linear unit.
    pub fn any_within(
        &self,
        shape: &Geometry<f64>,
        frame: Frame,
        threshold: f64,
    ) -> Result<bool, FrameError> {
        self.check_frame(frame)?;
        let rect = shape.bounding_rect().ok_or_else(|| {
            FrameError::InvalidGeometry("query shape has no extent".into())
        })?;
        let search = AABB::from_corners(
            [rect.min().x - threshold, rect.min().y - threshold],
            [rect.max().x + threshold, rect.max().y + threshold],
        );
        Ok(self
            .rtree
            .locate_in_envelope_intersecting(&search)
            .any(|cand| shape_distance(&self.shapes[cand.idx()], shape) <= threshold))
    }

    #[inline]
    fn check_frame(&self, frame: Frame) -> Result<(), FrameError> {
        if frame == self.frame {
            Ok(())
        } else {
            Err(FrameError::Mismatch { left: frame, right: self.frame })
        }
    }
}
