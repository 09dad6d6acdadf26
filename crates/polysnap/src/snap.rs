use geo::{Closest, ClosestPoint};

use crate::{
    error::SnapError,
    geopoint::GeoPoint,
    guide_index::{Guide, GuideAxis, GuideIndex},
    pixel::Pixel,
    viewport::Viewport,
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SnapTarget {
    /// A vertex of an eligible feature or a committed vertex.
    Vertex,
    Guide(GuideAxis),
    /// Nothing in range, the pointer position is used as is.
    Pointer,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Snap {
    pub point: GeoPoint,
    pub target: SnapTarget,
    pub distance_px: Option<f64>,
}

impl Snap {
    pub fn is_snapped(&self) -> bool {
        self.target != SnapTarget::Pointer
    }

    pub fn used_horizontal_guide(&self) -> bool {
        self.target == SnapTarget::Guide(GuideAxis::Horizontal)
    }

    pub fn used_vertical_guide(&self) -> bool {
        self.target == SnapTarget::Guide(GuideAxis::Vertical)
    }
}

struct Candidate {
    distance: f64,
    rank: u8,
    sequence: usize,
    point: GeoPoint,
    target: SnapTarget,
}

impl Candidate {
    /// Nearest first. Exact ties go to vertices, then the horizontal guide,
    /// then the vertical guide.
    fn cmp(&self, other: &Candidate) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.rank.cmp(&other.rank))
            .then(self.sequence.cmp(&other.sequence))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SnapResolver {
    tolerance_px: f64,
}

impl SnapResolver {
    pub fn new(tolerance_px: f64) -> Result<Self, SnapError> {
        if !tolerance_px.is_finite() || tolerance_px < 0.0 {
            return Err(SnapError::InvalidTolerance(tolerance_px));
        }

        Ok(SnapResolver { tolerance_px })
    }

    pub fn tolerance_px(&self) -> f64 {
        self.tolerance_px
    }

    /// Picks the coordinate for the live preview vertex. A candidate exactly
    /// `tolerance_px` away is still in range.
    pub fn resolve<V: Viewport + ?Sized>(
        &self,
        viewport: &V,
        pointer: Pixel,
        index: &GuideIndex,
    ) -> Snap {
        let vertex = index
            .nearest_vertex(&pointer)
            .map(|(vertex, distance)| Candidate {
                distance,
                rank: 0,
                sequence: vertex.sequence,
                point: vertex.point,
                target: SnapTarget::Vertex,
            });

        let guides = index
            .guides()
            .into_iter()
            .filter_map(|guide| guide_candidate(viewport, guide, &pointer));

        let best = vertex
            .into_iter()
            .chain(guides)
            .filter(|candidate| candidate.distance <= self.tolerance_px)
            .min_by(Candidate::cmp);

        match best {
            Some(candidate) => Snap {
                point: candidate.point,
                target: candidate.target,
                distance_px: Some(candidate.distance),
            },
            None => Snap {
                point: viewport.unproject(&pointer),
                target: SnapTarget::Pointer,
                distance_px: None,
            },
        }
    }
}

fn guide_candidate<V: Viewport + ?Sized>(
    viewport: &V,
    guide: &Guide,
    pointer: &Pixel,
) -> Option<Candidate> {
    let [start, end] = guide.pixel_line()?;
    let line = geo::Line::new(geo::Coord::from(start), geo::Coord::from(end));

    let closest = match line.closest_point(&geo::Point::from(*pointer)) {
        Closest::Intersection(point) => Pixel::from(point),
        Closest::SinglePoint(point) => Pixel::from(point),
        Closest::Indeterminate => return None,
    };

    let rank = match guide.axis() {
        GuideAxis::Horizontal => 1,
        GuideAxis::Vertical => 2,
    };

    Some(Candidate {
        distance: pointer.distance(&closest),
        rank,
        sequence: 0,
        point: guide.lock(viewport.unproject(&closest)),
        target: SnapTarget::Guide(guide.axis()),
    })
}
