use fxhash::FxHashSet;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{RStarInsertionStrategy, RTree, RTreeParams};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    constants::SNAP_GUIDE_PROPERTY,
    feature::{DrawFeature, FeatureId},
    feature_store::FeatureStore,
    geopoint::GeoPoint,
    pixel::Pixel,
    viewport::Viewport,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideAxis {
    /// Constant latitude.
    Horizontal,
    /// Constant longitude.
    Vertical,
}

impl GuideAxis {
    pub fn feature_id(&self) -> FeatureId {
        match self {
            GuideAxis::Horizontal => FeatureId::horizontal_guide(),
            GuideAxis::Vertical => FeatureId::vertical_guide(),
        }
    }
}

/// An alignment line through the most recently committed vertex, stretched
/// across the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    axis: GuideAxis,
    anchor: Option<GeoPoint>,
    line: Option<[GeoPoint; 2]>,
    pixels: Option<[Pixel; 2]>,
}

impl Guide {
    fn new(axis: GuideAxis) -> Self {
        Guide {
            axis,
            anchor: None,
            line: None,
            pixels: None,
        }
    }

    pub fn axis(&self) -> GuideAxis {
        self.axis
    }

    pub fn anchor(&self) -> Option<GeoPoint> {
        self.anchor
    }

    pub fn line(&self) -> Option<[GeoPoint; 2]> {
        self.line
    }

    pub fn pixel_line(&self) -> Option<[Pixel; 2]> {
        self.pixels
    }

    fn anchor_at<V: Viewport + ?Sized>(&mut self, viewport: &V, anchor: GeoPoint) {
        self.anchor = Some(anchor);
        self.stretch(viewport);
    }

    fn stretch<V: Viewport + ?Sized>(&mut self, viewport: &V) {
        let Some(anchor) = self.anchor else {
            return;
        };

        let bounds = viewport.bounds();
        let line = match self.axis {
            GuideAxis::Horizontal => [
                GeoPoint::new(bounds.west, anchor.lat),
                GeoPoint::new(bounds.east, anchor.lat),
            ],
            GuideAxis::Vertical => [
                GeoPoint::new(anchor.lng, bounds.north),
                GeoPoint::new(anchor.lng, bounds.south),
            ],
        };

        self.pixels = Some([viewport.project(&line[0]), viewport.project(&line[1])]);
        self.line = Some(line);
    }

    /// Copies the locked axis of the anchor onto `point`, so a point snapped
    /// onto the guide shares the anchor's latitude (or longitude) exactly.
    pub(crate) fn lock(&self, point: GeoPoint) -> GeoPoint {
        match (self.axis, self.anchor) {
            (GuideAxis::Horizontal, Some(anchor)) => GeoPoint::new(point.lng, anchor.lat),
            (GuideAxis::Vertical, Some(anchor)) => GeoPoint::new(anchor.lng, point.lat),
            (_, None) => point,
        }
    }

    pub fn to_feature(&self) -> DrawFeature {
        let coordinates: Vec<geo_types::Coord<f64>> = self
            .line
            .map(|line| line.iter().map(|point| geo_types::Coord::from(*point)).collect())
            .unwrap_or_default();

        DrawFeature::new(
            self.axis.feature_id(),
            geo_types::LineString::new(coordinates),
        )
        .with_property(SNAP_GUIDE_PROPERTY, "true")
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SnapVertex {
    pub point: GeoPoint,
    /// Insertion order, used to break ties between equidistant vertices.
    pub sequence: usize,
}

type VertexEntry = GeomWithData<[f64; 2], SnapVertex>;

struct GuideIndexTreeParams;

impl RTreeParams for GuideIndexTreeParams {
    type DefaultInsertionStrategy = RStarInsertionStrategy;

    const MAX_SIZE: usize = 16;
    const MIN_SIZE: usize = 6;
    const REINSERTION_COUNT: usize = 3;
}

/// The snap pool: vertices of eligible features in pixel space plus the two
/// guides.
pub struct GuideIndex {
    vertices: RTree<VertexEntry, GuideIndexTreeParams>,
    committed: Vec<GeoPoint>,
    horizontal: Guide,
    vertical: Guide,
    visible_only: bool,
    next_sequence: usize,
}

impl GuideIndex {
    pub fn new(visible_only: bool) -> Self {
        GuideIndex {
            vertices: RTree::new_with_params(),
            committed: Vec::new(),
            horizontal: Guide::new(GuideAxis::Horizontal),
            vertical: Guide::new(GuideAxis::Vertical),
            visible_only,
            next_sequence: 0,
        }
    }

    /// Recomputes the pixel position of every candidate vertex and stretches
    /// the guides to the current viewport.
    #[instrument(skip_all, level = "debug", fields(exclude = %exclude))]
    pub fn rebuild<V, S>(&mut self, viewport: &V, store: &S, exclude: &FeatureId)
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        let mut seen = FxHashSet::default();
        let snapshot: Vec<GeoPoint> = store
            .eligible_features(exclude)
            .into_iter()
            .flat_map(|feature| feature.vertices())
            .filter(|point| seen.insert(point.key()))
            .collect();

        let visible_only = self.visible_only;
        let projected: Vec<(GeoPoint, Pixel)> = snapshot
            .par_iter()
            .map(|point| (*point, viewport.project(point)))
            .filter(|(_, pixel)| !visible_only || viewport.contains(pixel))
            .collect();

        // Committed vertices stay in the pool even when scrolled out of view.
        let committed = self
            .committed
            .iter()
            .map(|point| (*point, viewport.project(point)));

        let entries: Vec<VertexEntry> = projected
            .into_iter()
            .chain(committed)
            .enumerate()
            .map(|(sequence, (point, pixel))| {
                VertexEntry::new(pixel.into(), SnapVertex { point, sequence })
            })
            .collect();

        self.next_sequence = entries.len();
        self.vertices = RTree::bulk_load_with_params(entries);

        self.horizontal.stretch(viewport);
        self.vertical.stretch(viewport);

        debug!(
            candidates = snapshot.len(),
            vertices = self.vertices.size(),
            "Rebuilt snap pool"
        );
    }

    /// Adds a committed vertex to the pool and re-anchors both guides on it.
    pub fn extend_guides<V: Viewport + ?Sized>(&mut self, viewport: &V, point: GeoPoint) {
        let pixel = viewport.project(&point);

        self.committed.push(point);
        self.vertices.insert(VertexEntry::new(
            pixel.into(),
            SnapVertex {
                point,
                sequence: self.next_sequence,
            },
        ));
        self.next_sequence += 1;

        self.horizontal.anchor_at(viewport, point);
        self.vertical.anchor_at(viewport, point);
    }

    /// The closest vertex to `pixel` and its distance in pixels. Among
    /// equidistant vertices the earliest inserted wins.
    pub fn nearest_vertex(&self, pixel: &Pixel) -> Option<(SnapVertex, f64)> {
        let query: [f64; 2] = (*pixel).into();
        let mut nearest = self
            .vertices
            .nearest_neighbor_iter(&query)
            .map(|entry| (entry.data, pixel.distance(&Pixel::from(*entry.geom()))));

        let first = nearest.next()?;
        let best = nearest
            .take_while(|(_, distance)| *distance == first.1)
            .fold(first, |best, candidate| {
                if candidate.0.sequence < best.0.sequence {
                    candidate
                } else {
                    best
                }
            });

        Some(best)
    }

    pub fn guide(&self, axis: GuideAxis) -> &Guide {
        match axis {
            GuideAxis::Horizontal => &self.horizontal,
            GuideAxis::Vertical => &self.vertical,
        }
    }

    pub fn guides(&self) -> [&Guide; 2] {
        [&self.horizontal, &self.vertical]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.size()
    }

    pub fn committed(&self) -> &[GeoPoint] {
        &self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.size() == 0 && self.horizontal.pixels.is_none()
    }
}
