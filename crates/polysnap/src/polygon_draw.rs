use tracing::{debug, info, warn};

use crate::{
    display::{DisplayFeature, Meta},
    feature::{DrawFeature, FeatureId},
    feature_store::FeatureStore,
    geopoint::GeoPoint,
};

#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The ring was valid and the polygon stays in the store.
    Created(DrawFeature),
    /// Too few vertices, or the polygon was already removed.
    Discarded { feature_id: FeatureId },
}

/// Plain polygon drawing: the single open ring under construction, how it is
/// finalized and how it is displayed. Snapping is layered on top of it by
/// [`crate::snap_mode::SnapMode`].
#[derive(Debug, Clone)]
pub struct PolygonDraw {
    id: FeatureId,
    ring: Vec<GeoPoint>,
}

impl Default for PolygonDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonDraw {
    pub fn new() -> Self {
        Self::with_id(FeatureId::generate())
    }

    pub fn with_id(id: FeatureId) -> Self {
        PolygonDraw {
            id,
            ring: Vec::new(),
        }
    }

    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    /// Open ring: committed vertices followed by the preview slot, if any.
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Sets the coordinate at `position`, appending when `position` is one
    /// past the end.
    pub fn update_coordinate(&mut self, position: usize, point: GeoPoint) {
        if position < self.ring.len() {
            self.ring[position] = point;
            return;
        }

        if position > self.ring.len() {
            warn!(
                position,
                len = self.ring.len(),
                "Coordinate position past the end of the ring, appending"
            );
        }
        self.ring.push(point);
    }

    pub fn remove_coordinate(&mut self, position: usize) -> Option<GeoPoint> {
        (position < self.ring.len()).then(|| self.ring.remove(position))
    }

    pub fn is_valid(&self) -> bool {
        self.ring.len() >= 3
    }

    pub fn to_feature(&self) -> DrawFeature {
        let exterior: Vec<geo_types::Coord<f64>> = self
            .ring
            .iter()
            .map(|point| geo_types::Coord::from(*point))
            .collect();

        DrawFeature::new(
            self.id.clone(),
            geo_types::Polygon::new(geo_types::LineString::new(exterior), vec![]),
        )
    }

    pub fn display_features(&self) -> Vec<DisplayFeature> {
        let len = self.ring.len();
        if len < 2 {
            return Vec::new();
        }

        let mut features = vec![self.vertex(0)];
        if len > 2 {
            features.push(self.vertex(len - 2));
        }

        // Until the third vertex is committed the ring is drawn as a line
        if len <= 3 {
            features.push(DisplayFeature {
                id: self.id.clone(),
                meta: Meta::Feature,
                active: true,
                coord_path: None,
                geometry: geo_types::LineString::new(vec![
                    self.ring[0].into(),
                    self.ring[1].into(),
                ])
                .into(),
            });

            if len == 2 {
                return features;
            }
        }

        features.push(DisplayFeature {
            id: self.id.clone(),
            meta: Meta::Feature,
            active: true,
            coord_path: None,
            geometry: self.to_feature().geometry,
        });
        features
    }

    fn vertex(&self, position: usize) -> DisplayFeature {
        DisplayFeature {
            id: self.id.clone(),
            meta: Meta::Vertex,
            active: false,
            coord_path: Some(format!("0.{position}")),
            geometry: geo_types::Point::from(geo_types::Coord::from(self.ring[position])).into(),
        }
    }

    /// Drops the preview slot and keeps the polygon only if it is valid.
    pub fn on_stop<S: FeatureStore + ?Sized>(
        &mut self,
        store: &mut S,
        preview_position: usize,
    ) -> StopOutcome {
        if !store.contains(&self.id) {
            debug!(id = %self.id, "Polygon already removed from the store");
            return StopOutcome::Discarded {
                feature_id: self.id.clone(),
            };
        }

        self.remove_coordinate(preview_position);

        if self.is_valid() {
            let feature = self.to_feature();
            store.upsert(feature.clone());
            info!(id = %self.id, vertices = self.ring.len(), "Polygon created");
            StopOutcome::Created(feature)
        } else {
            store.remove(&self.id);
            info!(id = %self.id, vertices = self.ring.len(), "Discarding incomplete polygon");
            StopOutcome::Discarded {
                feature_id: self.id.clone(),
            }
        }
    }

    pub fn discard<S: FeatureStore + ?Sized>(&self, store: &mut S) {
        store.remove(&self.id);
    }
}
