use std::collections::BTreeMap;

use geojson::FeatureCollection;

use crate::{
    error::SnapError,
    feature::{DrawFeature, FeatureId},
};

/// Storage for the features shown on the map.
///
/// The store decides which features are eligible as snap targets; the
/// drawing mode only asks it to leave out the polygon under construction.
pub trait FeatureStore {
    /// Every snap-eligible feature except `exclude`. Guide features are never
    /// eligible.
    fn eligible_features(&self, exclude: &FeatureId) -> Vec<&DrawFeature>;

    fn get(&self, id: &FeatureId) -> Option<&DrawFeature>;

    fn upsert(&mut self, feature: DrawFeature);

    fn remove(&mut self, id: &FeatureId) -> Option<DrawFeature>;

    fn contains(&self, id: &FeatureId) -> bool {
        self.get(id).is_some()
    }
}

/// In-memory store, ordered by feature id so enumeration is deterministic.
#[derive(Debug, Default, Clone)]
pub struct MemoryFeatureStore {
    features: BTreeMap<FeatureId, DrawFeature>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: impl IntoIterator<Item = DrawFeature>) -> Self {
        MemoryFeatureStore {
            features: features
                .into_iter()
                .map(|feature| (feature.id.clone(), feature))
                .collect(),
        }
    }

    pub fn from_geojson(collection: FeatureCollection) -> Result<Self, SnapError> {
        let features = collection
            .features
            .into_iter()
            .map(DrawFeature::try_from_geojson)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_features(features))
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.values().map(DrawFeature::to_geojson).collect(),
            foreign_members: None,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &FeatureId> {
        self.features.keys()
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn eligible_features(&self, exclude: &FeatureId) -> Vec<&DrawFeature> {
        self.features
            .values()
            .filter(|feature| &feature.id != exclude && !feature.id.is_reserved())
            .collect()
    }

    fn get(&self, id: &FeatureId) -> Option<&DrawFeature> {
        self.features.get(id)
    }

    fn upsert(&mut self, feature: DrawFeature) {
        self.features.insert(feature.id.clone(), feature);
    }

    fn remove(&mut self, id: &FeatureId) -> Option<DrawFeature> {
        self.features.remove(id)
    }
}
