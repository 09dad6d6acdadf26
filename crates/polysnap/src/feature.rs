use std::fmt;

use geo::CoordsIter;
use geojson::{JsonObject, JsonValue, feature::Id};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::{HORIZONTAL_GUIDE_ID, VERTICAL_GUIDE_ID},
    error::SnapError,
    geopoint::GeoPoint,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        FeatureId(id.into())
    }

    pub fn generate() -> Self {
        FeatureId(Uuid::new_v4().to_string())
    }

    pub fn horizontal_guide() -> Self {
        FeatureId::new(HORIZONTAL_GUIDE_ID)
    }

    pub fn vertical_guide() -> Self {
        FeatureId::new(VERTICAL_GUIDE_ID)
    }

    /// Reserved ids belong to the guide features and never name a drawn
    /// feature.
    pub fn is_reserved(&self) -> bool {
        self.0 == HORIZONTAL_GUIDE_ID || self.0 == VERTICAL_GUIDE_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&FeatureId> for Id {
    fn from(id: &FeatureId) -> Self {
        Id::String(id.0.clone())
    }
}

/// A feature held by the feature store.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawFeature {
    pub id: FeatureId,
    pub geometry: geo_types::Geometry<f64>,
    pub properties: JsonObject,
}

impl DrawFeature {
    pub fn new(id: FeatureId, geometry: impl Into<geo_types::Geometry<f64>>) -> Self {
        DrawFeature {
            id,
            geometry: geometry.into(),
            properties: JsonObject::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn vertices(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.geometry.coords_iter().map(GeoPoint::from)
    }

    pub fn try_from_geojson(feature: geojson::Feature) -> Result<Self, SnapError> {
        let id = match &feature.id {
            Some(Id::String(id)) => FeatureId::new(id.clone()),
            Some(Id::Number(id)) => FeatureId::new(id.to_string()),
            None => FeatureId::generate(),
        };

        let geometry = feature
            .geometry
            .ok_or_else(|| SnapError::MissingGeometry(id.to_string()))?;
        let geometry = geo_types::Geometry::<f64>::try_from(geometry.value)?;

        Ok(DrawFeature {
            id,
            geometry,
            properties: feature.properties.unwrap_or_default(),
        })
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: Some(Id::from(&self.id)),
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_not_reserved() {
        let a = FeatureId::generate();
        let b = FeatureId::generate();

        assert_ne!(a, b);
        assert!(!a.is_reserved());
        assert!(FeatureId::horizontal_guide().is_reserved());
        assert!(FeatureId::vertical_guide().is_reserved());
    }

    #[test]
    fn test_try_from_geojson_reads_polygon_vertices() {
        let json = r#"{
            "type": "Feature",
            "id": 7,
            "properties": { "name": "parcel" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
            }
        }"#;
        let feature: geojson::Feature = json.parse::<geojson::GeoJson>().unwrap().try_into().unwrap();

        let feature = DrawFeature::try_from_geojson(feature).unwrap();

        assert_eq!(feature.id, FeatureId::new("7"));
        assert_eq!(feature.properties["name"], "parcel");
        assert_eq!(
            feature.vertices().collect::<Vec<_>>(),
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(1.0, 0.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_missing_geometry_is_an_error() {
        let feature = geojson::Feature {
            bbox: None,
            geometry: None,
            id: Some(Id::String("empty".to_string())),
            properties: None,
            foreign_members: None,
        };

        assert!(matches!(
            DrawFeature::try_from_geojson(feature),
            Err(SnapError::MissingGeometry(id)) if id == "empty"
        ));
    }
}
