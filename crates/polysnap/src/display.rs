use geojson::{JsonObject, JsonValue};
use serde::Serialize;

use crate::{
    constants::SNAP_GUIDE_PROPERTY,
    feature::FeatureId,
    guide_index::{Guide, GuideAxis},
    snap::Snap,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Meta {
    Feature,
    Vertex,
    Guide,
}

impl Meta {
    fn as_str(&self) -> &'static str {
        match self {
            Meta::Feature => "feature",
            Meta::Vertex => "vertex",
            Meta::Guide => "guide",
        }
    }
}

/// A feature handed to the host for rendering. Vertex markers carry the id
/// of the feature they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFeature {
    pub id: FeatureId,
    pub meta: Meta,
    pub active: bool,
    pub coord_path: Option<String>,
    pub geometry: geo_types::Geometry<f64>,
}

impl DisplayFeature {
    pub fn guide(guide: &Guide) -> Self {
        DisplayFeature {
            id: guide.axis().feature_id(),
            meta: Meta::Guide,
            active: false,
            coord_path: None,
            geometry: guide.to_feature().geometry,
        }
    }

    pub fn guide_axis(&self) -> Option<GuideAxis> {
        if self.meta != Meta::Guide {
            return None;
        }

        if self.id == FeatureId::horizontal_guide() {
            Some(GuideAxis::Horizontal)
        } else if self.id == FeatureId::vertical_guide() {
            Some(GuideAxis::Vertical)
        } else {
            None
        }
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        let mut properties = JsonObject::new();
        properties.insert("meta".to_string(), JsonValue::from(self.meta.as_str()));
        properties.insert(
            "active".to_string(),
            JsonValue::from(if self.active { "true" } else { "false" }),
        );

        let id = match self.meta {
            Meta::Vertex => {
                properties.insert("parent".to_string(), JsonValue::from(self.id.as_str()));
                None
            }
            Meta::Guide => {
                properties.insert(SNAP_GUIDE_PROPERTY.to_string(), JsonValue::from("true"));
                Some(geojson::feature::Id::from(&self.id))
            }
            Meta::Feature => Some(geojson::feature::Id::from(&self.id)),
        };

        if let Some(coord_path) = &self.coord_path {
            properties.insert("coord_path".to_string(), JsonValue::from(coord_path.as_str()));
        }

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Which guides the last snap resolution used. Guides are only drawn while
/// they are actively capturing the pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GuideVisibility {
    pub horizontal: bool,
    pub vertical: bool,
}

impl GuideVisibility {
    pub fn from_snap(snap: Option<&Snap>) -> Self {
        snap.map(|snap| GuideVisibility {
            horizontal: snap.used_horizontal_guide(),
            vertical: snap.used_vertical_guide(),
        })
        .unwrap_or_default()
    }

    pub fn shows(&self, axis: GuideAxis) -> bool {
        match axis {
            GuideAxis::Horizontal => self.horizontal,
            GuideAxis::Vertical => self.vertical,
        }
    }

    pub fn filter(&self, feature: DisplayFeature) -> Option<DisplayFeature> {
        match feature.guide_axis() {
            Some(axis) if !self.shows(axis) => None,
            _ => Some(feature),
        }
    }
}
