use crate::{
    feature::{DrawFeature, FeatureId},
    geopoint::GeoPoint,
    pixel::Pixel,
    viewport::{Viewport, ViewportSize},
};

/// Equirectangular viewport with an exact integer scale, so pixel distances
/// in tests come out exact.
///
///  Y (pixels, down)
///  0 +-----------------------> X
///    |  lat 6.0
///    |
///    |  lat 0.0 at y = height
///    v
pub struct PlanarViewport {
    pub pixels_per_degree: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PlanarViewport {
    fn default() -> Self {
        PlanarViewport {
            pixels_per_degree: 100.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport for PlanarViewport {
    fn project(&self, point: &GeoPoint) -> Pixel {
        Pixel::new(
            point.lng * self.pixels_per_degree,
            self.height - point.lat * self.pixels_per_degree,
        )
    }

    fn unproject(&self, pixel: &Pixel) -> GeoPoint {
        GeoPoint::new(
            pixel.x / self.pixels_per_degree,
            (self.height - pixel.y) / self.pixels_per_degree,
        )
    }

    fn size(&self) -> ViewportSize {
        ViewportSize {
            width: self.width,
            height: self.height,
        }
    }
}

pub fn point_feature(id: &str, lng: f64, lat: f64) -> DrawFeature {
    DrawFeature::new(FeatureId::new(id), geo_types::Point::new(lng, lat))
}

pub fn polygon_feature(id: &str, coordinates: &[(f64, f64)]) -> DrawFeature {
    let exterior: Vec<geo_types::Coord<f64>> = coordinates
        .iter()
        .map(|&(x, y)| geo_types::Coord { x, y })
        .collect();

    DrawFeature::new(
        FeatureId::new(id),
        geo_types::Polygon::new(geo_types::LineString::new(exterior), vec![]),
    )
}
