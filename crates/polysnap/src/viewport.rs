use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{geopoint::GeoPoint, pixel::Pixel};

const TILE_SIZE: f64 = 512.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// Geographic extent of the visible map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// The map surface the drawing mode runs on.
///
/// Implementations must be `Sync`: vertex projection during a guide rebuild
/// runs on the rayon pool.
pub trait Viewport: Sync {
    fn project(&self, point: &GeoPoint) -> Pixel;

    fn unproject(&self, pixel: &Pixel) -> GeoPoint;

    fn size(&self) -> ViewportSize;

    fn contains(&self, pixel: &Pixel) -> bool {
        let size = self.size();
        pixel.x >= 0.0 && pixel.x <= size.width && pixel.y >= 0.0 && pixel.y <= size.height
    }

    /// Assumes a north-up map: the top-left corner is north-west.
    fn bounds(&self) -> GeoBounds {
        let size = self.size();
        let north_west = self.unproject(&Pixel::new(0.0, 0.0));
        let south_east = self.unproject(&Pixel::new(size.width, size.height));

        GeoBounds {
            west: north_west.lng,
            south: south_east.lat,
            east: south_east.lng,
            north: north_west.lat,
        }
    }
}

/// North-up spherical Web Mercator map, as rendered by slippy-map clients.
#[derive(Debug, Clone, PartialEq)]
pub struct WebMercatorViewport {
    center: GeoPoint,
    zoom: f64,
    size: ViewportSize,
}

impl WebMercatorViewport {
    pub fn new(center: GeoPoint, zoom: f64, width: f64, height: f64) -> Self {
        WebMercatorViewport {
            center,
            zoom,
            size: ViewportSize { width, height },
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = center;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = ViewportSize { width, height };
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn to_world(&self, point: &GeoPoint) -> [f64; 2] {
        let scale = self.world_size();
        let lat = point
            .lat
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();

        let x = (point.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * scale;
        [x, y]
    }
}

impl Viewport for WebMercatorViewport {
    fn project(&self, point: &GeoPoint) -> Pixel {
        let [x, y] = self.to_world(point);
        let [center_x, center_y] = self.to_world(&self.center);

        Pixel::new(
            x - center_x + self.size.width / 2.0,
            y - center_y + self.size.height / 2.0,
        )
    }

    fn unproject(&self, pixel: &Pixel) -> GeoPoint {
        let scale = self.world_size();
        let [center_x, center_y] = self.to_world(&self.center);

        let x = pixel.x - self.size.width / 2.0 + center_x;
        let y = pixel.y - self.size.height / 2.0 + center_y;

        let lng = x / scale * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / scale)).sinh().atan().to_degrees();
        GeoPoint::new(lng, lat)
    }

    fn size(&self) -> ViewportSize {
        self.size
    }
}
