use serde::{Deserialize, Serialize};

use crate::error::SnapError;

/// Screen position in pixels, origin top-left, y pointing down.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub const fn new(x: f64, y: f64) -> Self {
        Pixel { x, y }
    }

    /// Pointer positions coming from the host are checked here, never
    /// inside the state machine.
    pub fn try_new(x: f64, y: f64) -> Result<Self, SnapError> {
        if x.is_finite() && y.is_finite() {
            Ok(Pixel { x, y })
        } else {
            Err(SnapError::NonFiniteCoordinate(x, y))
        }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Pixel::new(self.x + dx, self.y + dy)
    }

    pub fn distance(&self, other: &Pixel) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<Pixel> for [f64; 2] {
    fn from(pixel: Pixel) -> Self {
        [pixel.x, pixel.y]
    }
}

impl From<[f64; 2]> for Pixel {
    fn from(value: [f64; 2]) -> Self {
        Pixel::new(value[0], value[1])
    }
}

impl From<Pixel> for geo::Point<f64> {
    fn from(pixel: Pixel) -> Self {
        geo::Point::new(pixel.x, pixel.y)
    }
}

impl From<Pixel> for geo::Coord<f64> {
    fn from(pixel: Pixel) -> Self {
        geo::Coord {
            x: pixel.x,
            y: pixel.y,
        }
    }
}

impl From<geo::Point<f64>> for Pixel {
    fn from(point: geo::Point<f64>) -> Self {
        Pixel::new(point.x(), point.y())
    }
}
