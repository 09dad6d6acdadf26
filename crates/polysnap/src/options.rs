use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_PRECISION_METERS, DEFAULT_SNAP_PX},
    error::SnapError,
    rounding::CoordinateRounder,
    snap::SnapResolver,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapOptions {
    /// Maximum pointer distance, in pixels, at which a target captures the
    /// preview vertex.
    pub snap_px: f64,
    /// Ground spacing of the grid committed vertices are rounded to.
    pub precision_meters: f64,
    /// Only vertices inside the viewport are snap targets.
    pub visible_vertices_only: bool,
}

impl Default for SnapOptions {
    fn default() -> Self {
        SnapOptions {
            snap_px: DEFAULT_SNAP_PX,
            precision_meters: DEFAULT_PRECISION_METERS,
            visible_vertices_only: true,
        }
    }
}

impl SnapOptions {
    pub fn with_snap_px(mut self, snap_px: f64) -> Self {
        self.snap_px = snap_px;
        self
    }

    pub fn validate(&self) -> Result<(), SnapError> {
        self.resolver()?;
        self.rounder()?;
        Ok(())
    }

    pub(crate) fn resolver(&self) -> Result<SnapResolver, SnapError> {
        SnapResolver::new(self.snap_px)
    }

    pub(crate) fn rounder(&self) -> Result<CoordinateRounder, SnapError> {
        CoordinateRounder::new(self.precision_meters)
    }
}
