pub mod constants;
pub mod display;
pub mod error;
pub mod feature;
pub mod feature_store;
pub mod geopoint;
pub mod guide_index;
pub mod options;
pub mod pixel;
pub mod polygon_draw;
pub mod rebuild;
pub mod rounding;
pub mod snap;
pub mod snap_mode;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_utils;
