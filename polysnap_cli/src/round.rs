use clap::Args;
use polysnap::{geopoint::GeoPoint, rounding::CoordinateRounder};
use tracing::debug;

use crate::parsers;

#[derive(Args)]
pub struct RoundArgs {
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,

    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Ground precision, in meters or with a unit ("1cm", "0.5m")
    #[arg(short, long, value_parser = parsers::parse_precision, default_value = "1cm")]
    precision: f64,
}

pub fn run(args: RoundArgs) -> Result<(), anyhow::Error> {
    let point = GeoPoint::try_new(args.lng, args.lat)?;
    let rounder = CoordinateRounder::new(args.precision)?;
    let rounded = rounder.round(point);

    debug!(
        lat_step = rounder.lat_step(),
        lng_step = rounder.lng_step(rounded.lat),
        "Rounding grid"
    );

    println!("{}", serde_json::to_string(&rounded)?);
    Ok(())
}
