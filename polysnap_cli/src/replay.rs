use std::{fs, path::PathBuf};

use clap::Args;
use geojson::{FeatureCollection, GeoJson};
use polysnap::{
    feature_store::MemoryFeatureStore,
    geopoint::GeoPoint,
    options::SnapOptions,
    pixel::Pixel,
    polygon_draw::StopOutcome,
    snap_mode::{ClickOutcome, DrawContext, Key, ModeChange, SnapMode},
    viewport::WebMercatorViewport,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::parsers;

#[derive(Args)]
pub struct ReplayArgs {
    /// GeoJSON feature collection the drawing snaps to
    #[arg(short, long)]
    features: Option<PathBuf>,

    /// JSON script with the viewport, options and pointer events
    #[arg(short, long)]
    script: PathBuf,

    /// Overrides the snapping distance of the script
    #[arg(long, value_parser = parsers::parse_snap_px)]
    snap_px: Option<f64>,

    /// Where to write the resulting feature collection (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ScriptViewport {
    center: GeoPoint,
    zoom: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct Script {
    viewport: ScriptViewport,
    #[serde(default)]
    options: SnapOptions,
    events: Vec<Event>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Event {
    Move {
        x: f64,
        y: f64,
    },
    Click,
    Viewport {
        center: Option<GeoPoint>,
        zoom: Option<f64>,
    },
    KeyUp {
        key: Key,
    },
    Trash,
    Stop,
}

fn load_store(path: Option<&PathBuf>) -> Result<MemoryFeatureStore, anyhow::Error> {
    let Some(path) = path else {
        return Ok(MemoryFeatureStore::new());
    };

    let geojson: GeoJson = fs::read_to_string(path)?.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;
    Ok(MemoryFeatureStore::from_geojson(collection)?)
}

pub fn run(args: ReplayArgs) -> Result<(), anyhow::Error> {
    info!("Replaying {:?}", args.script);
    let script: Script = serde_json::from_str(&fs::read_to_string(&args.script)?)?;
    let mut store = load_store(args.features.as_ref())?;

    let mut options = script.options;
    if let Some(snap_px) = args.snap_px {
        options = options.with_snap_px(snap_px);
    }

    let mut viewport = WebMercatorViewport::new(
        script.viewport.center,
        script.viewport.zoom,
        script.viewport.width,
        script.viewport.height,
    );
    let mut mode = SnapMode::new(options)?;
    let handle = mode.enter(&mut DrawContext::new(&viewport, &mut store));

    let mut outcome = None;
    for event in script.events {
        debug!(?event, "Event");

        if let Event::Viewport { center, zoom } = event {
            if let Some(center) = center {
                viewport.set_center(center);
            }
            if let Some(zoom) = zoom {
                viewport.set_zoom(zoom);
            }
            handle.request_rebuild();
            continue;
        }

        let mut ctx = DrawContext::new(&viewport, &mut store);
        let change = match event {
            Event::Move { x, y } => {
                if let Some(snap) = mode.on_pointer_move(&mut ctx, Pixel::try_new(x, y)?) {
                    debug!(target = ?snap.target, distance = ?snap.distance_px, "Snapped");
                }
                None
            }
            Event::Click => match mode.on_click(&mut ctx) {
                ClickOutcome::Closed(change) => Some(change),
                ClickOutcome::Committed { position, point } => {
                    info!(position, lng = point.lng, lat = point.lat, "Vertex committed");
                    None
                }
                ClickOutcome::Ignored => None,
            },
            Event::KeyUp { key } => mode.on_key_up(&mut ctx, key),
            Event::Trash => mode.on_trash(&mut ctx),
            Event::Stop => {
                outcome = mode.stop(&mut ctx);
                break;
            }
            Event::Viewport { .. } => None,
        };

        if let Some(ModeChange::SimpleSelect { feature_ids }) = change {
            info!(?feature_ids, "Leaving snap mode");
            outcome = mode.stop(&mut ctx);
            break;
        }
    }

    if outcome.is_none() {
        warn!("Script ended while drawing, stopping the mode");
        outcome = mode.stop(&mut DrawContext::new(&viewport, &mut store));
    }

    match outcome {
        Some(StopOutcome::Created(feature)) => info!(id = %feature.id, "Polygon created"),
        Some(StopOutcome::Discarded { feature_id }) => info!(id = %feature_id, "Polygon discarded"),
        None => {}
    }

    let output = serde_json::to_string_pretty(&GeoJson::from(store.to_geojson()))?;
    match args.out {
        Some(path) => fs::write(path, output)?,
        None => println!("{output}"),
    }

    Ok(())
}
