//! GPX 1.1 writer

use super::xml::{XmlWriter, fmt_coord};
use crate::Stop;
use geo::LineString;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const CREATOR: &str = "monument-lib";

/// Write `stops` as waypoints and `geometry` (two points or more) as one track
pub fn to_gpx(name: &str, stops: &[Stop], geometry: Option<&LineString<f64>>) -> String {
    let mut w = XmlWriter::new();
    w.open(
        "gpx",
        &[
            ("version", "1.1"),
            ("creator", CREATOR),
            ("xmlns", GPX_NAMESPACE),
        ],
    );

    w.open("metadata", &[]);
    w.text("name", name);
    w.close("metadata");

    for stop in stops {
        let (lat, lon) = (fmt_coord(stop.lat), fmt_coord(stop.lon));
        w.open("wpt", &[("lat", lat.as_str()), ("lon", lon.as_str())]);
        w.text("name", &stop.name);
        if let Some(desc) = &stop.description {
            w.text("desc", desc);
        }
        w.close("wpt");
    }

    if let Some(line) = geometry.filter(|line| line.0.len() >= 2) {
        w.open("trk", &[]);
        w.text("name", name);
        w.open("trkseg", &[]);
        for coord in line.coords() {
            let (lat, lon) = (fmt_coord(coord.y), fmt_coord(coord.x));
            w.empty("trkpt", &[("lat", lat.as_str()), ("lon", lon.as_str())]);
        }
        w.close("trkseg");
        w.close("trk");
    }

    w.close("gpx");
    w.finish()
}
