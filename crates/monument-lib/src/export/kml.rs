//! KML 2.2 writer

use super::xml::{XmlWriter, fmt_coord};
use crate::Stop;
use geo::LineString;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// `lon,lat,0` as used by KML coordinate lists
fn triple(lon: f64, lat: f64) -> String {
    format!("{},{},0", fmt_coord(lon), fmt_coord(lat))
}

/// Write `stops` as point placemarks and `geometry` (two points or more) as a line placemark
pub fn to_kml(name: &str, stops: &[Stop], geometry: Option<&LineString<f64>>) -> String {
    let mut w = XmlWriter::new();
    w.open("kml", &[("xmlns", KML_NAMESPACE)]);
    w.open("Document", &[]);
    w.text("name", name);

    for stop in stops {
        w.open("Placemark", &[]);
        w.text("name", &stop.name);
        if let Some(desc) = &stop.description {
            w.text("description", desc);
        }
        w.open("Point", &[]);
        w.raw_text("coordinates", &triple(stop.lon, stop.lat));
        w.close("Point");
        w.close("Placemark");
    }

    if let Some(line) = geometry.filter(|line| line.0.len() >= 2) {
        let coordinates: Vec<String> = line.coords().map(|c| triple(c.x, c.y)).collect();
        w.open("Placemark", &[]);
        w.text("name", name);
        w.open("LineString", &[]);
        w.raw_text("tessellate", "1");
        w.raw_text("coordinates", &coordinates.join(" "));
        w.close("LineString");
        w.close("Placemark");
    }

    w.close("Document");
    w.close("kml");
    w.finish()
}
