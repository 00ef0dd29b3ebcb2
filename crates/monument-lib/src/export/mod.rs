//! GPX and KML export of an ordered stop list
//!
//! Both writers are pure functions of their input: the same stops and geometry
//! always produce the same bytes. Geometry is only written when it has at least
//! two points.

mod gpx;
mod kml;
mod xml;

pub use gpx::to_gpx;
pub use kml::to_kml;
pub use xml::{fmt_coord, xml_escape};

use crate::{CatalogueError, Stop};
use geo::LineString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Gpx,
    Kml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Kml => "kml",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Gpx => "application/gpx+xml",
            Self::Kml => "application/vnd.google-earth.kml+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpx" => Ok(Self::Gpx),
            "kml" => Ok(Self::Kml),
            other => Err(CatalogueError::Validation(format!(
                "unknown export format '{other}' (expected gpx or kml)"
            ))),
        }
    }
}

/// A rendered export, ready to be written to disk or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportDocument {
    /// File name derived from the route name, e.g. `ruta-mudejar.gpx`
    pub fn file_name(&self, route_name: &str) -> String {
        let mut slug = String::with_capacity(route_name.len());
        for c in route_name.chars().flat_map(char::to_lowercase) {
            if c.is_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        let stem = if slug.is_empty() { "route" } else { slug };
        format!("{stem}.{}", self.format.extension())
    }
}

/// Render `stops` (and `geometry`, if any) in `format`
pub fn export(
    format: ExportFormat,
    name: &str,
    stops: &[Stop],
    geometry: Option<&LineString<f64>>,
) -> ExportDocument {
    #[cfg(feature = "profiling")]
    profiling::scope!("export::export");

    let text = match format {
        ExportFormat::Gpx => to_gpx(name, stops, geometry),
        ExportFormat::Kml => to_kml(name, stops, geometry),
    };
    tracing::debug!(%format, stops = stops.len(), bytes = text.len(), "route exported");
    ExportDocument {
        format,
        bytes: text.into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(n: u64) -> Vec<Stop> {
        (0..n)
            .map(|i| Stop {
                id: i,
                lat: 41.0 + i as f64 * 0.1,
                lon: -1.0 + i as f64 * 0.05,
                name: format!("Stop {i}"),
                description: None,
            })
            .collect()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("GPX".parse::<ExportFormat>().unwrap(), ExportFormat::Gpx);
        assert_eq!(" kml ".parse::<ExportFormat>().unwrap(), ExportFormat::Kml);
        assert!("kmz".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Kml.to_string(), "kml");
    }

    #[test]
    fn test_one_element_per_stop() {
        for n in [1, 5, 25] {
            let stops = stops(n);
            let gpx = String::from_utf8(export(ExportFormat::Gpx, "R", &stops, None).bytes).unwrap();
            let kml = String::from_utf8(export(ExportFormat::Kml, "R", &stops, None).bytes).unwrap();
            assert_eq!(gpx.matches("<wpt ").count(), n as usize);
            assert_eq!(kml.matches("<Point>").count(), n as usize);
        }
    }

    #[test]
    fn test_file_name() {
        let doc = export(ExportFormat::Gpx, "x", &stops(1), None);
        assert_eq!(doc.file_name("Ruta del Mudéjar!"), "ruta-del-mudéjar.gpx");
        assert_eq!(doc.file_name("  ?? "), "route.gpx");
        assert_eq!(doc.format.mime_type(), "application/gpx+xml");
    }
}
