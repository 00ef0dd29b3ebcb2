use clap::{Args, Parser, Subcommand};
use monument_lib::{CatalogueError, EngineConfig, ExportFormat, FilterSet, ViewportBounds};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// Monument Planner - browse the heritage catalogue and export routes as GPX or KML
pub struct Settings {
    /// Catalogue API base URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// JSON engine configuration; missing fields keep their defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is not set
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Catalogue filters shared by every query
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Country code, e.g. ES
    #[arg(long, global = true)]
    pub country: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    #[arg(long, global = true)]
    pub province: Option<String>,

    #[arg(long, global = true)]
    pub municipality: Option<String>,

    /// Category tag, e.g. "Arquitectura religiosa"
    #[arg(long, global = true)]
    pub category: Option<String>,

    /// Type tag, e.g. "Castillo"
    #[arg(long = "type", global = true)]
    pub type_tag: Option<String>,

    /// Free text search
    #[arg(long, global = true)]
    pub text: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch one viewport the way the map does and print what would be rendered
    Browse {
        /// Viewport as minLon,minLat,maxLon,maxLat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Bbox,

        /// Map zoom level
        #[arg(long, default_value = "7")]
        zoom: u8,
    },

    /// Paginated list search
    Search {
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size (defaults to the configured search page size)
        #[arg(long)]
        limit: Option<u32>,

        /// Sort key understood by the catalogue, e.g. nombre
        #[arg(long)]
        sort: Option<String>,
    },

    /// Monuments around a point, topped up by a broad search when sparse
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Search radius in kilometres
        #[arg(long, default_value = "10")]
        km: f64,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Turn a JSON list of monuments into a GPX or KML route
    Export {
        /// JSON array of monuments, in stop order
        #[arg(long, value_name = "FILE")]
        stops: PathBuf,

        #[arg(long, default_value = "gpx")]
        format: ExportFormat,

        /// Route name written into the document
        #[arg(long, default_value = "Route")]
        name: String,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Ask the catalogue optimizer for the visiting order first
        #[arg(long, default_value = "false")]
        optimize: bool,
    },

    /// Store a JSON list of monuments as a named route
    Save {
        #[arg(long, value_name = "FILE")]
        stops: PathBuf,

        #[arg(long)]
        name: String,
    },
}

/// Parsed `--bbox` argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bbox {
    pub fn with_zoom(self, zoom: u8) -> ViewportBounds {
        ViewportBounds::new(self.min_lon, self.min_lat, self.max_lon, self.max_lat, zoom)
    }
}

fn parse_bbox(value: &str) -> Result<Bbox, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in bbox: {e}"))?;
    match parts.as_slice() {
        &[min_lon, min_lat, max_lon, max_lat] => Ok(Bbox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }),
        _ => Err(format!(
            "expected minLon,minLat,maxLon,maxLat, got {} values",
            parts.len()
        )),
    }
}

impl FilterArgs {
    pub fn to_filter_set(&self) -> FilterSet {
        FilterSet {
            country: self.country.clone(),
            region: self.region.clone(),
            province: self.province.clone(),
            municipality: self.municipality.clone(),
            category: self.category.clone(),
            type_tag: self.type_tag.clone(),
            text: self.text.clone(),
        }
    }
}

impl Settings {
    /// Engine configuration: config file (or defaults) with command line overrides
    pub fn engine_config(&self) -> Result<EngineConfig, CatalogueError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("-1.5,41,-0.5,42").unwrap();
        assert_eq!(bbox.min_lon, -1.5);
        assert_eq!(bbox.max_lat, 42.0);
        assert_eq!(bbox.with_zoom(9).zoom, 9);
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let settings = Settings::parse_from([
            "monument-planner",
            "--api-url",
            "https://catalogue.example/api",
            "--country",
            "ES",
            "browse",
            "--bbox",
            "-1.5,41,-0.5,42",
            "--zoom",
            "9",
        ]);
        let config = settings.engine_config().unwrap();
        assert_eq!(config.api_base_url, "https://catalogue.example/api");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(settings.filters.to_filter_set().country.as_deref(), Some("ES"));
        assert!(matches!(settings.command, Command::Browse { zoom: 9, .. }));
    }

    #[test]
    fn test_export_defaults() {
        let settings =
            Settings::parse_from(["monument-planner", "export", "--stops", "stops.json"]);
        let Command::Export {
            format,
            name,
            optimize,
            output,
            ..
        } = settings.command
        else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::Gpx);
        assert_eq!(name, "Route");
        assert!(!optimize);
        assert!(output.is_none());
    }
}
