//! Subcommand handlers

use crate::settings::{Command, Settings};
use monument_lib::cluster::count_label;
use monument_lib::{
    CatalogueClient, CatalogueError, ClusterOrMarker, ExportFormat, MapLayer, MapSession, Notice,
    OptimizationOutcome, PointOfInterest, RouteOptimizer, RoutePlanner, SpatialQueryClient,
    ViewportBounds,
};
use std::io::Write;
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, CatalogueError>;

pub async fn run(settings: &Settings) -> Result<()> {
    let config = settings.engine_config()?;
    let filters = settings.filters.to_filter_set();
    let client = CatalogueClient::from_config(&config)?;
    tracing::debug!(api = %config.api_base_url, filters = ?filters, "catalogue client ready");

    match &settings.command {
        Command::Browse { bbox, zoom } => {
            let mut session = MapSession::new(&config).with_filters(filters);
            load_viewport(&mut session, &client, bbox.with_zoom(*zoom)).await?;
            print_layer(&session);
            Ok(())
        }
        Command::Search { page, limit, sort } => {
            let limit = limit.unwrap_or(u32::try_from(config.search_page_size).unwrap_or(u32::MAX));
            let result = client.search(&filters, *page, limit, sort.as_deref()).await?;
            tracing::info!(
                page = result.page,
                shown = result.items.len(),
                total = result.total,
                "search results"
            );
            print_json(&result.items)
        }
        Command::Nearby {
            lat,
            lng,
            km,
            limit,
        } => {
            let results = client.nearby(&filters, *lat, *lng, *km, *limit).await?;
            tracing::info!(found = results.len(), km, "nearby monuments");
            print_json(&results)
        }
        Command::Export {
            stops,
            format,
            name,
            output,
            optimize: run_optimizer,
        } => {
            let mut planner = load_planner(stops, name)?;
            if *run_optimizer {
                optimize_route(&mut planner, &client).await;
            }
            export(&planner, *format, output.as_deref())?;
            Ok(())
        }
        Command::Save { stops, name } => {
            let planner = load_planner(stops, name)?;
            let id = planner.save_with(&client).await?;
            println!("{id}");
            println!("{}", client.itinerary_pdf_url(id));
            Ok(())
        }
    }
}

/// Settle the session on `bounds` and run the fetch loop to completion.
///
/// A failure with nothing loaded yet is an error; otherwise it is logged and
/// the previous layer stays.
async fn load_viewport<C: SpatialQueryClient>(
    session: &mut MapSession,
    client: &C,
    bounds: ViewportBounds,
) -> Result<()> {
    if let Some(request) = session.viewport_settled(bounds) {
        session.drive(client, request).await;
    }

    if let Some(notice) = session.take_notice() {
        if matches!(session.layer(), MapLayer::Empty) {
            return Err(CatalogueError::Network(notice.message().to_string()));
        }
        tracing::warn!("{}", notice.message());
    }
    Ok(())
}

fn print_layer(session: &MapSession) {
    match session.layer() {
        MapLayer::Empty => println!("nothing to show"),
        MapLayer::Regions(regions) => {
            let total: u64 = regions.iter().map(|r| r.total_count).sum();
            println!("{} regions, {} monuments (zoom in to see markers)", regions.len(), total);
            for region in regions {
                println!(
                    "{:>6}  {}",
                    count_label(usize::try_from(region.total_count).unwrap_or(usize::MAX)),
                    region.region_name
                );
            }
        }
        MapLayer::Markers(markers) => {
            let items = session.rendered();
            println!("{} markers in {} items", markers.len(), items.len());
            for item in items {
                match item {
                    ClusterOrMarker::Marker(view) => println!(
                        "{} {}  ({:.5}, {:.5})",
                        view.style.glyph, view.poi.name, view.poi.lat, view.poi.lon
                    ),
                    ClusterOrMarker::Cluster(cluster) => println!(
                        "[{}] cluster around ({:.5}, {:.5})",
                        cluster.label(),
                        cluster.centroid_lat,
                        cluster.centroid_lon
                    ),
                }
            }
        }
    }
}

fn load_planner(path: &Path, name: &str) -> Result<RoutePlanner> {
    let file = std::fs::File::open(path)?;
    let pois: Vec<PointOfInterest> = serde_json::from_reader(std::io::BufReader::new(file))?;

    let mut planner = RoutePlanner::new(name);
    let outcome = planner.select_all(&pois);
    if let Some(Notice::Info(message) | Notice::Warning(message)) = planner.take_notice() {
        tracing::warn!(rejected = outcome.rejected, "{message}");
    }
    if outcome.already_selected > 0 {
        tracing::info!(duplicates = outcome.already_selected, "duplicate stops ignored");
    }
    Ok(planner)
}

/// Reorder the planner's stops; any failure leaves the file order in place
async fn optimize_route<O: RouteOptimizer>(planner: &mut RoutePlanner, optimizer: &O) {
    match planner.optimize_with(optimizer).await {
        Ok(OptimizationOutcome::Applied) => {
            if let Some(route) = planner.route() {
                tracing::info!(summary = %route.summary(), "route optimized");
            }
        }
        Ok(OptimizationOutcome::Stale) => {}
        Ok(OptimizationOutcome::Failed(error)) => {
            tracing::warn!(error = %error, "optimization failed, exporting in the given order");
        }
        Err(error) => tracing::warn!(error = %error, "optimization skipped"),
    }
}

/// Write the export to `output` (a file, or a directory to place a named
/// file in) or to stdout. Returns the path written, if any.
fn export(
    planner: &RoutePlanner,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let document = planner.export(format)?;
    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(document.file_name(planner.name()))
            } else {
                PathBuf::from(path)
            };
            std::fs::write(&path, &document.bytes)?;
            tracing::info!(
                path = %path.display(),
                mime = document.format.mime_type(),
                bytes = document.bytes.len(),
                "route written"
            );
            Ok(Some(path))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&document.bytes)?;
            stdout.flush()?;
            Ok(None)
        }
    }
}

fn print_json(pois: &[PointOfInterest]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(pois)?);
    Ok(())
}
