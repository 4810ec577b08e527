//! Relationship table builder.
//!
//! Intersects a lower-level boundary set (e.g. suburbs) with a higher-level
//! one (e.g. Significant Urban Areas) and writes the percentage of each lower
//! area lying inside each higher area, in the CSV layout the registry loads.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ausgeo::config::DataConfig;
use ausgeo::spatial::{load_boundaries, overlaps_for, AreaBoundary, BoundaryIndex, OverlapRow};
use ausgeo::GeoType;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Build area overlap tables from boundary GeoJSON")]
struct Args {
    /// Data directory; boundary files are looked up under Boundaries/
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Geography type of the contained areas
    #[arg(long, default_value = "sal")]
    lower_type: GeoType,

    /// Geography type of the containing areas
    #[arg(long, default_value = "sua")]
    higher_type: GeoType,

    /// Lower boundary file (default: discovered under the data directory)
    #[arg(long)]
    lower: Option<PathBuf>,

    /// Higher boundary file (default: discovered under the data directory)
    #[arg(long)]
    higher: Option<PathBuf>,

    /// Output CSV (default: Relationships/<lower>_to_<higher>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rebuild even if the output already exists
    #[arg(long)]
    force: bool,
}

fn boundary_file(config: &DataConfig, explicit: Option<&PathBuf>, geo_type: GeoType) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    config
        .boundaries
        .iter()
        .find(|t| t.geo_type == geo_type)
        .map(|t| config.resolve(&t.path))
        .with_context(|| {
            format!(
                "No {} boundary file under {}; pass one explicitly",
                geo_type,
                config.data_dir.join("Boundaries").display()
            )
        })
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    if args.lower_type == args.higher_type {
        bail!("Lower and higher geography types must differ");
    }

    let config = DataConfig::from_data_dir(&args.data_dir);
    let output = args.output.clone().unwrap_or_else(|| {
        config.data_dir.join("Relationships").join(format!(
            "{}_to_{}.csv",
            args.lower_type.key(),
            args.higher_type.key()
        ))
    });

    if output.exists() && !args.force {
        info!("{} already exists, skipping (use --force to rebuild)", output.display());
        return Ok(());
    }

    let lower_path = boundary_file(&config, args.lower.as_ref(), args.lower_type)?;
    let higher_path = boundary_file(&config, args.higher.as_ref(), args.higher_type)?;

    let lower = load_boundaries(&lower_path, args.lower_type)
        .with_context(|| format!("Failed to load {}", lower_path.display()))?;

    let higher = load_boundaries(&higher_path, args.higher_type)
        .with_context(|| format!("Failed to load {}", higher_path.display()))?;

    if lower.is_empty() || higher.is_empty() {
        bail!("Nothing to intersect: {} lower and {} higher boundaries", lower.len(), higher.len());
    }

    let index = BoundaryIndex::build(higher);
    if index.is_empty() {
        bail!("No {} boundary has a usable extent", args.higher_type);
    }
    info!(
        "Intersecting {} {} areas with {} {} areas",
        lower.len(),
        args.lower_type,
        index.len(),
        args.higher_type
    );

    let pb = ProgressBar::new(lower.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let stats = write_overlaps(&lower, &index, (args.lower_type, args.higher_type), &output, &pb)?;
    pb.finish_with_message("Overlap computation complete");

    if stats.unmatched > 0 {
        warn!(
            "{} of {} {} areas overlap no {} area",
            stats.unmatched,
            lower.len(),
            args.lower_type,
            args.higher_type
        );
    }
    info!("Wrote {} overlap rows to {}", stats.rows, output.display());

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct WriteStats {
    rows: usize,
    unmatched: usize,
}

/// Write the overlap table for `lower` against `index` to `output`.
///
/// Rows go to a temporary file beside `output`, which replaces it only once
/// every row is written; an interrupted run leaves no partial table behind.
fn write_overlaps(
    lower: &[AreaBoundary],
    index: &BoundaryIndex,
    (lower_type, higher_type): (GeoType, GeoType),
    output: &Path,
    pb: &ProgressBar,
) -> Result<WriteStats> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let partial = Builder::new()
        .prefix(".overlap-")
        .suffix(".csv.partial")
        .tempfile_in(&dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;

    let mut stats = WriteStats::default();
    {
        let mut writer = csv::Writer::from_writer(partial.as_file());
        writer.write_record(OverlapRow::header(lower_type, higher_type))?;

        for boundary in lower {
            let rows = overlaps_for(boundary, index);
            if rows.is_empty() {
                stats.unmatched += 1;
            }
            for row in &rows {
                writer.write_record(row.record())?;
            }
            stats.rows += rows.len();
            pb.inc(1);
        }
        writer.flush()?;
    }

    partial.as_file().sync_all()?;
    partial
        .persist(output)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move overlap table into {}", output.display()))?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ausgeo::models::Area;
    use geo::{polygon, MultiPolygon};

    fn square(code: &str, geo_type: GeoType, x: f64, y: f64, size: f64) -> AreaBoundary {
        AreaBoundary {
            area: Area::new(code, geo_type, format!("Area {}", code)),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: y),
                (x: x + size, y: y),
                (x: x + size, y: y + size),
                (x: x, y: y + size),
                (x: x, y: y),
            ]]),
        }
    }

    #[test]
    fn test_write_overlaps_replaces_output_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Relationships").join("sal_to_sua.csv");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "sal_code,sua_code,overlap_pct\n1,2,3\n").unwrap();

        let index = BoundaryIndex::build(vec![square("1030", GeoType::Sua, 0.0, 0.0, 2.0)]);
        let lower = vec![
            square("10001", GeoType::Sal, 0.5, 0.5, 1.0),
            square("10002", GeoType::Sal, 10.0, 10.0, 1.0),
        ];

        let stats = write_overlaps(
            &lower,
            &index,
            (GeoType::Sal, GeoType::Sua),
            &output,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(stats, WriteStats { rows: 1, unmatched: 1 });

        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "sal_code,sal_name,state,sua_code,sua_name,overlap_pct");
        assert!(lines[1].starts_with("10001,Area 10001,,1030,Area 1030,100"));
        assert_eq!(lines.len(), 2);

        let entries: Vec<_> = fs::read_dir(output.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
