//! Command-line queries against ABS geography tables.
//!
//! Loads the registry from a data directory (or a TOML layout file) and
//! answers one query per invocation. Results go to stdout, logs to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ausgeo::lookup::DEFAULT_MIN_OVERLAP;
use ausgeo::report::{self, CompareMetric, NearSort, MAJOR_CITY_POPULATION};
use ausgeo::{AgeGroup, DataConfig, Gender, GeoRegistry, GeoService, GeoType, ResolveMode};

mod output;
use output::{demographic_rows, emit, AreaRow, Format};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Look up Australian statistical areas, suburbs and cities")]
struct Args {
    /// Directory laid out as Population/, Relationships/ and Boundaries/
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// TOML file listing the tables to load (overrides --data-dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank areas matching a name or code
    Resolve {
        query: String,
        #[arg(short = 't', long = "type", default_value = "sal")]
        geo_type: GeoType,
        /// Fail unless exactly one area is the best match
        #[arg(long)]
        strict: bool,
    },
    /// Areas lying within a target area
    Within {
        target: String,
        #[arg(short = 't', long = "type", default_value = "sua")]
        target_type: GeoType,
        #[arg(short, long, default_value = "sal")]
        result_type: GeoType,
        #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP, value_parser = parse_percentage)]
        min_overlap: f64,
    },
    /// Areas that contain a target area
    Containing {
        target: String,
        #[arg(short = 't', long = "type", default_value = "sal")]
        target_type: GeoType,
        #[arg(short, long, default_value = "sua")]
        container_type: GeoType,
        #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP, value_parser = parse_percentage)]
        min_overlap: f64,
    },
    /// Suburbs whose centroid lies near a city's centroid
    Near {
        city: String,
        #[arg(long, default_value_t = 10.0, value_parser = parse_distance)]
        max_km: f64,
        /// distance, population, overlap or name
        #[arg(long, default_value = "distance")]
        sort: NearSort,
    },
    /// Age/sex counts for one area
    Demographics {
        area: String,
        #[arg(short = 't', long = "type", default_value = "sal")]
        geo_type: GeoType,
        /// e.g. 0_4, 25_34, 85ov, total
        #[arg(long)]
        age: Option<AgeGroup>,
        /// m, f or total
        #[arg(long)]
        gender: Option<Gender>,
    },
    /// Significant Urban Areas above a population threshold
    Cities {
        #[arg(long, default_value_t = MAJOR_CITY_POPULATION)]
        min_population: u64,
    },
    /// Most populous suburbs
    Largest {
        #[arg(short, default_value_t = 10)]
        n: usize,
        #[arg(long)]
        state: Option<String>,
    },
    /// Suburbs in one state
    State {
        state: String,
        #[arg(long, default_value_t = 0)]
        min_population: u64,
    },
    /// Substring search on area names
    Find {
        pattern: String,
        #[arg(short = 't', long = "type", default_value = "sal")]
        geo_type: GeoType,
        #[arg(long)]
        state: Option<String>,
    },
    /// Population totals per state
    Population {
        #[arg(short = 't', long = "type", default_value = "sal")]
        geo_type: GeoType,
    },
    /// Compare suburb counts, population and density of several cities
    Compare {
        #[arg(required = true, num_args = 1..)]
        cities: Vec<String>,
        /// population, area, suburb_count or density
        #[arg(long, default_value = "population")]
        metric: CompareMetric,
        #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP, value_parser = parse_percentage)]
        min_overlap: f64,
    },
    /// Share of each state's suburbs inside a Significant Urban Area
    Coverage,
}

/// Overlap threshold in percent, 0 to 100 inclusive.
fn parse_percentage(s: &str) -> Result<f64, String> {
    let pct: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if pct.is_finite() && (0.0..=100.0).contains(&pct) {
        Ok(pct)
    } else {
        Err(format!("{} is not a percentage between 0 and 100", s))
    }
}

fn parse_distance(s: &str) -> Result<f64, String> {
    let km: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if km.is_finite() && km >= 0.0 {
        Ok(km)
    } else {
        Err(format!("{} is not a non-negative distance", s))
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<DataConfig> {
    match &args.config {
        Some(path) => DataConfig::load_from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display())),
        None => Ok(DataConfig::from_data_dir(&args.data_dir)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = load_config(&args)?;
    info!("Loading geography tables from {}", config.data_dir.display());
    let registry = GeoRegistry::load(&config).context("Failed to load geography tables")?;
    let service = GeoService::new(&registry);
    let format = args.format;

    match args.command {
        Command::Resolve {
            query,
            geo_type,
            strict,
        } => {
            if strict {
                let area = service.resolve_one(&query, geo_type, ResolveMode::Strict)?;
                emit(&[AreaRow::from(area)], format)?;
            } else {
                let rows: Vec<AreaRow> = service.rank(&query, geo_type).iter().map(AreaRow::from).collect();
                emit(&rows, format)?;
            }
        }
        Command::Within {
            target,
            target_type,
            result_type,
            min_overlap,
        } => {
            let found = service.areas_within_named(&target, target_type, result_type, min_overlap)?;
            let rows: Vec<AreaRow> = found.iter().map(AreaRow::from).collect();
            emit(&rows, format)?;
        }
        Command::Containing {
            target,
            target_type,
            container_type,
            min_overlap,
        } => {
            let found = service.containing_named(&target, target_type, container_type, min_overlap)?;
            let rows: Vec<AreaRow> = found.iter().map(AreaRow::from).collect();
            emit(&rows, format)?;
        }
        Command::Near { city, max_km, sort } => {
            let found = report::suburbs_near_city(&service, &city, max_km, sort)?;
            let rows: Vec<AreaRow> = found.iter().map(AreaRow::from).collect();
            emit(&rows, format)?;
        }
        Command::Demographics {
            area,
            geo_type,
            age,
            gender,
        } => {
            let resolved = service.resolve_one(&area, geo_type, ResolveMode::BestGuess)?;
            info!("Demographics for {} {} ({})", geo_type, resolved.code, resolved.name);
            let d = service.demographics(geo_type, &resolved.code, age, gender);
            emit(&demographic_rows(&d, age, gender), format)?;
        }
        Command::Cities { min_population } => {
            let rows: Vec<AreaRow> = report::major_cities(&service, min_population)
                .into_iter()
                .map(AreaRow::from)
                .collect();
            emit(&rows, format)?;
        }
        Command::Largest { n, state } => {
            let rows: Vec<AreaRow> = report::largest_suburbs(&service, n, state.as_deref())
                .into_iter()
                .map(AreaRow::from)
                .collect();
            emit(&rows, format)?;
        }
        Command::State {
            state,
            min_population,
        } => {
            let rows: Vec<AreaRow> = report::suburbs_in_state(&service, &state, min_population)
                .into_iter()
                .map(AreaRow::from)
                .collect();
            emit(&rows, format)?;
        }
        Command::Find {
            pattern,
            geo_type,
            state,
        } => {
            let rows: Vec<AreaRow> = report::find_areas_by_name(&service, &pattern, geo_type, state.as_deref())
                .into_iter()
                .map(AreaRow::from)
                .collect();
            emit(&rows, format)?;
        }
        Command::Population { geo_type } => {
            emit(&report::population_by_state(&service, geo_type), format)?;
        }
        Command::Compare {
            cities,
            metric,
            min_overlap,
        } => {
            let names: Vec<&str> = cities.iter().map(String::as_str).collect();
            emit(&report::compare_cities(&service, &names, min_overlap, metric), format)?;
        }
        Command::Coverage => {
            emit(&report::geographic_coverage(&service), format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_overlap_must_be_a_percentage() {
        assert_eq!(parse_percentage("87.5"), Ok(87.5));
        assert_eq!(parse_percentage("0"), Ok(0.0));
        assert_eq!(parse_percentage("100"), Ok(100.0));
        for bad in ["NaN", "nan", "inf", "-1", "100.5", "half"] {
            assert!(parse_percentage(bad).is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_max_km_must_be_finite() {
        assert_eq!(parse_distance("2.5"), Ok(2.5));
        assert!(parse_distance("NaN").is_err());
        assert!(parse_distance("-3").is_err());
        assert!(parse_distance("infinity").is_err());
    }

    #[test]
    fn test_cli_rejects_nan_threshold() {
        let parsed = Args::try_parse_from(["query", "within", "Sydney", "--min-overlap", "NaN"]);
        assert!(parsed.is_err());

        let args = Args::try_parse_from(["query", "within", "Sydney", "--min-overlap", "90"]).unwrap();
        let Command::Within { min_overlap, .. } = args.command else {
            panic!("expected within");
        };
        assert_eq!(min_overlap, 90.0);
    }
}
