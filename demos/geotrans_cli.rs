//!
//! Shift geodetic coordinates between two datums from stdin
//!
use clap::{ArgAction, Parser};
use geotrans::accuracy::Accuracy;
use geotrans::coordinate::{CoordinateKind, CoordinateTuple, Geodetic};
use geotrans::errors::{Error, Result};
use geotrans::service::ConversionService;

use std::io::{self, BufRead};

#[derive(Parser)]
#[command(author, version = "0.1", about = "Shift geodetic coordinates between datums", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Source datum code, e.g. WGE
    #[arg(long, default_value = "WGE")]
    from: String,
    /// Target datum code, e.g. NAS-C
    #[arg(long, required = true)]
    to: String,
    /// Increase verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose);

    log::debug!("from: {}\nto: {}", args.from, args.to);

    let service = ConversionService::new(&args.from, &args.to)?;
    let target_hint = CoordinateKind::Geodetic(Geodetic { lon: 0.0, lat: 0.0, height: 0.0 });

    fn from_parse_err(err: std::num::ParseFloatError) -> Error {
        eprintln!("{err:?}");
        Error::Precision
    }

    let stdin = io::stdin().lock();
    for line in stdin.lines() {
        let line = line.unwrap();
        let inputs = line.as_str().split_whitespace().collect::<Vec<_>>();
        if inputs.len() < 2 || inputs.len() > 3 {
            eprintln!("Expecting: '<lon_deg> <lat_deg> [<height_m>]' found: {}", line.as_str());
            std::process::exit(1);
        }

        let lon: f64 = inputs[0].parse().map_err(from_parse_err)?;
        let lat: f64 = inputs[1].parse().map_err(from_parse_err)?;
        let height: f64 = if inputs.len() > 2 { inputs[2].parse().map_err(from_parse_err)? } else { 0.0 };

        let coord = CoordinateTuple::geodetic(lon.to_radians(), lat.to_radians(), height);
        let (result, accuracy) = service.convert_source_to_target(&coord, Accuracy::UNKNOWN, &target_hint);

        if let Some(err) = &result.error {
            eprintln!("error: {err}");
            continue;
        }
        let g = result.as_geodetic().unwrap();
        if let Some(w) = &result.warning {
            eprintln!("warning: {w}");
        }
        println!("{} {} {}  (CE90={:.1} LE90={:.1})", g.lon.to_degrees(), g.lat.to_degrees(), g.height, accuracy.ce90, accuracy.le90);
    }
    Ok(())
}

//
// Logger
//
fn init_logger(verbose: u8) {
    use env_logger::Env;
    use log::LevelFilter;

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    match verbose {
        1 => builder.filter_level(LevelFilter::Debug),
        _ if verbose > 1 => builder.filter_level(LevelFilter::Trace),
        _ => &mut builder,
    }
    .init();
}
