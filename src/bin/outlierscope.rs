use std::path::{Path, PathBuf};
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, ErrorKind};
use log::LevelFilter;

use outlierscope::{analysis, log_error, Config, Detectors, Error, Mode, Outputs, Upload};

const REQUEST_FAILED: i32 = 1;
const INVALID_ARGUMENTS: i32 = 2;

fn app() -> App<'static, 'static> {
    App::new("outlierscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Flags the outlying rows of a CSV or Excel file")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("FILE")
                .help("The uploaded file. Its extension (.csv, .xls, .xlsx) selects the parser.")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("mode")
                .long("mode")
                .short("m")
                .takes_value(true)
                .possible_values(&Mode::ALL)
                .default_value("simple")
                .help("Detection strictness."),
        )
        .arg(
            Arg::with_name("data-url")
                .long("data-url")
                .help("FILE holds a base64 data URL instead of the raw file."),
        )
        .arg(
            Arg::with_name("name")
                .long("name")
                .takes_value(true)
                .help("Filename to choose the parser from, instead of FILE's own name."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .takes_value(true)
                .value_name("PATH")
                .help("Write the chart description as JSON."),
        )
        .arg(
            Arg::with_name("svg")
                .long("svg")
                .takes_value(true)
                .value_name("PATH")
                .help("Render the chart as SVG."),
        )
        .arg(
            Arg::with_name("csv")
                .long("csv")
                .takes_value(true)
                .value_name("PATH")
                .help("Write every row with its outlier flag as CSV."),
        )
        .arg(
            Arg::with_name("contamination")
                .long("contamination")
                .takes_value(true)
                .help("Expected fraction of outliers, in (0, 0.5]. [default: 0.1]"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Seed of the isolation forest. [default: 42]"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for even more."),
        )
}

/// Detector parameters from the command line, on top of the defaults
fn config(matches: &ArgMatches<'_>) -> Result<Config, Error> {
    let mut config = Config::default();

    if let Some(raw) = matches.value_of("contamination") {
        let fraction: f64 = raw.parse().map_err(|_| Error::InvalidParameter {
            name: "contamination".to_owned(),
            reason: format!("{:?} is not a number", raw),
        })?;
        if !(fraction > 0.0 && fraction <= 0.5) {
            return Err(Error::InvalidParameter {
                name: "contamination".to_owned(),
                reason: format!("{} is outside (0, 0.5]", fraction),
            });
        }
        config = config.contamination(fraction);
    }

    if let Some(raw) = matches.value_of("seed") {
        let seed: u64 = raw.parse().map_err(|_| Error::InvalidParameter {
            name: "seed".to_owned(),
            reason: format!("{:?} is not an unsigned integer", raw),
        })?;
        config = config.seed(seed);
    }

    Ok(config)
}

fn outputs(matches: &ArgMatches<'_>) -> Outputs {
    Outputs {
        json: matches.value_of("json").map(PathBuf::from),
        svg: matches.value_of("svg").map(PathBuf::from),
        csv: matches.value_of("csv").map(PathBuf::from),
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
}

fn serve(matches: &ArgMatches<'_>, mode: Mode, config: &Config) -> Result<(), Error> {
    let file = Path::new(matches.value_of("FILE").unwrap_or_default());
    let upload = if matches.is_present("data-url") {
        Upload::open_data_url(file)?
    } else {
        Upload::open(file)?
    };
    let upload = match matches.value_of("name") {
        Some(name) => upload.with_filename(name),
        None => upload,
    };

    let detectors = Detectors::available(config);
    let outcome = analysis::run(&upload, mode, &detectors)?;
    outputs(matches).write(&outcome)?;

    println!("{}", outcome.summary);
    Ok(())
}

fn main() {
    let matches = match app().get_matches_safe() {
        Ok(matches) => matches,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => {
                println!("{}", e.message);
                process::exit(0);
            }
            _ => {
                eprintln!("{}", e.message);
                process::exit(INVALID_ARGUMENTS);
            }
        },
    };

    init_logging(matches.occurrences_of("verbose"));

    let parsed = matches
        .value_of("mode")
        .unwrap_or_default()
        .parse::<Mode>()
        .and_then(|mode| Ok((mode, config(&matches)?)));
    let (mode, config) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(INVALID_ARGUMENTS);
        }
    };

    if let Err(e) = serve(&matches, mode, &config) {
        log_error(&e);
        eprintln!("{}", e.user_message());
        process::exit(REQUEST_FAILED);
    }
}
