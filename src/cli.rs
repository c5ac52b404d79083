// Command line interface parsing
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use clap::{
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    value_parser,
    Arg,
    ArgAction,
    ArgMatches,
    Command,
};
use s3report::common::{
    AnalysisConfig,
    RetryPolicy,
    SizeUnit,
};
use tracing::debug;

// Defaults, matching AnalysisConfig::default()
const DEFAULT_CONCURRENCY: &str = "8";
const DEFAULT_LOOKBACK_DAYS: &str = "3";
const DEFAULT_MAX_ATTEMPTS: &str = "4";
const DEFAULT_SAMPLE_SIZE: &str = "1000";
const DEFAULT_UNIT: &str = "binary";

// This should match the string values in the SizeUnit FromStr impl
const VALID_UNITS: &[&str] = &[
    "binary",
    "bytes",
    "decimal",
];

// Everything the binary needs from the command line.
pub struct Settings {
    pub region:   Option<String>,
    pub profile:  Option<String>,
    pub unit:     SizeUnit,
    pub json:     bool,
    pub analysis: AnalysisConfig,
}

// Ensures that the size unit we're passed is one we can format with.
fn is_valid_unit(s: &str) -> Result<SizeUnit, String> {
    s.parse::<SizeUnit>().map_err(String::from)
}

// Crate clap app
fn create_app() -> Command {
    debug!("Creating CLI app");

    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("REGION")
                .env("AWS_REGION")
                .hide_env_values(true)
                .long("region")
                .short('r')
                .value_name("REGION")
                .help("Set the AWS region to create the clients in")
        )
        .arg(
            Arg::new("PROFILE")
                .env("AWS_PROFILE")
                .hide_env_values(true)
                .long("profile")
                .short('p')
                .value_name("PROFILE")
                .help("AWS profile to load credentials from")
        )
        .arg(
            Arg::new("SAMPLE_SIZE")
                .env("S3REPORT_SAMPLE_SIZE")
                .long("sample-size")
                .short('s')
                .value_name("COUNT")
                .help("Maximum number of objects sampled per bucket")
                .default_value(DEFAULT_SAMPLE_SIZE)
                .value_parser(value_parser!(usize))
        )
        .arg(
            Arg::new("LOOKBACK_DAYS")
                .env("S3REPORT_LOOKBACK_DAYS")
                .long("lookback-days")
                .value_name("DAYS")
                .help("Days of CloudWatch metrics searched for a size datapoint")
                .default_value(DEFAULT_LOOKBACK_DAYS)
                .value_parser(value_parser!(u32).range(1..=365))
        )
        .arg(
            Arg::new("CONCURRENCY")
                .env("S3REPORT_CONCURRENCY")
                .long("concurrency")
                .short('c')
                .value_name("BUCKETS")
                .help("Number of buckets collected at the same time")
                .default_value(DEFAULT_CONCURRENCY)
                .value_parser(value_parser!(usize))
        )
        .arg(
            Arg::new("MAX_ATTEMPTS")
                .env("S3REPORT_MAX_ATTEMPTS")
                .long("max-attempts")
                .value_name("ATTEMPTS")
                .help("Attempts per AWS call before giving up")
                .default_value(DEFAULT_MAX_ATTEMPTS)
                .value_parser(value_parser!(u32).range(1..))
        )
        .arg(
            Arg::new("UNIT")
                .env("S3REPORT_UNIT")
                .long("unit")
                .short('u')
                .value_name("UNIT")
                .help("Sets the unit used for sizes in the summary")
                .default_value(DEFAULT_UNIT)
                .value_parser(is_valid_unit)
                .long_help(format!(
                    "Sets the unit used for sizes in the summary, one of: {}",
                    VALID_UNITS.join(", "),
                ))
        )
        .arg(
            Arg::new("JSON")
                .env("S3REPORT_JSON")
                .long("json")
                .help("Print the full report as JSON instead of a summary")
                .action(ArgAction::SetTrue)
        )
}

// Turn parsed matches into Settings.
fn settings(matches: &ArgMatches) -> Settings {
    let defaults = AnalysisConfig::default();

    let sample_limit = matches.get_one::<usize>("SAMPLE_SIZE")
        .copied()
        .unwrap_or(defaults.sample_limit);

    let lookback = matches.get_one::<u32>("LOOKBACK_DAYS")
        .map(|days| chrono::Duration::days(i64::from(*days)))
        .unwrap_or(defaults.lookback);

    let concurrency = matches.get_one::<usize>("CONCURRENCY")
        .copied()
        .unwrap_or(defaults.concurrency);

    let max_attempts = matches.get_one::<u32>("MAX_ATTEMPTS")
        .copied()
        .unwrap_or(defaults.retry.max_attempts);

    let unit = matches.get_one::<SizeUnit>("UNIT")
        .copied()
        .unwrap_or(SizeUnit::Bytes);

    let profile = matches.get_one::<String>("PROFILE").cloned();

    Settings {
        region:   matches.get_one::<String>("REGION").cloned(),
        unit,
        json:     matches.get_flag("JSON"),
        analysis: AnalysisConfig {
            sample_limit,
            lookback,
            concurrency,
            retry: RetryPolicy {
                max_attempts,
                ..defaults.retry
            },
            account: profile.clone(),
            ..defaults
        },
        profile,
    }
}

pub fn parse_args() -> Settings {
    debug!("Parsing command line arguments");

    settings(&create_app().get_matches())
}
