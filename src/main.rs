// s3report: Point-in-time inventory of the S3 buckets in an AWS account.
#![forbid(unsafe_code)]
use anyhow::{
    Context,
    Result,
};
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_types::region::Region;
use s3report::{
    build_report,
    cloudwatch,
    cost_explorer,
    s3,
    Backends,
    Summary,
};
use std::sync::Arc;
use tracing::{
    debug,
    info,
};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = cli::parse_args();

    debug!("main: Loading AWS config");

    // The pipeline retries calls itself.
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled());

    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }

    let config = loader.load().await;

    let s3_client = Arc::new(s3::Client::new(&config));

    let backends = Backends {
        buckets: s3_client.clone(),
        objects: s3_client,
        usage:   Arc::new(cloudwatch::Client::new(&config)),
        cost:    Arc::new(cost_explorer::Client::new(&config)),
    };

    let report = build_report(&backends, &settings.analysis)
        .await
        .context("Failed to build bucket report")?;

    info!(buckets = report.bucket_count(), "report complete");

    if settings.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialise report")?;

        println!("{}", json);
    }
    else {
        print!("{}", Summary::new(&report, settings.unit));
    }

    Ok(())
}
