//! Bench command implementation

use crate::bench::{run_benchmark, BenchSettings};
use crate::cli::output::format_json;
use crate::cli::{BenchArgs, Context};
use std::time::Duration;

/// Translate CLI flags into benchmark settings.
pub async fn settings_from_args(args: &BenchArgs) -> Result<BenchSettings, Box<dyn std::error::Error>> {
    let settings = BenchSettings {
        concurrency: args.concurrency,
        requests: args.requests,
        warmup_requests: args.warmup_requests,
        timeout: Duration::from_secs(args.timeout),
        max_output_tokens: args.max_output_tokens,
        ..Default::default()
    };

    let settings = match &args.prompt_file {
        Some(path) => settings.with_prompt_file(path).await?,
        None => settings,
    };
    settings.validate()?;
    Ok(settings)
}

/// Handle `ragchat bench`: run, print the summary JSON, optionally save it.
pub async fn run_bench(args: &BenchArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings_from_args(args).await?;

    if settings.warmup_requests > 0 {
        eprintln!(
            "Running warmup phase: {} requests...",
            settings.warmup_requests
        );
    }
    eprintln!("Running measured phase: {} requests...", settings.requests);

    let report = run_benchmark(&ctx.client, &settings).await?;

    if let Some(path) = &args.json_out {
        report.write_json(path)?;
    }

    if args.show_errors > 0 {
        let errors: Vec<&str> = report.errors(args.show_errors).collect();
        if !errors.is_empty() {
            eprintln!("Sample errors:");
            for error in errors {
                eprintln!("- {}", error);
            }
        }
    }

    println!("{}", format_json(&report.summary)?);
    Ok(())
}
