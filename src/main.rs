use std::env;

use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use dotenvy::dotenv;
use reqwest::Client;
use tracing::error;

mod config;
mod error;
mod facebook;
mod images;
mod ledger;
mod prompt;
mod publish;
mod render;
mod schedule;
mod sequence;
mod utils;
mod youtube;

use config::{Config, ImageBackend};
use prompt::assembler::generate_prompt;
use prompt::description::generate_description;
use prompt::freeform::generate_card_prompt;
use prompt::params::View;
use schedule::{ScheduleOptions, StreamMode};
use utils::logging::init_logging;

fn usage() -> &'static str {
    "Usage: mtm <command>\n\
     \n\
     Commands:\n\
     \x20 prompt <day> <front|back|both>\n\
     \x20 describe <day>\n\
     \x20 freeform <day>\n\
     \x20 render <day> <front|back|both> [--backend dezgo|novita|openai|gemini]\n\
     \x20 schedule <start-end> [--dry-run|--no-dry-run] [--verbose-existing|-e]\n\
     \x20          [--stream-mode persistent|per-broadcast] [--auto-start-stop]\n\
     \x20 post-if-finished [YYYY-MM-DD] [--dry-run]\n\
     \x20 check-sequence\n\
     \x20 move-numbered\n\
     \x20 crop-sources [--dry-run]"
}

fn parse_day(value: &str) -> anyhow::Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| anyhow!("Invalid day index: {value}"))
}

fn parse_views(value: &str) -> anyhow::Result<Vec<View>> {
    match value.trim().to_lowercase().as_str() {
        "both" => Ok(vec![View::Front, View::Back]),
        other => Ok(vec![View::parse(other)?]),
    }
}

fn parse_schedule_args(args: &[String]) -> anyhow::Result<(i64, i64, ScheduleOptions)> {
    let range_arg = args
        .first()
        .ok_or_else(|| anyhow!("schedule requires a day range, e.g. 275-282"))?;
    let (start, end) = schedule::parse_range(range_arg)?;

    let mut options = ScheduleOptions::default();
    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--dry-run" => options.dry_run = true,
            "--no-dry-run" => options.dry_run = false,
            "--verbose-existing" | "-e" => options.verbose_existing = true,
            "--auto-start-stop" => options.auto_start_stop = true,
            "--stream-mode" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --stream-mode"))?;
                options.stream_mode = StreamMode::parse(value)?;
            }
            other => return Err(anyhow!("Unknown schedule flag: {other}")),
        }
        index += 1;
    }

    Ok((start, end, options))
}

fn parse_post_args(args: &[String]) -> anyhow::Result<(NaiveDate, bool)> {
    let mut date = Local::now().date_naive();
    let mut dry_run = false;

    for arg in args {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            value if value.starts_with("--") => {
                return Err(anyhow!("Unknown post-if-finished flag: {value}"));
            }
            value => {
                date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map_err(|_| anyhow!("Invalid date (expected YYYY-MM-DD): {value}"))?;
            }
        }
    }

    Ok((date, dry_run))
}

async fn run(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("");
    let rest = args.get(1..).unwrap_or(&[]);

    match command {
        "prompt" => {
            let day = parse_day(rest.first().ok_or_else(|| anyhow!("{}", usage()))?)?;
            let views = parse_views(rest.get(1).map(String::as_str).unwrap_or("both"))?;
            for view in views {
                println!("{}\n", generate_prompt(day, view)?);
            }
        }
        "describe" => {
            let day = parse_day(rest.first().ok_or_else(|| anyhow!("{}", usage()))?)?;
            println!("{}", generate_description(day)?);
        }
        "freeform" => {
            let day = parse_day(rest.first().ok_or_else(|| anyhow!("{}", usage()))?)?;
            println!("{}", generate_card_prompt(&config.sources_dir, day)?);
        }
        "render" => {
            let day = parse_day(rest.first().ok_or_else(|| anyhow!("{}", usage()))?)?;
            let views = parse_views(rest.get(1).map(String::as_str).unwrap_or("both"))?;

            let mut config = config.clone();
            let mut index = 2;
            while index < rest.len() {
                match rest[index].as_str() {
                    "--backend" => {
                        index += 1;
                        let value = rest
                            .get(index)
                            .ok_or_else(|| anyhow!("Missing value for --backend"))?;
                        config.image_backend = ImageBackend::parse(value)?;
                    }
                    other => return Err(anyhow!("Unknown render flag: {other}")),
                }
                index += 1;
            }

            let http = Client::new();
            for view in views {
                let path = render::render_for_day(&http, &config, day, view).await?;
                println!("{}", path.display());
            }
        }
        "schedule" => {
            let (start, end, options) = parse_schedule_args(rest)?;
            let http = Client::new();
            schedule::schedule_range(&http, config, &options, start, end).await?;
        }
        "post-if-finished" => {
            let (date, dry_run) = parse_post_args(rest)?;
            let http = Client::new();
            let outcome = publish::post_if_finished(&http, config, date, dry_run).await?;
            println!("{outcome:?}");
        }
        "check-sequence" => {
            sequence::report_sequence(&config.sources_dir)?;
        }
        "move-numbered" => {
            let moved = sequence::move_numbered(&config.sources_dir)?;
            println!("Moved {} file(s) into sora/", moved.len());
        }
        "crop-sources" => {
            let dry_run = match rest.first().map(String::as_str) {
                Some("--dry-run") => true,
                Some(other) => return Err(anyhow!("Unknown crop-sources flag: {other}")),
                None => false,
            };
            let cropped = sequence::crop_sources_to_16x9(&config.sequence_dir, dry_run)?;
            println!("{} file(s) {}", cropped, if dry_run { "to crop" } else { "cropped" });
        }
        _ => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    let _guards = init_logging(&config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&config, &args).await {
        error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_selector_supports_both() {
        assert_eq!(parse_views("both").unwrap(), vec![View::Front, View::Back]);
        assert_eq!(parse_views("front").unwrap(), vec![View::Front]);
        assert!(parse_views("sideways").is_err());
    }

    #[test]
    fn schedule_args_parse_flags() {
        let args: Vec<String> = ["200-205", "--no-dry-run", "-e", "--stream-mode", "per-broadcast"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (start, end, options) = parse_schedule_args(&args).unwrap();
        assert_eq!((start, end), (200, 205));
        assert!(!options.dry_run);
        assert!(options.verbose_existing);
        assert_eq!(options.stream_mode, StreamMode::PerBroadcast);
        assert!(!options.auto_start_stop);
    }

    #[test]
    fn schedule_defaults_to_dry_run() {
        let args = vec!["10-12".to_string()];
        let (_, _, options) = parse_schedule_args(&args).unwrap();
        assert!(options.dry_run);
    }

    #[test]
    fn post_args_accept_an_explicit_date() {
        let args = vec!["2025-03-01".to_string(), "--dry-run".to_string()];
        let (date, dry_run) = parse_post_args(&args).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!(dry_run);
    }
}
