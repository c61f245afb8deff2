//! Delete every survey with a given name from the configured account.
//!
//! Deleting a survey also deletes its responses, so the matched surveys are
//! confirmed interactively before anything is deleted.

use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use qualtrics_builder::config::AppConfig;
use qualtrics_builder::{delete_surveys_by_name, DeleteOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "purge-surveys",
    about = "Delete every survey with a given name, including its responses"
)]
struct Cli {
    #[arg(help = "Name of the surveys to delete (defaults to survey.name from config)")]
    survey_name: Option<String>,

    #[arg(long, help = "Save each survey definition here as <survey id>.json first")]
    archive_dir: Option<PathBuf>,

    #[arg(long = "print", help = "Log each survey definition before deleting it")]
    print_surveys: bool,

    #[arg(short, long, help = "Skip the confirmation prompt")]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let survey_name = cli
        .survey_name
        .unwrap_or_else(|| config.survey.name.clone());

    if let Some(dir) = &cli.archive_dir {
        anyhow::ensure!(dir.is_dir(), "archive directory {} does not exist", dir.display());
    }

    let client = config.qualtrics_client()?;
    let options = DeleteOptions {
        print_surveys: cli.print_surveys,
        archive_dir: cli.archive_dir,
    };
    let skip_prompt = cli.yes;
    let report = delete_surveys_by_name(&client, &survey_name, &options, |matched| {
        skip_prompt
            || Confirm::new()
                .with_prompt(format!(
                    "Really delete {} surveys, including any responses!?",
                    matched.len()
                ))
                .default(false)
                .interact()
                .unwrap_or(false)
    })
    .await
    .context("survey purge failed")?;

    if report.aborted {
        println!("aborting survey deletion.");
    } else {
        println!("deleted {} surveys named {:?}", report.deleted.len(), survey_name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_are_not_survey_names() {
        let cli = Cli::try_parse_from([
            "purge-surveys",
            "Old Survey",
            "--archive-dir",
            "/tmp/archive",
            "--print",
        ])
        .unwrap();
        assert_eq!(cli.survey_name.as_deref(), Some("Old Survey"));
        assert_eq!(cli.archive_dir, Some(PathBuf::from("/tmp/archive")));
        assert!(cli.print_surveys);
        assert!(!cli.yes);
    }

    #[test]
    fn test_survey_name_is_optional() {
        let cli = Cli::try_parse_from(["purge-surveys", "--archive-dir", "out"]).unwrap();
        assert_eq!(cli.survey_name, None);
        assert_eq!(cli.archive_dir, Some(PathBuf::from("out")));
        assert!(!cli.print_surveys);
    }

    #[test]
    fn test_help_is_not_treated_as_a_name() {
        let err = Cli::try_parse_from(["purge-surveys", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
