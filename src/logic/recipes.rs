//! Account maintenance built from the same client calls as survey creation.

use log::info;
use std::path::PathBuf;

use crate::client::PlatformClient;
use crate::error::SurveyResult;
use crate::logic::Progress;
use crate::model::{SurveyId, SurveyOptions, SurveySummary};

/// What to do with each survey just before it is deleted.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Log the full survey definition at info level
    pub print_surveys: bool,
    /// Save the full survey definition as `<dir>/<survey id>.json`; the
    /// directory must already exist
    pub archive_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub matched: Vec<SurveySummary>,
    pub deleted: Vec<SurveyId>,
    /// The confirmation callback declined
    pub aborted: bool,
}

/// Delete every survey in the account whose name is exactly `survey_name`.
///
/// Deleting a survey also deletes its responses. `confirm` sees the matched
/// surveys and must return `true` before anything is deleted; it is not
/// called when nothing matches.
pub async fn delete_surveys_by_name<C, F>(
    client: &C,
    survey_name: &str,
    options: &DeleteOptions,
    confirm: F,
) -> SurveyResult<DeleteReport>
where
    C: PlatformClient + ?Sized,
    F: FnOnce(&[SurveySummary]) -> bool,
{
    let surveys = client.list_surveys().await?;
    info!("found {} surveys total", surveys.len());

    let matched: Vec<SurveySummary> = surveys
        .into_iter()
        .filter(|s| s.name == survey_name)
        .collect();
    info!("found {} surveys with name {:?}", matched.len(), survey_name);

    let mut report = DeleteReport {
        matched,
        ..DeleteReport::default()
    };
    if report.matched.is_empty() {
        return Ok(report);
    }
    if !confirm(&report.matched) {
        info!("aborting survey deletion");
        report.aborted = true;
        return Ok(report);
    }

    let mut progress = Progress::new("deleting", report.matched.len());
    for survey in &report.matched {
        if options.print_surveys || options.archive_dir.is_some() {
            let definition = client.get_survey(&survey.id).await?;
            let pretty = serde_json::to_string_pretty(&definition)?;
            if options.print_surveys {
                info!("{}", pretty);
            }
            if let Some(dir) = &options.archive_dir {
                let path = dir.join(format!("{}.json", survey.id));
                info!("saving survey {} to {}", survey.id, path.display());
                std::fs::write(&path, pretty)?;
            }
        }
        client.delete_survey(&survey.id).await?;
        progress.tick(&survey.id);
        report.deleted.push(survey.id.clone());
    }
    Ok(report)
}

/// Global look of an existing survey. Unset fields leave the remote value
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct SurveyStyle {
    pub header_html: Option<String>,
    pub footer_html: Option<String>,
    pub custom_css: Option<String>,
    /// Appended to the footer inside a `<script>` element
    pub script_js: Option<String>,
}

impl SurveyStyle {
    pub fn to_options(&self) -> SurveyOptions {
        let mut options = SurveyOptions::new();

        let mut footer = self.footer_html.clone();
        if let Some(js) = &self.script_js {
            let html = footer.get_or_insert_with(String::new);
            html.push_str(&format!("\n\n<script>\n{}\n</script>\n", js));
        }
        if let Some(footer) = footer {
            options.set_footer_html(footer);
        }
        if let Some(header) = &self.header_html {
            options.set_header_html(header.clone());
        }
        if let Some(css) = &self.custom_css {
            options.set_custom_css(css.clone());
        }
        options
    }
}

/// Patch header, footer, CSS and footer script of an existing survey,
/// keeping every other option.
pub async fn style_survey<C>(client: &C, survey_id: &str, style: &SurveyStyle) -> SurveyResult<()>
where
    C: PlatformClient + ?Sized,
{
    let options = style.to_options();
    if options.is_empty() {
        info!("nothing to restyle on survey {}", survey_id);
        return Ok(());
    }
    client.update_survey_options(survey_id, &options).await?;
    info!("survey {} restyled", survey_id);
    Ok(())
}
