use serde_json::Value;

use crate::error::SurveyResult;
use crate::model::{BlockId, QuestionId, SurveyId, SurveyLinks, SurveyOptions, SurveySummary};

/// The survey-definitions operations the builder needs from the platform.
///
/// Every call is independent and blocking from the caller's point of view;
/// the creation sequence awaits each one before building the next.
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    /// Create an empty survey shell
    async fn create_survey(&self, name: &str) -> SurveyResult<SurveyId>;
    /// Apply global options, keeping options not named in `options`
    async fn update_survey_options(
        &self,
        survey_id: &str,
        options: &SurveyOptions,
    ) -> SurveyResult<()>;
    /// Create an empty standard block
    async fn create_block(&self, survey_id: &str, description: &str) -> SurveyResult<BlockId>;
    /// Create a question in `block_id`, or in the default block when `None`
    async fn create_element(
        &self,
        survey_id: &str,
        block_id: Option<&str>,
        payload: &Value,
    ) -> SurveyResult<QuestionId>;
    /// Append a page break to `block_id`, or to the default block when `None`
    async fn create_page_break(&self, survey_id: &str, block_id: Option<&str>) -> SurveyResult<()>;
    /// Replace the survey's flow
    async fn update_flow(&self, survey_id: &str, flow: &Value) -> SurveyResult<()>;

    /// Full survey definition
    async fn get_survey(&self, survey_id: &str) -> SurveyResult<Value>;
    /// Delete a survey, including any responses collected with it
    async fn delete_survey(&self, survey_id: &str) -> SurveyResult<()>;
    async fn list_surveys(&self) -> SurveyResult<Vec<SurveySummary>>;

    /// Web root of the data center, e.g. `https://syd1.qualtrics.com`
    fn web_base_url(&self) -> &str;

    fn links(&self, survey_id: &str) -> SurveyLinks {
        SurveyLinks::new(self.web_base_url(), survey_id)
    }
}
