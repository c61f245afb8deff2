use serde::{Deserialize, Serialize};

pub type SurveyId = String;
pub type BlockId = String;
pub type QuestionId = String;

/// Default survey name, conventional during survey development
pub const DEFAULT_SURVEY_NAME: &str = "Test Survey";

/// Force-response switch shared by several question types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForceResponse {
    On,
    #[default]
    Off,
}

impl ForceResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceResponse::On => "ON",
            ForceResponse::Off => "OFF",
        }
    }
}

impl From<bool> for ForceResponse {
    fn from(value: bool) -> Self {
        if value {
            ForceResponse::On
        } else {
            ForceResponse::Off
        }
    }
}

/// Web links to a created survey, derived from the data center URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyLinks {
    pub editor: String,
    pub preview: String,
}

impl SurveyLinks {
    pub fn new(web_base_url: &str, survey_id: &str) -> Self {
        let base = web_base_url.trim_end_matches('/');
        Self {
            editor: format!("{}/survey-builder/{}/edit", base, survey_id),
            preview: format!("{}/jfe/preview/{}", base, survey_id),
        }
    }
}

/// One entry of the account's survey listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
    pub id: SurveyId,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}
