use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

use crate::client::traits::PlatformClient;
use crate::error::{ApiCall, SurveyError, SurveyResult};
use crate::model::{BlockId, QuestionId, SurveyId, SurveyOptions, SurveySummary};

pub const DRY_RUN_BASE_URL: &str = "https://dry-run.qualtrics.com";

/// Which trait operation a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    CreateSurvey,
    UpdateSurveyOptions,
    CreateBlock,
    CreateElement,
    CreatePageBreak,
    UpdateFlow,
    GetSurvey,
    DeleteSurvey,
    ListSurveys,
}

/// One call made against a [`RecordingClient`], with the arguments it got.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateSurvey {
        name: String,
    },
    UpdateSurveyOptions {
        survey_id: SurveyId,
        options: Value,
    },
    CreateBlock {
        survey_id: SurveyId,
        description: String,
    },
    CreateElement {
        survey_id: SurveyId,
        block_id: Option<BlockId>,
        payload: Value,
    },
    CreatePageBreak {
        survey_id: SurveyId,
        block_id: Option<BlockId>,
    },
    UpdateFlow {
        survey_id: SurveyId,
        flow: Value,
    },
    GetSurvey {
        survey_id: SurveyId,
    },
    DeleteSurvey {
        survey_id: SurveyId,
    },
    ListSurveys,
}

impl RecordedCall {
    pub fn kind(&self) -> CallKind {
        match self {
            RecordedCall::CreateSurvey { .. } => CallKind::CreateSurvey,
            RecordedCall::UpdateSurveyOptions { .. } => CallKind::UpdateSurveyOptions,
            RecordedCall::CreateBlock { .. } => CallKind::CreateBlock,
            RecordedCall::CreateElement { .. } => CallKind::CreateElement,
            RecordedCall::CreatePageBreak { .. } => CallKind::CreatePageBreak,
            RecordedCall::UpdateFlow { .. } => CallKind::UpdateFlow,
            RecordedCall::GetSurvey { .. } => CallKind::GetSurvey,
            RecordedCall::DeleteSurvey { .. } => CallKind::DeleteSurvey,
            RecordedCall::ListSurveys => CallKind::ListSurveys,
        }
    }

    fn api_call(&self) -> ApiCall {
        match self {
            RecordedCall::CreateSurvey { name } => ApiCall::CreateSurvey { name: name.clone() },
            RecordedCall::UpdateSurveyOptions { survey_id, .. } => ApiCall::UpdateSurveyOptions {
                survey_id: survey_id.clone(),
            },
            RecordedCall::CreateBlock { survey_id, .. } => ApiCall::CreateBlock {
                survey_id: survey_id.clone(),
            },
            RecordedCall::CreateElement {
                survey_id, block_id, ..
            } => ApiCall::CreateElement {
                survey_id: survey_id.clone(),
                block_id: block_id.clone(),
            },
            RecordedCall::CreatePageBreak {
                survey_id,
                block_id,
            } => ApiCall::CreatePageBreak {
                survey_id: survey_id.clone(),
                block_id: block_id.clone(),
            },
            RecordedCall::UpdateFlow { survey_id, .. } => ApiCall::UpdateFlow {
                survey_id: survey_id.clone(),
            },
            RecordedCall::GetSurvey { survey_id } => ApiCall::GetSurvey {
                survey_id: survey_id.clone(),
            },
            RecordedCall::DeleteSurvey { survey_id } => ApiCall::DeleteSurvey {
                survey_id: survey_id.clone(),
            },
            RecordedCall::ListSurveys => ApiCall::ListSurveys,
        }
    }
}

impl fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedCall::CreateElement { payload, .. } => write!(
                f,
                "{} ({})",
                self.api_call(),
                payload["QuestionType"].as_str().unwrap_or("?")
            ),
            _ => write!(f, "{}", self.api_call()),
        }
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<RecordedCall>,
    attempts: HashMap<CallKind, usize>,
    failures: HashMap<CallKind, usize>,
    surveys: Vec<SurveySummary>,
    next_survey: usize,
    next_block: usize,
    next_question: usize,
}

/// In-memory stand-in for the platform.
///
/// Records every call in order and answers with sequential IDs (`SV_1`,
/// `BL_1`, `QID1`, ...). Used for dry runs and for checking creation
/// sequences without network access.
#[derive(Debug)]
pub struct RecordingClient {
    state: Mutex<RecordingState>,
    web_base_url: String,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecordingState::default()),
            web_base_url: DRY_RUN_BASE_URL.to_string(),
        }
    }

    /// Start with existing surveys in the account listing.
    pub fn with_surveys(surveys: Vec<SurveySummary>) -> Self {
        let client = Self::new();
        client.state.lock().surveys = surveys;
        client
    }

    /// Reject the `nth` call (1-based) of `kind` with a remote rejection.
    /// The failed call is still recorded.
    pub fn fail_on(&self, kind: CallKind, nth: usize) {
        self.state.lock().failures.insert(kind, nth);
    }

    /// Every call made so far, failed ones included.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .cloned()
            .collect()
    }

    /// Surveys currently in the simulated account.
    pub fn surveys(&self) -> Vec<SurveySummary> {
        self.state.lock().surveys.clone()
    }

    fn record(&self, call: RecordedCall) -> SurveyResult<MutexStateGuard<'_>> {
        let mut state = self.state.lock();
        let kind = call.kind();
        let attempt = {
            let count = state.attempts.entry(kind).or_insert(0);
            *count += 1;
            *count
        };
        let api_call = call.api_call();
        state.calls.push(call);

        if state.failures.get(&kind) == Some(&attempt) {
            return Err(SurveyError::RemoteRejection {
                call: api_call,
                status: 500,
                code: Some("INJECTED".to_string()),
                message: format!("injected failure on call {} of this kind", attempt),
            });
        }
        Ok(state)
    }
}

type MutexStateGuard<'a> = parking_lot::MutexGuard<'a, RecordingState>;

#[async_trait::async_trait]
impl PlatformClient for RecordingClient {
    async fn create_survey(&self, name: &str) -> SurveyResult<SurveyId> {
        let mut state = self.record(RecordedCall::CreateSurvey {
            name: name.to_string(),
        })?;
        state.next_survey += 1;
        let id = format!("SV_{}", state.next_survey);
        state.surveys.push(SurveySummary {
            id: id.clone(),
            name: name.to_string(),
            owner_id: None,
            last_modified: None,
            is_active: Some(false),
        });
        Ok(id)
    }

    async fn update_survey_options(
        &self,
        survey_id: &str,
        options: &SurveyOptions,
    ) -> SurveyResult<()> {
        self.record(RecordedCall::UpdateSurveyOptions {
            survey_id: survey_id.to_string(),
            options: options.clone().into_value(),
        })?;
        Ok(())
    }

    async fn create_block(&self, survey_id: &str, description: &str) -> SurveyResult<BlockId> {
        let mut state = self.record(RecordedCall::CreateBlock {
            survey_id: survey_id.to_string(),
            description: description.to_string(),
        })?;
        state.next_block += 1;
        Ok(format!("BL_{}", state.next_block))
    }

    async fn create_element(
        &self,
        survey_id: &str,
        block_id: Option<&str>,
        payload: &Value,
    ) -> SurveyResult<QuestionId> {
        let mut state = self.record(RecordedCall::CreateElement {
            survey_id: survey_id.to_string(),
            block_id: block_id.map(str::to_string),
            payload: payload.clone(),
        })?;
        state.next_question += 1;
        Ok(format!("QID{}", state.next_question))
    }

    async fn create_page_break(&self, survey_id: &str, block_id: Option<&str>) -> SurveyResult<()> {
        self.record(RecordedCall::CreatePageBreak {
            survey_id: survey_id.to_string(),
            block_id: block_id.map(str::to_string),
        })?;
        Ok(())
    }

    async fn update_flow(&self, survey_id: &str, flow: &Value) -> SurveyResult<()> {
        self.record(RecordedCall::UpdateFlow {
            survey_id: survey_id.to_string(),
            flow: flow.clone(),
        })?;
        Ok(())
    }

    async fn get_survey(&self, survey_id: &str) -> SurveyResult<Value> {
        let state = self.record(RecordedCall::GetSurvey {
            survey_id: survey_id.to_string(),
        })?;
        match state.surveys.iter().find(|s| s.id == survey_id) {
            Some(summary) => Ok(json!({
                "SurveyID": summary.id,
                "SurveyName": summary.name,
            })),
            None => Err(SurveyError::RemoteRejection {
                call: ApiCall::GetSurvey {
                    survey_id: survey_id.to_string(),
                },
                status: 404,
                code: None,
                message: "survey not found".to_string(),
            }),
        }
    }

    async fn delete_survey(&self, survey_id: &str) -> SurveyResult<()> {
        let mut state = self.record(RecordedCall::DeleteSurvey {
            survey_id: survey_id.to_string(),
        })?;
        let before = state.surveys.len();
        state.surveys.retain(|s| s.id != survey_id);
        if state.surveys.len() == before {
            return Err(SurveyError::RemoteRejection {
                call: ApiCall::DeleteSurvey {
                    survey_id: survey_id.to_string(),
                },
                status: 404,
                code: None,
                message: "survey not found".to_string(),
            });
        }
        Ok(())
    }

    async fn list_surveys(&self) -> SurveyResult<Vec<SurveySummary>> {
        let state = self.record(RecordedCall::ListSurveys)?;
        Ok(state.surveys.clone())
    }

    fn web_base_url(&self) -> &str {
        &self.web_base_url
    }
}
