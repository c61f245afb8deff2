use std::fmt;
use thiserror::Error;

use crate::model::{BlockId, QuestionId, SurveyId};

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Identity of a single survey-definitions API call, carried by errors so the
/// caller can tell which step of a creation sequence failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateSurvey { name: String },
    GetSurvey { survey_id: SurveyId },
    DeleteSurvey { survey_id: SurveyId },
    ListSurveys,
    GetSurveyOptions { survey_id: SurveyId },
    UpdateSurveyOptions { survey_id: SurveyId },
    CreateBlock { survey_id: SurveyId },
    GetBlock { survey_id: SurveyId, block_id: BlockId },
    UpdateBlock { survey_id: SurveyId, block_id: BlockId },
    DeleteBlock { survey_id: SurveyId, block_id: BlockId },
    ListQuestions { survey_id: SurveyId },
    GetQuestion { survey_id: SurveyId, question_id: QuestionId },
    UpdateQuestion { survey_id: SurveyId, question_id: QuestionId },
    DeleteQuestion { survey_id: SurveyId, question_id: QuestionId },
    CreateElement { survey_id: SurveyId, block_id: Option<BlockId> },
    CreatePageBreak { survey_id: SurveyId, block_id: Option<BlockId> },
    GetFlow { survey_id: SurveyId },
    UpdateFlow { survey_id: SurveyId },
    UpdateFlowElement { survey_id: SurveyId, flow_id: String },
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiCall::CreateSurvey { name } => write!(f, "create survey {:?}", name),
            ApiCall::GetSurvey { survey_id } => write!(f, "get survey {}", survey_id),
            ApiCall::DeleteSurvey { survey_id } => write!(f, "delete survey {}", survey_id),
            ApiCall::ListSurveys => write!(f, "list surveys"),
            ApiCall::GetSurveyOptions { survey_id } => {
                write!(f, "get options of survey {}", survey_id)
            }
            ApiCall::UpdateSurveyOptions { survey_id } => {
                write!(f, "update options of survey {}", survey_id)
            }
            ApiCall::CreateBlock { survey_id } => write!(f, "create block in survey {}", survey_id),
            ApiCall::GetBlock { survey_id, block_id } => {
                write!(f, "get block {} of survey {}", block_id, survey_id)
            }
            ApiCall::UpdateBlock { survey_id, block_id } => {
                write!(f, "update block {} of survey {}", block_id, survey_id)
            }
            ApiCall::DeleteBlock { survey_id, block_id } => {
                write!(f, "delete block {} of survey {}", block_id, survey_id)
            }
            ApiCall::ListQuestions { survey_id } => {
                write!(f, "list questions of survey {}", survey_id)
            }
            ApiCall::GetQuestion {
                survey_id,
                question_id,
            } => write!(f, "get question {} of survey {}", question_id, survey_id),
            ApiCall::UpdateQuestion {
                survey_id,
                question_id,
            } => write!(f, "update question {} of survey {}", question_id, survey_id),
            ApiCall::DeleteQuestion {
                survey_id,
                question_id,
            } => write!(f, "delete question {} of survey {}", question_id, survey_id),
            ApiCall::CreateElement { survey_id, block_id } => write!(
                f,
                "create question in block {} of survey {}",
                block_id.as_deref().unwrap_or("<default>"),
                survey_id
            ),
            ApiCall::CreatePageBreak { survey_id, block_id } => write!(
                f,
                "append page break to block {} of survey {}",
                block_id.as_deref().unwrap_or("<default>"),
                survey_id
            ),
            ApiCall::GetFlow { survey_id } => write!(f, "get flow of survey {}", survey_id),
            ApiCall::UpdateFlow { survey_id } => write!(f, "update flow of survey {}", survey_id),
            ApiCall::UpdateFlowElement { survey_id, flow_id } => {
                write!(f, "update flow element {} of survey {}", flow_id, survey_id)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("{call} rejected with status {status}: {message}")]
    RemoteRejection {
        call: ApiCall,
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{call} failed before a response arrived: {source}")]
    Transport {
        call: ApiCall,
        #[source]
        source: reqwest::Error,
    },

    #[error("{call} returned an unexpected response: {detail}")]
    MalformedResponse { call: ApiCall, detail: String },

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurveyError {
    /// The API call that failed, for remote-side errors.
    pub fn call(&self) -> Option<&ApiCall> {
        match self {
            SurveyError::RemoteRejection { call, .. }
            | SurveyError::Transport { call, .. }
            | SurveyError::MalformedResponse { call, .. } => Some(call),
            _ => None,
        }
    }

    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, SurveyError::RemoteRejection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_names_the_call() {
        let err = SurveyError::RemoteRejection {
            call: ApiCall::CreateBlock {
                survey_id: "SV_1".to_string(),
            },
            status: 400,
            code: Some("QVAL_1".to_string()),
            message: "Invalid request".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "create block in survey SV_1 rejected with status 400: Invalid request"
        );
        assert!(err.is_remote_rejection());
        assert!(matches!(err.call(), Some(ApiCall::CreateBlock { .. })));
    }

    #[test]
    fn test_default_block_is_named_in_element_calls() {
        let call = ApiCall::CreateElement {
            survey_id: "SV_1".to_string(),
            block_id: None,
        };
        assert_eq!(call.to_string(), "create question in block <default> of survey SV_1");
    }
}
