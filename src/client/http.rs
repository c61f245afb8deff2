use log::debug;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

use crate::client::traits::PlatformClient;
use crate::error::{ApiCall, SurveyError, SurveyResult};
use crate::model::{BlockId, QuestionId, SurveyId, SurveyOptions, SurveySummary};

pub const DEFAULT_USER_AGENT: &str = "user of library qualtrics-builder";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Qualtrics survey-definitions API over HTTPS.
///
/// Holds the data center URL and the API token every call needs. Responses
/// are unwrapped from the platform's `{"result": ..., "meta": ...}` envelope.
#[derive(Debug, Clone)]
pub struct QualtricsClient {
    client: Client,
    web_base_url: String,
    api_base_url: String,
    api_token: String,
}

impl QualtricsClient {
    /// Client for the data center subdomain, e.g. `"syd1"` or
    /// `"melbourneuni.au1"`.
    pub fn new(api_token: impl Into<String>, data_center: &str) -> SurveyResult<Self> {
        Self::with_base_url(
            api_token,
            &format!("https://{}.qualtrics.com", data_center),
            DEFAULT_USER_AGENT,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Client against an explicit web root (proxies, test servers).
    pub fn with_base_url(
        api_token: impl Into<String>,
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> SurveyResult<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(SurveyError::Configuration(
                "a Qualtrics API token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SurveyError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let web_base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_base_url: format!("{}/API/v3/", web_base_url),
            web_base_url,
            api_token,
        })
    }

    async fn request(
        &self,
        call: ApiCall,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> SurveyResult<Value> {
        let url = format!("{}{}", self.api_base_url, endpoint);
        self.request_url(call, method, &url, body).await
    }

    async fn request_url(
        &self,
        call: ApiCall,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> SurveyResult<Value> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("x-api-token", &self.api_token)
            .header("accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(SurveyError::Transport { call, source }),
        };
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(source) => return Err(SurveyError::Transport { call, source }),
        };
        debug!("[qualtrics] {} {} -> {} {}", method, url, status.as_u16(), text);

        let parsed: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            let error = &parsed["meta"]["error"];
            let message = error["errorMessage"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| match &parsed {
                    Value::String(raw) => raw.clone(),
                    Value::Null => status.canonical_reason().unwrap_or("").to_string(),
                    other => other.to_string(),
                });
            return Err(SurveyError::RemoteRejection {
                call,
                status: status.as_u16(),
                code: error["errorCode"].as_str().map(str::to_string),
                message,
            });
        }

        Ok(match parsed {
            Value::Object(mut envelope) => envelope.remove("result").unwrap_or(Value::Null),
            _ => Value::Null,
        })
    }

    /// Current options of a survey.
    pub async fn get_survey_options(&self, survey_id: &str) -> SurveyResult<SurveyOptions> {
        let call = ApiCall::GetSurveyOptions {
            survey_id: survey_id.to_string(),
        };
        let result = self
            .request(
                call.clone(),
                Method::GET,
                &format!("survey-definitions/{}/options", survey_id),
                None,
            )
            .await?;
        match result {
            Value::Object(map) => Ok(SurveyOptions::from(map)),
            Value::Null => Ok(SurveyOptions::new()),
            other => Err(SurveyError::MalformedResponse {
                call,
                detail: format!("options are not an object: {}", other),
            }),
        }
    }

    /// Replace the whole option set of a survey. Options missing from
    /// `options` fall back to the platform's defaults.
    pub async fn replace_survey_options(
        &self,
        survey_id: &str,
        options: &SurveyOptions,
    ) -> SurveyResult<()> {
        let call = ApiCall::UpdateSurveyOptions {
            survey_id: survey_id.to_string(),
        };
        self.request(
            call,
            Method::PUT,
            &format!("survey-definitions/{}/options", survey_id),
            Some(&options.clone().into_value()),
        )
        .await?;
        Ok(())
    }

    pub async fn list_questions(&self, survey_id: &str) -> SurveyResult<Vec<Value>> {
        let call = ApiCall::ListQuestions {
            survey_id: survey_id.to_string(),
        };
        let result = self
            .request(
                call.clone(),
                Method::GET,
                &format!("survey-definitions/{}/questions", survey_id),
                None,
            )
            .await?;
        elements_of(call, result)
    }

    pub async fn get_question(&self, survey_id: &str, question_id: &str) -> SurveyResult<Value> {
        let call = ApiCall::GetQuestion {
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
        };
        self.request(
            call,
            Method::GET,
            &format!("survey-definitions/{}/questions/{}", survey_id, question_id),
            None,
        )
        .await
    }

    /// Replace a question's definition with `question`.
    pub async fn update_question(
        &self,
        survey_id: &str,
        question_id: &str,
        question: &Value,
    ) -> SurveyResult<()> {
        let call = ApiCall::UpdateQuestion {
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
        };
        self.request(
            call,
            Method::PUT,
            &format!("survey-definitions/{}/questions/{}", survey_id, question_id),
            Some(question),
        )
        .await?;
        Ok(())
    }

    /// Overwrite only the top-level fields present in `fields`, keeping the
    /// rest of the remote question definition.
    pub async fn partial_update_question(
        &self,
        survey_id: &str,
        question_id: &str,
        fields: &Value,
    ) -> SurveyResult<()> {
        let current = self.get_question(survey_id, question_id).await?;
        let call = ApiCall::GetQuestion {
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
        };
        let merged = merge_fields(call, current, fields)?;
        self.update_question(survey_id, question_id, &merged).await
    }

    pub async fn delete_question(&self, survey_id: &str, question_id: &str) -> SurveyResult<()> {
        let call = ApiCall::DeleteQuestion {
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
        };
        self.request(
            call,
            Method::DELETE,
            &format!("survey-definitions/{}/questions/{}", survey_id, question_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// Every block of a survey, taken from the full survey definition.
    pub async fn list_blocks(&self, survey_id: &str) -> SurveyResult<Vec<Value>> {
        let survey = self.get_survey(survey_id).await?;
        match survey["Blocks"].as_object() {
            Some(blocks) => Ok(blocks.values().cloned().collect()),
            None => Err(SurveyError::MalformedResponse {
                call: ApiCall::GetSurvey {
                    survey_id: survey_id.to_string(),
                },
                detail: "survey definition has no Blocks map".to_string(),
            }),
        }
    }

    pub async fn get_block(&self, survey_id: &str, block_id: &str) -> SurveyResult<Value> {
        let call = ApiCall::GetBlock {
            survey_id: survey_id.to_string(),
            block_id: block_id.to_string(),
        };
        self.request(
            call,
            Method::GET,
            &format!("survey-definitions/{}/blocks/{}", survey_id, block_id),
            None,
        )
        .await
    }

    pub async fn update_block(
        &self,
        survey_id: &str,
        block_id: &str,
        block: &Value,
    ) -> SurveyResult<()> {
        let call = ApiCall::UpdateBlock {
            survey_id: survey_id.to_string(),
            block_id: block_id.to_string(),
        };
        self.request(
            call,
            Method::PUT,
            &format!("survey-definitions/{}/blocks/{}", survey_id, block_id),
            Some(block),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_block(&self, survey_id: &str, block_id: &str) -> SurveyResult<()> {
        let call = ApiCall::DeleteBlock {
            survey_id: survey_id.to_string(),
            block_id: block_id.to_string(),
        };
        self.request(
            call,
            Method::DELETE,
            &format!("survey-definitions/{}/blocks/{}", survey_id, block_id),
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn get_flow(&self, survey_id: &str) -> SurveyResult<Value> {
        let call = ApiCall::GetFlow {
            survey_id: survey_id.to_string(),
        };
        self.request(
            call,
            Method::GET,
            &format!("survey-definitions/{}/flow", survey_id),
            None,
        )
        .await
    }

    /// Replace a single flow element, addressed by its `FL_n` ID.
    pub async fn update_flow_element(
        &self,
        survey_id: &str,
        flow_id: &str,
        element: &Value,
    ) -> SurveyResult<()> {
        let call = ApiCall::UpdateFlowElement {
            survey_id: survey_id.to_string(),
            flow_id: flow_id.to_string(),
        };
        self.request(
            call,
            Method::PUT,
            &format!("survey-definitions/{}/flow/{}", survey_id, flow_id),
            Some(element),
        )
        .await?;
        Ok(())
    }

    /// The default block every new survey starts with.
    async fn default_block_id(&self, survey_id: &str) -> SurveyResult<BlockId> {
        let survey = self.get_survey(survey_id).await?;
        let blocks = survey["Blocks"].as_object().cloned().unwrap_or_default();
        blocks
            .iter()
            .find(|(_, block)| block["Type"] == "Default")
            .map(|(key, block)| block["ID"].as_str().unwrap_or(key.as_str()).to_string())
            .ok_or_else(|| SurveyError::MalformedResponse {
                call: ApiCall::GetSurvey {
                    survey_id: survey_id.to_string(),
                },
                detail: "survey definition has no default block".to_string(),
            })
    }
}

/// The item list of a listing result, bare or wrapped in `elements`.
fn elements_of(call: ApiCall, result: Value) -> SurveyResult<Vec<Value>> {
    match result {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("elements") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SurveyError::MalformedResponse {
                call,
                detail: "listing has no elements".to_string(),
            }),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(SurveyError::MalformedResponse {
            call,
            detail: format!("unexpected listing: {}", other),
        }),
    }
}

/// Overlay the top-level keys of `fields` onto `current`.
fn merge_fields(call: ApiCall, current: Value, fields: &Value) -> SurveyResult<Value> {
    match (current, fields) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                base.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(base))
        }
        (current, _) => Err(SurveyError::MalformedResponse {
            call,
            detail: format!("cannot merge {} into {}", fields, current),
        }),
    }
}

/// Pull a string ID field out of a create call's result.
fn id_field(call: ApiCall, result: &Value, field: &str) -> SurveyResult<String> {
    match result[field].as_str() {
        Some(id) => Ok(id.to_string()),
        None => Err(SurveyError::MalformedResponse {
            call,
            detail: format!("missing {} in {}", field, result),
        }),
    }
}

#[async_trait::async_trait]
impl PlatformClient for QualtricsClient {
    async fn create_survey(&self, name: &str) -> SurveyResult<SurveyId> {
        let call = ApiCall::CreateSurvey {
            name: name.to_string(),
        };
        let body = json!({
            "SurveyName": name,
            "Language": "EN",
            "ProjectCategory": "CORE",
        });
        let result = self
            .request(call.clone(), Method::POST, "survey-definitions", Some(&body))
            .await?;
        id_field(call, &result, "SurveyID")
    }

    async fn update_survey_options(
        &self,
        survey_id: &str,
        options: &SurveyOptions,
    ) -> SurveyResult<()> {
        let mut merged = self.get_survey_options(survey_id).await?;
        merged.merge(options.clone());
        self.replace_survey_options(survey_id, &merged).await
    }

    async fn create_block(&self, survey_id: &str, description: &str) -> SurveyResult<BlockId> {
        let call = ApiCall::CreateBlock {
            survey_id: survey_id.to_string(),
        };
        let body = json!({
            "Description": description,
            "Type": "Standard",
        });
        let result = self
            .request(
                call.clone(),
                Method::POST,
                &format!("survey-definitions/{}/blocks", survey_id),
                Some(&body),
            )
            .await?;
        id_field(call, &result, "BlockID")
    }

    async fn create_element(
        &self,
        survey_id: &str,
        block_id: Option<&str>,
        payload: &Value,
    ) -> SurveyResult<QuestionId> {
        let call = ApiCall::CreateElement {
            survey_id: survey_id.to_string(),
            block_id: block_id.map(str::to_string),
        };
        let query = block_id
            .map(|id| format!("?blockId={}", id))
            .unwrap_or_default();
        let result = self
            .request(
                call.clone(),
                Method::POST,
                &format!("survey-definitions/{}/questions{}", survey_id, query),
                Some(payload),
            )
            .await?;
        id_field(call, &result, "QuestionID")
    }

    async fn create_page_break(&self, survey_id: &str, block_id: Option<&str>) -> SurveyResult<()> {
        // no dedicated route: rewrite the block with one more element
        let block_id = match block_id {
            Some(id) => id.to_string(),
            None => self.default_block_id(survey_id).await?,
        };
        let mut block = self.get_block(survey_id, &block_id).await?;
        let malformed = |detail: &str| SurveyError::MalformedResponse {
            call: ApiCall::GetBlock {
                survey_id: survey_id.to_string(),
                block_id: block_id.clone(),
            },
            detail: detail.to_string(),
        };
        let Some(fields) = block.as_object_mut() else {
            return Err(malformed("block definition is not an object"));
        };
        match fields
            .entry("BlockElements")
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(elements) => elements.push(json!({ "Type": "Page Break" })),
            other => {
                return Err(malformed(&format!(
                    "BlockElements is not a list: {}",
                    other
                )))
            }
        }
        self.update_block(survey_id, &block_id, &block).await
    }

    async fn update_flow(&self, survey_id: &str, flow: &Value) -> SurveyResult<()> {
        let call = ApiCall::UpdateFlow {
            survey_id: survey_id.to_string(),
        };
        self.request(
            call,
            Method::PUT,
            &format!("survey-definitions/{}/flow", survey_id),
            Some(flow),
        )
        .await?;
        Ok(())
    }

    async fn get_survey(&self, survey_id: &str) -> SurveyResult<Value> {
        let call = ApiCall::GetSurvey {
            survey_id: survey_id.to_string(),
        };
        self.request(
            call,
            Method::GET,
            &format!("survey-definitions/{}", survey_id),
            None,
        )
        .await
    }

    async fn delete_survey(&self, survey_id: &str) -> SurveyResult<()> {
        let call = ApiCall::DeleteSurvey {
            survey_id: survey_id.to_string(),
        };
        self.request(
            call,
            Method::DELETE,
            &format!("survey-definitions/{}", survey_id),
            None,
        )
        .await?;
        Ok(())
    }

    async fn list_surveys(&self) -> SurveyResult<Vec<SurveySummary>> {
        let mut surveys = Vec::new();
        let mut page = self
            .request(ApiCall::ListSurveys, Method::GET, "surveys", None)
            .await?;
        loop {
            let elements = page["elements"].clone();
            let batch: Vec<SurveySummary> = serde_json::from_value(elements).map_err(|e| {
                SurveyError::MalformedResponse {
                    call: ApiCall::ListSurveys,
                    detail: e.to_string(),
                }
            })?;
            surveys.extend(batch);

            match page["nextPage"].as_str() {
                Some(next) if !next.is_empty() => {
                    let next = next.to_string();
                    page = self
                        .request_url(ApiCall::ListSurveys, Method::GET, &next, None)
                        .await?;
                }
                _ => break,
            }
        }
        Ok(surveys)
    }

    fn web_base_url(&self) -> &str {
        &self.web_base_url
    }
}
