use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use parking_lot::Mutex;
use qualtrics_builder::{
    ApiCall, Block, PlatformClient, QualtricsClient, SurveyError, SurveyOptions, Survey,
    TextEntryQuestion, TextGraphicQuestion,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const TOKEN: &str = "secret-token";

#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    token: Option<String>,
    user_agent: Option<String>,
    body: Value,
}

/// Minimal stand-in for the survey-definitions API.
#[derive(Clone)]
struct FakeQualtrics {
    base_url: String,
    requests: Arc<Mutex<Vec<Request>>>,
    next_id: Arc<AtomicUsize>,
}

impl FakeQualtrics {
    fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    fn routes(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn reject(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "meta": {
                "httpStatus": status.to_string(),
                "error": { "errorMessage": message, "errorCode": code },
            }
        })),
    )
}

fn block_definition(description: &str) -> Value {
    json!({
        "Type": "Standard",
        "Description": description,
        "BlockElements": [{ "Type": "Question", "QuestionID": "QID1" }],
    })
}

async fn handle(
    State(fake): State<FakeQualtrics>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let token = header("x-api-token");
    fake.requests.lock().push(Request {
        method: method.to_string(),
        path: uri
            .path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        token: token.clone(),
        user_agent: header("user-agent"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    if token.as_deref() != Some(TOKEN) {
        return reject(StatusCode::UNAUTHORIZED, "AUTH_1", "invalid API token");
    }

    let path = uri.path().strip_prefix("/API/v3/").unwrap_or("");
    let segments: Vec<&str> = path.split('/').collect();
    let result = match (method.as_str(), segments.as_slice()) {
        ("POST", ["survey-definitions"]) => json!({ "SurveyID": "SV_http" }),
        ("GET", ["survey-definitions", id]) => json!({
            "SurveyID": id,
            "Blocks": {
                "BL_first": { "Type": "Standard", "Description": "Other", "ID": "BL_first" },
                "BL_default": { "Type": "Default", "Description": "Default Question Block", "ID": "BL_default" },
            }
        }),
        ("DELETE", ["survey-definitions", _]) => Value::Null,
        ("GET", ["survey-definitions", _, "options"]) => {
            json!({ "BackButton": "false", "Header": "old header" })
        }
        ("PUT", ["survey-definitions", _, "options"])
        | ("PUT", ["survey-definitions", _, "flow"])
        | ("PUT", ["survey-definitions", _, "flow", _])
        | ("PUT", ["survey-definitions", _, "blocks", _])
        | ("PUT", ["survey-definitions", _, "questions", _])
        | ("DELETE", ["survey-definitions", _, "blocks", _])
        | ("DELETE", ["survey-definitions", _, "questions", _]) => Value::Null,
        ("GET", ["survey-definitions", _, "blocks", "BL_null"]) => json!({
            "Type": "Standard",
            "Description": "x",
            "BlockElements": null,
        }),
        ("POST", ["survey-definitions", _, "blocks"]) => {
            json!({ "BlockID": format!("BL_{}", fake.next_id()) })
        }
        ("GET", ["survey-definitions", _, "blocks", id]) => block_definition(id),
        ("GET", ["survey-definitions", _, "questions"]) => json!({
            "elements": [
                { "QuestionID": "QID1", "QuestionType": "DB" },
                { "QuestionID": "QID2", "QuestionType": "TE" },
            ]
        }),
        ("GET", ["survey-definitions", _, "questions", id]) => json!({
            "QuestionID": id,
            "QuestionText": "old text",
            "QuestionType": "DB",
        }),
        ("GET", ["survey-definitions", _, "flow"]) => json!({
            "FlowID": "FL_1",
            "Type": "Root",
            "Flow": [{ "FlowID": "FL_2", "Type": "Block", "ID": "BL_first" }],
        }),
        ("POST", ["survey-definitions", _, "questions"]) => {
            if uri.query() == Some("blockId=BL_bad") {
                return reject(StatusCode::BAD_REQUEST, "QVAL_1", "Invalid QuestionType");
            }
            json!({ "QuestionID": format!("QID{}", fake.next_id()) })
        }
        ("GET", ["surveys"]) => {
            if uri.query() == Some("offset=2") {
                json!({ "elements": [{ "id": "SV_3", "name": "Third" }] })
            } else {
                json!({
                    "elements": [
                        { "id": "SV_1", "name": "Test Survey", "ownerId": "UR_1", "isActive": true },
                        { "id": "SV_2", "name": "Other" },
                    ],
                    "nextPage": format!("{}/API/v3/surveys?offset=2", fake.base_url),
                })
            }
        }
        _ => return reject(StatusCode::NOT_FOUND, "NOT_FOUND", "no such route"),
    };

    (
        StatusCode::OK,
        Json(json!({ "result": result, "meta": { "httpStatus": "200 - OK" } })),
    )
}

async fn spawn_fake() -> FakeQualtrics {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = FakeQualtrics {
        base_url: format!("http://{}", addr),
        requests: Arc::new(Mutex::new(Vec::new())),
        next_id: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new().fallback(handle).with_state(fake.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    fake
}

fn client_for(fake: &FakeQualtrics, token: &str) -> QualtricsClient {
    QualtricsClient::with_base_url(token, &fake.base_url, "test-agent", Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn test_create_survey_sends_shell_and_unwraps_id() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let survey_id = client.create_survey("Test Survey").await.unwrap();
    assert_eq!(survey_id, "SV_http");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/API/v3/survey-definitions");
    assert_eq!(requests[0].token.as_deref(), Some(TOKEN));
    assert_eq!(requests[0].user_agent.as_deref(), Some("test-agent"));
    assert_eq!(
        requests[0].body,
        json!({ "SurveyName": "Test Survey", "Language": "EN", "ProjectCategory": "CORE" })
    );
}

#[tokio::test]
async fn test_options_update_keeps_existing_options() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let mut options = SurveyOptions::new();
    options.set_show_back_button(true);
    client.update_survey_options("SV_http", &options).await.unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http/options",
            "PUT /API/v3/survey-definitions/SV_http/options",
        ]
    );
    assert_eq!(
        fake.requests()[1].body,
        json!({ "BackButton": "true", "Header": "old header" })
    );
}

#[tokio::test]
async fn test_page_break_without_block_goes_to_default_block() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    client.create_page_break("SV_http", None).await.unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http",
            "GET /API/v3/survey-definitions/SV_http/blocks/BL_default",
            "PUT /API/v3/survey-definitions/SV_http/blocks/BL_default",
        ]
    );
    let updated = &fake.requests()[2].body;
    assert_eq!(
        updated["BlockElements"],
        json!([
            { "Type": "Question", "QuestionID": "QID1" },
            { "Type": "Page Break" },
        ])
    );
}

#[tokio::test]
async fn test_rejection_carries_platform_error() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let err = client
        .create_element("SV_http", Some("BL_bad"), &json!({ "QuestionType": "??" }))
        .await
        .unwrap_err();

    match err {
        SurveyError::RemoteRejection {
            call,
            status,
            code,
            message,
        } => {
            assert_eq!(
                call,
                ApiCall::CreateElement {
                    survey_id: "SV_http".to_string(),
                    block_id: Some("BL_bad".to_string()),
                }
            );
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("QVAL_1"));
            assert_eq!(message, "Invalid QuestionType");
        }
        other => panic!("expected a remote rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_token_is_rejected() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, "wrong");

    let err = client.delete_survey("SV_http").await.unwrap_err();
    assert!(matches!(
        err,
        SurveyError::RemoteRejection { status: 401, .. }
    ));
}

#[tokio::test]
async fn test_list_surveys_follows_next_page() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let surveys = client.list_surveys().await.unwrap();
    let ids: Vec<&str> = surveys.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["SV_1", "SV_2", "SV_3"]);
    assert_eq!(surveys[0].owner_id.as_deref(), Some("UR_1"));
    assert_eq!(fake.requests().len(), 2);
}

#[tokio::test]
async fn test_blocked_survey_over_http() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let mut survey = Survey::blocked("Over HTTP");
    let block = survey.as_blocked_mut().unwrap().append(Block::new("Only"));
    block.append(TextGraphicQuestion::new("Hello")).unwrap();
    block.append_page_break().unwrap();
    block.append(TextEntryQuestion::new("name", "Name?")).unwrap();

    let result = survey.create(&client).await.unwrap();
    assert_eq!(result.survey_id, "SV_http");
    assert_eq!(
        result.links.preview,
        format!("{}/jfe/preview/SV_http", fake.base_url)
    );

    assert_eq!(
        fake.routes(),
        vec![
            "POST /API/v3/survey-definitions",
            "POST /API/v3/survey-definitions/SV_http/blocks",
            "POST /API/v3/survey-definitions/SV_http/questions?blockId=BL_1",
            "GET /API/v3/survey-definitions/SV_http/blocks/BL_1",
            "PUT /API/v3/survey-definitions/SV_http/blocks/BL_1",
            "POST /API/v3/survey-definitions/SV_http/questions?blockId=BL_1",
        ]
    );

    let ids: Vec<Option<&str>> = survey.as_blocked_mut().unwrap().blocks[0]
        .elements()
        .iter()
        .map(|e| e.id())
        .collect();
    assert_eq!(ids, vec![Some("QID2"), None, Some("QID3")]);
}

#[tokio::test]
async fn test_page_break_into_malformed_block_fails() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let err = client
        .create_page_break("SV_http", Some("BL_null"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SurveyError::MalformedResponse {
            call: ApiCall::GetBlock { .. },
            ..
        }
    ));
    // the block is never written back
    assert_eq!(
        fake.routes(),
        vec!["GET /API/v3/survey-definitions/SV_http/blocks/BL_null"]
    );
}

#[tokio::test]
async fn test_question_routes() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let questions = client.list_questions("SV_http").await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1]["QuestionID"], "QID2");

    let question = client.get_question("SV_http", "QID1").await.unwrap();
    assert_eq!(question["QuestionText"], "old text");

    client
        .partial_update_question("SV_http", "QID1", &json!({ "QuestionText": "new text" }))
        .await
        .unwrap();
    client.delete_question("SV_http", "QID2").await.unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http/questions",
            "GET /API/v3/survey-definitions/SV_http/questions/QID1",
            "GET /API/v3/survey-definitions/SV_http/questions/QID1",
            "PUT /API/v3/survey-definitions/SV_http/questions/QID1",
            "DELETE /API/v3/survey-definitions/SV_http/questions/QID2",
        ]
    );
    assert_eq!(
        fake.requests()[3].body,
        json!({ "QuestionID": "QID1", "QuestionText": "new text", "QuestionType": "DB" })
    );
}

#[tokio::test]
async fn test_block_routes() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let blocks = client.list_blocks("SV_http").await.unwrap();
    let ids: Vec<&str> = blocks.iter().filter_map(|b| b["ID"].as_str()).collect();
    assert_eq!(ids, vec!["BL_first", "BL_default"]);

    let mut block = client.get_block("SV_http", "BL_first").await.unwrap();
    block["Description"] = json!("Renamed");
    client.update_block("SV_http", "BL_first", &block).await.unwrap();
    client.delete_block("SV_http", "BL_first").await.unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http",
            "GET /API/v3/survey-definitions/SV_http/blocks/BL_first",
            "PUT /API/v3/survey-definitions/SV_http/blocks/BL_first",
            "DELETE /API/v3/survey-definitions/SV_http/blocks/BL_first",
        ]
    );
    assert_eq!(fake.requests()[2].body["Description"], "Renamed");
}

#[tokio::test]
async fn test_flow_routes() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let flow = client.get_flow("SV_http").await.unwrap();
    assert_eq!(flow["Type"], "Root");

    let element = json!({ "FlowID": "FL_2", "Type": "Block", "ID": "BL_default" });
    client
        .update_flow_element("SV_http", "FL_2", &element)
        .await
        .unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http/flow",
            "PUT /API/v3/survey-definitions/SV_http/flow/FL_2",
        ]
    );
    assert_eq!(fake.requests()[1].body, element);
}

#[tokio::test]
async fn test_replace_options_drops_existing_options() {
    let fake = spawn_fake().await;
    let client = client_for(&fake, TOKEN);

    let existing = client.get_survey_options("SV_http").await.unwrap();
    assert!(!existing.is_empty());

    let mut options = SurveyOptions::new();
    options.set_show_back_button(true);
    client.replace_survey_options("SV_http", &options).await.unwrap();

    assert_eq!(
        fake.routes(),
        vec![
            "GET /API/v3/survey-definitions/SV_http/options",
            "PUT /API/v3/survey-definitions/SV_http/options",
        ]
    );
    assert_eq!(fake.requests()[1].body, json!({ "BackButton": "true" }));
}
