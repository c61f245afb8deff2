use qualtrics_builder::client::CallKind;
use qualtrics_builder::{
    ApiCall, Block, BlockRandomizer, FlowNode, FlowTree, QuestionList, RecordedCall,
    RecordingClient, Survey, SurveyError, TextGraphicQuestion,
};
use serde_json::Value;

fn block_of_four(label: &str) -> Block {
    Block::with_elements(
        label,
        (1..=4).map(|i| TextGraphicQuestion::new(format!("{} question {}", label, i))),
    )
}

fn kinds(client: &RecordingClient) -> Vec<CallKind> {
    client.calls().iter().map(|call| call.kind()).collect()
}

fn flow_survey() -> Survey {
    let mut tree = FlowTree::new();
    let keys: Vec<_> = ["A", "B", "C"]
        .iter()
        .map(|label| tree.add_block(block_of_four(label)))
        .collect();
    let randomizer =
        BlockRandomizer::new(1, true, keys.into_iter().map(FlowNode::block).collect()).unwrap();
    tree.append(randomizer);
    Survey::new("Flow Survey", tree)
}

fn block_ids_in_flow(flow: &Value, out: &mut Vec<String>) {
    if flow["Type"] == "Block" {
        if let Some(id) = flow["ID"].as_str() {
            out.push(id.to_string());
        }
    }
    if let Some(children) = flow["Flow"].as_array() {
        for child in children {
            block_ids_in_flow(child, out);
        }
    }
}

#[tokio::test]
async fn test_flat_survey_makes_exactly_two_calls() {
    let client = RecordingClient::new();
    let mut list = QuestionList::new();
    list.append(TextGraphicQuestion::new("Hello, world!"));
    let mut survey = Survey::new("Test Survey", list);

    let result = survey.create(&client).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        RecordedCall::CreateSurvey {
            name: "Test Survey".to_string()
        }
    );
    match &calls[1] {
        RecordedCall::CreateElement {
            survey_id,
            block_id,
            payload,
        } => {
            assert_eq!(survey_id, &result.survey_id);
            assert_eq!(block_id, &None);
            assert_eq!(payload["QuestionText"], "Hello, world!");
        }
        other => panic!("expected an element create, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blocked_survey_is_created_block_major() {
    let client = RecordingClient::new();
    let mut survey = Survey::blocked("Blocked");
    for label in ["A", "B", "C"] {
        survey.as_blocked_mut().unwrap().append(block_of_four(label));
    }

    survey.create(&client).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 14);
    assert_eq!(calls[0].kind(), CallKind::CreateSurvey);

    let mut expected = vec![CallKind::CreateSurvey];
    for _ in 0..3 {
        expected.push(CallKind::CreateBlock);
        expected.extend([CallKind::CreateElement; 4]);
    }
    assert_eq!(kinds(&client), expected);

    // every element lands in the block created just before it
    let mut blocks_seen = 0;
    for call in calls.iter().skip(1) {
        match call {
            RecordedCall::CreateBlock { .. } => blocks_seen += 1,
            RecordedCall::CreateElement { block_id, .. } => {
                assert_eq!(block_id.as_deref(), Some(format!("BL_{}", blocks_seen).as_str()));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    let blocks = &survey.as_blocked_mut().unwrap().blocks;
    let block_ids: Vec<_> = blocks.iter().map(|b| b.id().unwrap().to_string()).collect();
    assert_eq!(block_ids, vec!["BL_1", "BL_2", "BL_3"]);
}

#[tokio::test]
async fn test_flow_survey_uploads_flow_last() {
    let client = RecordingClient::new();
    let mut survey = flow_survey();

    let result = survey.create(&client).await.unwrap();
    assert_eq!(result.blocks_created, 3);
    assert_eq!(result.elements_created, 12);

    let calls = client.calls();
    assert_eq!(calls.len(), 1 + 3 + 12 + 1);
    assert_eq!(client.calls_of(CallKind::CreateBlock).len(), 3);
    assert_eq!(client.calls_of(CallKind::CreateElement).len(), 12);

    let flow = match calls.last() {
        Some(RecordedCall::UpdateFlow { flow, .. }) => flow.clone(),
        other => panic!("expected the flow update last, got {:?}", other),
    };
    assert_eq!(flow["Type"], "Root");

    let randomizer = &flow["Flow"][0];
    assert_eq!(randomizer["Type"], "BlockRandomizer");
    assert_eq!(randomizer["SubSet"], 1);
    assert_eq!(randomizer["Flow"].as_array().unwrap().len(), 3);

    let mut referenced = Vec::new();
    block_ids_in_flow(&flow, &mut referenced);
    assert_eq!(referenced, vec!["BL_1", "BL_2", "BL_3"]);
}

#[tokio::test]
async fn test_failed_block_create_stops_everything_after_it() {
    let client = RecordingClient::new();
    client.fail_on(CallKind::CreateBlock, 2);
    let mut survey = flow_survey();

    let err = survey.create(&client).await.unwrap_err();

    match &err {
        SurveyError::RemoteRejection { call, .. } => {
            assert_eq!(
                call,
                &ApiCall::CreateBlock {
                    survey_id: "SV_1".to_string()
                }
            );
        }
        other => panic!("expected a remote rejection, got {:?}", other),
    }

    // first block fully populated, second block attempted, nothing after
    assert_eq!(
        kinds(&client),
        vec![
            CallKind::CreateSurvey,
            CallKind::CreateBlock,
            CallKind::CreateElement,
            CallKind::CreateElement,
            CallKind::CreateElement,
            CallKind::CreateElement,
            CallKind::CreateBlock,
        ]
    );
    assert!(client.calls_of(CallKind::UpdateFlow).is_empty());
}

#[tokio::test]
async fn test_shared_block_is_created_once() {
    let client = RecordingClient::new();
    let mut tree = FlowTree::new();
    let shared = tree.add_block(block_of_four("Shared"));
    tree.append(FlowNode::block(shared));
    tree.append(FlowNode::group_of("Again", vec![FlowNode::block(shared)]));
    tree.append(FlowNode::EndSurvey);
    let mut survey = Survey::new("Shared", tree);

    survey.create(&client).await.unwrap();

    assert_eq!(client.calls_of(CallKind::CreateBlock).len(), 1);
    let flow = match client.calls().last() {
        Some(RecordedCall::UpdateFlow { flow, .. }) => flow.clone(),
        other => panic!("expected the flow update last, got {:?}", other),
    };
    let mut referenced = Vec::new();
    block_ids_in_flow(&flow, &mut referenced);
    assert_eq!(referenced, vec!["BL_1", "BL_1"]);
    assert_eq!(flow["Properties"]["Count"], 5);
}

#[tokio::test]
async fn test_second_create_makes_a_new_survey() {
    let client = RecordingClient::new();
    let mut survey = flow_survey();

    let first = survey.create(&client).await.unwrap();
    let second = survey.create(&client).await.unwrap();

    assert_eq!(first.survey_id, "SV_1");
    assert_eq!(second.survey_id, "SV_2");
    assert_eq!(survey.id(), Some("SV_2"));
    assert_eq!(client.calls_of(CallKind::CreateBlock).len(), 6);
}
