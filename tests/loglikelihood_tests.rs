mod common;

use serde_json::{Value, json};
use sglang_lm::{BaseUrl, LanguageModel, LlmError, RetryConfig, lm};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use common::{BodyContains, BodyNotContains, model_for, request_bodies};

const MODEL: &str = "meta-llama/Llama-3.1-8B";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scored(normalized: &[f64]) -> Value {
    Value::Array(
        normalized
            .iter()
            .map(|score| {
                json!({
                    "text": "",
                    "meta_info": {
                        "prompt_tokens": 9,
                        "normalized_prompt_logprob": score
                    }
                })
            })
            .collect(),
    )
}

async fn mount_generate(server: &MockServer, prompt_tokens: usize, scores: Value) {
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(BodyNotContains("return_logprob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "",
            "meta_info": { "prompt_tokens": prompt_tokens }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(BodyContains("return_logprob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scores))
        .mount(server)
        .await;
}

#[tokio::test]
async fn scores_stripped_actions_against_the_server_root() {
    let server = MockServer::start().await;
    mount_generate(&server, 6, scored(&[-0.25, -1.75])).await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let scores = model
        .get_loglikelihood(
            "Q: ",
            &strings(&["Q: because it rains", "Q:  because it is sunny "]),
        )
        .await
        .expect("scoring should succeed");

    assert_eq!(scores, vec![-0.25, -1.75]);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["text"], "Q: ");
    assert_eq!(bodies[0]["sampling_params"]["max_new_tokens"], 0);
    assert_eq!(
        bodies[1]["text"],
        json!(["Q: because it rains", "Q: because it is sunny"])
    );
    assert_eq!(bodies[1]["return_logprob"], true);
    assert_eq!(bodies[1]["logprob_start_len"], 4);
}

#[tokio::test]
async fn prefix_mismatch_fails_without_touching_the_network() {
    let server = MockServer::start().await;
    mount_generate(&server, 6, scored(&[-1.0])).await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let err = model
        .get_loglikelihood("Q: ", &strings(&["Q: fine", "A: not a continuation"]))
        .await
        .unwrap_err();

    match err {
        LlmError::InvalidInput(message) => {
            assert!(message.contains("'A: not a continuation'"))
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
    assert!(request_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn short_prefixes_start_scoring_at_zero() {
    let server = MockServer::start().await;
    mount_generate(&server, 1, scored(&[-3.0])).await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    model
        .get_loglikelihood("Q", &strings(&["Q yes"]))
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[1]["logprob_start_len"], 0);
    assert_eq!(bodies[1]["text"], json!(["Qyes"]));
}

#[tokio::test]
async fn missing_normalized_score_falls_back_to_token_mean() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        4,
        json!([{
            "text": "",
            "meta_info": {
                "prompt_tokens": 6,
                "input_token_logprobs": [[-1.0, 10, "a"], [-3.0, 11, "b"]]
            }
        }]),
    )
    .await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let scores = model
        .get_loglikelihood("Q: ", &strings(&["Q: ab"]))
        .await
        .unwrap();
    assert_eq!(scores, vec![-2.0]);
}

#[tokio::test]
async fn result_count_mismatch_is_rejected() {
    let server = MockServer::start().await;
    mount_generate(&server, 6, scored(&[-0.5])).await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let err = model
        .get_loglikelihood("Q: ", &strings(&["Q: a", "Q: b"]))
        .await
        .unwrap_err();

    match err {
        LlmError::Api { message, .. } => assert!(message.contains("1 results for 2 choices")),
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn select_returns_the_most_likely_choice() {
    let server = MockServer::start().await;
    mount_generate(&server, 6, scored(&[-2.0, -0.5, -1.0])).await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let selection = model
        .select("The sky is ", &strings(&["green", "blue", "red"]))
        .await
        .unwrap();

    assert_eq!(selection.choice, "blue");
    assert_eq!(selection.index, 1);
    assert_eq!(selection.scores.len(), 3);
    assert_eq!(selection.scores[2].choice, "red");
    assert_eq!(selection.scores[2].normalized_logprob, -1.0);
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("scheduler crashed"))
        .mount(&server)
        .await;

    let (model, _) = model_for(&server, MODEL, RetryConfig::default());
    let err = model
        .get_loglikelihood("Q: ", &strings(&["Q: a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Api { status_code: Some(500), .. }));
}

#[test]
fn missing_endpoint_fails_at_construction() {
    let err = lm::model(MODEL)
        .base_url(BaseUrl::Env("SGLANG_LM_TEST_UNSET_ENDPOINT".to_string()))
        .build()
        .unwrap_err();

    match err {
        LlmError::MissingConfiguration(message) => {
            assert!(message.contains("SGLANG_LM_TEST_UNSET_ENDPOINT"))
        }
        other => panic!("Expected MissingConfiguration, got {other:?}"),
    }
}
