//! Prompting pipeline tests: real store, mocked chat-completions API.

mod common;

use chrono::Utc;

use apogee::db;
use apogee::error::AppError;
use apogee::services::agent_service;

/// Mount the tool-selection completion answering with the given tool calls
async fn mock_selection(server: &wiremock::MockServer, tool_names: &[&str]) {
    let tool_calls: Vec<serde_json::Value> = tool_names
        .iter()
        .map(|name| {
            serde_json::json!({
                "id": "call_1",
                "type": "function",
                "function": { "name": name, "arguments": "{}" }
            })
        })
        .collect();
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/chat/completions"))
        .and(wiremock::matchers::body_string_contains("decides which tools"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": null, "tool_calls": tool_calls } }]
            })),
        )
        .mount(server)
        .await;
}

/// Mount the composition completion answering with the given content
async fn mock_composition(server: &wiremock::MockServer, content: serde_json::Value) {
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/chat/completions"))
        .and(wiremock::matchers::body_string_contains(
            "Here are the results from the tools",
        ))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": content } }]
            })),
        )
        .mount(server)
        .await;
}

/// Every chat-completions request body the server received, in order
async fn completion_requests(server: &wiremock::MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/chat/completions")
        .map(|request| serde_json::from_slice(&request.body).expect("completion body"))
        .collect()
}

#[tokio::test]
async fn selection_request_carries_the_catalog_and_the_serialized_input() {
    let pool = common::test_pool().await;
    let server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&server);
    mock_selection(&server, &["getTodayLeaderboard"]).await;
    mock_composition(&server, serde_json::json!("Here's the scoop")).await;

    let response =
        agent_service::process_prompt(&pool, &openai, "leaderboard only", "who's on top?")
            .await
            .expect("prompting pipeline");
    assert_eq!(response, "Here's the scoop");

    let requests = completion_requests(&server).await;
    assert_eq!(requests.len(), 2);

    let selection = &requests[0];
    assert_eq!(selection["model"], "gpt-4.1-mini");
    assert_eq!(selection["tool_choice"], "auto");
    assert_eq!(selection["messages"][0]["role"], "system");
    assert_eq!(
        selection["messages"][0]["content"],
        "You are an assistant that decides which tools to call based on user input."
    );
    assert_eq!(selection["messages"][1]["role"], "user");
    assert_eq!(
        selection["messages"][1]["content"],
        r#"{"tools":"leaderboard only","prompt":"who's on top?"}"#
    );

    let names: Vec<&str> = selection["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .map(|tool| tool["function"]["name"].as_str().expect("name"))
        .collect();
    assert_eq!(
        names,
        vec![
            "getLastWeekLeaderboard",
            "getLastWeekTransactions",
            "getTodayLeaderboard",
        ]
    );
}

#[tokio::test]
async fn selecting_no_tools_is_an_error() {
    let pool = common::test_pool().await;
    let server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&server);

    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/chat/completions"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "I would rather chat." } }]
            })),
        )
        .mount(&server)
        .await;

    let result = agent_service::process_prompt(&pool, &openai, "anything", "hello").await;

    let err = result.expect_err("selection must fail");
    assert!(matches!(err, AppError::NoToolsSelected));
    assert_eq!(err.to_string(), "no tools were selected");
    // composition never runs on an empty selection
    assert_eq!(completion_requests(&server).await.len(), 1);
}

#[tokio::test]
async fn composition_sees_results_only_for_selected_tools() {
    let pool = common::test_pool().await;
    let server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&server);
    mock_selection(&server, &["getTodayLeaderboard"]).await;
    mock_composition(&server, serde_json::json!("done")).await;

    let alice = common::named_user(&pool, "U1ALICE", Some("Alice")).await;
    db::transaction::store_karma(&pool, &[common::storable_for(&alice, "<@U9>", 3, Utc::now())])
        .await
        .expect("seed");

    agent_service::process_prompt(&pool, &openai, "today", "standings?")
        .await
        .expect("prompting pipeline");

    let requests = completion_requests(&server).await;
    let composition = &requests[1];
    assert!(composition.get("tools").is_none());
    assert_eq!(composition["messages"][0]["role"], "system");
    assert_eq!(
        composition["messages"][0]["content"],
        "Compose a human-readable message using the provided tool data, suitable for posting in Slack."
    );
    assert_eq!(composition["messages"][1]["role"], "user");
    assert_eq!(composition["messages"][1]["content"], "standings?");
    assert_eq!(composition["messages"][2]["role"], "system");

    let results = composition["messages"][2]["content"]
        .as_str()
        .expect("results message");
    assert!(results.starts_with("Here are the results from the tools: "));
    assert!(results.contains(r#""getTodayLeaderboard""#));
    assert!(results.contains("Alice"));
    // unselected slots still serialize, as empty lists
    assert!(results.contains(r#""getLastWeekLeaderboard": []"#));
    assert!(results.contains(r#""getLastWeekTransactions": []"#));
}

#[tokio::test]
async fn a_composition_without_content_is_an_empty_message() {
    let pool = common::test_pool().await;
    let server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&server);
    mock_selection(&server, &["getLastWeekLeaderboard"]).await;
    mock_composition(&server, serde_json::Value::Null).await;

    let response = agent_service::process_prompt(&pool, &openai, "weekly", "who won?")
        .await
        .expect("prompting pipeline");
    assert_eq!(response, "");
}

#[tokio::test]
async fn the_weekly_summary_composes_from_all_three_tools_in_one_call() {
    let pool = common::test_pool().await;
    let server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&server);
    mock_composition(&server, serde_json::json!("Your week in karma")).await;

    let response = agent_service::weekly_summary(&pool, &openai, "recap please")
        .await
        .expect("weekly summary");
    assert_eq!(response, "Your week in karma");

    let requests = completion_requests(&server).await;
    assert_eq!(requests.len(), 1);
    let results = requests[0]["messages"][2]["content"]
        .as_str()
        .expect("results message");
    assert!(results.contains(r#""getLastWeekLeaderboard""#));
    assert!(results.contains(r#""getLastWeekTransactions""#));
    assert!(results.contains(r#""getTodayLeaderboard""#));
}

#[tokio::test]
async fn kata_prompting_posts_the_composed_message_to_the_channel() {
    let pool = common::test_pool().await;
    let openai_server = wiremock::MockServer::start().await;
    let slack_server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&openai_server);
    let slack = common::slack_client(&slack_server);
    mock_selection(&openai_server, &["getLastWeekTransactions"]).await;
    mock_composition(&openai_server, serde_json::json!("The summary")).await;
    common::mock_post_message(&slack_server).await;

    agent_service::run_kata_prompting(
        &pool,
        &slack,
        &openai,
        "C0REPORTS",
        "transactions",
        "what happened this week?",
    )
    .await
    .expect("kata prompting");

    assert_eq!(
        common::posted_messages(&slack_server).await,
        vec!["The summary".to_string()]
    );
}

#[tokio::test]
async fn the_weekly_summary_posts_to_the_requested_channel() {
    let pool = common::test_pool().await;
    let openai_server = wiremock::MockServer::start().await;
    let slack_server = wiremock::MockServer::start().await;
    let openai = common::openai_client(&openai_server);
    let slack = common::slack_client(&slack_server);
    mock_composition(&openai_server, serde_json::json!("Weekly recap!")).await;
    common::mock_post_message(&slack_server).await;

    agent_service::run_weekly_summary(&pool, &slack, &openai, "C0WEEKLY", "recap")
        .await
        .expect("weekly summary");

    let requests = slack_server.received_requests().await.unwrap_or_default();
    let post = requests
        .iter()
        .find(|request| request.url.path() == "/chat.postMessage")
        .expect("postMessage request");
    let body: serde_json::Value = serde_json::from_slice(&post.body).expect("body");
    assert_eq!(body["channel"], "C0WEEKLY");
    assert_eq!(body["text"], "Weekly recap!");
}
