use serde::Serialize;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::api::openai::{
    ChatCompletionRequest, ChatMessage, FunctionDefinition, OpenAiClient, ToolDefinition,
};
use crate::api::slack::SlackClient;
use crate::db;
use crate::error::AppError;
use crate::models::stats::ToolResults;

const MODEL: &str = "gpt-4.1-mini";

pub const TOOL_LAST_WEEK_LEADERBOARD: &str = "getLastWeekLeaderboard";
pub const TOOL_LAST_WEEK_TRANSACTIONS: &str = "getLastWeekTransactions";
pub const TOOL_TODAY_LEADERBOARD: &str = "getTodayLeaderboard";

const SELECTION_INSTRUCTION: &str =
    "You are an assistant that decides which tools to call based on user input.";
const COMPOSITION_INSTRUCTION: &str =
    "Compose a human-readable message using the provided tool data, suitable for posting in Slack.";

/// User content of the selection call; field order matches the wire shape
/// consumers have come to expect.
#[derive(Serialize)]
struct SelectionInput<'a> {
    tools: &'a str,
    prompt: &'a str,
}

/// The fixed catalog of reporting functions offered to the model.
/// All three take no arguments.
fn tool_catalog() -> Vec<ToolDefinition> {
    let no_parameters = json!({ "type": "object", "properties": {} });
    let function = |name: &str, description: &str| ToolDefinition {
        kind: "function".to_string(),
        function: FunctionDefinition {
            name: name.to_string(),
            description: description.to_string(),
            parameters: no_parameters.clone(),
        },
    };

    vec![
        function(
            TOOL_LAST_WEEK_LEADERBOARD,
            "Leaderboard of karma received per user over the last 7 days.",
        ),
        function(
            TOOL_LAST_WEEK_TRANSACTIONS,
            "All karma transactions from the last 7 days with sender and recipient names.",
        ),
        function(
            TOOL_TODAY_LEADERBOARD,
            "Leaderboard of total karma received per user to date.",
        ),
    ]
}

/// Ask the model which reporting functions to run for this input.
///
/// Zero selected functions is a hard error; composition never runs on an
/// empty selection.
async fn select_tools(
    openai: &OpenAiClient,
    tools: &str,
    prompt: &str,
) -> Result<Vec<String>, AppError> {
    let input = serde_json::to_string(&SelectionInput { tools, prompt })?;

    let request = ChatCompletionRequest {
        model: MODEL.to_string(),
        messages: vec![
            ChatMessage::system(SELECTION_INSTRUCTION),
            ChatMessage::user(input),
        ],
        tools: Some(tool_catalog()),
        tool_choice: Some("auto".to_string()),
    };

    let response = openai.chat_completion(&request).await?;
    let selected: Vec<String> = response
        .choices
        .into_iter()
        .next()
        .map(|choice| {
            choice
                .message
                .tool_calls
                .into_iter()
                .map(|call| call.function.name)
                .collect()
        })
        .unwrap_or_default();

    if selected.is_empty() {
        return Err(AppError::NoToolsSelected);
    }

    debug!("model selected tools: {:?}", selected);
    Ok(selected)
}

/// Run each selected reporting function once against the store.
///
/// Duplicate selections run once; unknown names are logged and leave their
/// slot at the default empty list.
async fn execute_tools(pool: &SqlitePool, selected: &[String]) -> Result<ToolResults, AppError> {
    let mut results = ToolResults::default();
    let mut executed = HashSet::new();

    for name in selected {
        if !executed.insert(name.as_str()) {
            continue;
        }
        match name.as_str() {
            TOOL_LAST_WEEK_LEADERBOARD => {
                results.last_week_leaderboard = db::stats::last_week_leaderboard(pool).await?;
            }
            TOOL_LAST_WEEK_TRANSACTIONS => {
                results.last_week_transactions = db::stats::last_week_transactions(pool).await?;
            }
            TOOL_TODAY_LEADERBOARD => {
                results.today_leaderboard = db::stats::today_leaderboard(pool).await?;
            }
            other => {
                warn!("model selected unknown tool {}", other);
            }
        }
    }

    Ok(results)
}

/// Turn the collected tool results into a channel-ready message.
///
/// A response without text content is a success with an empty message.
async fn compose_message(
    openai: &OpenAiClient,
    prompt: &str,
    tool_results: &ToolResults,
) -> Result<String, AppError> {
    let serialized = serde_json::to_string_pretty(tool_results)?;

    let request = ChatCompletionRequest {
        model: MODEL.to_string(),
        messages: vec![
            ChatMessage::system(COMPOSITION_INSTRUCTION),
            ChatMessage::user(prompt),
            ChatMessage::system(format!(
                "Here are the results from the tools: {}",
                serialized
            )),
        ],
        tools: None,
        tool_choice: None,
    };

    let response = openai.chat_completion(&request).await?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    Ok(content)
}

/// Explicit-selection variant: the model picks which reporting functions
/// to run, then composes a message from their results.
pub async fn process_prompt(
    pool: &SqlitePool,
    openai: &OpenAiClient,
    tools: &str,
    prompt: &str,
) -> Result<String, AppError> {
    let selected = select_tools(openai, tools, prompt).await?;
    let results = execute_tools(pool, &selected).await?;
    compose_message(openai, prompt, &results).await
}

/// Implicit variant for the scheduled weekly summary: always run all three
/// reporting functions concurrently, then compose.
pub async fn weekly_summary(
    pool: &SqlitePool,
    openai: &OpenAiClient,
    prompt: &str,
) -> Result<String, AppError> {
    let (last_week_leaderboard, last_week_transactions, today_leaderboard) = tokio::try_join!(
        db::stats::last_week_leaderboard(pool),
        db::stats::last_week_transactions(pool),
        db::stats::today_leaderboard(pool),
    )?;

    let results = ToolResults {
        last_week_leaderboard,
        last_week_transactions,
        today_leaderboard,
    };

    compose_message(openai, prompt, &results).await
}

/// Run the explicit pipeline and post the composed message to the channel
pub async fn run_kata_prompting(
    pool: &SqlitePool,
    slack: &SlackClient,
    openai: &OpenAiClient,
    channel: &str,
    tools: &str,
    prompt: &str,
) -> Result<(), AppError> {
    let response = process_prompt(pool, openai, tools, prompt).await?;
    slack.post_message(channel, &response).await?;
    Ok(())
}

/// Run the weekly-summary pipeline and post the composed message to the channel
pub async fn run_weekly_summary(
    pool: &SqlitePool,
    slack: &SlackClient,
    openai: &OpenAiClient,
    channel: &str,
    prompt: &str,
) -> Result<(), AppError> {
    let response = weekly_summary(pool, openai, prompt).await?;
    slack.post_message(channel, &response).await?;
    Ok(())
}
