//! Tool execution loop — the core agentic behavior.
//!
//! Flow: prompt → LLM → if tool_use → execute tools → inject results → LLM → repeat
//! Stops when: stop_reason is not "tool_use", max iterations reached, or error.

use tracing::{debug, info, warn};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ToolCall};

use super::{Tool, ToolResult};

/// Run the full tool execution loop (non-streaming).
///
/// Starts from `initial_request`, which must have `messages` or `raw_messages` set.
/// Returns the final `ChatResponse` (the one with `stop_reason != "tool_use"`) plus
/// the names of every tool actually invoked, in call order.
pub async fn run_tool_loop(
    provider: &dyn LlmProvider,
    initial_request: ChatRequest,
    tools: &[Box<dyn Tool>],
    max_iterations: usize,
) -> Result<(ChatResponse, Vec<String>), crate::provider::ProviderError> {
    let mut raw_messages: Vec<serde_json::Value> =
        if let Some(ref raw) = initial_request.raw_messages {
            raw.clone()
        } else {
            initial_request
                .messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
                .collect()
        };

    let mut last_response: Option<ChatResponse> = None;
    let mut called_tools: Vec<String> = Vec::new();

    for iteration in 0..max_iterations.max(1) {
        let mut req = initial_request.clone();
        req.raw_messages = Some(raw_messages.clone());

        debug!(iteration, "tool loop iteration");

        let response = provider.send(&req).await?;

        if response.tool_calls.is_empty() || response.stop_reason != "tool_use" {
            info!(iteration, "tool loop complete — no more tool calls");
            return Ok((response, called_tools));
        }

        let tool_calls_json: Vec<serde_json::Value> = response
            .tool_calls
            .iter()
            .map(|call| {
                serde_json::json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.input.to_string(),
                    }
                })
            })
            .collect();

        raw_messages.push(serde_json::json!({
            "role": "assistant",
            "content": if response.content.is_empty() { serde_json::Value::Null } else { serde_json::json!(response.content) },
            "tool_calls": tool_calls_json,
        }));

        for call in &response.tool_calls {
            let result = execute_tool(tools, call).await;
            called_tools.push(call.name.clone());
            raw_messages.push(serde_json::json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": result.content,
            }));
        }

        last_response = Some(response);
    }

    warn!(max_iterations, "tool loop hit maximum iterations");

    if let Some(resp) = last_response {
        Ok((resp, called_tools))
    } else {
        Err(crate::provider::ProviderError::Parse(format!(
            "tool loop exceeded {max_iterations} iterations without a final response"
        )))
    }
}

/// Find and execute the named tool. Returns an error ToolResult if not found.
async fn execute_tool(tools: &[Box<dyn Tool>], call: &ToolCall) -> ToolResult {
    match tools.iter().find(|t| t.name() == call.name) {
        Some(tool) => {
            debug!(tool = %call.name, "executing tool");
            tool.execute(call.input.clone()).await
        }
        None => ToolResult::error(format!("unknown tool: {}", call.name)),
    }
}
