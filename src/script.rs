//! Agent program generation and output parsing.
//!
//! The task is rendered into a small self-contained Python program that
//! invokes the agent SDK inside the sandbox. Untrusted text (prompt,
//! tool names, model id) is never interpolated raw: every value goes
//! through JSON encoding, so it cannot escape the generated program's
//! syntax. The program prints each agent message as one tagged JSON
//! line, which this module parses back into [`AgentMessage`].

use serde::Deserialize;

use crate::runner::Task;

/// Where the generated program is written inside the sandbox.
pub(crate) const AGENT_SCRIPT_PATH: &str = "/home/user/agent.py";

/// Command that executes the generated program.
pub(crate) const AGENT_COMMAND: &str = "python3 /home/user/agent.py";

/// One message emitted by the agent, as a tagged line on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum AgentMessage {
    /// Intermediate content produced while the agent works.
    Content { text: String },
    /// The final textual result of the task.
    Result { text: String },
}

/// Encodes a string as a literal that is valid in both JSON and Python
/// source. JSON escapes only quotes, backslashes and control
/// characters, all of which Python string literals accept.
fn literal(value: &str) -> String {
    serde_json::to_string(value).expect("JSON encoding of a string cannot fail")
}

/// Encodes a string twice, producing a Python literal whose
/// `json.loads` yields the original text. The extra round-trip keeps
/// the decoding explicit in the generated source.
fn double_encoded_literal(value: &str) -> String {
    literal(&literal(value))
}

/// Renders the task into the agent program source.
pub(crate) fn render_agent_script(task: &Task) -> String {
    let tools_json =
        serde_json::to_string(&task.allowed_tools).expect("JSON encoding of strings cannot fail");

    format!(
        r#"import asyncio
import json

from claude_agent_sdk import ClaudeAgentOptions, query


async def main():
    prompt = json.loads({prompt})
    allowed_tools = json.loads({tools})

    async for msg in query(
        prompt=prompt,
        options=ClaudeAgentOptions(
            model={model},
            allowed_tools=allowed_tools,
            max_turns={max_turns},
        ),
    ):
        if hasattr(msg, "result"):
            print(json.dumps({{"type": "result", "text": msg.result}}), flush=True)
        elif hasattr(msg, "content"):
            for block in msg.content:
                if hasattr(block, "text"):
                    print(json.dumps({{"type": "content", "text": block.text}}), flush=True)


asyncio.run(main())
"#,
        prompt = double_encoded_literal(&task.prompt),
        tools = literal(&tools_json),
        model = literal(&task.model),
        max_turns = task.max_turns,
    )
}

/// Extracts the task result from the program's stdout.
///
/// Lines are parsed as tagged [`AgentMessage`]s; the last `Result`
/// message wins. Output with no tagged result line (for example a
/// plain `print`) falls back to the trimmed raw stdout.
pub(crate) fn extract_result(stdout: &str) -> String {
    let mut result = None;

    for line in stdout.lines() {
        if let Ok(AgentMessage::Result { text }) = serde_json::from_str::<AgentMessage>(line) {
            result = Some(text);
        }
    }

    result.unwrap_or_else(|| stdout.trim().to_string())
}
