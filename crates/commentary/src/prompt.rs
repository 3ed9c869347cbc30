//! Prompt assembly.

/// Header that introduces the selected domain context.
pub const CONTEXT_HEADER: &str = "=== DOMAIN CONTEXT ===";

/// Assemble the request payload: the topic, then the domain context block
/// when there is any, then the instructions when there are any.
pub fn build_prompt(topic: &str, context: &str, instructions: Option<&str>) -> String {
    let mut prompt = topic.trim().to_string();

    if !context.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADER);
        prompt.push('\n');
        prompt.push_str(context);
    }

    if let Some(instructions) = instructions.filter(|i| !i.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(instructions);
    }

    prompt
}
