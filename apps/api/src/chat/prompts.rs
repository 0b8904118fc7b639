// Prompt constants for the mortgage assistant chat.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::applications::form::STEPS;
use crate::llm_client::prompts::NO_ADVICE_INSTRUCTION;
use crate::models::application::ApplicationRow;

pub const CHAT_SYSTEM: &str = "You are a friendly mortgage assistant helping a customer \
    through their home loan application. Explain terms such as loan-to-value ratio, \
    debt-to-income ratio, deposits and loan terms in plain language. Keep answers \
    short and specific to the customer's question. Ask which document or form step \
    they mean when a question is ambiguous.";

/// Full system prompt, with a summary of the linked application when there is one.
pub fn build_system_prompt(application: Option<&ApplicationRow>) -> String {
    let mut prompt = format!("{CHAT_SYSTEM}\n\n{NO_ADVICE_INSTRUCTION}");
    if let Some(app) = application {
        prompt.push_str("\n\n");
        prompt.push_str(&application_summary(app));
    }
    prompt
}

fn application_summary(app: &ApplicationRow) -> String {
    let step = usize::try_from(app.current_step)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| STEPS.get(i))
        .map(|s| s.key)
        .unwrap_or("review");

    let mut summary = format!(
        "The customer's application is currently '{}'. Next form step: {} ({} of {}).",
        app.status,
        step,
        app.current_step.min(STEPS.len() as i32),
        STEPS.len()
    );

    if let Some(risk) = &app.risk_assessment {
        if let (Some(level), Some(score)) = (
            risk.get("level").and_then(|v| v.as_str()),
            risk.get("score").and_then(|v| v.as_u64()),
        ) {
            summary.push_str(&format!(
                " Internal risk assessment: {level} ({score}/100). Do not disclose the score; \
                use it only to decide which topics to raise."
            ));
        }
    }

    summary
}
