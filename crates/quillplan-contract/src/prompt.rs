use quillplan_core::ChatMessage;
use serde_json::Value;

use crate::model::PlanRequest;

const SYSTEM_PROMPT: &str = "You are a planning engine for children's fiction. \
Output ONLY machine-readable JSON that matches the provided JSON Schema exactly. \
No markdown or commentary. No extra keys. \
Keep POV objective (no inner thoughts). \
Keep peril mild and age-appropriate, with visible solutions.";

/// System + user messages for one planning run.
pub fn build_prompt(request: &PlanRequest) -> Vec<ChatMessage> {
    let user = format!(
        "TASK: Fill the provided JSON skeleton WITHOUT changing locked fields or array lengths.\n\
RULES:\n\
- Do NOT delete or reorder chapters. Fill EVERY chapter object.\n\
- `pacing.acts` are CHAPTER COUNTS (locked). `pacing.word_targets` are per-act budgets; \
chapter `word_count` values in each act should add up to that act's budget.\n\
- Keep POV objective; keep the locked tone and pace; peril stays mild with visible solutions.\n\
- Choose mythic figures and locales from RESEARCH and list them in `research_selection`.\n\
- Stay strictly within the BOOK SUMMARY; do not invent off-topic genres or settings.\n\
- JSON only.\n\n\
MATERIALS:\n\
== BOOK_MODEL (locked) ==\n{book_model}\n\n\
== BLUEPRINT (locked) ==\n{blueprint}\n\n\
== SUMMARY (locked) ==\n{summary}\n\n\
== HIGH-LEVEL PLAN (advisory) ==\n{planning}\n\n\
== RESEARCH (for selection only) ==\n{research}\n\n\
WORD BUDGET: max_total_words={max_words}\n\
OUTPUT: JSON only.",
        book_model = compact(&request.book_model),
        blueprint = compact(&request.blueprint),
        summary = request.summary_text,
        planning = request.planning_text,
        research = compact(&request.research),
        max_words = request.max_total_words,
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

fn compact(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillplan_core::Role;
    use serde_json::json;

    #[test]
    fn prompt_embeds_locked_materials() {
        let request = PlanRequest {
            book_model: json!({"book": {"title": "Lantern"}}),
            blueprint: json!({"acts": 3}),
            research: json!({"figures": ["Leshy"]}),
            planning_text: "Three trials.".to_string(),
            summary_text: "A fox finds a lantern.".to_string(),
            max_total_words: 30_000,
            expected_chapters: None,
        };

        let messages = build_prompt(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        let user = &messages[1].content;
        assert!(user.contains(r#"{"book":{"title":"Lantern"}}"#));
        assert!(user.contains("A fox finds a lantern."));
        assert!(user.contains("max_total_words=30000"));
    }
}
