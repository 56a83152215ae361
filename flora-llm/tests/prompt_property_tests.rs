use flora_core::{FlowerDraft, RecordId};
use flora_llm::extract::{json_array_span, json_object_span, parse_object};
use flora_llm::prompts::{self, EXPAND_THRESHOLD_CHARS, HISTORY_WINDOW};
use flora_llm::ChatMessage;
use proptest::prelude::*;
use serde_json::{json, Value};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn object_survives_surrounding_prose(
        prefix in "[A-Za-z .!\n]{0,30}",
        suffix in "[A-Za-z .!\n]{0,30}",
        name in "[A-Za-z ]{0,20}",
    ) {
        let payload = json!({ "name": name }).to_string();
        let text = format!("{prefix}```json\n{payload}\n```{suffix}");
        prop_assert_eq!(json_object_span(&text), Some(payload.as_str()));
        let parsed: Value = parse_object("test", &text).expect("object should parse");
        prop_assert_eq!(parsed["name"].as_str(), Some(name.as_str()));
    }

    #[test]
    fn array_span_is_bracketed(items in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let payload = serde_json::to_string(&items).expect("serialize");
        let text = format!("Facts: {payload} Hope that helps");
        let span = json_array_span(&text).expect("span");
        prop_assert!(span.starts_with('[') && span.ends_with(']'));
    }

    #[test]
    fn expand_decision_matches_threshold(description in 0usize..250, care in 0usize..250) {
        let flower = FlowerDraft::new("Rose")
            .with_description("é".repeat(description))
            .with_care_instructions("c".repeat(care))
            .into_flower(RecordId::new("r"), None, None);
        prop_assert_eq!(prompts::should_expand(&flower), description + care < EXPAND_THRESHOLD_CHARS);
    }

    #[test]
    fn chat_prompt_keeps_only_recent_history(count in 0usize..15) {
        let history: Vec<ChatMessage> = (0..count)
            .map(|i| ChatMessage::user(format!("message-{i:02}")))
            .collect();
        let prompt = prompts::chat("hello", None, &history);
        for (i, message) in history.iter().enumerate() {
            let included = i + HISTORY_WINDOW >= count;
            prop_assert_eq!(prompt.contains(&message.content), included);
        }
    }
}
