//! Prompt construction for the content provider.
//!
//! Prompts are plain text; structured answers are requested as JSON and
//! recovered with [`crate::extract`].

use flora_core::{Flower, Language};

use crate::{ChatMessage, ChatRole};

/// Combined description + care length below which a record is expanded
/// rather than summarized.
pub const EXPAND_THRESHOLD_CHARS: usize = 200;

/// Number of trailing chat messages included in a chat prompt.
pub const HISTORY_WINDOW: usize = 6;

/// Whether a record is short enough to be expanded instead of summarized.
pub fn should_expand(flower: &Flower) -> bool {
    flower.description.chars().count() + flower.care_instructions.chars().count()
        < EXPAND_THRESHOLD_CHARS
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// `- Label: value` lines describing a record, with a fallback for blanks.
fn record_lines(flower: &Flower, description_fallback: &str) -> String {
    format!(
        "- Name: {}\n- Type: {}\n- Color: {}\n- Description: {}\n- Blooming Season: {}\n- Care Instructions: {}",
        or_default(&flower.name, "Unknown"),
        or_default(&flower.flower_type, "Not specified"),
        or_default(&flower.color, "Not specified"),
        or_default(&flower.description, description_fallback),
        or_default(&flower.blooming_season, "Not specified"),
        or_default(&flower.care_instructions, "Not specified"),
    )
}

pub fn translate(flower: &Flower, language: Language) -> String {
    format!(
        "Translate the following flower information to {language}.\n\
         Return ONLY a JSON object with the translated fields. No explanations.\n\
         \n\
         Flower Information:\n\
         - Name: {}\n\
         - Type: {}\n\
         - Color: {}\n\
         - Description: {}\n\
         - Blooming Season: {}\n\
         - Care Instructions: {}\n\
         \n\
         Return JSON format:\n\
         {{\n  \"name\": \"translated name\",\n  \"type\": \"translated type\",\n  \"color\": \"translated color\",\n  \"description\": \"translated description\",\n  \"bloomingSeason\": \"translated season\",\n  \"careInstructions\": \"translated care\"\n}}",
        flower.name,
        flower.flower_type,
        flower.color,
        flower.description,
        flower.blooming_season,
        flower.care_instructions,
        language = language.name(),
    )
}

pub fn expand(flower: &Flower) -> String {
    format!(
        "You are Flora, a flower expert. The following flower has brief information.\n\
         Please expand and enrich the content with more details, interesting facts, and care tips.\n\
         \n\
         Current Flower Information:\n\
         {}\n\
         \n\
         Return ONLY a JSON object with enriched content:\n\
         {{\n  \"type\": \"expanded\",\n  \"keyPoints\": [\"3-5 key facts about this flower\"],\n  \"description\": \"A detailed 2-3 paragraph description with interesting facts, history, and characteristics\",\n  \"careInstructions\": \"Comprehensive care guide with watering, sunlight, soil, and seasonal tips\"\n}}",
        record_lines(flower, "No description"),
    )
}

pub fn summarize(flower: &Flower) -> String {
    format!(
        "You are Flora, a flower expert. Summarize the following flower information into concise key points.\n\
         \n\
         Flower Information:\n\
         {}\n\
         \n\
         Return ONLY a JSON object with summarized content:\n\
         {{\n  \"type\": \"summarized\",\n  \"keyPoints\": [\"5-7 most important key points about this flower, each 1 short sentence\"],\n  \"quickCare\": \"One sentence care summary\",\n  \"bestFor\": \"What this flower is best for (e.g., gardens, bouquets, beginners)\"\n}}",
        record_lines(flower, "No description"),
    )
}

pub const DESCRIBE_IMAGE: &str = "Analyze this flower image and provide detailed information.\n\
Return ONLY a JSON object with no additional text or explanation.\n\
\n\
Required JSON format:\n\
{\n  \"name\": \"Flower name (common name)\",\n  \"scientificName\": \"Scientific/botanical name if known\",\n  \"type\": \"Flower family or type\",\n  \"color\": \"Primary color(s) of the flower\",\n  \"description\": \"A detailed 2-3 paragraph description of the flower, its characteristics, history, and significance\",\n  \"bloomingSeason\": \"When this flower typically blooms\",\n  \"careInstructions\": \"Basic care tips for growing this flower\"\n}";

pub const IDENTIFY_IMAGE: &str = "Identify this flower in the image.\n\
Return ONLY a JSON object with the following information:\n\
\n\
{\n  \"name\": \"Common name of the flower\",\n  \"scientificName\": \"Scientific name\",\n  \"confidence\": \"high/medium/low\",\n  \"description\": \"Brief 1-2 sentence description\",\n  \"similarFlowers\": [\"Similar flower 1\", \"Similar flower 2\"]\n}";

pub fn care_recommendations(flower_name: &str, climate: Option<&str>) -> String {
    let climate = climate
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!(" in {c} climate"))
        .unwrap_or_default();
    format!(
        "Provide practical care tips for growing {flower_name}{climate}.\n\
         Include:\n\
         - Watering frequency\n\
         - Sunlight requirements\n\
         - Soil type\n\
         - Best planting time\n\
         - Common problems and solutions\n\
         \n\
         Keep it concise and practical."
    )
}

pub fn flower_facts(flower_name: &str) -> String {
    format!(
        "Give me 5 interesting and unique facts about {flower_name}.\n\
         Return ONLY a JSON array of strings, no explanations:\n\
         [\"fact 1\", \"fact 2\", \"fact 3\", \"fact 4\", \"fact 5\"]"
    )
}

fn chat_flower_context(flower: &Flower) -> String {
    format!(
        "CURRENT FLOWER CONTEXT:\n{}\n- Category: {}\n",
        record_lines(flower, "No description available"),
        or_default(&flower.category, "Not specified"),
    )
}

fn chat_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut out = String::from("CONVERSATION HISTORY:\n");
    for message in &history[start..] {
        let speaker = match message.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Flora",
        };
        out.push_str(speaker);
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

pub fn chat(message: &str, flower: Option<&Flower>, history: &[ChatMessage]) -> String {
    let context = flower.map(chat_flower_context).unwrap_or_default();
    format!(
        "You are Flora, a friendly and knowledgeable AI assistant for the Flower Base app.\n\
         You are an expert on flowers, plants, gardening, and botanical topics.\n\
         Your personality is warm, helpful, and passionate about flowers.\n\
         \n\
         {context}\n\
         {history}\n\
         GUIDELINES:\n\
         - Be concise but informative (2-4 sentences unless more detail is requested)\n\
         - If the user asks about the current flower, use the context provided above\n\
         - Be enthusiastic about flowers and gardening\n\
         - If you don't know something, say so honestly\n\
         - You can suggest related flowers, care tips, or interesting facts\n\
         - Use flower emojis occasionally to be friendly 🌸🌺🌻\n\
         \n\
         User's question: {message}\n\
         \n\
         Respond as Flora:",
        history = chat_history(history),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_core::{FlowerDraft, RecordId};

    fn flower(description: &str, care: &str) -> Flower {
        FlowerDraft::new("Rose")
            .with_description(description)
            .with_care_instructions(care)
            .into_flower(RecordId::new("r1"), None, None)
    }

    #[test]
    fn test_should_expand_threshold() {
        assert!(should_expand(&flower("", "")));
        assert!(should_expand(&flower(&"a".repeat(100), &"b".repeat(99))));
        assert!(!should_expand(&flower(&"a".repeat(100), &"b".repeat(100))));
    }

    #[test]
    fn test_should_expand_counts_characters_not_bytes() {
        // 150 two-byte characters: 300 bytes but only 150 characters.
        assert!(should_expand(&flower(&"é".repeat(150), "")));
    }

    #[test]
    fn test_translate_prompt_names_language_and_fields() {
        let prompt = translate(&flower("Fragrant.", "Water daily."), Language::Hindi);
        assert!(prompt.starts_with("Translate the following flower information to Hindi."));
        assert!(prompt.contains("- Description: Fragrant."));
        assert!(prompt.contains("\"careInstructions\": \"translated care\""));
    }

    #[test]
    fn test_expand_prompt_uses_fallbacks_for_blank_fields() {
        let prompt = expand(&flower("", ""));
        assert!(prompt.contains("- Description: No description"));
        assert!(prompt.contains("- Care Instructions: Not specified"));
        assert!(prompt.contains("\"type\": \"expanded\""));
    }

    #[test]
    fn test_care_prompt_climate_is_optional() {
        assert!(care_recommendations("Rose", None).starts_with("Provide practical care tips for growing Rose.\n"));
        assert!(care_recommendations("Rose", Some("tropical"))
            .starts_with("Provide practical care tips for growing Rose in tropical climate."));
        assert!(care_recommendations("Rose", Some("  ")).starts_with("Provide practical care tips for growing Rose.\n"));
    }

    #[test]
    fn test_chat_prompt_keeps_last_six_history_messages() {
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{i}"))
                } else {
                    ChatMessage::assistant(format!("a{i}"))
                }
            })
            .collect();
        let prompt = chat("hello", None, &history);
        assert!(prompt.contains("CONVERSATION HISTORY:\nUser: q2\nFlora: a3\n"));
        assert!(!prompt.contains("q0"));
        assert!(!prompt.contains("a1"));
        assert!(prompt.contains("Flora: a7\n"));
        assert!(prompt.contains("User's question: hello"));
        assert!(!prompt.contains("CURRENT FLOWER CONTEXT"));
    }

    #[test]
    fn test_chat_prompt_includes_flower_context() {
        let prompt = chat("how tall?", Some(&flower("Red and fragrant.", "")), &[]);
        assert!(prompt.contains("CURRENT FLOWER CONTEXT:\n- Name: Rose\n"));
        assert!(prompt.contains("- Care Instructions: Not specified\n- Category: Not specified\n"));
        assert!(!prompt.contains("CONVERSATION HISTORY"));
    }
}
