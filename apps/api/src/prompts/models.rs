use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DIMENSION: u32 = 768;
pub const DEFAULT_INFERENCE_STEPS: u32 = 25;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 6.5;

/// A prompt and its generation settings for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub character: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub sampler: String,
    pub upscaler: String,
}

impl PromptRecord {
    /// Normalises a loosely-typed record (remote row or local JSON entry).
    ///
    /// Missing or malformed fields take their defaults; numbers may arrive as
    /// strings. The prompt text is read from `prompt`, then `Prompt`.
    pub fn from_record(record: &Value, fallback_character: &str) -> Self {
        let prompt = str_field(record, "prompt")
            .filter(|p| !p.is_empty())
            .or_else(|| str_field(record, "Prompt"))
            .unwrap_or_default();

        PromptRecord {
            character: str_field(record, "character")
                .unwrap_or_else(|| fallback_character.to_string()),
            prompt,
            negative_prompt: str_field(record, "negative_prompt").unwrap_or_default(),
            width: u32_field(record, "width").unwrap_or(DEFAULT_DIMENSION),
            height: u32_field(record, "height").unwrap_or(DEFAULT_DIMENSION),
            num_inference_steps: u32_field(record, "num_inference_steps")
                .unwrap_or(DEFAULT_INFERENCE_STEPS),
            guidance_scale: f32_field(record, "guidance_scale").unwrap_or(DEFAULT_GUIDANCE_SCALE),
            sampler: str_field(record, "sampler").unwrap_or_default(),
            upscaler: str_field(record, "upscaler").unwrap_or_default(),
        }
    }
}

fn str_field(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn u32_field(record: &Value, key: &str) -> Option<u32> {
    match record.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn f32_field(record: &Value, key: &str) -> Option<f32> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
