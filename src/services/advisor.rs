use serde_json::json;

use crate::config::AppConfig;
use crate::models::TradeSignal;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Optional generative advisory scorer. Adds free-text observations on top
/// of the deterministic validation; failures degrade to an inline marker and
/// never block the pipeline.
#[derive(Debug, Clone)]
pub struct Advisor {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl Advisor {
    /// None when no API key is configured — the silent no-op case.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.gemini_model.clone(),
        })
    }

    /// Ask the model for 2-5 lines of observations about the signal.
    /// Returns None when the model has nothing to say.
    pub async fn score(&self, signal: &TradeSignal, original_text: &str) -> Option<String> {
        let prompt = build_prompt(signal, original_text);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let resp = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "advisor request failed");
                return Some(format!("[advisor offline] {e}"));
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "advisor returned non-2xx");
            return Some(format!("[advisor offline] status {}", resp.status()));
        }

        let value: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "advisor response unreadable");
                return Some(format!("[advisor offline] {e}"));
            }
        };

        let text = extract_text(&value)?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

fn build_prompt(signal: &TradeSignal, original_text: &str) -> String {
    format!(
        "You are an assistant that only adds observations about a trade signal.\n\
         Do NOT repeat checks already covered by fixed rules:\n\
         - For SHORT: stop-loss above the entry PM, take-profits below it.\n\
         - For LONG: stop-loss below the entry PM, take-profits above it.\n\
         If those hold, do not claim there is an error; you may note secondary\n\
         concerns instead (entry range too wide, aggressive leverage, distant TPs).\n\n\
         Original text between <<<>>>:\n<<<\n{original_text}\n>>>\n\n\
         Extracted: {signal}\n\n\
         Answer in 2-5 objective lines."
    )
}

/// Pull the first candidate's text parts out of a generateContent response.
fn extract_text(value: &serde_json::Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let chunks: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join(""))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text_from_candidates() {
        let resp = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "part one " }, { "text": "part two" }] }
            }]
        });
        assert_eq!(extract_text(&resp), Some("part one part two".into()));
    }

    #[test]
    fn test_extract_text_missing_shape() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({"candidates": []})), None);
    }
}
