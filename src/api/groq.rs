use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::logw;
use reqwest::Client;
use serde_json::json;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Parameters of a single system + user chat completion.
#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

fn chat_url(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

fn request_body(model: &str, completion: &Completion<'_>) -> serde_json::Value {
    let mut body = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": completion.system},
            {"role": "user", "content": completion.user},
        ],
        "max_tokens": completion.max_tokens,
    });
    if let Some(temperature) = completion.temperature {
        body["temperature"] = json!(temperature);
    }
    body
}

fn extract_message_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("Groq error message: {}", msg));
        }
        if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
            logw(format!("Groq error type: {}", typ));
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

/// Issues one chat completion and returns the trimmed message content.
pub async fn chat_completion(
    client: &Client,
    cfg: &Config,
    completion: &Completion<'_>,
) -> Result<String> {
    let body = request_body(&cfg.groq_model, completion);

    let resp = client
        .post(chat_url(&cfg.groq_api_base))
        .bearer_auth(&cfg.groq_api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|e| PipelineError::Generation(format!("Groq request failed: {e}")))?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        let snippet = raw.chars().take(800).collect::<String>();
        return Err(PipelineError::Generation(format!(
            "Groq HTTP {}: {}",
            status.as_u16(),
            snippet
        )));
    }

    match extract_message_content(&raw) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => {
            let snippet = raw.chars().take(800).collect::<String>();
            Err(PipelineError::Generation(format!(
                "Groq response had no content: {}",
                snippet
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_includes_temperature_only_when_set() {
        let with = request_body(
            "llama",
            &Completion {
                system: "sys",
                user: "usr",
                max_tokens: 300,
                temperature: Some(0.7),
            },
        );
        assert_eq!(with["max_tokens"], 300);
        assert_eq!(with["messages"][0]["role"], "system");
        assert_eq!(with["messages"][1]["content"], "usr");
        assert!(with["temperature"].as_f64().is_some());

        let without = request_body(
            "llama",
            &Completion {
                system: "sys",
                user: "usr",
                max_tokens: 100,
                temperature: None,
            },
        );
        assert!(without.get("temperature").is_none());
    }

    #[test]
    fn chat_url_joins_base() {
        assert_eq!(
            chat_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn extracts_first_choice() {
        let raw = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  Shocking news!  "}}]}"#;
        assert_eq!(extract_message_content(raw).as_deref(), Some("Shocking news!"));
    }

    #[test]
    fn error_payload_has_no_content() {
        let raw = r#"{"error":{"message":"rate limited","type":"tokens"}}"#;
        assert_eq!(extract_message_content(raw), None);
        assert_eq!(extract_message_content("not json"), None);
    }
}
