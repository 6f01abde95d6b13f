use crate::error::ExtractionFailure;
use crate::extractors::fallback::parse_rent;
use crate::extractors::traits::{FieldExtractor, PostCheck, PostClassifier};
use crate::models::ExtractedFields;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that extracts location and rental \
information from text messages. Always respond with a single valid JSON object.";

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.1;
const CHECK_MAX_TOKENS: u32 = 5;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// The JSON object the model is asked to return. Every key is nullable.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelFields {
    location: Option<Value>,
    city: Option<Value>,
    rent: Option<Value>,
    bhk: Option<Value>,
    additional_details: Option<Value>,
    latitude: Option<Value>,
    longitude: Option<Value>,
}

/// Extractor and yes/no classifier backed by an OpenAI-compatible
/// chat-completions endpoint
#[derive(Debug, Clone)]
pub struct AiExtractor {
    api_key: String,
    api_url: String,
    model: String,
    client: Client,
}

impl AiExtractor {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ExtractionFailure> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            api_url,
            model,
            client,
        })
    }
}

impl AiExtractor {
    /// Send one chat request and return the first choice's message content
    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, ExtractionFailure> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionFailure::Status { status, body });
        }

        let api_response: ChatResponse = response.json().await?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractionFailure::EmptyContent)
    }
}

#[async_trait]
impl FieldExtractor for AiExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractionFailure> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(text),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!("Sending {} chars to {}", text.len(), self.model);
        let content = self.chat(&request).await?;
        parse_model_output(&content)
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}

#[async_trait]
impl PostClassifier for AiExtractor {
    async fn check(&self, check: PostCheck, text: &str) -> Result<bool, ExtractionFailure> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: check_prompt(check, text),
            }],
            max_tokens: CHECK_MAX_TOKENS,
            temperature: 0.0,
            response_format: None,
        };

        let content = self.chat(&request).await?;
        parse_yes_no(&content)
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}

fn check_prompt(check: PostCheck, text: &str) -> String {
    let question = match check {
        PostCheck::Rental => "Determine if this post is about renting residential property.",
        PostCheck::RestrictedTenancy => {
            "Determine if this rental listing text indicates that the listing is \
            for female-only or family-only tenants."
        }
    };
    format!("{} Reply YES or NO.\nText: '''{}'''", question, text)
}

/// Read a YES/NO reply. Anything else is an unclear answer.
pub fn parse_yes_no(content: &str) -> Result<bool, ExtractionFailure> {
    let first_word = content
        .split(|c: char| !c.is_alphanumeric())
        .find(|word| !word.is_empty())
        .map(str::to_lowercase);

    match first_word.as_deref() {
        Some("yes") => Ok(true),
        Some("no") => Ok(false),
        _ => Err(ExtractionFailure::UnclearAnswer(content.trim().to_string())),
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        "Analyze this rental property message and extract the following information as a JSON object \
        with exactly these keys, using null when a value is not present:\n\
        - location: the specific area/locality/neighborhood mentioned\n\
        - city: the city name\n\
        - rent: the monthly rent as a number only\n\
        - bhk: room count such as 1BHK, 2BHK or STUDIO\n\
        - additional_details: any other relevant details (furnished, parking, etc.)\n\
        - latitude: latitude if coordinates are given in the message\n\
        - longitude: longitude if coordinates are given in the message\n\n\
        Message: \"{}\"\n\n\
        Return only the JSON object.",
        text
    )
}

/// Parse the model's message content into listing fields
pub fn parse_model_output(content: &str) -> Result<ExtractedFields, ExtractionFailure> {
    let json = strip_code_fence(content);
    let value: Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(ExtractionFailure::MalformedJson(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    let fields: ModelFields = serde_json::from_value(value)?;

    let latitude = fields.latitude.as_ref().and_then(|v| as_coordinate(v, 90.0));
    let longitude = fields.longitude.as_ref().and_then(|v| as_coordinate(v, 180.0));
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    let extracted = ExtractedFields {
        location: fields.location.as_ref().and_then(as_text),
        city: fields.city.as_ref().and_then(as_text),
        rent: fields.rent.as_ref().and_then(as_rent),
        bhk: fields
            .bhk
            .as_ref()
            .and_then(as_text)
            .map(|bhk| bhk.replace(' ', "").to_uppercase()),
        additional_details: fields.additional_details.as_ref().and_then(as_text),
        latitude,
        longitude,
    };
    if !extracted.has_listing_fields() {
        return Err(ExtractionFailure::NoListingFields);
    }
    Ok(extracted)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(as_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty() && !text.eq_ignore_ascii_case("null")).then_some(text)
}

fn as_rent(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|rent| rent.is_finite() && *rent >= 1.0)
            .map(|rent| rent.round() as u64),
        Value::String(s) => {
            let plain = s.replace(',', "");
            match plain.trim().parse::<f64>() {
                Ok(rent) if rent.is_finite() && rent >= 1.0 => Some(rent.round() as u64),
                _ => parse_rent(s),
            }
        }
        _ => None,
    }
}

fn as_coordinate(value: &Value, limit: f64) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && v.abs() <= limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let fields = parse_model_output(
            r#"{"location":"Koramangala","city":"Bangalore","rent":18000,"bhk":"1bhk",
                "additional_details":"semi furnished","latitude":null,"longitude":null}"#,
        )
        .unwrap();
        assert_eq!(fields.location.as_deref(), Some("Koramangala"));
        assert_eq!(fields.city.as_deref(), Some("Bangalore"));
        assert_eq!(fields.rent, Some(18000));
        assert_eq!(fields.bhk.as_deref(), Some("1BHK"));
        assert_eq!(fields.additional_details.as_deref(), Some("semi furnished"));
        assert_eq!(fields.latitude, None);
    }

    #[test]
    fn test_parse_fenced_output() {
        let content = "```json\n{\"location\": \"Baner\", \"rent\": \"25k\"}\n```";
        let fields = parse_model_output(content).unwrap();
        assert_eq!(fields.location.as_deref(), Some("Baner"));
        assert_eq!(fields.rent, Some(25000));
        assert_eq!(fields.city, None);
    }

    #[test]
    fn test_parse_string_rent_with_commas() {
        let fields = parse_model_output(r#"{"rent": "18,500"}"#).unwrap();
        assert_eq!(fields.rent, Some(18500));
    }

    #[test]
    fn test_non_positive_rent_is_dropped() {
        let fields = parse_model_output(r#"{"rent": 0, "location": "Powai"}"#).unwrap();
        assert_eq!(fields.rent, None);
    }

    #[test]
    fn test_coordinates_require_both() {
        let fields =
            parse_model_output(r#"{"location": "Baner", "latitude": 12.9, "longitude": null}"#)
                .unwrap();
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.longitude, None);

        let fields =
            parse_model_output(r#"{"location": "Baner", "latitude": 12.9, "longitude": "77.6"}"#)
                .unwrap();
        assert_eq!(fields.latitude, Some(12.9));
        assert_eq!(fields.longitude, Some(77.6));
    }

    #[test]
    fn test_out_of_range_coordinates_are_dropped() {
        let fields =
            parse_model_output(r#"{"location": "Baner", "latitude": 118.5, "longitude": 73.8}"#)
                .unwrap();
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.longitude, None);

        let fields =
            parse_model_output(r#"{"location": "Baner", "latitude": 18.5, "longitude": -190.0}"#)
                .unwrap();
        assert_eq!(fields.coordinates(), None);
    }

    #[test]
    fn test_reply_without_listing_fields_is_a_failure() {
        let all_null = r#"{"location": null, "city": null, "rent": null, "bhk": null,
            "additional_details": null, "latitude": null, "longitude": null}"#;
        assert!(matches!(
            parse_model_output(all_null),
            Err(ExtractionFailure::NoListingFields)
        ));
        assert!(matches!(parse_model_output("{}"), Err(ExtractionFailure::NoListingFields)));
        assert!(matches!(
            parse_model_output(r#"{"additional_details": "just a greeting"}"#),
            Err(ExtractionFailure::NoListingFields)
        ));
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            parse_model_output("Sorry, I cannot help with that."),
            Err(ExtractionFailure::MalformedJson(_))
        ));
        assert!(matches!(
            parse_model_output("[1, 2, 3]"),
            Err(ExtractionFailure::MalformedJson(_))
        ));
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("YES").unwrap());
        assert!(parse_yes_no("Yes.").unwrap());
        assert!(!parse_yes_no(" no\n").unwrap());
        assert!(!parse_yes_no("No, it is a sale post").unwrap());
        assert!(matches!(parse_yes_no("Not sure"), Err(ExtractionFailure::UnclearAnswer(_))));
        assert!(matches!(parse_yes_no("..."), Err(ExtractionFailure::UnclearAnswer(_))));
    }

    #[test]
    fn test_check_request_has_no_json_format() {
        let request = ChatRequest {
            model: "gpt-4.1",
            messages: vec![ChatMessage {
                role: "user",
                content: check_prompt(PostCheck::Rental, "1BHK in Baner"),
            }],
            max_tokens: CHECK_MAX_TOKENS,
            temperature: 0.0,
            response_format: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["max_tokens"], 5);
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Reply YES or NO."));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let extractor = AiExtractor::new(
            "test-key".to_string(),
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            "gpt-4.1".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        let result = extractor.extract("2BHK near Indiranagar, rent 30k").await;
        assert!(matches!(result, Err(ExtractionFailure::Transport(_))));

        let answer = extractor.check(PostCheck::Rental, "2BHK near Indiranagar").await;
        assert!(matches!(answer, Err(ExtractionFailure::Transport(_))));
    }
}
