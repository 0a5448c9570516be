use crate::{
    config::Config,
    error::{AppError, AppResult},
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

/// Upper bound on titles returned per call
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Turns liked titles into suggested titles
///
/// Recommendations are an enhancement: a missing credential or an answer
/// that does not decode yields an empty list rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn get_recommendations(&self, liked_titles: Vec<String>) -> AppResult<Vec<String>>;
}

/// Google Generative Language backed recommender
#[derive(Clone)]
pub struct GeminiRecommender {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

// ============================================================================
// Generative Language API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's parts, concatenated
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        Some(text)
    }
}

/// Prompt sent for a list of liked titles
pub fn build_prompt(liked_titles: &[String]) -> String {
    format!(
        "Based on these movies I liked: {}, recommend {} similar movies. Return ONLY a JSON array of strings (movie titles).",
        liked_titles.join(", "),
        MAX_RECOMMENDATIONS
    )
}

/// Decodes the model's answer as a JSON array of titles
///
/// Anything that is not an array of strings yields an empty list.
pub fn parse_recommendations(text: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(text.trim()) {
        Ok(titles) => titles
            .into_iter()
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .take(MAX_RECOMMENDATIONS)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Recommendation response was not a JSON array of titles");
            Vec::new()
        }
    }
}

impl GeminiRecommender {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for GeminiRecommender {
    async fn get_recommendations(&self, liked_titles: Vec<String>) -> AppResult<Vec<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("Gemini API key not configured, recommendations are empty");
            return Ok(Vec::new());
        };

        if liked_titles.is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(&liked_titles)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let text = match serde_json::from_str::<GenerateContentResponse>(&body) {
            Ok(envelope) => envelope.text().unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected Gemini response envelope");
                return Ok(Vec::new());
            }
        };

        let titles = parse_recommendations(&text);

        tracing::info!(
            liked = liked_titles.len(),
            recommended = titles.len(),
            "Recommendations generated"
        );

        Ok(titles)
    }
}
