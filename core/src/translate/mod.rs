/// Best-effort machine translation against third-party APIs
///
/// Contract with the rest of the crate: given a list of source strings
/// and a target language code, return a same-length list of translated
/// strings or `None` for entries no engine could handle. Engine choice
/// lives in an explicit selector object; a demotion sticks for the
/// rest of the run.
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

pub mod fill;
pub mod retry;

pub use fill::{fill_language, FillError, FillSummary};

use retry::{evaluate_retry, parse_retry_after, RetryError, RetryHint, RetryPolicy};

static TRANSLATE_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build translation client")
});

/// Items per Google batch request.
pub const BATCH_SIZE: usize = 25;
/// Batches in flight at once during a fill run.
pub const MAX_CONCURRENT: usize = 6;
/// Pause between request waves, to stay under provider rate limits.
pub const BATCH_DELAY_MS: u64 = 30;

const FALLBACK_SUCCESS_THRESHOLD: f64 = 0.8;
const GOOGLE_RETRY_POLICY: RetryPolicy = RetryPolicy::new(
    Duration::from_secs(1),
    Duration::from_secs(30),
    2,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Google,
    MyMemory,
    Libre,
}

impl Engine {
    pub fn label(&self) -> &'static str {
        match self {
            Engine::Google => "Google Cloud Translation",
            Engine::MyMemory => "MyMemory",
            Engine::Libre => "LibreTranslate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub google_api_key: Option<String>,
    pub google_endpoint: String,
    pub mymemory_endpoint: String,
    pub libre_endpoint: String,
    pub source_lang: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_endpoint: "https://translation.googleapis.com".into(),
            mymemory_endpoint: "https://api.mymemory.translated.net".into(),
            libre_endpoint: "https://libretranslate.com".into(),
            source_lang: "en".into(),
        }
    }
}

impl EngineConfig {
    /// Read the Google API key from the conventional environment
    /// variable; endpoints keep their defaults.
    pub fn from_env() -> Self {
        Self {
            google_api_key: std::env::var("GOOGLE_TRANSLATE_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            ..Self::default()
        }
    }
}

/// Provider-selection context. Starts on Google when a key is
/// configured; a poor Google run demotes the selector to the per-text
/// fallback chain (MyMemory, then LibreTranslate).
#[derive(Debug)]
pub struct EngineSelector {
    config: EngineConfig,
    current: Mutex<Engine>,
}

impl EngineSelector {
    pub fn new(config: EngineConfig) -> Self {
        let initial = if config.google_api_key.is_some() {
            Engine::Google
        } else {
            Engine::MyMemory
        };
        Self {
            config,
            current: Mutex::new(initial),
        }
    }

    pub fn current(&self) -> Engine {
        *self.current.lock().expect("engine state lock poisoned")
    }

    fn demote(&self, reason: &str) {
        let mut current = self.current.lock().expect("engine state lock poisoned");
        if *current == Engine::Google {
            warn!("demoting from Google to fallback engines: {reason}");
            *current = Engine::MyMemory;
        }
    }

    /// Translate a batch of texts into `target_lang`. The output always
    /// has the same length as the input; failures surface as `None`
    /// entries, never as errors.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> Vec<Option<String>> {
        if texts.is_empty() {
            return Vec::new();
        }

        if self.current() == Engine::Google {
            debug!("translating {} items via Google", texts.len());
            match self.translate_with_google(texts, target_lang).await {
                Ok(results) => {
                    let succeeded = results.iter().filter(|entry| entry.is_some()).count();
                    let rate = succeeded as f64 / texts.len() as f64;
                    if rate >= FALLBACK_SUCCESS_THRESHOLD {
                        return results;
                    }
                    self.demote(&format!("success rate {:.0}%", rate * 100.0));
                }
                Err(message) => self.demote(&message),
            }
        }

        debug!("translating {} items via fallback chain", texts.len());
        let mut results = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let mut translated = self.translate_with_mymemory(text, target_lang).await;
            if translated.is_none() {
                translated = self.translate_with_libre(text, target_lang).await;
            }
            results.push(translated);

            if index + 1 < texts.len() {
                sleep(Duration::from_millis(BATCH_DELAY_MS * 2)).await;
            }
        }
        results
    }

    async fn translate_with_google(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Vec<Option<String>>, String> {
        let Some(api_key) = self.config.google_api_key.as_deref() else {
            return Err("Google Translate API key not configured".into());
        };

        let url = format!(
            "{}/language/translate/v2?key={api_key}",
            self.config.google_endpoint
        );
        let body = GoogleRequest {
            q: texts,
            source: &self.config.source_lang,
            target: target_lang,
            format: "text",
        };

        let mut attempts = 0;
        let response = loop {
            let outcome = TRANSLATE_CLIENT.post(&url).json(&body).send().await;
            match outcome {
                Ok(response) if response.status().is_success() => break response,
                Ok(response) => {
                    let status = response.status();
                    let hint = retry_hint_from(&response);
                    let decision = evaluate_retry(
                        RetryError::Http {
                            status,
                            retry_hint: hint,
                        },
                        GOOGLE_RETRY_POLICY,
                        attempts,
                    );
                    if !decision.should_retry {
                        return Err(format!("Google API error: {status}"));
                    }
                    sleep(Duration::from_millis(decision.delay_ms)).await;
                }
                Err(err) => {
                    let decision = evaluate_retry(
                        RetryError::Network { retry_hint: None },
                        GOOGLE_RETRY_POLICY,
                        attempts,
                    );
                    if !decision.should_retry {
                        return Err(format!("Google request error: {err}"));
                    }
                    sleep(Duration::from_millis(decision.delay_ms)).await;
                }
            }
            attempts += 1;
        };

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|err| format!("Google response decode error: {err}"))?;

        let translations = parsed
            .data
            .map(|data| data.translations)
            .unwrap_or_default();
        if translations.len() != texts.len() {
            return Err(format!(
                "Google returned {} translations for {} inputs",
                translations.len(),
                texts.len()
            ));
        }

        Ok(translations
            .into_iter()
            .map(|entry| entry.translated_text.filter(|text| !text.is_empty()))
            .collect())
    }

    async fn translate_with_mymemory(&self, text: &str, target_lang: &str) -> Option<String> {
        let url = format!("{}/get", self.config.mymemory_endpoint);
        let langpair = format!("{}|{}", self.config.source_lang, target_lang);

        let response = TRANSLATE_CLIENT
            .get(&url)
            .query(&[("q", text), ("langpair", &langpair)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let parsed: MyMemoryResponse = response.json().await.ok()?;
        if parsed.response_status != 200 {
            return None;
        }
        parsed
            .response_data
            .and_then(|data| data.translated_text)
            .filter(|translated| !translated.is_empty())
    }

    async fn translate_with_libre(&self, text: &str, target_lang: &str) -> Option<String> {
        let url = format!("{}/translate", self.config.libre_endpoint);
        let body = LibreRequest {
            q: text,
            source: &self.config.source_lang,
            target: target_lang,
            format: "text",
        };

        let response = TRANSLATE_CLIENT.post(&url).json(&body).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }

        let parsed: LibreResponse = response.json().await.ok()?;
        parsed
            .translated_text
            .filter(|translated| !translated.is_empty())
    }
}

fn retry_hint_from(response: &Response) -> Option<RetryHint> {
    let header = response.headers().get(reqwest::header::RETRY_AFTER)?;
    let value = header.to_str().ok()?;
    parse_retry_after(value, SystemTime::now()).map(RetryHint::new)
}

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: Option<GoogleData>,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseStatus", default)]
    response_status: i64,
    #[serde(rename = "responseData")]
    response_data: Option<MyMemoryData>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Engine summary line for user-facing output.
pub fn describe_engines(selector: &EngineSelector) -> String {
    let key_status = if selector.config.google_api_key.is_some() {
        "configured"
    } else {
        "not configured"
    };
    let line = format!(
        "engine: {} (Google key {key_status})",
        selector.current().label()
    );
    info!("{line}");
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, api_key: Option<&str>) -> EngineConfig {
        EngineConfig {
            google_api_key: api_key.map(str::to_string),
            google_endpoint: server.uri(),
            mymemory_endpoint: server.uri(),
            libre_endpoint: server.uri(),
            source_lang: "en".into(),
        }
    }

    #[tokio::test]
    async fn google_batch_translates_all_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/language/translate/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "translations": [
                        {"translatedText": "Bonjour"},
                        {"translatedText": "Monde"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let selector = EngineSelector::new(config_for(&server, Some("test-key")));
        let results = selector
            .translate_batch(&["Hello".into(), "World".into()], "fr")
            .await;

        assert_eq!(
            results,
            vec![Some("Bonjour".into()), Some("Monde".into())]
        );
        assert_eq!(selector.current(), Engine::Google);
    }

    #[tokio::test]
    async fn low_google_success_rate_demotes_selector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/language/translate/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "translations": [
                        {"translatedText": null},
                        {"translatedText": null}
                    ]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseStatus": 200,
                "responseData": {"translatedText": "Bonjour"}
            })))
            .mount(&server)
            .await;

        let selector = EngineSelector::new(config_for(&server, Some("test-key")));
        let results = selector
            .translate_batch(&["Hello".into(), "World".into()], "fr")
            .await;

        assert_eq!(selector.current(), Engine::MyMemory);
        assert_eq!(
            results,
            vec![Some("Bonjour".into()), Some("Bonjour".into())]
        );
    }

    #[tokio::test]
    async fn missing_key_starts_on_fallback_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("langpair", "en|ja"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseStatus": 200,
                "responseData": {"translatedText": "こんにちは"}
            })))
            .mount(&server)
            .await;

        let selector = EngineSelector::new(config_for(&server, None));
        assert_eq!(selector.current(), Engine::MyMemory);

        let results = selector.translate_batch(&["Hello".into()], "ja").await;
        assert_eq!(results, vec![Some("こんにちは".into())]);
    }

    #[tokio::test]
    async fn mymemory_failure_falls_through_to_libre() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseStatus": 403,
                "responseData": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translatedText": "Hallo"
            })))
            .mount(&server)
            .await;

        let selector = EngineSelector::new(config_for(&server, None));
        let results = selector.translate_batch(&["Hello".into()], "de").await;
        assert_eq!(results, vec![Some("Hallo".into())]);
    }

    #[tokio::test]
    async fn every_engine_failing_yields_nones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let selector = EngineSelector::new(config_for(&server, None));
        let results = selector
            .translate_batch(&["Hello".into(), "World".into()], "de")
            .await;
        assert_eq!(results, vec![None, None]);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let config = EngineConfig::default();
        let selector = EngineSelector::new(config);
        assert!(selector.translate_batch(&[], "fr").await.is_empty());
    }
}
