use anyhow::{anyhow, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;

/// Represents a line of OCR text with its words
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// Represents a single recognized word and its box in the uploaded image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Recognition result: flat text plus the per-line word overlay when the
/// service provided one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrText {
    pub text: String,
    pub lines: Vec<OcrLine>,
}

impl OcrText {
    pub fn has_overlay(&self) -> bool {
        self.lines.iter().any(|line| !line.words.is_empty())
    }
}

/// An external text-recognition service.
pub trait OcrService: Send {
    fn recognize(&self, jpeg: &[u8]) -> Result<OcrText>;
}

/// Client for the OCR.space parse API.
pub struct OcrSpaceClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    language: String,
    engine: u8,
}

impl OcrSpaceClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.ocr_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: reqwest::blocking::Client, config: &AppConfig) -> Self {
        Self {
            client,
            endpoint: config.ocr_endpoint.clone(),
            api_key: config.ocr_api_key.clone(),
            language: config.ocr_language.clone(),
            engine: config.ocr_engine,
        }
    }
}

impl OcrService for OcrSpaceClient {
    fn recognize(&self, jpeg: &[u8]) -> Result<OcrText> {
        let file = Part::bytes(jpeg.to_vec())
            .file_name("selection.jpg")
            .mime_str("image/jpeg")?;

        let form = Form::new()
            .part("file", file)
            .text("language", self.language.clone())
            .text("isOverlayRequired", "true")
            .text("OCREngine", self.engine.to_string())
            .text("detectOrientation", "true");

        crate::log(&format!(
            "OCR request: {} bytes to {}",
            jpeg.len(),
            self.endpoint
        ));

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .header("User-Agent", "scrap-fill")
            .multipart(form)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(anyhow!("OCR service returned HTTP {}: {}", status, body.trim()));
        }

        parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Value,
    #[serde(default)]
    parsed_results: Vec<ApiParsedResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiParsedResult {
    #[serde(default)]
    parsed_text: String,
    #[serde(default, alias = "WordsOverlay")]
    text_overlay: Option<ApiOverlay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiOverlay {
    #[serde(default)]
    lines: Vec<ApiLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiLine {
    #[serde(default)]
    line_text: String,
    #[serde(default)]
    words: Vec<ApiWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiWord {
    #[serde(default)]
    word_text: String,
    #[serde(default)]
    left: f32,
    #[serde(default)]
    top: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

/// Flattens `ErrorMessage`, which the service sends as a string or a list of strings.
fn error_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses an OCR.space JSON response body into structured output.
pub fn parse_response(body: &str) -> Result<OcrText> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| anyhow!("Malformed OCR response: {}", e))?;

    if response.is_errored_on_processing {
        let message = error_text(&response.error_message);
        return Err(anyhow!(if message.is_empty() {
            "OCR processing failed".to_string()
        } else {
            message
        }));
    }

    let first = response
        .parsed_results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("OCR response contained no results"))?;

    let lines = first
        .text_overlay
        .map(|overlay| {
            overlay
                .lines
                .into_iter()
                .map(|line| {
                    let words: Vec<OcrWord> = line
                        .words
                        .into_iter()
                        .filter(|w| !w.word_text.trim().is_empty())
                        .map(|w| OcrWord {
                            text: w.word_text,
                            left: w.left,
                            top: w.top,
                            width: w.width,
                            height: w.height,
                        })
                        .collect();
                    let text = if line.line_text.is_empty() {
                        words
                            .iter()
                            .map(|w| w.text.as_str())
                            .collect::<Vec<_>>()
                            .join(" ")
                    } else {
                        line.line_text
                    };
                    OcrLine { text, words }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(OcrText {
        text: first.parsed_text,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Accepts one HTTP request, answers with `status` and `body`, and
    /// returns the raw request lower-cased.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/parse/image", listener.local_addr().unwrap());
        let status = status.to_string();
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let Some(end) = find(&request, b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let done = match length {
                    Some(length) => request.len() >= end + 4 + length,
                    None => request.ends_with(b"0\r\n\r\n"),
                };
                if done {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).to_lowercase()
        });

        (endpoint, handle)
    }

    fn local_client(endpoint: String) -> OcrSpaceClient {
        let config = AppConfig {
            ocr_endpoint: endpoint,
            ocr_api_key: "K123".to_string(),
            ..AppConfig::default()
        };
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        OcrSpaceClient::with_client(client, &config)
    }

    #[test]
    fn test_recognize_sends_multipart_request() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"ParsedResults":[{"ParsedText":"Hello"}],"IsErroredOnProcessing":false}"#,
        );
        let client = local_client(endpoint);

        let result = client.recognize(&[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        assert_eq!(result.text, "Hello");

        let request = server.join().unwrap();
        assert!(request.starts_with("post /parse/image "));
        assert!(request.contains("apikey: k123"));
        assert!(request.contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="selection.jpg""#));
        assert!(request.contains("content-type: image/jpeg"));

        let field = |name: &str| {
            let marker = format!("name=\"{}\"\r\n\r\n", name.to_lowercase());
            let start = request.find(&marker).map(|i| i + marker.len())?;
            request[start..].split("\r\n").next().map(str::to_string)
        };
        assert_eq!(field("language").as_deref(), Some("eng"));
        assert_eq!(field("isOverlayRequired").as_deref(), Some("true"));
        assert_eq!(field("OCREngine").as_deref(), Some("2"));
        assert_eq!(field("detectOrientation").as_deref(), Some("true"));
    }

    #[test]
    fn test_recognize_rejects_http_error() {
        let (endpoint, server) = serve_once("403 Forbidden", "The API key is invalid");
        let client = local_client(endpoint);

        let err = client.recognize(&[0xFF, 0xD8]).unwrap_err();
        assert!(err.to_string().contains("403"));
        server.join().unwrap();
    }

    const OVERLAY_RESPONSE: &str = r#"{
        "ParsedResults": [{
            "TextOverlay": {
                "Lines": [
                    { "LineText": "123 MAIN ST", "Words": [
                        { "WordText": "123", "Left": 4, "Top": 2, "Height": 10, "Width": 20 },
                        { "WordText": "MAIN", "Left": 30, "Top": 2, "Height": 10, "Width": 35 },
                        { "WordText": "ST", "Left": 70, "Top": 2, "Height": 10, "Width": 15 }
                    ], "MaxHeight": 10, "MinTop": 2 },
                    { "LineText": "SPRINGFIELD IL", "Words": [
                        { "WordText": "SPRINGFIELD", "Left": 4, "Top": 20, "Height": 10, "Width": 80 },
                        { "WordText": "IL", "Left": 90, "Top": 20, "Height": 10, "Width": 12 }
                    ], "MaxHeight": 10, "MinTop": 20 }
                ],
                "HasOverlay": true
            },
            "FileParseExitCode": 1,
            "ParsedText": "123 MAIN ST\r\nSPRINGFIELD IL\r\n",
            "ErrorMessage": ""
        }],
        "OCRExitCode": 1,
        "IsErroredOnProcessing": false
    }"#;

    #[test]
    fn test_parse_overlay_response() {
        let result = parse_response(OVERLAY_RESPONSE).unwrap();
        assert!(result.has_overlay());
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].words.len(), 3);
        assert_eq!(result.lines[0].words[1].text, "MAIN");
        assert_eq!(result.lines[0].words[1].left, 30.0);
        assert_eq!(result.lines[1].text, "SPRINGFIELD IL");
        assert!(result.text.starts_with("123 MAIN ST"));
    }

    #[test]
    fn test_parse_flat_response() {
        let body = r#"{ "ParsedResults": [{ "ParsedText": "hello\r\nworld" }], "IsErroredOnProcessing": false }"#;
        let result = parse_response(body).unwrap();
        assert!(!result.has_overlay());
        assert_eq!(result.text, "hello\r\nworld");
    }

    #[test]
    fn test_parse_words_overlay_alias() {
        let body = r#"{ "ParsedResults": [{ "ParsedText": "a b",
            "WordsOverlay": { "Lines": [{ "Words": [{ "WordText": "a" }, { "WordText": "b" }] }] } }] }"#;
        let result = parse_response(body).unwrap();
        assert_eq!(result.lines[0].text, "a b");
    }

    #[test]
    fn test_parse_service_error_string() {
        let body = r#"{ "IsErroredOnProcessing": true, "ErrorMessage": "File failed validation" }"#;
        let err = parse_response(body).unwrap_err();
        assert_eq!(err.to_string(), "File failed validation");
    }

    #[test]
    fn test_parse_service_error_list() {
        let body = r#"{ "IsErroredOnProcessing": true, "ErrorMessage": ["Timed out", "Try again"] }"#;
        let err = parse_response(body).unwrap_err();
        assert_eq!(err.to_string(), "Timed out; Try again");
    }

    #[test]
    fn test_parse_no_results() {
        let body = r#"{ "IsErroredOnProcessing": false, "ParsedResults": [] }"#;
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_response("<html>502</html>").is_err());
    }
}
