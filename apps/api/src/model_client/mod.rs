/// Model client: the single point of entry for hosted text-to-image inference.
///
/// Talks to a Hugging Face Inference-style endpoint: `POST {base}/models/{model}`
/// with a bearer token, JSON `{inputs, parameters}` in, encoded image bytes out.
/// The response is re-encoded as PNG so callers always get the same format.
///
/// One attempt per call. Failures are returned to the caller, which decides
/// whether to fall back.
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::ImageFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::generation::facade::GenerationRequest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an undecodable image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Model returned an empty body")]
    EmptyBody,
}

/// Anything that can turn a prompt into PNG bytes.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    async fn text_to_image(&self, request: &GenerationRequest) -> Result<Vec<u8>, ModelError>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Debug, Serialize)]
struct InferenceParameters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_inference_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guidance_scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: String,
}

/// Client for the hosted diffusion model.
#[derive(Clone)]
pub struct HfInferenceClient {
    client: Client,
    endpoint: String,
    model: String,
    token: String,
}

impl HfInferenceClient {
    pub fn new(base_url: &str, model: &str, token: String) -> Result<Self, ModelError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint: format!("{}/models/{}", base_url.trim_end_matches('/'), model),
            model: model.to_string(),
            token,
        })
    }
}

#[async_trait]
impl ImageModel for HfInferenceClient {
    fn name(&self) -> &str {
        &self.model
    }

    /// Runs one inference call. Width and height are not sent: the model
    /// produces its native resolution.
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<Vec<u8>, ModelError> {
        let sampler = &request.sampler;
        if sampler.sampler.is_some() || sampler.upscaler.is_some() {
            debug!(
                "Ignoring sampler {:?} / upscaler {:?}: not supported by the inference endpoint",
                sampler.sampler, sampler.upscaler
            );
        }
        let body = InferenceRequest {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                negative_prompt: sampler.negative_prompt.as_deref().filter(|s| !s.is_empty()),
                num_inference_steps: sampler.num_inference_steps,
                guidance_scale: sampler.guidance_scale,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<InferenceError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ModelError::EmptyBody);
        }

        let image = image::load_from_memory(&bytes)?;
        debug!(
            "Model {} returned {}x{} image ({} bytes)",
            self.model,
            image.width(),
            image.height(),
            bytes.len()
        );

        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use crate::generation::facade::SamplerParams;
    use crate::test_support::spawn_server;

    const TOKEN: &str = "hf_test_token";

    fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 200, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    async fn fake_model(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(format!("Bearer {TOKEN}").as_str());
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"})))
                .into_response();
        }
        if body["inputs"] == "loading" {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "Model is currently loading"})),
            )
                .into_response();
        }
        if body["inputs"] == "garbage" {
            return ([(header::CONTENT_TYPE, "image/jpeg")], b"nope".to_vec()).into_response();
        }
        // Echo sampler params back through the image size so the test can see them
        let steps = body["parameters"]["num_inference_steps"].as_u64().unwrap_or(1) as u32;
        ([(header::CONTENT_TYPE, "image/jpeg")], jpeg_bytes(steps, 16)).into_response()
    }

    async fn client_for(token: &str) -> HfInferenceClient {
        let router = Router::new().route("/models/*model", post(fake_model));
        let base = spawn_server(router).await;
        HfInferenceClient::new(&base, "org/model", token.to_string()).unwrap()
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            width: 512,
            height: 512,
            sampler: SamplerParams {
                num_inference_steps: Some(24),
                ..SamplerParams::default()
            },
        }
    }

    #[tokio::test]
    async fn test_text_to_image_reencodes_as_png() {
        let client = client_for(TOKEN).await;
        let bytes = client.text_to_image(&request("a cat")).await.unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&bytes).unwrap();
        // native model size, not the requested 512x512
        assert_eq!((img.width(), img.height()), (24, 16));
    }

    #[tokio::test]
    async fn test_text_to_image_bad_token_is_api_error() {
        let client = client_for("wrong").await;
        let err = client.text_to_image(&request("a cat")).await.unwrap_err();
        match err {
            ModelError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_to_image_server_error_surfaces_message() {
        let client = client_for(TOKEN).await;
        let err = client.text_to_image(&request("loading")).await.unwrap_err();
        assert!(matches!(err, ModelError::Api { status: 503, .. }));
        assert!(err.to_string().contains("currently loading"));
    }

    #[tokio::test]
    async fn test_text_to_image_undecodable_payload() {
        let client = client_for(TOKEN).await;
        let err = client.text_to_image(&request("garbage")).await.unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let client =
            HfInferenceClient::new("http://127.0.0.1:9", "org/model", TOKEN.to_string()).unwrap();
        let err = client.text_to_image(&request("a cat")).await.unwrap_err();
        assert!(matches!(err, ModelError::Http(_)));
    }

    #[test]
    fn test_endpoint_joins_base_and_model() {
        let client =
            HfInferenceClient::new("https://api.example/", "runwayml/sd", "t".into()).unwrap();
        assert_eq!(client.endpoint, "https://api.example/models/runwayml/sd");
        assert_eq!(client.name(), "runwayml/sd");
    }

    #[test]
    fn test_empty_negative_prompt_is_omitted() {
        let body = InferenceRequest {
            inputs: "x",
            parameters: InferenceParameters {
                negative_prompt: Some("").filter(|s: &&str| !s.is_empty()),
                num_inference_steps: None,
                guidance_scale: Some(6.5),
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"inputs": "x", "parameters": {"guidance_scale": 6.5}}));
    }
}
