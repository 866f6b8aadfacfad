//! Generation facade: chooses between the hosted model and the placeholder.
//!
//! Flow: external model (if configured) → on any failure, placeholder compositor.
//! The external path never surfaces an error to the caller; only invalid
//! dimensions or a compositor failure do.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::model_client::{HfInferenceClient, ImageModel};
use crate::prompts::PromptRecord;
use crate::render::{compose, RenderError};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Optional sampler settings, forwarded to the hosted model only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerParams {
    pub negative_prompt: Option<String>,
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub sampler: Option<String>,
    pub upscaler: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub sampler: SamplerParams,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.into(),
            width,
            height,
            sampler: SamplerParams::default(),
        }
    }
}

impl From<&PromptRecord> for GenerationRequest {
    fn from(record: &PromptRecord) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            prompt: record.prompt.clone(),
            width: record.width,
            height: record.height,
            sampler: SamplerParams {
                negative_prompt: non_empty(&record.negative_prompt),
                num_inference_steps: Some(record.num_inference_steps),
                guidance_scale: Some(record.guidance_scale),
                sampler: non_empty(&record.sampler),
                upscaler: non_empty(&record.upscaler),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Model,
    Placeholder,
}

/// PNG bytes plus where they came from.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub png: Bytes,
    pub source: ImageSource,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Width and height must be positive (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Placeholder rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ────────────────────────────────────────────────────────────────────────────
// Facade
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Generator {
    model: Option<Arc<dyn ImageModel>>,
}

impl Generator {
    pub fn new(model: Option<Arc<dyn ImageModel>>) -> Self {
        Self { model }
    }

    /// Enables the hosted model when a token is configured.
    pub fn from_config(config: &Config) -> Self {
        let Some(token) = config.huggingface_token.clone() else {
            info!("HUGGINGFACE_TOKEN not set, serving placeholder images only");
            return Self::new(None);
        };

        match HfInferenceClient::new(&config.inference_url, &config.image_model, token) {
            Ok(client) => {
                info!("External image model enabled: {}", config.image_model);
                Self::new(Some(Arc::new(client)))
            }
            Err(e) => {
                warn!("External image model unavailable, serving placeholders: {e}");
                Self::new(None)
            }
        }
    }

    pub fn uses_remote_model(&self) -> bool {
        self.model.is_some()
    }

    /// Produces a PNG for `request`, degrading to the placeholder on any model failure.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let (width, height) = (request.width, request.height);
        if width == 0 || height == 0 {
            return Err(GenerationError::InvalidDimensions { width, height });
        }

        if let Some(model) = &self.model {
            match model.text_to_image(request).await {
                Ok(png) => {
                    info!("Generated image with {} ({} bytes)", model.name(), png.len());
                    return Ok(GeneratedImage {
                        png: Bytes::from(png),
                        source: ImageSource::Model,
                    });
                }
                Err(e) => warn!(
                    "External model {} failed, rendering placeholder: {e}",
                    model.name()
                ),
            }
        }

        // CPU-bound: keep it off the async workers
        let prompt = request.prompt.clone();
        let png = tokio::task::spawn_blocking(move || compose(&prompt, width, height)).await??;
        info!("Rendered {width}x{height} placeholder ({} bytes)", png.len());

        Ok(GeneratedImage {
            png: Bytes::from(png),
            source: ImageSource::Placeholder,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::model_client::ModelError;

    /// Test double: either always succeeds with a fixed image or always fails.
    pub struct FakeModel {
        pub calls: AtomicUsize,
        pub succeed: bool,
    }

    impl FakeModel {
        pub fn new(succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                succeed,
            })
        }
    }

    pub const FAKE_MODEL_SIZE: u32 = 8;

    #[async_trait]
    impl ImageModel for FakeModel {
        fn name(&self) -> &str {
            "fake"
        }

        async fn text_to_image(&self, _request: &GenerationRequest) -> Result<Vec<u8>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeed {
                return Err(ModelError::Api {
                    status: 401,
                    message: "Invalid credentials".to_string(),
                });
            }
            let img = image::RgbImage::new(FAKE_MODEL_SIZE, FAKE_MODEL_SIZE);
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png)
                .map_err(ModelError::Decode)?;
            Ok(buf.into_inner())
        }
    }

    fn dims(png: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(png).expect("decodable PNG");
        (img.width(), img.height())
    }

    #[tokio::test]
    async fn test_without_model_renders_placeholder() {
        let generator = Generator::new(None);
        assert!(!generator.uses_remote_model());

        let image = generator
            .generate(&GenerationRequest::new("x", 100, 100))
            .await
            .unwrap();
        assert_eq!(image.source, ImageSource::Placeholder);
        assert_eq!(dims(&image.png), (100, 100));
    }

    #[tokio::test]
    async fn test_failing_model_falls_back_to_placeholder() {
        let model = FakeModel::new(false);
        let generator = Generator::new(Some(model.clone()));

        let image = generator
            .generate(&GenerationRequest::new("x", 120, 90))
            .await
            .unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1, "exactly one attempt");
        assert_eq!(image.source, ImageSource::Placeholder);
        assert_eq!(dims(&image.png), (120, 90));
    }

    #[tokio::test]
    async fn test_successful_model_ignores_requested_size() {
        let model = FakeModel::new(true);
        let generator = Generator::new(Some(model.clone()));

        let image = generator
            .generate(&GenerationRequest::new("x", 768, 768))
            .await
            .unwrap();
        assert_eq!(image.source, ImageSource::Model);
        assert_eq!(dims(&image.png), (FAKE_MODEL_SIZE, FAKE_MODEL_SIZE));
    }

    #[tokio::test]
    async fn test_zero_dimensions_rejected_before_model_call() {
        let model = FakeModel::new(true);
        let generator = Generator::new(Some(model.clone()));

        let err = generator
            .generate(&GenerationRequest::new("x", 0, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidDimensions { width: 0, height: 100 }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config_without_token_is_placeholder_only() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(!Generator::from_config(&config).uses_remote_model());
    }

    #[test]
    fn test_from_config_with_token_enables_model() {
        let config = Config::from_lookup(|k| (k == "HUGGINGFACE_TOKEN").then(|| "hf_x".into()))
            .unwrap();
        assert!(Generator::from_config(&config).uses_remote_model());
    }

    #[test]
    fn test_request_from_prompt_record() {
        let record = PromptRecord {
            character: "c".into(),
            prompt: "p".into(),
            negative_prompt: String::new(),
            width: 512,
            height: 256,
            num_inference_steps: 25,
            guidance_scale: 6.5,
            sampler: "ddim".into(),
            upscaler: String::new(),
        };
        let req = GenerationRequest::from(&record);
        assert_eq!((req.width, req.height), (512, 256));
        assert_eq!(req.sampler.negative_prompt, None);
        assert_eq!(req.sampler.num_inference_steps, Some(25));
        assert_eq!(req.sampler.sampler.as_deref(), Some("ddim"));
        assert_eq!(req.sampler.upscaler, None);
    }
}
