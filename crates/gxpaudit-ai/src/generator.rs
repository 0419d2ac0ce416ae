//! Collaborator interfaces: text generation and speech-to-text.

use async_trait::async_trait;
use tracing::info;

use crate::error::GenerationError;

/// Media type assumed for images passed without a `data:` URI header.
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Token budget for transcribing one page of handwritten notes.
pub const HANDWRITING_MAX_TOKENS: u32 = 2_000;

/// Fixed instruction sent with a photo of handwritten notes.
pub const HANDWRITING_PROMPT: &str = "Please transcribe all handwritten text from this image.

Instructions:
- Extract all handwritten text exactly as written
- Maintain the structure and organization of the notes
- Include any diagrams or sketches descriptions in [brackets]
- If text is unclear or illegible, indicate with [illegible]
- Preserve bullet points, numbering, and formatting
- Include any signatures, dates, or timestamps

Provide only the transcribed text, without any additional commentary or explanations.";

/// A chat-style language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a text-only prompt.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;

    /// Complete a prompt over a set of images, returning one response for
    /// the whole set.
    async fn complete_with_images(
        &self,
        _prompt: &str,
        _images: &[ImagePayload],
        _max_tokens: u32,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unsupported("image input"))
    }
}

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, GenerationError>;
}

/// Transcribe handwritten notes in `image` (base64 or a `data:` URI) with
/// a vision-capable generator.
///
/// The model's text is returned as-is; it is not JSON and skips the parsing
/// pipeline.
pub async fn transcribe_handwritten<G>(generator: &G, image: &str) -> Result<String, GenerationError>
where
    G: TextGenerator + ?Sized,
{
    let image = image.trim();
    if image.is_empty() {
        return Err(GenerationError::NoImages);
    }
    let images = [ImagePayload::parse(image)];
    let text = generator
        .complete_with_images(HANDWRITING_PROMPT, &images, HANDWRITING_MAX_TOKENS)
        .await?;
    info!(chars = text.len(), "handwritten notes transcribed");
    Ok(text)
}

/// A base64-encoded image with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub media_type: String,
    /// Base64 data without any URI header.
    pub data: String,
}

impl ImagePayload {
    /// Accept either a `data:<media>;base64,<data>` URI or bare base64.
    pub fn parse(input: &str) -> Self {
        if let Some(rest) = input.strip_prefix("data:")
            && let Some((header, data)) = rest.split_once(',')
        {
            let media_type = header.split(';').next().unwrap_or_default().trim();
            return Self {
                media_type: if media_type.is_empty() {
                    DEFAULT_IMAGE_MEDIA_TYPE.to_string()
                } else {
                    media_type.to_string()
                },
                data: data.to_string(),
            };
        }

        Self {
            media_type: DEFAULT_IMAGE_MEDIA_TYPE.to_string(),
            data: input.to_string(),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}
