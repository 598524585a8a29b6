/*!
 * Page translation seam and its concrete implementations.
 *
 * The pipeline only knows the [`PageTranslator`] trait; the text and vision
 * implementations below talk to an OpenAI-compatible provider, and tests
 * substitute [`mock::MockTranslator`]. Implementations must be safe to
 * invoke concurrently from multiple workers with no shared mutable state
 * between calls.
 *
 * Empty-translation policy: a blank source page yields a valid empty
 * translation without a provider call; a non-blank page for which the
 * provider returns an empty string is an error, never a silent success.
 */

pub mod mock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;

use crate::document::{PageContent, PageTranslation, PageUnit};
use crate::errors::{ProviderError, TranslateError};
use crate::pipeline::retry::RetryPolicy;
use crate::providers::openai::{ChatRequest, OpenAI};

/// Translates one page unit into a [`PageTranslation`].
///
/// A failure after retries are exhausted propagates as a regular error to
/// the scheduler; it never aborts the batch.
#[async_trait]
pub trait PageTranslator: Send + Sync {
    /// Translate a single page
    async fn translate(&self, unit: &PageUnit) -> Result<PageTranslation, TranslateError>;
}

/// Translator for text pages via chat completions
pub struct TextTranslator {
    /// Provider client
    client: OpenAI,
    /// Model name
    model: String,
    /// Source language name (e.g. "English")
    source_language: String,
    /// Target language name (e.g. "Serbian")
    target_language: String,
    /// Retry policy for transient provider failures
    retry: RetryPolicy,
}

impl TextTranslator {
    /// Create a text translator
    pub fn new(
        client: OpenAI,
        model: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            retry,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a professional translator. Your task is to translate a page of text \
             from {} to {}. Return only the translated text in {}, nothing else. \
             Do not explain, summarize, or change the meaning of the original text. \
             Preserve the original structure and line breaks as much as possible.",
            self.source_language, self.target_language, self.target_language
        )
    }
}

#[async_trait]
impl PageTranslator for TextTranslator {
    async fn translate(&self, unit: &PageUnit) -> Result<PageTranslation, TranslateError> {
        let text = match &unit.content {
            PageContent::Text(text) => text,
            PageContent::Image(_) => {
                return Err(TranslateError::Provider(ProviderError::RequestFailed(
                    format!("text translator received an image page (page {})", unit.index),
                )))
            }
        };

        // A blank page is a valid empty translation, no provider call needed
        if text.trim().is_empty() {
            debug!("Page {} is blank, skipping provider call", unit.index);
            return Ok(PageTranslation {
                index: unit.index,
                original: text.clone(),
                translated: String::new(),
            });
        }

        let request = ChatRequest::new(&self.model)
            .system(self.system_prompt())
            .user_text(text)
            .temperature(0.3);

        let op_name = format!("translate page {}", unit.index);
        let response = self
            .retry
            .run(&op_name, || {
                let client = self.client.clone();
                let request = request.clone();
                async move { client.complete(request).await }
            })
            .await?;

        let translated = OpenAI::extract_text(&response);
        if translated.trim().is_empty() {
            return Err(TranslateError::EmptyTranslation { index: unit.index });
        }

        Ok(PageTranslation {
            index: unit.index,
            original: text.clone(),
            translated: translated.trim().to_string(),
        })
    }
}

/// Translator for image pages via a vision-capable model.
///
/// The model is asked to transcribe the page and translate it, returning
/// both sections under `#<Language>#` markers; the transcription becomes
/// the `original` field of the result.
pub struct VisionTranslator {
    /// Provider client
    client: OpenAI,
    /// Vision-capable model name
    model: String,
    /// Source language name
    source_language: String,
    /// Target language name
    target_language: String,
    /// Retry policy for transient provider failures
    retry: RetryPolicy,
}

impl VisionTranslator {
    /// Create a vision translator
    pub fn new(
        client: OpenAI,
        model: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            retry,
        }
    }

    fn instruction(&self) -> String {
        format!(
            "You are a professional translator. This image is a scanned page from a book \
             in {source}. First transcribe the page content as clear, grammatical {source}. \
             Then, in a separate section, translate it into {target}. \
             Use the following section markers:\n#{source}#\n...\n#{target}#\n...\n\
             Do not explain, summarize, or change the meaning of the original text. \
             Preserve the text structure and line layout where possible.",
            source = self.source_language,
            target = self.target_language
        )
    }
}

#[async_trait]
impl PageTranslator for VisionTranslator {
    async fn translate(&self, unit: &PageUnit) -> Result<PageTranslation, TranslateError> {
        let image = match &unit.content {
            PageContent::Image(bytes) => bytes,
            PageContent::Text(_) => {
                return Err(TranslateError::Provider(ProviderError::RequestFailed(
                    format!("vision translator received a text page (page {})", unit.index),
                )))
            }
        };

        let data_url = format!(
            "data:{};base64,{}",
            sniff_image_mime(image),
            BASE64.encode(image)
        );

        let request = ChatRequest::new(&self.model)
            .user_image(self.instruction(), data_url)
            .temperature(0.3);

        let op_name = format!("translate page {}", unit.index);
        let response = self
            .retry
            .run(&op_name, || {
                let client = self.client.clone();
                let request = request.clone();
                async move { client.complete(request).await }
            })
            .await?;

        let output = OpenAI::extract_text(&response);
        if output.trim().is_empty() {
            return Err(TranslateError::EmptyTranslation { index: unit.index });
        }

        let (original, translated) =
            split_marked_sections(&output, &self.source_language, &self.target_language);
        if translated.trim().is_empty() {
            return Err(TranslateError::EmptyTranslation { index: unit.index });
        }

        Ok(PageTranslation {
            index: unit.index,
            original,
            translated,
        })
    }
}

/// Guess the MIME type of an encoded page image from its magic bytes
fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Split a `#<Source>#` / `#<Target>#` marked response into (original,
/// translated). A response without markers is treated as translation only.
fn split_marked_sections(output: &str, source_label: &str, target_label: &str) -> (String, String) {
    let source_marker = format!("#{}#", source_label);
    let target_marker = format!("#{}#", target_label);

    match (output.find(&source_marker), output.find(&target_marker)) {
        (Some(source_at), Some(target_at)) if source_at < target_at => {
            let original = output[source_at + source_marker.len()..target_at]
                .trim()
                .to_string();
            let translated = output[target_at + target_marker.len()..].trim().to_string();
            (original, translated)
        }
        (None, Some(target_at)) => (
            String::new(),
            output[target_at + target_marker.len()..].trim().to_string(),
        ),
        _ => (String::new(), output.trim().to_string()),
    }
}
