pub mod ai;
pub mod fallback;
pub mod traits;

pub use ai::AiExtractor;
pub use fallback::RegexExtractor;
pub use traits::{FieldExtractor, PostCheck, PostClassifier};

use crate::config::Settings;
use crate::error::ExtractionFailure;
use crate::models::ExtractedFields;
use tracing::{debug, warn};

/// Remote inference first (when configured), then the regex heuristics
pub struct ListingExtractor {
    remote: Option<Box<dyn FieldExtractor>>,
    fallback: Box<dyn FieldExtractor>,
}

impl ListingExtractor {
    pub fn new(remote: Option<Box<dyn FieldExtractor>>, fallback: Box<dyn FieldExtractor>) -> Self {
        Self { remote, fallback }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let remote = remote_from_settings(settings)
            .map(|extractor| Box::new(extractor) as Box<dyn FieldExtractor>);
        Self::new(remote, Box::new(RegexExtractor::new()))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Try each strategy in order
    pub async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractionFailure> {
        let mut remote_failure = None;

        if let Some(remote) = &self.remote {
            let result = remote.extract(text).await.and_then(|fields| {
                if fields.has_listing_fields() {
                    Ok(fields)
                } else {
                    Err(ExtractionFailure::NoListingFields)
                }
            });
            match result {
                Ok(fields) => {
                    debug!("Extracted fields with {}", remote.name());
                    return Ok(fields);
                }
                Err(e) => {
                    warn!("{} extraction failed, falling back: {}", remote.name(), e);
                    remote_failure = Some(e);
                }
            }
        }

        match self.fallback.extract(text).await {
            Ok(fields) => Ok(fields),
            Err(fallback) => Err(match remote_failure {
                Some(remote) => ExtractionFailure::Exhausted {
                    remote: remote.to_string(),
                    fallback: fallback.to_string(),
                },
                None => fallback,
            }),
        }
    }
}

/// Model client for the configured key. A client that cannot be constructed
/// only disables remote inference.
pub fn remote_from_settings(settings: &Settings) -> Option<AiExtractor> {
    let key = settings.openai_api_key.as_ref()?;
    match AiExtractor::new(
        key.clone(),
        settings.openai_api_url.clone(),
        settings.openai_model.clone(),
        settings.request_timeout,
    ) {
        Ok(extractor) => Some(extractor),
        Err(e) => {
            warn!("Remote inference disabled: {}", e);
            None
        }
    }
}
