//! Pre-extraction checks that decide whether a post is worth keeping.
//!
//! Each check asks the model when one is configured and falls back to the
//! keyword heuristics when there is no model or its answer is unusable.

use crate::config::Settings;
use crate::extractors::fallback::{looks_like_rental, looks_restricted};
use crate::extractors::{remote_from_settings, PostCheck, PostClassifier};
use tracing::{debug, warn};

/// Outcome of screening one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    Keep,
    NotRental,
    Restricted,
}

pub struct PostScreen {
    classifier: Option<Box<dyn PostClassifier>>,
    rentals_only: bool,
    skip_restricted: bool,
}

impl PostScreen {
    pub fn new(
        classifier: Option<Box<dyn PostClassifier>>,
        rentals_only: bool,
        skip_restricted: bool,
    ) -> Self {
        Self {
            classifier,
            rentals_only,
            skip_restricted,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let classifier = if settings.rentals_only || settings.skip_restricted {
            remote_from_settings(settings)
                .map(|client| Box::new(client) as Box<dyn PostClassifier>)
        } else {
            None
        };
        Self::new(classifier, settings.rentals_only, settings.skip_restricted)
    }

    /// Keep-all screens never call out
    pub fn is_active(&self) -> bool {
        self.rentals_only || self.skip_restricted
    }

    pub async fn screen(&self, text: &str) -> Screening {
        if self.rentals_only && !self.ask(PostCheck::Rental, text).await {
            return Screening::NotRental;
        }
        if self.skip_restricted && self.ask(PostCheck::RestrictedTenancy, text).await {
            return Screening::Restricted;
        }
        Screening::Keep
    }

    async fn ask(&self, check: PostCheck, text: &str) -> bool {
        if let Some(classifier) = &self.classifier {
            match classifier.check(check, text).await {
                Ok(answer) => {
                    debug!("{} answered {:?}: {}", classifier.name(), check, answer);
                    return answer;
                }
                Err(e) => warn!("{:?} check failed, using keywords: {}", check, e),
            }
        }
        match check {
            PostCheck::Rental => looks_like_rental(text),
            PostCheck::RestrictedTenancy => looks_restricted(text),
        }
    }
}
