use crate::error::ExtractionFailure;
use crate::models::ExtractedFields;
use async_trait::async_trait;

/// Common trait for listing field extractors
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Turn one post's text into listing fields
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractionFailure>;

    /// Strategy name used in logs
    fn name(&self) -> &'static str;
}

/// Yes/no questions asked about a post before extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCheck {
    /// Is the post about renting residential property?
    Rental,
    /// Is the listing only for female or family tenants?
    RestrictedTenancy,
}

/// Answers [`PostCheck`] questions about a post's text
#[async_trait]
pub trait PostClassifier: Send + Sync {
    async fn check(&self, check: PostCheck, text: &str) -> Result<bool, ExtractionFailure>;

    fn name(&self) -> &'static str;
}
