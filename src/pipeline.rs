use crate::config::Settings;
use crate::extractors::ListingExtractor;
use crate::geo::GeoEnricher;
use crate::models::{CandidatePost, ExtractedFields, ListingRecord, Source};
use crate::screening::{PostScreen, Screening};
use crate::splitter::{normalize_newlines, Splitter};
use crate::store::ResultStore;
use tracing::{debug, info, warn};

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub posts: usize,
    pub stored: usize,
    /// Dropped by screening, either not a rental or restricted tenancy
    pub skipped: usize,
    pub extraction_failures: usize,
}

/// Split, extract, enrich, store
pub struct Pipeline {
    splitter: Splitter,
    extractor: ListingExtractor,
    enricher: GeoEnricher,
    screen: PostScreen,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Self {
        Self::with_parts(
            Splitter::default(),
            ListingExtractor::from_settings(settings),
            GeoEnricher::from_settings(settings),
            PostScreen::from_settings(settings),
        )
    }

    pub fn with_parts(
        splitter: Splitter,
        extractor: ListingExtractor,
        enricher: GeoEnricher,
        screen: PostScreen,
    ) -> Self {
        debug!(
            "Pipeline ready (remote inference: {}, screening: {})",
            extractor.has_remote(),
            screen.is_active()
        );
        Self {
            splitter,
            extractor,
            enricher,
            screen,
        }
    }

    /// Fully resolve one post. Failures end up in the record, never here.
    pub async fn process_post(&self, post: &CandidatePost) -> ListingRecord {
        self.process(post).await.0
    }

    async fn process(&self, post: &CandidatePost) -> (ListingRecord, bool) {
        let (fields, failed) = match self.extractor.extract(&post.text).await {
            Ok(fields) => (fields, false),
            Err(e) => {
                warn!("Extraction failed: {}", e);
                (ExtractedFields::failed(format!("extraction failed: {}", e)), true)
            }
        };
        let enrichment = self.enricher.enrich(&fields).await;
        let record = ListingRecord::build(post, fields, enrichment.coordinates, enrichment.route);
        (record, failed)
    }

    /// Process every post in `text` sequentially, appending to `store`
    pub async fn run(
        &self,
        text: &str,
        source: Source,
        page_url: Option<&str>,
        store: &mut ResultStore,
    ) -> RunStats {
        let text = normalize_newlines(text);
        let mut stats = RunStats::default();

        for post in self.splitter.posts(&text, source, page_url) {
            stats.posts += 1;

            let verdict = self.screen.screen(&post.text).await;
            if verdict != Screening::Keep {
                debug!(
                    "Skipping post ({:?}): {}",
                    verdict,
                    post.text.chars().take(60).collect::<String>()
                );
                stats.skipped += 1;
                continue;
            }

            let (record, failed) = self.process(&post).await;
            if failed {
                stats.extraction_failures += 1;
            }

            let stored = store.append(record);
            info!(
                "🏡 Listing #{}: {} {} {}",
                stats.stored + 1,
                stored.bhk.as_deref().unwrap_or("?"),
                stored.location.as_deref().unwrap_or("unknown location"),
                stored
                    .distance_from_office_km
                    .map(|km| format!("({} km from office)", km))
                    .unwrap_or_default()
            );
            stats.stored += 1;
        }

        info!(
            "📊 Processed {} posts: {} stored, {} skipped, {} extraction failures",
            stats.posts, stats.stored, stats.skipped, stats.extraction_failures
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InsertOrder, OutputFormat};
    use std::time::Duration;

    const TWO_POSTS: &str = "2BHK near Indiranagar, rent 30k\n\n\nStudio at Koramangala, 18k rent";

    #[tokio::test]
    async fn test_end_to_end_without_services() {
        let pipeline = Pipeline::new(&Settings::default());
        let mut store = ResultStore::new(InsertOrder::OldestFirst);

        let stats = pipeline.run(TWO_POSTS, Source::Text, None, &mut store).await;
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.extraction_failures, 0);

        let records = store.list();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].bhk.as_deref(), Some("2BHK"));
        assert_eq!(records[0].location.as_deref(), Some("Indiranagar"));
        assert_eq!(records[0].rent, Some(30000));

        assert_eq!(records[1].bhk.as_deref(), Some("STUDIO"));
        assert_eq!(records[1].location.as_deref(), Some("Koramangala"));
        assert_eq!(records[1].rent, Some(18000));

        for record in records {
            assert_eq!(record.city, None);
            assert_eq!(record.additional_details, None);
            assert_eq!(record.latitude, None);
            assert_eq!(record.longitude, None);
            assert_eq!(record.distance_from_office_km, None);
            assert_eq!(record.driving_duration, None);
            assert_eq!(record.source, Source::Text);
            assert_eq!(record.page_url, "");
        }
        assert_ne!(records[0].id, records[1].id);
    }

    #[tokio::test]
    async fn test_failed_extraction_is_still_a_record() {
        let pipeline = Pipeline::new(&Settings::default());
        let mut store = ResultStore::default();

        let stats = pipeline
            .run("Good morning everyone, have a nice day", Source::Whatsapp, None, &mut store)
            .await;
        assert_eq!(stats.stored, 1);
        assert_eq!(stats.extraction_failures, 1);

        let record = &store.list()[0];
        assert_eq!(record.location, None);
        assert_eq!(record.rent, None);
        assert!(record
            .additional_details
            .as_deref()
            .unwrap()
            .starts_with("extraction failed:"));
    }

    #[tokio::test]
    async fn test_rentals_only_filter() {
        let settings = Settings {
            rentals_only: true,
            ..Settings::default()
        };
        let pipeline = Pipeline::new(&settings);
        let mut store = ResultStore::default();
        let text = "Selling my old bicycle, good condition\n\n\n1BHK for rent in Baner, 15k";

        let stats = pipeline.run(text, Source::Facebook, Some("https://www.facebook.com/groups/1/posts/2/"), &mut store).await;
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].page_url, "https://www.facebook.com/groups/1/posts/2/");
    }

    #[tokio::test]
    async fn test_restricted_listings_are_skipped() {
        let settings = Settings {
            skip_restricted: true,
            ..Settings::default()
        };
        let pipeline = Pipeline::new(&settings);
        let mut store = ResultStore::default();
        let text = "1BHK in Baner for 15k, girls only\n\n\n2BHK in Kothrud, 22k, bachelors welcome";

        let stats = pipeline.run(text, Source::Facebook, None, &mut store).await;
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.list()[0].location.as_deref(), Some("Kothrud"));
    }

    #[tokio::test]
    async fn test_unreachable_services_still_produce_output() {
        let settings = Settings {
            openai_api_key: Some("test-key".to_string()),
            openai_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            maps_api_key: Some("maps-key".to_string()),
            maps_api_url: "http://127.0.0.1:9/maps/api".to_string(),
            reference_point: Some(crate::models::Coordinates {
                latitude: 12.9716,
                longitude: 77.5946,
            }),
            request_timeout: Duration::from_secs(2),
            ..Settings::default()
        };
        let pipeline = Pipeline::new(&settings);
        let mut store = ResultStore::default();

        let stats = pipeline.run(TWO_POSTS, Source::Telegram, None, &mut store).await;
        assert_eq!(stats.stored, 2);
        assert_eq!(store.list()[0].location.as_deref(), Some("Indiranagar"));
        assert!(store.list().iter().all(|r| r.latitude.is_none() && r.distance_from_office_km.is_none()));

        let csv = store.serialize(OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_process_post_keeps_provenance() {
        let pipeline = Pipeline::new(&Settings::default());
        let post = CandidatePost {
            text: "3 BHK in Whitefield, Bangalore. Rs. 45,000 per month".to_string(),
            source: Source::Telegram,
            page_url: Some("https://t.me/flats_blr/7".to_string()),
            captured_at: chrono::Utc::now(),
        };

        let record = pipeline.process_post(&post).await;
        assert_eq!(record.bhk.as_deref(), Some("3BHK"));
        assert_eq!(record.rent, Some(45000));
        assert_eq!(record.city.as_deref(), Some("Bangalore"));
        assert_eq!(record.page_url, "https://t.me/flats_blr/7");
        assert_eq!(record.date, post.captured_at);
        assert!(record.id.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_produces_no_records() {
        let pipeline = Pipeline::new(&Settings::default());
        let mut store = ResultStore::default();
        let stats = pipeline.run("   ", Source::Text, None, &mut store).await;
        assert_eq!(stats, RunStats::default());
        assert!(store.is_empty());
    }
}
