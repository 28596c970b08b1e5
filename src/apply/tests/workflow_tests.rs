use super::fake::Node;
use super::{open_listing, screenshots, COVER_TEXT, LISTING_URL};
use crate::apply::{selectors, Diagnostics, ListingWorkflow, MAX_ATTEMPTS};
use crate::config::ApplyConfig;
use crate::generator::{CoverLetterGenerator, GeneratorError};
use crate::results::{ApplyOutcome, FailureReason};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DESCRIPTION: &str = "Ищем бэкенд-инженера в команду платформы данных. Стек: Django, PostgreSQL, Kafka, Kubernetes.";
const GENERATED: &str = "Добрый день! Работал с Django и Kafka три года, буду рад обсудить вакансию.";

fn workflow(dir: &Path) -> ListingWorkflow {
    ListingWorkflow::new(ApplyConfig::default(), Diagnostics::new(dir))
}

fn has_screenshot(dir: &Path, tag: &str) -> bool {
    let prefix = format!("hh_{}_", tag);
    screenshots(dir)
        .iter()
        .any(|name| name.starts_with(&prefix) && name.ends_with(".png"))
}

#[derive(Clone, Default)]
struct StubGenerator {
    reply: Option<String>,
    hang: bool,
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CoverLetterGenerator for StubGenerator {
    async fn generate(&self, description: &str) -> Result<String, GeneratorError> {
        self.seen.lock().unwrap().push(description.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.reply.clone().ok_or(GeneratorError::EmptyResponse)
    }
}

#[tokio::test(start_paused = true)]
async fn test_successful_application() {
    let listing = open_listing("Python разработчик · обновлено вчера");
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(result.title, "Python developer");
    assert!(result.failure.is_none());

    let browser = &listing.browser;
    assert_eq!(browser.node(listing.apply_button).clicks, 1);
    assert_eq!(browser.node(listing.cover_field).value, COVER_TEXT);
    assert!(browser.node(listing.resume_radio).checked);
    assert!(browser.node(listing.consent).checked);
    assert_eq!(browser.node(listing.submit).clicks, 1);

    let dom = browser.dom();
    assert_eq!(dom.visited, vec![LISTING_URL.to_string()]);
    assert_eq!(dom.opened_pages, 1);
    assert_eq!(dom.closed_pages, 1);
    assert_eq!(dom.screenshots, 0);
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_listing_is_skipped_without_interaction() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[listing.confirmation].visible = true;
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::SkippedAlreadyApplied);
    assert_eq!(result.title, "Python developer");
    let browser = &listing.browser;
    assert_eq!(browser.node(listing.apply_button).clicks, 0);
    assert!(browser.node(listing.cover_field).value.is_empty());
    assert!(!browser.node(listing.resume_radio).checked);
    assert_eq!(browser.node(listing.submit).clicks, 0);
    assert_eq!(browser.dom().closed_pages, 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_without_apply_control_is_skipped() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[listing.apply_button].visible = false;
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::SkippedAlreadyApplied);
    assert_eq!(listing.browser.node(listing.submit).clicks, 0);
    assert!(screenshots(dir.path()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_resume_blocks_submission() {
    let listing = open_listing("Java developer");
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Error);
    assert_eq!(result.failure, Some(FailureReason::ResumeNotFound));
    assert!(has_screenshot(dir.path(), "resume_not_found"));

    let browser = &listing.browser;
    assert_eq!(browser.node(listing.submit).clicks, 0);
    assert_eq!(browser.node(listing.submit).forced_clicks, 0);
    assert!(!browser.node(listing.resume_radio).checked);
    assert_eq!(browser.dom().closed_pages, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_resume_falls_back_when_allowed() {
    let listing = open_listing("Java developer");
    let dir = tempfile::tempdir().unwrap();
    let config = ApplyConfig {
        fail_if_resume_not_found: false,
        ..ApplyConfig::default()
    };

    let result = ListingWorkflow::new(config, Diagnostics::new(dir.path()))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(listing.browser.node(listing.resume).clicks, 1);
    assert_eq!(listing.browser.node(listing.submit).clicks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unfillable_cover_letter_stops_before_resume() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[listing.cover_field].visible = false;
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Error);
    assert_eq!(result.failure, Some(FailureReason::NoCoverLetter));
    assert!(has_screenshot(dir.path(), "no_cover_letter"));

    let browser = &listing.browser;
    assert_eq!(browser.node(listing.resume).clicks, 0);
    assert!(!browser.node(listing.resume_radio).checked);
    assert!(!browser.node(listing.consent).checked);
    assert_eq!(browser.node(listing.submit).clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_optional_cover_letter_does_not_block() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[listing.cover_field].visible = false;
    let dir = tempfile::tempdir().unwrap();
    let config = ApplyConfig {
        require_cover_letter: false,
        ..ApplyConfig::default()
    };

    let result = ListingWorkflow::new(config, Diagnostics::new(dir.path()))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert!(listing.browser.node(listing.cover_field).value.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_submission_is_bounded() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[listing.submit].on_click.clear();
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Error);
    assert_eq!(result.failure, Some(FailureReason::SubmitExhausted));
    assert_eq!(listing.browser.node(listing.submit).clicks, MAX_ATTEMPTS);
    assert!(has_screenshot(dir.path(), "submit_fail"));
    assert_eq!(listing.browser.dom().closed_pages, 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_is_reported() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().hang_navigation = true;
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Error);
    assert_eq!(result.failure, Some(FailureReason::NavigationTimeout));
    assert!(result.title.is_empty());
    assert!(has_screenshot(dir.path(), "vacancy_timeout"));
    assert_eq!(listing.browser.node(listing.apply_button).clicks, 0);
    assert_eq!(listing.browser.dom().closed_pages, 1);
}

#[tokio::test(start_paused = true)]
async fn test_title_falls_back_to_document_title() {
    let listing = open_listing("Python разработчик");
    listing.browser.dom().nodes[0].text.clear();
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.title, "Вакансия Python developer в Москве");
}

#[tokio::test(start_paused = true)]
async fn test_relocation_warning_is_confirmed() {
    let listing = open_listing("Python разработчик");
    let confirm = listing
        .browser
        .add(Node::matching(selectors::foreign_country_confirm()[0].clone()));
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(listing.browser.node(confirm).clicks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_generated_cover_letter_is_used() {
    let listing = open_listing("Python разработчик");
    listing
        .browser
        .add(Node::matching(selectors::description()[0].clone()).text(DESCRIPTION));
    let dir = tempfile::tempdir().unwrap();
    let generator = StubGenerator {
        reply: Some(GENERATED.to_string()),
        ..StubGenerator::default()
    };

    let result = workflow(dir.path())
        .with_generator(Box::new(generator.clone()), Duration::from_secs(10))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(listing.browser.node(listing.cover_field).value, GENERATED);
    assert_eq!(*generator.seen.lock().unwrap(), vec![DESCRIPTION.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_generation_uses_static_letter() {
    let listing = open_listing("Python разработчик");
    listing
        .browser
        .add(Node::matching(selectors::description()[0].clone()).text(DESCRIPTION));
    let dir = tempfile::tempdir().unwrap();

    let result = workflow(dir.path())
        .with_generator(Box::new(StubGenerator::default()), Duration::from_secs(10))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(listing.browser.node(listing.cover_field).value, COVER_TEXT);
}

#[tokio::test(start_paused = true)]
async fn test_slow_generation_times_out_to_static_letter() {
    let listing = open_listing("Python разработчик");
    listing
        .browser
        .add(Node::matching(selectors::description()[0].clone()).text(DESCRIPTION));
    let dir = tempfile::tempdir().unwrap();
    let generator = StubGenerator {
        reply: Some(GENERATED.to_string()),
        hang: true,
        ..StubGenerator::default()
    };

    let result = workflow(dir.path())
        .with_generator(Box::new(generator), Duration::from_secs(5))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert_eq!(listing.browser.node(listing.cover_field).value, COVER_TEXT);
}

#[tokio::test(start_paused = true)]
async fn test_generation_skipped_without_description() {
    let listing = open_listing("Python разработчик");
    let dir = tempfile::tempdir().unwrap();
    let generator = StubGenerator {
        reply: Some(GENERATED.to_string()),
        ..StubGenerator::default()
    };

    let result = workflow(dir.path())
        .with_generator(Box::new(generator.clone()), Duration::from_secs(10))
        .process_listing(&listing.browser, LISTING_URL, COVER_TEXT)
        .await;

    assert_eq!(result.outcome, ApplyOutcome::Success);
    assert!(generator.seen.lock().unwrap().is_empty());
    assert_eq!(listing.browser.node(listing.cover_field).value, COVER_TEXT);
}
