use serde::{Deserialize, Serialize};
use std::fmt;

/// Final state of one listing-processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Success,
    SkippedAlreadyApplied,
    Error,
}

/// Why a listing ended in [`ApplyOutcome::Error`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The listing page did not load in time
    NavigationTimeout,
    /// The cover letter could not be written and verified
    NoCoverLetter,
    /// No resume matched the configured criterion
    ResumeNotFound,
    /// Every submit cycle ran without a confirmed submission
    SubmitExhausted,
    /// Anything else, with the driver message
    Unexpected(String),
}

impl FailureReason {
    /// Tag used in diagnostic screenshot names
    pub fn tag(&self) -> &'static str {
        match self {
            FailureReason::NavigationTimeout => "vacancy_timeout",
            FailureReason::NoCoverLetter => "no_cover_letter",
            FailureReason::ResumeNotFound => "resume_not_found",
            FailureReason::SubmitExhausted => "submit_fail",
            FailureReason::Unexpected(_) => "error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NavigationTimeout => write!(f, "listing page timed out"),
            FailureReason::NoCoverLetter => write!(f, "cover letter could not be filled"),
            FailureReason::ResumeNotFound => write!(f, "matching resume not found"),
            FailureReason::SubmitExhausted => write!(f, "submission was not confirmed"),
            FailureReason::Unexpected(msg) => write!(f, "unexpected error: {}", msg),
        }
    }
}

/// Result of [`crate::apply::ListingWorkflow::process_listing`]
#[derive(Debug, Clone)]
pub struct ListingResult {
    pub outcome: ApplyOutcome,

    /// Listing title, empty when none could be read
    pub title: String,

    /// Set when `outcome` is `Error`
    pub failure: Option<FailureReason>,
}

impl ListingResult {
    pub fn success(title: String) -> Self {
        Self {
            outcome: ApplyOutcome::Success,
            title,
            failure: None,
        }
    }

    pub fn skipped(title: String) -> Self {
        Self {
            outcome: ApplyOutcome::SkippedAlreadyApplied,
            title,
            failure: None,
        }
    }

    pub fn error(title: String, reason: FailureReason) -> Self {
        Self {
            outcome: ApplyOutcome::Error,
            title,
            failure: Some(reason),
        }
    }
}

/// Run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    FoundLinks,
    SkippedSeen,
    SkippedAlready,
    Opened,
    AppliesDone,
    Errors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub found_links: usize,
    pub skipped_seen: usize,
    pub skipped_already: usize,
    pub opened: usize,
    pub applies_done: usize,
    pub errors: usize,
}

impl Stats {
    pub fn bump(&mut self, counter: Counter, by: usize) {
        let slot = match counter {
            Counter::FoundLinks => &mut self.found_links,
            Counter::SkippedSeen => &mut self.skipped_seen,
            Counter::SkippedAlready => &mut self.skipped_already,
            Counter::Opened => &mut self.opened,
            Counter::AppliesDone => &mut self.applies_done,
            Counter::Errors => &mut self.errors,
        };
        *slot += by;
    }

    /// Counts the outcome of one processed listing
    pub fn record(&mut self, outcome: ApplyOutcome) {
        let counter = match outcome {
            ApplyOutcome::Success => Counter::AppliesDone,
            ApplyOutcome::SkippedAlreadyApplied => Counter::SkippedAlready,
            ApplyOutcome::Error => Counter::Errors,
        };
        self.bump(counter, 1);
    }

    pub fn log_summary(&self, max_applies: usize) {
        ::log::info!("========== REPORT ==========");
        ::log::info!("Links found:              {}", self.found_links);
        ::log::info!("Skipped (seen before):    {}", self.skipped_seen);
        ::log::info!("Skipped (already applied): {}", self.skipped_already);
        ::log::info!("Opened/processed:         {}", self.opened);
        ::log::info!("Successful applications:  {}", self.applies_done);
        ::log::info!("Errors/failures:          {}", self.errors);
        ::log::info!("Application limit:        {}", max_applies);
        ::log::info!("========== /REPORT ==========");
    }
}
