//! The per-listing application workflow.
//!
//! [`ListingWorkflow`] drives the listing page; the cover letter, resume,
//! consent and submit steps each probe the page through [`locator`] with
//! their own fallback lists from [`selectors`].

pub mod consent;
pub mod cover_letter;
pub mod diagnostics;
pub mod locator;
pub mod resume;
pub mod selectors;
pub mod status;
pub mod submit;
pub mod workflow;

#[cfg(test)]
pub(crate) mod tests;

/// Attempts shared by the cover letter fill loop and the submit loop
pub const MAX_ATTEMPTS: usize = 3;

pub use consent::ConsentHandler;
pub use cover_letter::CoverLetterFiller;
pub use diagnostics::Diagnostics;
pub use locator::Probe;
pub use resume::ResumeSelector;
pub use submit::SubmissionDriver;
pub use workflow::ListingWorkflow;
