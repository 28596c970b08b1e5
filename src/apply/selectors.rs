//! Locator strategy lists for the listing page and the application form.
//!
//! Each list is ordered from the most precise selector to the most generic.
//! The site's markup changes often, so new fallbacks go at the end.

use crate::browser::{xpath, Strategy};

/// Phrases shown once an application has been sent
pub const ALREADY_APPLIED_PHRASES: [&str; 4] = [
    "Отклик отправлен",
    "Вы откликнулись",
    "Отклик уже отправлен",
    "Отклик отправлен работодателю",
];

const APPLY_LABEL: &str = "Откликнуться";

pub fn login_markers() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="mainmenu_applicantProfile"]"#),
        Strategy::css(r#"a[href*="/applicant/resumes"]"#),
        Strategy::css(r#"[aria-label*="Профиль"]"#),
    ]
}

pub fn listing_title() -> Vec<Strategy> {
    vec![
        Strategy::css("h1"),
        Strategy::css(r#"[data-qa="vacancy-title"]"#),
        Strategy::css(r#"[data-qa="vacancy-view-title"]"#),
        Strategy::css(".vacancy-title"),
    ]
}

pub fn already_applied() -> Vec<Strategy> {
    ALREADY_APPLIED_PHRASES
        .iter()
        .map(|phrase| Strategy::text(phrase))
        .collect()
}

pub fn apply_entry_point() -> Vec<Strategy> {
    vec![
        Strategy::button(APPLY_LABEL),
        Strategy::link(APPLY_LABEL),
        Strategy::css(r#"[data-qa="vacancy-response-link-top"]"#),
        Strategy::css(r#"[data-qa="vacancy-sidebar-submit"]"#),
    ]
}

/// Confirmation control of the "listing is in another country" dialog
pub fn foreign_country_confirm() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="relocation-warning-confirm"]"#),
        Strategy::button("Все равно откликнуться"),
    ]
}

/// Containers whose text is the listing description, CSS form shared with the HTML parser
pub const DESCRIPTION_SELECTORS: [&str; 8] = [
    r#"div[data-qa="vacancy-description"]"#,
    r#"div[data-qa="job-description"]"#,
    r#"div[class*="vacancy-description"]"#,
    r#"div[class*="job-description"]"#,
    r#"div[data-qa="description-text"]"#,
    r#"div[class*="description-text"]"#,
    r#"div[data-qa="vacancy-content"]"#,
    r#"div[class*="vacancy-content"]"#,
];

pub fn description() -> Vec<Strategy> {
    DESCRIPTION_SELECTORS.iter().map(|s| Strategy::css(s)).collect()
}

pub fn cover_letter_toggle() -> Vec<Strategy> {
    vec![
        Strategy::button("Добавить сопроводительное"),
        Strategy::text("Добавить сопроводительное"),
        Strategy::css(r#"[data-qa="vacancy-response-letter-toggle"]"#),
    ]
}

pub fn cover_letter_input() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"textarea[data-qa="vacancy-response-letter-input"]"#),
        Strategy::css(r#"textarea[placeholder*="сопроводительное"]"#),
        Strategy::css("textarea"),
    ]
}

/// Elements whose own text mentions the resume criterion
pub fn resume_by_text(criterion: &str) -> Vec<Strategy> {
    let text_match = xpath::contains_folded(".", criterion);
    let href_match = xpath::contains_folded("normalize-space(.)", criterion);
    vec![
        // innermost element only, never the list wrapping every resume
        Strategy::xpath(format!(
            r#"//div[contains(@data-qa,"resume")][.//text()[{m}]][not(.//div[contains(@data-qa,"resume")][.//text()[{m}]])]"#,
            m = text_match
        )),
        Strategy::xpath(format!("//label[.//text()[{}]]", text_match)),
        Strategy::xpath(format!(
            r#"//a[contains(@href,"resume")][{m}]/ancestor::label | //a[contains(@href,"resume")][{m}]/ancestor::*[contains(@data-qa,"resume-select_item")]"#,
            m = href_match
        )),
    ]
}

/// One entry per resume in the selection list
pub fn resume_tiles() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="resume-select_item"]"#),
        Strategy::css(r#"[data-qa="resume-item"]"#),
    ]
}

/// Resume tiles scanned one by one when the textual pass finds nothing
pub fn resume_containers() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="resume-select_item"]"#),
        Strategy::css(r#"[data-qa="resume-select"] [data-qa="resume-item"]"#),
        Strategy::css(r#"[data-qa*="resume"]"#),
        Strategy::xpath("//label[contains(., \"-\")]"),
    ]
}

pub fn resume_fallback() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="resume-select_item"]"#),
        Strategy::css(r#"input[name="resume"]"#),
        Strategy::css(r#"input[type="radio"][value*="resume"]"#),
    ]
}

pub fn radio() -> Strategy {
    Strategy::css(r#"input[type="radio"]"#)
}

pub fn consent_checkboxes() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"input[type="checkbox"][name*="agreement"]"#),
        Strategy::css(r#"input[type="checkbox"][data-qa*="consent"]"#),
        Strategy::css(r#"input[type="checkbox"][required]"#),
    ]
}

pub fn submit() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="vacancy-response-submit-button"]"#),
        Strategy::button("Отправить отклик"),
        Strategy::button("Отправить"),
        Strategy::css(r#"button[data-qa*="submit"]"#),
    ]
}

/// Title links of search result cards; links from all of them are combined
pub fn search_result_titles() -> Vec<Strategy> {
    vec![
        Strategy::css(r#"[data-qa="vacancy-serp__vacancy-title"]"#),
        Strategy::css(r#"[data-qa="serp-item__title"]"#),
        Strategy::css(r#"a.bloko-link[data-qa*="title"]"#),
    ]
}

/// Broader link queries tried in order while nothing is found, as `(strategy, max items)`
pub fn search_result_fallbacks() -> Vec<(Strategy, usize)> {
    vec![
        (
            Strategy::css(
                r#"[data-qa="vacancy-serp__vacancy"] a[href*="/vacancy/"], [data-qa="serp-item"] a[href*="/vacancy/"]"#,
            ),
            60,
        ),
        (Strategy::css(r#"a[href*="/vacancy/"]"#), 80),
    ]
}
