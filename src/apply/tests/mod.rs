
mod workflow_tests;

use crate::apply::selectors;
use fake::{Effect, FakeBrowser, Node};
use std::path::Path;

pub const COVER_TEXT: &str =
    "Здравствуйте! Меня заинтересовала ваша вакансия, готов обсудить детали на собеседовании.";

pub const LISTING_URL: &str = "https://hh.ru/vacancy/123456";

/// Node ids of a typical open listing with its application form
pub struct ListingPage {
    pub browser: FakeBrowser,
    pub apply_button: usize,
    pub confirmation: usize,
    pub cover_field: usize,
    pub resume: usize,
    pub resume_radio: usize,
    pub consent: usize,
    pub submit: usize,
}

/// A listing that accepts applications, where submitting shows the confirmation
pub fn open_listing(resume_title: &str) -> ListingPage {
    let browser = FakeBrowser::new();
    browser.dom().title = "Вакансия Python developer в Москве".to_string();

    browser.add(Node::matching(selectors::listing_title()[0].clone()).text("Python developer"));
    let apply_button = browser.add(Node::button("Откликнуться"));
    let confirmation = browser.add(Node::new().text("Отклик отправлен").hidden());
    let cover_field =
        browser.add(Node::matching(selectors::cover_letter_input()[0].clone()).fillable());
    let resume =
        browser.add(Node::matching(selectors::resume_containers()[0].clone()).text(resume_title));
    let resume_radio = browser.add(
        Node::matching(selectors::radio())
            .checkbox()
            .attr("type", "radio")
            .inside(resume),
    );
    let consent = browser.add(Node::matching(selectors::consent_checkboxes()[0].clone()).checkbox());
    let submit = browser.add(Node::matching(selectors::submit()[0].clone()));
    browser.on_click(submit, Effect::Show(confirmation));

    ListingPage {
        browser,
        apply_button,
        confirmation,
        cover_field,
        resume,
        resume_radio,
        consent,
        submit,
    }
}

/// Names of the screenshots written into `dir`
pub fn screenshots(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect()
}
