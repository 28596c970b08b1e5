/// Normalizes free text for use in a prompt.
///
/// Lines are trimmed, whitespace inside a paragraph collapses to single
/// spaces, and paragraphs are separated by exactly one blank line.
pub fn normalize(text: &str) -> String {
    split_into_paragraphs(text)
        .iter()
        .map(|para| join_lines(para))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits text into paragraphs based on empty lines
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current_paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !current_paragraph.is_empty() {
                paragraphs.push(std::mem::take(&mut current_paragraph));
            }
        } else {
            current_paragraph.push(trimmed);
        }
    }

    if !current_paragraph.is_empty() {
        paragraphs.push(current_paragraph);
    }

    paragraphs
}

fn join_lines(paragraph: &[&str]) -> String {
    paragraph
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
