/// Sections shorter than this (in characters, before the header is restored) are dropped.
pub const MIN_CHUNK_CHARS: usize = 30;

const SECTION_DELIMITER: &str = "\n## ";
const SECTION_PREFIX: &str = "## ";

/// Split a guideline document on second-level headings.
///
/// The delimiter consumes the `## ` marker, so it is put back on every
/// section after the first. The first section keeps whatever the document
/// opens with (usually a `#` title).
pub fn split_sections(markdown: &str) -> Vec<String> {
    markdown
        .split(SECTION_DELIMITER)
        .enumerate()
        .filter_map(|(i, section)| {
            let section = section.trim();
            if section.chars().count() < MIN_CHUNK_CHARS {
                return None;
            }
            Some(if i > 0 {
                format!("{SECTION_PREFIX}{section}")
            } else {
                section.to_string()
            })
        })
        .collect()
}
