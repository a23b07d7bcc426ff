use std::collections::HashSet;

/// Slug used when a heading has no alphanumeric characters.
const EMPTY_SLUG: &str = "section";

/// Document-scoped slug generator.
///
/// The first occurrence of a slug is returned as is; repeats get `-2`, `-3`, …
/// appended, skipping any suffix that is already taken.
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
}

impl Slugger {
    /// Creates a new slugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next unique slug for the given heading text.
    pub fn next_slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if self.used.insert(base.clone()) {
            return base;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Converts heading text into a slug.
///
/// Lowercases, turns each run of non-alphanumeric characters into a single
/// hyphen and trims hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        slug.push_str(EMPTY_SLUG);
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(slugify("  What's new?  (v2.0) "), "what-s-new-v2-0");
        assert_eq!(slugify("a---b"), "a-b");
    }

    #[test]
    fn unicode_letters_preserved() {
        assert_eq!(slugify("Über Größe"), "über-größe");
        assert_eq!(slugify("多言語 ガイド"), "多言語-ガイド");
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(slugify("!!!"), "section");
    }

    #[test]
    fn deduplicates_with_numeric_suffix() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.next_slug("Hello"), "hello");
        assert_eq!(slugger.next_slug("Hello"), "hello-2");
        assert_eq!(slugger.next_slug("Hello"), "hello-3");
    }

    #[test]
    fn skips_suffixes_already_taken() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.next_slug("Intro 2"), "intro-2");
        assert_eq!(slugger.next_slug("Intro"), "intro");
        assert_eq!(slugger.next_slug("Intro"), "intro-3");
    }
}
