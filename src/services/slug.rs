use rand::{distributions::Alphanumeric, Rng};

/// Maximum stored slug length
pub const SLUG_MAX_LEN: usize = 32;
const PREFIX_LEN: usize = 8;

/// Builds a unique slug for a new movie: `{8 random chars}-{slugified title}`.
///
/// The random prefix keeps slugs distinct for movies sharing a title. Call
/// once at creation; slugs are never recomputed.
pub fn generate(title: &str) -> String {
    let prefix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PREFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    with_prefix(&prefix, title)
}

fn with_prefix(prefix: &str, title: &str) -> String {
    let budget = SLUG_MAX_LEN - prefix.len() - 1;
    let mut body = slugify(title);
    body.truncate(budget);
    let body = body.trim_end_matches('-');

    if body.is_empty() {
        prefix.to_string()
    } else {
        format!("{}-{}", prefix, body)
    }
}

/// Lowercases ASCII alphanumerics and collapses everything else into single hyphens
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Test 2: Revenge of the Test"), "test-2-revenge-of-the-test");
        assert_eq!(slugify("  Amélie!  "), "am-lie");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_generate_has_random_prefix_and_title() {
        let slug = generate("Tester");
        assert!(slug.ends_with("-tester"));
        assert_eq!(slug.len(), PREFIX_LEN + "-tester".len());
        assert!(slug[..PREFIX_LEN]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_is_unique_for_same_title() {
        assert_ne!(generate("Tester"), generate("Tester"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let slug = with_prefix("abcdefgh", "The Lord of the Rings: The Fellowship of the Ring");
        assert!(slug.len() <= SLUG_MAX_LEN);
        assert_eq!(slug, "abcdefgh-the-lord-of-the-rings-t");
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_truncation_drops_trailing_hyphen() {
        let slug = with_prefix("abcdefgh", "Finding Nemo Under the Sea");
        assert_eq!(slug, "abcdefgh-finding-nemo-under-the");
    }

    #[test]
    fn test_title_without_alphanumerics_keeps_prefix() {
        assert_eq!(with_prefix("abcdefgh", "???"), "abcdefgh");
    }
}
