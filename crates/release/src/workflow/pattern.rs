//! Glob matching for branch and path filters.
//!
//! * `*` matches any run of characters except `/`.
//! * `**` matches any run of characters including `/`; `**/` also matches nothing,
//!   so `**/README.md` matches a top-level `README.md`.
//! * `?` matches one character except `/`.
//!
//! Everything else matches literally.

/// Returns `true` when `text` matches `pattern` entirely.
///
/// Each `(pattern position, text position)` pair is evaluated once, so patterns with many
/// stars stay polynomial.
#[must_use]
pub fn matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let memo = vec![None; (pattern.len() + 1) * (text.len() + 1)];
    Matcher { pattern: &pattern, text: &text, memo }.at(0, 0)
}

struct Matcher<'a> {
    pattern: &'a [char],
    text: &'a [char],
    memo: Vec<Option<bool>>,
}

impl Matcher<'_> {
    fn at(&mut self, p: usize, t: usize) -> bool {
        let key = p * (self.text.len() + 1) + t;
        if let Some(hit) = self.memo[key] {
            return hit;
        }
        let result = self.step(p, t);
        self.memo[key] = Some(result);
        result
    }

    fn step(&mut self, p: usize, t: usize) -> bool {
        let (pattern, text) = (self.pattern, self.text);
        match &pattern[p..] {
            [] => t == text.len(),
            ['*', '*', '/', ..] => {
                self.at(p + 3, t)
                    || (t..text.len()).any(|i| text[i] == '/' && self.at(p + 3, i + 1))
            },
            ['*', '*', ..] => (t..=text.len()).any(|i| self.at(p + 2, i)),
            ['*', ..] => {
                let limit = text[t..]
                    .iter()
                    .position(|&c| c == '/')
                    .map_or(text.len(), |offset| t + offset);
                (t..=limit).any(|i| self.at(p + 1, i))
            },
            ['?', ..] => t < text.len() && text[t] != '/' && self.at(p + 1, t + 1),
            [c, ..] => t < text.len() && text[t] == *c && self.at(p + 1, t + 1),
        }
    }
}

/// Returns `true` when any of `patterns` matches `text`.
pub fn matches_any<S: AsRef<str>>(patterns: &[S], text: &str) -> bool {
    patterns.iter().any(|p| matches(p.as_ref(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_paths() {
        assert!(matches("README.md", "README.md"));
        assert!(!matches("README.md", "docs/README.md"));
        assert!(!matches("README.md", "README.mdx"));
    }

    #[test]
    fn single_star_stays_in_one_segment() {
        assert!(matches("*.md", "CHANGELOG.md"));
        assert!(!matches("*.md", "docs/guide.md"));
        assert!(matches("release/*", "release/v1"));
        assert!(!matches("release/*", "release/v1/hotfix"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(matches("**/README.md", "README.md"));
        assert!(matches("**/README.md", "src/ic_mple_log/README.md"));
        assert!(matches("docs/**", "docs/a/b/c.md"));
        assert!(!matches("docs/**", "src/docs/a.md"));
    }

    #[test]
    fn question_mark_is_one_character() {
        assert!(matches("v?", "v1"));
        assert!(!matches("v?", "v10"));
        assert!(!matches("a?b", "a/b"));
    }

    #[test]
    fn any_of_several() {
        let patterns = ["README.md", "docs/**"];
        assert!(matches_any(&patterns, "docs/x.md"));
        assert!(!matches_any(&patterns, "src/lib.rs"));
    }

    #[test]
    fn many_stars_against_a_long_path() {
        let text = "a".repeat(400);
        assert!(!matches("*a*a*a*a*a*a*a*a*a*a*a*a*b", &text));
        assert!(!matches("**a**a**a**a**a**a**a**b", &text));
        assert!(matches("*a*a*a*a*a*a*a*a*a*a*a*a", &text));
    }

    proptest! {
        #[test]
        fn text_without_wildcards_matches_itself(text in "[a-zA-Z0-9_./-]{0,40}") {
            prop_assert!(matches(&text, &text));
        }

        #[test]
        fn double_star_matches_everything(text in "[a-z/]{0,40}") {
            prop_assert!(matches("**", &text));
        }
    }
}
