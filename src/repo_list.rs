use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

lazy_static::lazy_static! {
    // scp-like syntax as accepted by git itself, e.g. `git@github.com:org/repo.git`
    static ref REGEX_SCP_LIKE: Regex = Regex::new(r"^[\w.-]+@[\w.-]+:").unwrap();
}

/// Turns one line of the repo list into a clonable URL.
///
/// Fully-qualified references (`https://` or scp-like `user@host:`) pass
/// through untouched, `github.com/...` gets a scheme, and a bare `org/repo`
/// is expanded to its GitHub URL. Anything else is unusable and yields
/// `None`.
pub fn normalize_url(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("https://") || REGEX_SCP_LIKE.is_match(raw) {
        return Some(raw.to_string());
    }

    if raw.starts_with("github.com") {
        return Some(format!("https://{raw}"));
    }

    if !raw.contains('/') {
        return None;
    }

    Some(format!("https://github.com/{raw}"))
}

/// Normalizes and deduplicates a set of input lines. Duplicate references
/// collapse to one entry no matter how they were spelled.
pub fn collect_urls<'a>(lines: impl Iterator<Item = &'a str>) -> HashSet<String> {
    lines.filter_map(normalize_url).collect()
}

pub fn read_repo_list(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error while reading repo list {}", path.display()))?;

    Ok(collect_urls(content.lines()))
}

/// Splits a repository URL into its organization and repository name.
///
/// The repository name has a trailing `.git` stripped; path segments past
/// the second are ignored. Returns `None` when the URL doesn't parse or its
/// path has fewer than two non-empty segments.
pub fn extract_org_repo(repo_url: &str) -> Option<(String, String)> {
    let path = if REGEX_SCP_LIKE.is_match(repo_url) {
        let (_, path) = repo_url.split_once(':')?;
        path.to_string()
    } else {
        Url::parse(repo_url).ok()?.path().to_string()
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let org = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    Some((org.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_bare_host_gets_scheme() {
        assert_eq!(
            normalize_url("github.com/foo/bar").as_deref(),
            Some("https://github.com/foo/bar")
        );
    }

    #[test]
    fn normalize_short_form_expands_to_github() {
        assert_eq!(
            normalize_url("foo/bar").as_deref(),
            Some("https://github.com/foo/bar")
        );
    }

    #[test]
    fn normalize_passes_qualified_urls_through() {
        assert_eq!(
            normalize_url("https://gitlab.com/foo/bar").as_deref(),
            Some("https://gitlab.com/foo/bar")
        );
        assert_eq!(
            normalize_url("git@github.com:foo/bar.git").as_deref(),
            Some("git@github.com:foo/bar.git")
        );
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            normalize_url("  foo/bar  ").as_deref(),
            Some("https://github.com/foo/bar")
        );
    }

    #[test]
    fn normalize_drops_unusable_lines() {
        assert_eq!(normalize_url("justaword"), None);
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
    }

    #[test]
    fn collect_urls_deduplicates_spellings() {
        let lines = ["org/repo", "https://github.com/org/repo", "  org/repo  "];
        let urls = collect_urls(lines.into_iter());

        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://github.com/org/repo"));
    }

    #[test]
    fn collect_urls_mixed_input() {
        let lines = [
            "foo/bar",
            "github.com/foo/bar",
            "baz/qux",
            "",
            "not-a-url",
        ];
        let urls = collect_urls(lines.into_iter());

        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://github.com/foo/bar"));
        assert!(urls.contains("https://github.com/baz/qux"));
    }

    #[test]
    fn read_repo_list_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let list = temp.path().join("repos.txt");
        std::fs::write(&list, "foo/bar\n\ngithub.com/foo/bar\nbaz/qux\n").unwrap();

        let urls = read_repo_list(&list).unwrap();

        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn read_repo_list_missing_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();

        assert!(read_repo_list(&temp.path().join("nope.txt")).is_err());
    }

    #[test]
    fn extract_strips_git_suffix() {
        assert_eq!(
            extract_org_repo("https://github.com/foo/bar.git"),
            Some(("foo".to_string(), "bar".to_string()))
        );
    }

    #[test]
    fn extract_rejects_single_segment_paths() {
        assert_eq!(extract_org_repo("https://github.com/onlyorg"), None);
        assert_eq!(extract_org_repo("https://github.com/"), None);
    }

    #[test]
    fn extract_handles_scp_like_urls() {
        assert_eq!(
            extract_org_repo("git@github.com:foo/bar.git"),
            Some(("foo".to_string(), "bar".to_string()))
        );
    }

    #[test]
    fn extract_ignores_empty_and_extra_segments() {
        assert_eq!(
            extract_org_repo("https://gitlab.com/group/project/extra"),
            Some(("group".to_string(), "project".to_string()))
        );
        assert_eq!(
            extract_org_repo("https://github.com/foo/bar/"),
            Some(("foo".to_string(), "bar".to_string()))
        );
    }
}
