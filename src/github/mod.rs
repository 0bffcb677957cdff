//! Repository fetching via the GitHub contents API.
//!
//! Directories are listed one at a time from an explicit worklist, files
//! with a recognized code extension are downloaded individually, and a
//! failed single-file download is skipped with a warning rather than
//! aborting the whole fetch.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// File extensions treated as source code.
pub const CODE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".java", ".cpp", ".h", ".cs", ".rb", ".go", ".ts", ".tsx", ".jsx",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidRepositoryUrl(String),
    #[error("GitHub API rate limit exceeded. Please wait or provide a GitHub token to increase the limit.")]
    RateLimitExceeded,
    #[error("GitHub API requires authentication. Please provide a GitHub token.")]
    AuthenticationRequired,
    #[error("Access denied to GitHub repository. Please check if the repository is private and if your token has correct permissions.")]
    AccessDenied,
    #[error("Repository or path not found: {0}")]
    NotFound(String),
    #[error("Failed to fetch repo contents: HTTP {status} - {body}")]
    Upstream { status: u16, body: String },
    #[error("Failed to reach GitHub API: {0}")]
    Transport(#[from] reqwest::Error),
}

/// An owner/name pair parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse a URL of the form `.../github.com/{owner}/{repo}...`.
    /// Fails with `InvalidRepositoryUrl` before any network call.
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let invalid = || FetchError::InvalidRepositoryUrl(url.to_string());

        let mut segments = url.trim().split('/').filter(|s| !s.is_empty());
        segments
            .by_ref()
            .find(|s| s.eq_ignore_ascii_case("github.com") || s.eq_ignore_ascii_case("www.github.com"))
            .ok_or_else(invalid)?;

        let owner = segments.next().map(clean_segment).ok_or_else(invalid)?;
        let name = segments
            .next()
            .map(|s| clean_segment(s).trim_end_matches(".git").to_string())
            .ok_or_else(invalid)?;

        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name,
        })
    }

    /// "owner/name", the repository identifier attached to every chunk.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Strip query strings and fragments from a path segment.
fn clean_segment(segment: &str) -> &str {
    let end = segment
        .find(|c| c == '?' || c == '#')
        .unwrap_or(segment.len());
    &segment[..end]
}

/// A source file downloaded from the repository.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub path: String,
    /// Extension with leading dot, lowercased; empty if none.
    pub extension: String,
    pub content: String,
}

/// One entry in a contents listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub path: String,
    pub download_url: Option<String>,
}

/// The contents endpoint returns a list for directories and a single
/// descriptor when the path is a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    Single(ContentEntry),
}

impl ContentsResponse {
    fn into_entries(self) -> Vec<ContentEntry> {
        match self {
            ContentsResponse::Listing(entries) => entries,
            ContentsResponse::Single(entry) => vec![entry],
        }
    }
}

/// True if the file name carries a recognized code extension.
pub fn is_code_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    CODE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Extension of a file name with its leading dot, lowercased.
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Fetch all recognized source files of a repository, recursing into
/// subdirectories via an explicit worklist.
pub async fn fetch_repo_files(
    client: &reqwest::Client,
    api_base: &str,
    token: Option<&str>,
    repo: &RepoRef,
) -> Result<Vec<SourceFile>, FetchError> {
    let mut files = Vec::new();
    let mut pending = vec![String::new()];

    while let Some(dir) = pending.pop() {
        let entries = list_contents(client, api_base, token, repo, &dir).await?;

        for entry in entries {
            match entry.kind.as_str() {
                "dir" => pending.push(entry.path),
                "file" if is_code_file(&entry.name) => {
                    match download_file(client, &entry).await {
                        Ok(Some(file)) => files.push(file),
                        Ok(None) => {
                            tracing::warn!("No download URL for {}, skipping", entry.path);
                        }
                        Err(e) => {
                            tracing::warn!("Error processing file {}: {e}", entry.path);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(files)
}

/// List one directory of the repository.
async fn list_contents(
    client: &reqwest::Client,
    api_base: &str,
    token: Option<&str>,
    repo: &RepoRef,
    path: &str,
) -> Result<Vec<ContentEntry>, FetchError> {
    let url = format!(
        "{api_base}/repos/{}/{}/contents/{path}",
        repo.owner, repo.name
    );

    let mut request = client.get(&url);
    if let Some(token) = token {
        request = request.header("Authorization", format!("token {token}"));
    }

    let resp = request.send().await?;
    let status = resp.status();

    if !status.is_success() {
        let rate_limited = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");
        let body = resp.text().await.unwrap_or_default();
        let location = format!("{}/{}/{path}", repo.owner, repo.name);
        return Err(classify_listing_error(
            status,
            rate_limited,
            &body,
            token.is_some(),
            &location,
        ));
    }

    let body: ContentsResponse = resp.json().await?;
    Ok(body.into_entries())
}

/// Map a failed listing response to its error kind. 403 is disambiguated by
/// the rate-limit flag (header or body text) and then by token presence.
fn classify_listing_error(
    status: StatusCode,
    rate_limited: bool,
    body: &str,
    has_token: bool,
    location: &str,
) -> FetchError {
    match status {
        StatusCode::FORBIDDEN => {
            if rate_limited || body.to_lowercase().contains("rate limit") {
                FetchError::RateLimitExceeded
            } else if !has_token {
                FetchError::AuthenticationRequired
            } else {
                FetchError::AccessDenied
            }
        }
        StatusCode::NOT_FOUND => FetchError::NotFound(location.to_string()),
        _ => FetchError::Upstream {
            status: status.as_u16(),
            body: truncate_body(body),
        },
    }
}

/// Download a single file's content as UTF-8 text.
async fn download_file(
    client: &reqwest::Client,
    entry: &ContentEntry,
) -> Result<Option<SourceFile>, FetchError> {
    let Some(url) = entry.download_url.as_deref() else {
        return Ok(None);
    };

    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Upstream {
            status: resp.status().as_u16(),
            body: truncate_body(&resp.text().await.unwrap_or_default()),
        });
    }

    let content = resp.text().await?;
    Ok(Some(SourceFile {
        name: entry.name.clone(),
        path: entry.path.clone(),
        extension: file_extension(&entry.name),
        content,
    }))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── URL parsing ─────────────────────────────────────

    #[test]
    fn test_parse_plain_https_url() {
        let repo = RepoRef::parse("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "rust");
        assert_eq!(repo.slug(), "rust-lang/rust");
    }

    #[test]
    fn test_parse_strips_git_suffix_and_trailing_slash() {
        let repo = RepoRef::parse("https://github.com/owner/project.git/").unwrap();
        assert_eq!(repo.name, "project");
    }

    #[test]
    fn test_parse_without_scheme() {
        let repo = RepoRef::parse("github.com/owner/project").unwrap();
        assert_eq!(repo.slug(), "owner/project");
    }

    #[test]
    fn test_parse_ignores_extra_path_segments() {
        let repo = RepoRef::parse("https://github.com/owner/project/tree/main/src").unwrap();
        assert_eq!(repo.slug(), "owner/project");
    }

    #[test]
    fn test_parse_strips_query_string() {
        let repo = RepoRef::parse("https://github.com/owner/project?tab=readme").unwrap();
        assert_eq!(repo.name, "project");
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        assert!(matches!(
            RepoRef::parse("https://gitlab.com/owner/project"),
            Err(FetchError::InvalidRepositoryUrl(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_repo() {
        assert!(matches!(
            RepoRef::parse("https://github.com/onlyowner"),
            Err(FetchError::InvalidRepositoryUrl(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            RepoRef::parse(""),
            Err(FetchError::InvalidRepositoryUrl(_))
        ));
    }

    // ─── Extension filtering ─────────────────────────────

    #[test]
    fn test_recognizes_code_files() {
        assert!(is_code_file("a.py"));
        assert!(is_code_file("c.go"));
        assert!(is_code_file("component.tsx"));
        assert!(is_code_file("HEADER.H"));
    }

    #[test]
    fn test_rejects_non_code_files() {
        assert!(!is_code_file("b.txt"));
        assert!(!is_code_file("README.md"));
        assert!(!is_code_file("binary.exe"));
        assert!(!is_code_file("noextension"));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("app.PY"), ".py");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("Makefile"), "");
        assert_eq!(file_extension(".gitignore"), "");
    }

    // ─── Listing responses ───────────────────────────────

    #[test]
    fn test_listing_parses_array() {
        let json = r#"[
            {"type": "file", "name": "a.py", "path": "a.py", "download_url": "https://raw.test/a.py"},
            {"type": "dir", "name": "src", "path": "src", "download_url": null}
        ]"#;
        let resp: ContentsResponse = serde_json::from_str(json).unwrap();
        let entries = resp.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "file");
        assert_eq!(entries[1].kind, "dir");
    }

    #[test]
    fn test_listing_parses_single_descriptor() {
        let json = r#"{"type": "file", "name": "a.py", "path": "a.py", "download_url": "https://raw.test/a.py"}"#;
        let resp: ContentsResponse = serde_json::from_str(json).unwrap();
        let entries = resp.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.py");
    }

    #[test]
    fn test_listing_filter_selects_code_files_only() {
        let json = r#"[
            {"type": "file", "name": "a.py", "path": "a.py", "download_url": "u"},
            {"type": "file", "name": "b.txt", "path": "b.txt", "download_url": "u"},
            {"type": "file", "name": "c.go", "path": "c.go", "download_url": "u"}
        ]"#;
        let resp: ContentsResponse = serde_json::from_str(json).unwrap();
        let selected: Vec<String> = resp
            .into_entries()
            .into_iter()
            .filter(|e| e.kind == "file" && is_code_file(&e.name))
            .map(|e| e.name)
            .collect();
        assert_eq!(selected, vec!["a.py", "c.go"]);
    }

    // ─── Error classification ────────────────────────────

    #[test]
    fn test_403_with_rate_limit_body() {
        let err = classify_listing_error(
            StatusCode::FORBIDDEN,
            false,
            "API rate limit exceeded for 1.2.3.4",
            true,
            "o/r/",
        );
        assert!(matches!(err, FetchError::RateLimitExceeded));
    }

    #[test]
    fn test_403_with_rate_limit_header() {
        let err = classify_listing_error(StatusCode::FORBIDDEN, true, "forbidden", true, "o/r/");
        assert!(matches!(err, FetchError::RateLimitExceeded));
    }

    #[test]
    fn test_403_without_token() {
        let err = classify_listing_error(StatusCode::FORBIDDEN, false, "forbidden", false, "o/r/");
        assert!(matches!(err, FetchError::AuthenticationRequired));
    }

    #[test]
    fn test_403_with_token() {
        let err = classify_listing_error(StatusCode::FORBIDDEN, false, "forbidden", true, "o/r/");
        assert!(matches!(err, FetchError::AccessDenied));
    }

    #[test]
    fn test_404_is_not_found() {
        let err = classify_listing_error(StatusCode::NOT_FOUND, false, "", true, "o/r/src");
        match err {
            FetchError::NotFound(loc) => assert_eq!(loc, "o/r/src"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_other_status_is_upstream() {
        let err = classify_listing_error(StatusCode::BAD_GATEWAY, false, "oops", true, "o/r/");
        match err {
            FetchError::Upstream { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "oops");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let long = "x".repeat(2000);
        let err = classify_listing_error(StatusCode::INTERNAL_SERVER_ERROR, false, &long, true, "o/r/");
        match err {
            FetchError::Upstream { body, .. } => assert!(body.len() < 600),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }
}
