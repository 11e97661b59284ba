//! Repository identity parsing and credential wrappers.

use std::fmt;

use url::Url;

use super::error::TargetError;

const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, TargetError> {
        let valid = !value.is_empty()
            && !value.starts_with('-')
            && value
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '-');
        if !valid {
            return Err(TargetError::InvalidSegment {
                segment: value.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, TargetError> {
        let valid = !value.is_empty()
            && value != "."
            && value != ".."
            && value.chars().all(|character| {
                character.is_ascii_alphanumeric() || matches!(character, '-' | '_' | '.')
            });
        if !valid {
            return Err(TargetError::InvalidSegment {
                segment: value.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Canonical `owner/name` identity of a repository to crawl.
///
/// # Example
///
/// ```
/// use devtalk::RepositoryTarget;
///
/// let target = RepositoryTarget::parse("https://github.com/octocat/hello-world/issues")
///     .expect("should parse repository URL");
/// assert_eq!(target.slug(), "octocat/hello-world");
/// assert_eq!(target.file_stem(), "octocat__hello-world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryTarget {
    owner: RepositoryOwner,
    name: RepositoryName,
}

impl RepositoryTarget {
    /// Creates a target from already separated owner and name strings.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::InvalidSegment`] when either part is empty or
    /// contains characters GitHub does not permit.
    pub fn from_owner_repo(owner: &str, name: &str) -> Result<Self, TargetError> {
        Ok(Self {
            owner: RepositoryOwner::new(owner)?,
            name: RepositoryName::new(name.strip_suffix(".git").unwrap_or(name))?,
        })
    }

    /// Parses a repository URL (`https://github.com/owner/name[/...]`), a
    /// schemeless `github.com/owner/name[/...]`, or a bare `owner/name`.
    ///
    /// Only the URL forms may carry trailing path segments.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] when the input is empty, is a URL for another
    /// host, lacks an owner or name, has extra segments after a bare
    /// `owner/name`, or contains invalid characters.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        if trimmed.contains("://") {
            let parsed =
                Url::parse(trimmed).map_err(|error| TargetError::InvalidUrl(error.to_string()))?;
            let host = parsed
                .host_str()
                .ok_or_else(|| TargetError::InvalidUrl("URL must include a host".to_owned()))?;
            if !is_github_host(host) {
                return Err(TargetError::UnsupportedHost {
                    host: host.to_owned(),
                });
            }
            let mut segments = parsed
                .path_segments()
                .ok_or_else(|| missing_segments(trimmed))?
                .filter(|segment| !segment.is_empty());
            let owner = segments.next().ok_or_else(|| missing_segments(trimmed))?;
            let name = segments.next().ok_or_else(|| missing_segments(trimmed))?;
            return Self::from_owner_repo(owner, name);
        }

        let mut segments = trimmed.split('/').filter(|segment| !segment.is_empty());
        let first = segments.next().ok_or_else(|| missing_segments(trimmed))?;
        if is_github_host(first) {
            let owner = segments.next().ok_or_else(|| missing_segments(trimmed))?;
            let name = segments.next().ok_or_else(|| missing_segments(trimmed))?;
            return Self::from_owner_repo(owner, name);
        }

        let name = segments.next().ok_or_else(|| missing_segments(trimmed))?;
        if segments.next().is_some() {
            return Err(TargetError::ExtraPathSegments {
                input: trimmed.to_owned(),
            });
        }
        Self::from_owner_repo(first, name)
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// `owner/name` form used in rows and logs.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.name.as_str())
    }

    /// File-system safe stem used to name the output tables.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}__{}", self.owner.as_str(), self.name.as_str())
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}

fn is_github_host(host: &str) -> bool {
    GITHUB_HOSTS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(host))
}

fn missing_segments(input: &str) -> TargetError {
    TargetError::MissingPathSegments {
        input: input.to_owned(),
    }
}

/// Repository list entry that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTarget {
    /// One-based line number in the input list.
    pub line: usize,
    /// Raw input text.
    pub input: String,
    /// Why the entry was rejected.
    pub error: TargetError,
}

/// Parsed repository list, split into usable targets and rejected entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList {
    /// Targets in input order, duplicates removed.
    pub targets: Vec<RepositoryTarget>,
    /// Entries rejected before any network call.
    pub invalid: Vec<InvalidTarget>,
}

impl TargetList {
    /// Parses one identifier per line, ignoring blank lines and `#` comments.
    #[must_use]
    pub fn parse_lines(input: &str) -> Self {
        let mut list = Self::default();
        for (index, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match RepositoryTarget::parse(line) {
                Ok(target) => {
                    if !list.targets.contains(&target) {
                        list.targets.push(target);
                    }
                }
                Err(error) => list.invalid.push(InvalidTarget {
                    line: index.saturating_add(1),
                    input: line.to_owned(),
                    error,
                }),
            }
        }
        list
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// Returns `None` when the supplied string is blank.
    #[must_use]
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersonalAccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{PersonalAccessToken, RepositoryTarget, TargetError, TargetList};

    #[rstest]
    #[case::https_url("https://github.com/octocat/hello-world")]
    #[case::trailing_slash("https://github.com/octocat/hello-world/")]
    #[case::deep_link("https://github.com/octocat/hello-world/pull/12/files")]
    #[case::git_suffix("https://github.com/octocat/hello-world.git")]
    #[case::www_host("https://www.github.com/octocat/hello-world")]
    #[case::schemeless("github.com/octocat/hello-world")]
    #[case::schemeless_deep_link("github.com/octocat/hello-world/issues/3")]
    #[case::slug("octocat/hello-world")]
    #[case::padded_slug("  octocat/hello-world \n")]
    fn parses_supported_forms(#[case] input: &str) {
        let target = RepositoryTarget::parse(input).expect("should parse repository identifier");
        assert_eq!(target.owner().as_str(), "octocat", "owner mismatch");
        assert_eq!(target.name().as_str(), "hello-world", "name mismatch");
    }

    #[rstest]
    #[case::empty("   ", TargetError::Empty)]
    #[case::owner_only("octocat", TargetError::MissingPathSegments { input: "octocat".to_owned() })]
    #[case::other_host(
        "https://gitlab.com/octocat/hello-world",
        TargetError::UnsupportedHost { host: "gitlab.com".to_owned() }
    )]
    #[case::bad_owner("octo cat/repo", TargetError::InvalidSegment { segment: "octo cat".to_owned() })]
    #[case::dot_name("octocat/..", TargetError::InvalidSegment { segment: "..".to_owned() })]
    #[case::bare_deep_path(
        "octocat/hello-world/issues",
        TargetError::ExtraPathSegments { input: "octocat/hello-world/issues".to_owned() }
    )]
    fn rejects_invalid_identifiers(#[case] input: &str, #[case] expected: TargetError) {
        let result = RepositoryTarget::parse(input);
        assert_eq!(result, Err(expected));
    }

    #[rstest]
    fn rejects_unparseable_url() {
        let result = RepositoryTarget::parse("https://");
        assert!(
            matches!(result, Err(TargetError::InvalidUrl(_))),
            "expected InvalidUrl, got {result:?}"
        );
    }

    #[rstest]
    fn slug_and_file_stem_are_derived_from_parts() {
        let target =
            RepositoryTarget::from_owner_repo("rust-lang", "rust.vim").expect("should build");
        assert_eq!(target.slug(), "rust-lang/rust.vim");
        assert_eq!(target.file_stem(), "rust-lang__rust.vim");
        assert_eq!(target.to_string(), "rust-lang/rust.vim");
    }

    #[rstest]
    fn target_list_skips_comments_and_collects_invalid_lines() {
        let input = "# seed list\nocto/one\n\nnot a repo\nhttps://github.com/octo/one\nocto/two\nocto/two/pulls\n";
        let list = TargetList::parse_lines(input);

        let slugs: Vec<String> = list.targets.iter().map(RepositoryTarget::slug).collect();
        assert_eq!(slugs, vec!["octo/one", "octo/two"], "duplicates must collapse");
        let rejected: Vec<(usize, &str)> = list
            .invalid
            .iter()
            .map(|invalid| (invalid.line, invalid.input.as_str()))
            .collect();
        assert_eq!(rejected, vec![(4, "not a repo"), (7, "octo/two/pulls")]);
    }

    #[rstest]
    fn token_is_trimmed_and_blank_rejected() {
        let token = PersonalAccessToken::new("  ghp_example\n").expect("token should be valid");
        assert_eq!(token.value(), "ghp_example");
        assert!(PersonalAccessToken::new(" \t").is_none());
        assert_eq!(format!("{token:?}"), "PersonalAccessToken(<redacted>)");
    }
}
