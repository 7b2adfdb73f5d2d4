use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Composite repository identity used as a map key everywhere a repo needs to
/// be looked up. Two maintainers pointing at the same org/repo collapse to a
/// single key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoKey {
    pub org: String,
    pub repo: String,
}

impl RepoKey {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
        }
    }

    /// Parse an "org/repo" string as passed on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        let (org, repo) = s.split_once('/')?;
        if org.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self::new(org, repo))
    }

    pub fn github_url(&self) -> String {
        format!("https://github.com/{}/{}", self.org, self.repo)
    }

    pub fn issue_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/{}/issues/{}",
            self.org, self.repo, number
        )
    }

    pub fn pull_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.org, self.repo, number
        )
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_valid_coordinate() {
        let key = RepoKey::parse("konveyor/tackle2-hub").unwrap();
        assert_eq!(key.org, "konveyor");
        assert_eq!(key.repo, "tackle2-hub");
        assert_eq!(key.to_string(), "konveyor/tackle2-hub");
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!(RepoKey::parse("no-slash").is_none());
        assert!(RepoKey::parse("/repo").is_none());
        assert!(RepoKey::parse("org/").is_none());
    }

    #[test]
    fn same_repo_dedups_in_a_set() {
        let mut seen = HashSet::new();
        seen.insert(RepoKey::new("konveyor", "crane"));
        seen.insert(RepoKey::new("konveyor", "crane"));
        assert_eq!(seen.len(), 1);
    }
}
