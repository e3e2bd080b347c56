//! Classification of git's natural-language output
//!
//! Each table is an ordered list of `(needle, outcome)` pairs; the first
//! needle found in the lowercased text wins.

use crate::infra::command::CommandOutput;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Working tree already matches HEAD. Not a failure.
    NothingToCommit,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushFailureKind {
    Rejected,
    Authentication,
    Other,
}

const COMMIT_TABLE: &[(&str, CommitOutcome)] = &[
    ("nothing to commit", CommitOutcome::NothingToCommit),
    ("nothing added to commit", CommitOutcome::NothingToCommit),
];

const PUSH_FAILURE_TABLE: &[(&str, PushFailureKind)] = &[
    ("rejected", PushFailureKind::Rejected),
    ("authentication", PushFailureKind::Authentication),
    ("could not read", PushFailureKind::Authentication),
    ("permission denied", PushFailureKind::Authentication),
];

fn lookup<T: Copy>(table: &[(&str, T)], text: &str) -> Option<T> {
    let lower = text.to_lowercase();
    table
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, outcome)| *outcome)
}

pub fn classify_commit(output: &CommandOutput) -> CommitOutcome {
    if output.success() {
        return CommitOutcome::Committed;
    }
    // git prints "nothing to commit" on stdout; check both streams
    lookup(COMMIT_TABLE, &output.combined()).unwrap_or(CommitOutcome::Failed)
}

pub fn classify_push_failure(error_text: &str) -> PushFailureKind {
    lookup(PUSH_FAILURE_TABLE, error_text).unwrap_or(PushFailureKind::Other)
}

/// Owner and repository recovered from a remote URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: Option<String>,
    pub owner: String,
    pub repo: String,
}

impl RemoteUrl {
    /// Accepts `https://<host>/<owner>/<repo>[.git]` and
    /// `<user>@<host>:<owner>/<repo>[.git]`.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let url = url.strip_suffix('/').unwrap_or(url);
        let url = url.strip_suffix(".git").unwrap_or(url);

        let (host, path) = if let Some((_, rest)) = url.split_once("://") {
            let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
            match rest.split_once('/') {
                Some((host, path)) => (Some(host.to_string()), path),
                None => return None,
            }
        } else if let Some((prefix, path)) = url.split_once(':') {
            let host = prefix.rsplit_once('@').map_or(prefix, |(_, h)| h);
            (Some(host.to_string()), path)
        } else {
            (None, url)
        };

        let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
        let repo = segments.next()?.to_string();
        let owner = segments.next()?.to_string();

        Some(Self { host, owner, repo })
    }

    /// Pages URL for GitHub-hosted remotes
    pub fn pages_url(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        let host = host.split(':').next().unwrap_or(host);
        if host.eq_ignore_ascii_case("github.com") {
            Some(format!("https://{}.github.io/{}/", self.owner, self.repo))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_table() {
        let cases = [
            (CommandOutput::completed(0, "[main 1a2b3c] Auto-deploy", ""), CommitOutcome::Committed),
            (
                CommandOutput::completed(1, "On branch main\nnothing to commit, working tree clean", ""),
                CommitOutcome::NothingToCommit,
            ),
            (
                CommandOutput::completed(1, "", "Nothing To Commit"),
                CommitOutcome::NothingToCommit,
            ),
            (
                CommandOutput::completed(1, "nothing added to commit but untracked files present", ""),
                CommitOutcome::NothingToCommit,
            ),
            (
                CommandOutput::completed(128, "", "Author identity unknown"),
                CommitOutcome::Failed,
            ),
        ];
        for (output, expected) in cases {
            assert_eq!(classify_commit(&output), expected, "{:?}", output);
        }
    }

    #[test]
    fn test_push_failure_table() {
        let cases = [
            (
                " ! [rejected]        HEAD -> main (fetch first)",
                PushFailureKind::Rejected,
            ),
            (
                "fatal: Authentication failed for 'https://github.com/a/b.git/'",
                PushFailureKind::Authentication,
            ),
            (
                "fatal: could not read Username for 'https://github.com': terminal prompts disabled",
                PushFailureKind::Authentication,
            ),
            (
                "git@github.com: Permission denied (publickey).",
                PushFailureKind::Authentication,
            ),
            (
                "fatal: unable to access: Could not resolve host",
                PushFailureKind::Other,
            ),
            ("", PushFailureKind::Other),
        ];
        for (text, expected) in cases {
            assert_eq!(classify_push_failure(text), expected, "{}", text);
        }
    }

    #[test]
    fn test_rejected_wins_over_authentication() {
        assert_eq!(
            classify_push_failure("rejected after authentication"),
            PushFailureKind::Rejected
        );
    }

    #[test]
    fn test_parse_https_remote() {
        let remote = RemoteUrl::parse("https://github.com/octocat/hello-world.git").unwrap();
        assert_eq!(remote.host.as_deref(), Some("github.com"));
        assert_eq!(remote.owner, "octocat");
        assert_eq!(remote.repo, "hello-world");
        assert_eq!(
            remote.pages_url().as_deref(),
            Some("https://octocat.github.io/hello-world/")
        );
    }

    #[test]
    fn test_parse_scp_style_remote() {
        let remote = RemoteUrl::parse("git@github.com:octocat/site.git\n").unwrap();
        assert_eq!(remote.host.as_deref(), Some("github.com"));
        assert_eq!(remote.owner, "octocat");
        assert_eq!(remote.repo, "site");
        assert_eq!(remote.pages_url().as_deref(), Some("https://octocat.github.io/site/"));
    }

    #[test]
    fn test_parse_without_git_suffix_and_with_credentials() {
        let remote = RemoteUrl::parse("https://token@github.com/octocat/site").unwrap();
        assert_eq!(remote.host.as_deref(), Some("github.com"));
        assert_eq!(remote.repo, "site");
    }

    #[test]
    fn test_non_github_remote_has_no_pages_url() {
        let remote = RemoteUrl::parse("https://gitlab.com/group/project.git").unwrap();
        assert_eq!(remote.owner, "group");
        assert_eq!(remote.pages_url(), None);

        let local = RemoteUrl::parse("/srv/git/site.git").unwrap();
        assert_eq!(local.host, None);
        assert_eq!(local.pages_url(), None);
    }

    #[test]
    fn test_unparseable_remote() {
        assert_eq!(RemoteUrl::parse("site"), None);
        assert_eq!(RemoteUrl::parse("https://github.com"), None);
    }
}
