//! Git command runner.
//!
//! The pipeline only needs a handful of read-only queries; every call may fail
//! independently and callers decide which failures matter.

use crate::error::GitError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Executes git subcommands against a repository root and returns stdout.
pub trait GitRunner: Send + Sync {
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, GitError>;

    /// Run a command and split its output into trimmed, non-empty lines.
    fn run_lines(&self, root: &Path, args: &[&str]) -> Result<Vec<String>, GitError> {
        let out = self.run(root, args)?;
        Ok(out
            .lines()
            .map(|line| line.trim_end_matches('\r').trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// `git` binary on PATH.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

impl GitRunner for GitCli {
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, GitError> {
        let rendered = args.join(" ");
        let output = Command::new("git")
            .arg("-c")
            .arg("core.quotepath=off")
            .arg("-C")
            .arg(root)
            .args(args)
            .output()
            .map_err(|source| GitError::Spawn {
                args: rendered.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(args = %rendered, status = %output.status, "git command failed");
            return Err(GitError::Failed {
                args: rendered,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Default-branch names tried, in order, when no base ref is configured.
pub const BASE_REF_CANDIDATES: &[&str] = &["main", "master"];

/// Base ref used when none of [`BASE_REF_CANDIDATES`] exists.
pub const FALLBACK_BASE_REF: &str = "HEAD";

/// `rev-parse --verify --quiet <name>` succeeds.
pub fn ref_exists(git: &dyn GitRunner, root: &Path, name: &str) -> bool {
    git.run(root, &["rev-parse", "--verify", "--quiet", name]).is_ok()
}

/// First existing default branch, else `HEAD`.
pub fn resolve_base_ref(git: &dyn GitRunner, root: &Path) -> String {
    BASE_REF_CANDIDATES
        .iter()
        .find(|name| ref_exists(git, root, name))
        .copied()
        .unwrap_or(FALLBACK_BASE_REF)
        .to_string()
}

/// `diff --name-only <base>...HEAD`
pub fn branch_diff(
    git: &dyn GitRunner,
    root: &Path,
    base_ref: &str,
) -> Result<Vec<String>, GitError> {
    let range = format!("{}...HEAD", base_ref);
    git.run_lines(root, &["diff", "--name-only", &range])
}

/// `diff --name-only` (unstaged working-tree changes)
pub fn working_tree_diff(git: &dyn GitRunner, root: &Path) -> Result<Vec<String>, GitError> {
    git.run_lines(root, &["diff", "--name-only"])
}

/// `diff --cached --name-only`
pub fn staged_diff(git: &dyn GitRunner, root: &Path) -> Result<Vec<String>, GitError> {
    git.run_lines(root, &["diff", "--cached", "--name-only"])
}

/// `ls-files --others --exclude-standard`
pub fn untracked_files(git: &dyn GitRunner, root: &Path) -> Result<Vec<String>, GitError> {
    git.run_lines(root, &["ls-files", "--others", "--exclude-standard"])
}

/// `rev-parse --abbrev-ref HEAD`
pub fn current_branch(git: &dyn GitRunner, root: &Path) -> Result<String, GitError> {
    Ok(git
        .run(root, &["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string())
}
