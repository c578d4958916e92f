use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::repo_list::extract_org_repo;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory the `<org>/<repo>` tree is created under.
    pub clone_dir: PathBuf,
    /// Maximum number of clones running at once.
    pub max_tasks: usize,
}

/// Runs the actual clone of one repository.
///
/// Abstracted away from the dispatcher so tests can substitute a fake
/// instead of spawning a real `git` process.
#[async_trait]
pub trait CloneClient: Send + Sync {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<CloneOutput>;
}

#[derive(Debug)]
pub struct CloneOutput {
    pub success: bool,
    pub output: String,
}

pub struct GitCli;

#[async_trait]
impl CloneClient for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<CloneOutput> {
        let output = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(dest)
            .output()
            .await
            .context("Unable to invoke git")?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CloneOutput {
            success: output.status.success(),
            output: combined,
        })
    }
}

/// Terminal state of one clone task. `Display` renders the console line
/// reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    Cloned { url: String },
    Skipped { org: String, repo: String },
    Failed { url: String, reason: String },
}

impl Display for CloneOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CloneOutcome::Cloned { url } => write!(f, "[CLONED] {url}"),
            CloneOutcome::Skipped { org, repo } => {
                write!(f, "[SKIPPED] {org}/{repo} already exists.")
            }
            CloneOutcome::Failed { reason, .. } => write!(f, "[ERROR] {reason}"),
        }
    }
}

/// Clones every repository in `urls`, at most `config.max_tasks` at a time.
///
/// Each repository is handled by its own task and reports exactly one
/// console line; a failed clone never affects the others. Returns one
/// outcome per URL, in no particular order, once every task has finished.
pub async fn clone_all(
    urls: HashSet<String>,
    config: Config,
    client: Arc<dyn CloneClient>,
) -> Vec<CloneOutcome> {
    let semaphore = Arc::new(Semaphore::new(config.max_tasks));
    let mut tasks = JoinSet::new();
    let mut outcomes = Vec::with_capacity(urls.len());

    for url in urls {
        // references we can't even split into org/repo never take a task slot
        let Some((org, repo)) = extract_org_repo(&url) else {
            let outcome = CloneOutcome::Failed {
                reason: format!("Couldn't parse org/repo from {url}"),
                url,
            };
            println!("{outcome}");
            outcomes.push(outcome);
            continue;
        };

        let target = config.clone_dir.join(&org).join(&repo);
        let semaphore = Arc::clone(&semaphore);
        let client = Arc::clone(&client);

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            let outcome = clone_one(client.as_ref(), &url, &org, &repo, &target).await;
            println!("{outcome}");
            outcome
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => eprintln!("[ERROR] Clone task panicked: {e}"),
        }
    }

    outcomes
}

async fn clone_one(
    client: &dyn CloneClient,
    url: &str,
    org: &str,
    repo: &str,
    target: &Path,
) -> CloneOutcome {
    // any existing entry at the target counts as already cloned
    if target.exists() {
        return CloneOutcome::Skipped {
            org: org.to_string(),
            repo: repo.to_string(),
        };
    }

    if let Some(parent) = target.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return CloneOutcome::Failed {
                url: url.to_string(),
                reason: format!("Couldn't create directory for {}: {e}", target.display()),
            };
        }
    }

    match client.clone_repo(url, target).await {
        Ok(CloneOutput { success: true, .. }) => CloneOutcome::Cloned {
            url: url.to_string(),
        },
        Ok(CloneOutput { output, .. }) => CloneOutcome::Failed {
            url: url.to_string(),
            reason: format!("Failed to clone {url}: {output}"),
        },
        Err(e) => CloneOutcome::Failed {
            url: url.to_string(),
            reason: format!("Failed to clone {url}: {e:#}"),
        },
    }
}
