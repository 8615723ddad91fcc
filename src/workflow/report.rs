use std::sync::Mutex;

use serde::Serialize;

use crate::error::Result;
use crate::workflow::types::Outcome;

const ABORTED_HEADING: &str = "Aborted before the run started";

/// One recorded repository outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoOutcome {
    pub repository: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Collects outcomes from concurrently running workflows.
///
/// Entries keep insertion order. Read it only after every workflow has
/// recorded.
#[derive(Debug, Default)]
pub struct RunReport {
    entries: Mutex<Vec<RepoOutcome>>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, repository: &str, outcome: Outcome) {
        self.lock().push(RepoOutcome {
            repository: repository.to_string(),
            outcome,
        });
    }

    /// Every recorded entry, successes included.
    pub fn all(&self) -> Vec<RepoOutcome> {
        self.lock().clone()
    }

    /// Entries whose outcome was not a success.
    pub fn entries(&self) -> Vec<RepoOutcome> {
        self.lock()
            .iter()
            .filter(|e| !e.outcome.is_success())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.lock().iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.lock().iter().any(|e| !e.outcome.is_success())
    }

    /// Human-readable listing of every repository that did not succeed,
    /// grouped under its failure detail in first-seen order. Empty when
    /// everything succeeded.
    pub fn summary(&self) -> String {
        let entries = self.lock();

        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for entry in entries.iter() {
            let heading = match &entry.outcome {
                Outcome::Success => continue,
                Outcome::Aborted => ABORTED_HEADING,
                Outcome::Failed { error } => error.as_str(),
            };
            match groups.iter_mut().find(|(h, _)| *h == heading) {
                Some((_, repos)) => repos.push(entry.repository.as_str()),
                None => groups.push((heading, vec![entry.repository.as_str()])),
            }
        }

        let mut out = String::new();
        for (heading, repos) in groups {
            out.push_str(&format!("{}:\n", capitalize(heading)));
            for repo in repos {
                out.push_str(&format!("  {repo}\n"));
            }
        }
        out
    }

    /// Every entry as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.lock())?)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RepoOutcome>> {
        // A panic mid-push cannot leave the Vec inconsistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
