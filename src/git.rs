//! Commit history collaborator.
//!
//! Recap assembly merges the day's commits per project by shelling out to
//! `git log`. A missing binary, a non-repository path, or any failure just
//! yields an empty list; git activity is enrichment, never a requirement.

use std::path::Path;
use std::process::Command;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    pub short_hash: String,
    pub time: String,
    pub subject: String,
}

/// Commits authored on the given day in the repository at `project_path`.
pub fn commits_for_day(project_path: &Path, date: &str) -> Vec<Commit> {
    let since = format!("{} 00:00:00", date);
    let until = format!("{} 23:59:59", date);

    let output = Command::new("git")
        .arg("-C")
        .arg(project_path)
        .arg("log")
        .arg("--since")
        .arg(&since)
        .arg("--until")
        .arg(&until)
        .arg("--date=format:%H:%M")
        .arg("--pretty=format:%h%x09%ad%x09%s")
        .output();

    let output = match output {
        Ok(output) if output.status.success() => output,
        _ => return Vec::new(),
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(parse_commit_line)
        .collect()
}

fn parse_commit_line(line: &str) -> Option<Commit> {
    let mut parts = line.splitn(3, '\t');
    let short_hash = parts.next()?.trim();
    let time = parts.next()?.trim();
    let subject = parts.next()?.trim();
    if short_hash.is_empty() {
        return None;
    }
    Some(Commit {
        short_hash: short_hash.to_string(),
        time: time.to_string(),
        subject: subject.to_string(),
    })
}
