//! Daily recap assembly.
//!
//! Consumes the `Session` contract, groups sessions by project, merges git
//! activity per project, and computes day totals. Rendering lives in
//! [`render`].

pub mod render;

use std::collections::HashMap;

use serde::Serialize;

use crate::git::{commits_for_day, Commit};
use crate::session::Session;
use crate::usage::{sum_tokens, TokenUsage};

/// One session with its narrative, produced by the summarization pipeline
/// (or the deterministic fallback).
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub session: Session,
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecap {
    pub name: String,
    pub path: Option<String>,
    pub entries: Vec<SessionEntry>,
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecapTotals {
    pub session_count: usize,
    pub message_count: usize,
    pub duration_ms: i64,
    pub tokens: TokenUsage,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRecap {
    pub date: String,
    pub projects: Vec<ProjectRecap>,
    pub totals: RecapTotals,
}

const UNGROUPED: &str = "(no project)";

/// Group entries by project in first-seen order and merge git history.
///
/// `include_git` exists so tests and `--stdout` previews can skip the
/// shell-out.
pub fn assemble(date: &str, entries: Vec<SessionEntry>, include_git: bool) -> DailyRecap {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, ProjectRecap> = HashMap::new();
    let mut totals = RecapTotals::default();

    let usages: Vec<TokenUsage> = entries.iter().map(|e| e.session.tokens).collect();
    totals.tokens = sum_tokens(&usages);

    for entry in entries {
        totals.session_count += 1;
        totals.message_count += entry.session.message_count;
        totals.duration_ms += entry.session.duration_ms;
        totals.cost_usd += entry.session.cost_usd;

        let name = entry
            .session
            .display_project()
            .unwrap_or_else(|| UNGROUPED.to_string());
        let project = grouped.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            ProjectRecap {
                name,
                path: entry.session.project_path.clone(),
                entries: Vec::new(),
                commits: Vec::new(),
            }
        });
        if project.path.is_none() {
            project.path = entry.session.project_path.clone();
        }
        project.entries.push(entry);
    }

    let mut projects: Vec<ProjectRecap> = order
        .into_iter()
        .filter_map(|name| grouped.remove(&name))
        .collect();

    if include_git {
        for project in &mut projects {
            if let Some(path) = &project.path {
                project.commits = commits_for_day(std::path::Path::new(path), date);
            }
        }
    }

    DailyRecap {
        date: date.to_string(),
        projects,
        totals,
    }
}
