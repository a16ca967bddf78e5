// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;

#[test]
fn repo_scope_labels() {
    assert_eq!(RepoScope::Full.label(), "full");
    assert_eq!(RepoScope::ReadOnly.label(), "read_only");
    assert_eq!(RepoScope::Paths { path_filters: vec!["src/**".into()] }.label(), "paths");
}

#[test]
fn project_status_display() {
    assert_eq!(ProjectStatus::Active.to_string(), "active");
    assert_eq!(ProjectStatus::Archived.to_string(), "archived");
}
