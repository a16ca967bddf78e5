// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use tempfile::tempdir;

#[test]
fn add_and_list_projects_round_trips() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let created = add_project(&db, "Demo", None, 1_000).expect("add project");
    let listed = list_projects(&db).expect("list projects");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].project_id, created.project_id);
    assert_eq!(listed[0].name, "Demo");
}

#[test]
fn migrate_check_is_not_ready_until_a_repo_exists() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let project = add_project(&db, "Demo", None, 1_000).expect("add project");

    let before = migrate_check(&db, project.project_id.as_str()).expect("check before");
    assert!(!before.ready);
    assert_eq!(before.repo_count, 0);

    let migration = migrate_to_multi_repo(&db, project.project_id.as_str(), false, None).expect("migrate");
    assert!(migration.created_repo.is_some());

    let after = migrate_check(&db, project.project_id.as_str()).expect("check after");
    assert!(after.ready);
    assert_eq!(after.repo_count, 1);
}

#[test]
fn migration_honors_explicit_workspace_root() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let project = add_project(&db, "Demo", None, 1_000).expect("add project");

    let root = std::path::PathBuf::from("services/api");
    let migration = migrate_to_multi_repo(&db, project.project_id.as_str(), false, Some(&root)).expect("migrate");
    let repo = migration.created_repo.expect("repo created");
    assert_eq!(repo.workspace_relpath, root);
}

#[test]
fn dry_run_migration_does_not_write_a_repo_row() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let project = add_project(&db, "Demo", None, 1_000).expect("add project");

    let migration = migrate_to_multi_repo(&db, project.project_id.as_str(), true, None).expect("dry run migrate");
    assert!(migration.dry_run);
    assert!(migration.created_repo.is_some());

    let repos = list_repos(&db, project.project_id.as_str()).expect("list repos");
    assert!(repos.is_empty());
}
