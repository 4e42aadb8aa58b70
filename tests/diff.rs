use crate::common::command::{
    commit_files, init_repository_dir, init_session, open_session, repository_dir,
    run_bitdiff_command, stdout_of,
};
use crate::common::file::{FileSpec, delete_path, make_file_executable, write_bytes, write_file};
use assert_fs::TempDir;
use bitdiff::artifacts::diff::delta::{Comparison, DeltaStatus, PatchResult};
use bitdiff::artifacts::index::entry_mode::{EntryMode, FileMode};
use bitdiff::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use bitdiff::artifacts::objects::blob::Blob;
use bitdiff::artifacts::objects::object::Object;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use std::sync::Arc;

mod common;

#[rstest]
fn show_cached_diff_for_file_added_to_index(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;

    write_file(FileSpec::new(
        repository_dir.path().join("4.txt"),
        "four\n".to_string(),
    ));
    run_bitdiff_command(repository_dir.path(), &["add", "4.txt"])
        .assert()
        .success();

    let expected_output = "diff --git a/4.txt b/4.txt\nnew file mode 100644\nindex 0000000..8510665\n--- /dev/null\n+++ b/4.txt\n@@ -0,0 +1 @@\n+four\n";
    let actual_output = stdout_of(&mut run_bitdiff_command(
        repository_dir.path(),
        &["diff", "--cached"],
    ));

    assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn show_diff_for_file_with_modified_content_in_workspace(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "modified one\n".to_string(),
    ));

    let expected_output = "diff --git a/1.txt b/1.txt\nindex 5626abf..4337797 100644\n--- a/1.txt\n+++ b/1.txt\n@@ -1 +1 @@\n-one\n+modified one\n";
    let actual_output = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["diff"]));

    assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn show_diff_for_file_deleted_from_workspace(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;

    delete_path(&repository_dir.path().join("a").join("2.txt"));

    let expected_output = "diff --git a/a/2.txt b/a/2.txt\ndeleted file mode 100644\nindex f719efd..0000000\n--- a/a/2.txt\n+++ /dev/null\n@@ -1 +0,0 @@\n-two\n";
    let actual_output = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["diff"]));

    assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn show_diff_for_file_with_modified_mode_in_workspace(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;

    make_file_executable(&repository_dir.path().join("1.txt"));

    let expected_output = "diff --git a/1.txt b/1.txt\nold mode 100644\nnew mode 100755\n";
    let actual_output = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["diff"]));

    assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn print_nothing_when_workspace_matches_index(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;

    let actual_output = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["diff"]));
    assert_eq!(actual_output, "");

    Ok(())
}

#[rstest]
fn commit_diff_against_first_parent(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let first = commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    let diff = repository.diff(&second, None)?.expect("second is a commit");

    assert_eq!(
        diff.comparison,
        Comparison::Commits {
            commit: second.clone(),
            parent: Some(first),
        }
    );
    assert_eq!(diff.deltas.len(), 1);
    let delta = &diff.deltas[0];
    assert_eq!(delta.status, DeltaStatus::Modified);
    assert_eq!(delta.hunks.len(), 1);
    assert_eq!(delta.hunks[0].header(), "@@ -1 +1,2 @@");
    assert_eq!(delta.hunks[0].to_string(), "@@ -1 +1,2 @@\n foo\n+bar\n");

    Ok(())
}

#[rstest]
fn root_commit_diff_adds_every_file(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let root = commit_files(&repository, &[("a.txt", "foo\n"), ("b/c.txt", "c\n")], "root");

    let diff = repository.diff(&root, None)?.expect("root is a commit");

    let paths = diff
        .deltas
        .iter()
        .map(|delta| (delta.new_path().to_path_buf(), delta.status))
        .collect::<Vec<_>>();
    assert_eq!(
        paths,
        vec![
            (Path::new("a.txt").to_path_buf(), DeltaStatus::Added),
            (Path::new("b/c.txt").to_path_buf(), DeltaStatus::Added),
        ]
    );
    assert_eq!(diff.deltas[0].hunks[0].header(), "@@ -0,0 +1 @@");

    Ok(())
}

#[rstest]
fn repeated_commit_diff_is_served_from_cache(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    let first_diff = repository.diff(&second, None)?.expect("second is a commit");
    let reads = repository.database().reads();
    let second_diff = repository.diff(&second, None)?.expect("second is a commit");

    assert_eq!(repository.database().reads(), reads);
    assert!(Arc::ptr_eq(&first_diff, &second_diff));

    Ok(())
}

#[rstest]
fn explicit_parent_shares_the_cached_diff(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let first = commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    let implicit = repository.diff(&second, None)?.expect("second is a commit");
    let reads = repository.database().reads();
    let explicit = repository
        .diff(&second, Some(&first))?
        .expect("second is a commit");

    assert_eq!(repository.database().reads(), reads);
    assert!(Arc::ptr_eq(&implicit, &explicit));

    Ok(())
}

#[rstest]
fn first_parent_lookup_reuses_an_explicit_parent_diff(
    repository_dir: TempDir,
) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let first = commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    let explicit = repository
        .diff(&second, Some(&first))?
        .expect("second is a commit");
    let implicit = repository.diff(&second, None)?.expect("second is a commit");

    assert!(Arc::ptr_eq(&explicit, &implicit));
    assert_eq!(repository.cached_diffs(), 2);

    Ok(())
}

#[rstest]
fn foreign_parent_diffs_against_empty_tree(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    let diff = repository
        .diff(&second, Some(&second))?
        .expect("second is a commit");

    assert_eq!(
        diff.comparison,
        Comparison::Commits {
            commit: second.clone(),
            parent: None,
        }
    );
    assert_eq!(diff.deltas[0].status, DeltaStatus::Added);

    let first_parent = repository.diff(&second, None)?.expect("second is a commit");
    assert_eq!(first_parent.deltas[0].status, DeltaStatus::Modified);

    Ok(())
}

#[rstest]
fn commit_clears_cached_diffs(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let first = commit_files(&repository, &[("a.txt", "foo\n")], "first");
    repository.diff(&first, None)?;
    assert!(repository.cached_diffs() > 0);

    commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");

    assert_eq!(repository.cached_diffs(), 0);

    Ok(())
}

#[rstest]
fn non_commit_objects_have_no_diff(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    let blob = repository
        .index()
        .entry_by_path(Path::new("a.txt"))
        .map(|entry| entry.oid.clone())
        .expect("a.txt is staged");
    let missing = Blob::from_text("never stored\n").object_id()?;

    assert!(repository.diff(&blob, None)?.is_none());
    assert!(repository.diff(&missing, None)?.is_none());

    Ok(())
}

#[rstest]
fn diff_maker_reports_untouched_paths_as_unmodified(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n"), ("b.txt", "bar\n")], "first");
    let second = commit_files(&repository, &[("a.txt", "changed\n")], "second");

    let result = repository
        .diff_maker(Path::new("b.txt"), &second, None)?
        .expect("second is a commit");
    let delta = result.delta().expect("text result has a delta");

    assert_eq!(delta.status, DeltaStatus::Unmodified);
    assert!(delta.hunks.is_empty());
    assert_eq!(delta.old.oid, delta.new.oid);

    let changed = repository
        .diff_maker(Path::new("a.txt"), &second, None)?
        .expect("second is a commit");
    assert_eq!(changed.delta().map(|delta| delta.status), Some(DeltaStatus::Modified));

    Ok(())
}

#[rstest]
fn binary_content_yields_no_hunks(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let root = repository_dir.path();
    write_bytes(&root.join("data.bin"), b"\x00\x01\x02binary\x00");
    repository.add(&["data.bin"])?;

    assert_eq!(
        repository.staged_diff(Path::new("data.bin"))?,
        Some(PatchResult::Binary)
    );

    write_bytes(&root.join("data.bin"), b"\x00\x01\x03binary\x00");
    assert_eq!(
        repository.unstaged_diff(Path::new("data.bin"))?,
        Some(PatchResult::Binary)
    );

    Ok(())
}

#[rstest]
fn untracked_file_diffs_as_untracked(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello\n".to_string(),
    ));

    let result = repository
        .unstaged_diff(Path::new("hello.txt"))?
        .expect("file is readable");
    let delta = result.delta().expect("text result has a delta");

    assert_eq!(delta.status, DeltaStatus::Untracked);
    assert!(!delta.old.exists());
    assert_eq!(delta.hunks[0].header(), "@@ -0,0 +1 @@");

    Ok(())
}

#[rstest]
fn conflicted_path_has_no_hunks(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "base\n")], "base");

    let ours = repository.database().store(&Blob::from_text("ours\n"))?;
    let theirs = repository.database().store(&Blob::from_text("theirs\n"))?;
    repository.update_index(|index| {
        for (stage, oid) in [(2, ours), (3, theirs)] {
            let mut entry = IndexEntry::new(
                "a.txt".into(),
                oid,
                EntryMetadata::detached(EntryMode::File(FileMode::Regular), 5),
            );
            entry.stage = stage;
            index.add(entry)?;
        }
        Ok::<_, anyhow::Error>(())
    })?;

    let result = repository
        .unstaged_diff(Path::new("a.txt"))?
        .expect("conflicts still answer");
    let delta = result.delta().expect("text result has a delta");
    assert_eq!(delta.status, DeltaStatus::Conflicted);
    assert!(delta.hunks.is_empty());

    let status = repository.status(Path::new("a.txt"))?;
    assert_eq!(status.porcelain_code(), "UU");

    Ok(())
}

#[rstest]
fn context_lines_follow_configuration(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let text = (1..=9).map(|i| format!("line {i}\n")).collect::<String>();
    commit_files(&repository, &[("a.txt", text.as_str())], "first");
    drop(repository);

    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        text.replace("line 5\n", "line five\n"),
    ));

    let config = bitdiff::config::Config {
        context_lines: 1,
        ..Default::default()
    };
    let repository = bitdiff::areas::repository::Repository::with_config(
        repository_dir.path(),
        config,
        Box::new(std::io::sink()),
    )?;

    let result = repository
        .unstaged_diff(Path::new("a.txt"))?
        .expect("file is readable");
    assert_eq!(
        result.delta().map(|delta| delta.hunks[0].header()),
        Some("@@ -4,3 +4,3 @@".to_string())
    );

    let (default_session, _) = open_session(repository_dir.path());
    let result = default_session
        .unstaged_diff(Path::new("a.txt"))?
        .expect("file is readable");
    assert_eq!(
        result.delta().map(|delta| delta.hunks[0].header()),
        Some("@@ -2,7 +2,7 @@".to_string())
    );

    Ok(())
}

#[rstest]
fn show_prints_commit_patch(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, output) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    commit_files(&repository, &[("a.txt", "foo\nbar\n")], "second");
    output.clear();

    repository.show("HEAD", None, None)?;

    let printed = output.contents();
    assert!(printed.starts_with("commit "));
    assert!(printed.contains("    second\n"));
    assert!(printed.ends_with("--- a/a.txt\n+++ b/a.txt\n@@ -1 +1,2 @@\n foo\n+bar\n"));

    Ok(())
}
