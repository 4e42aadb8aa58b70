use crate::common::command::{
    bitdiff_commit, commit_files, index_bytes, init_repository_dir, init_session, repository_dir,
    run_bitdiff_command, stdout_of,
};
use crate::common::file::{FileSpec, delete_path, write_bytes, write_file};
use assert_fs::TempDir;
use bitdiff::areas::repository::Repository;
use bitdiff::artifacts::diff::delta::{DeltaStatus, PatchResult};
use bitdiff::artifacts::diff::hunk::{DiffHunk, HunkLine, LineKind};
use bitdiff::artifacts::status::file_status::FileStatus;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::path::Path;

mod common;

fn first_hunk(result: Option<PatchResult>) -> Option<DiffHunk> {
    result?.delta()?.hunks.first().cloned()
}

fn index_text(repository: &Repository, path: &str) -> Option<String> {
    repository.reload_index().expect("Failed to reload index");
    let oid = repository.index().entry_by_path(Path::new(path))?.oid.clone();
    let blob = repository.database().load_blob(&oid).expect("Failed to load blob");
    Some(blob.text().expect("blob is not UTF-8").to_string())
}

#[rstest]
fn stage_and_unstage_an_appended_line(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "foo\nbar\n".to_string(),
    ));

    let hunk = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one hunk");
    assert_eq!(hunk.header(), "@@ -1 +1,2 @@");

    repository.patch_index_file(Path::new("a.txt"), &hunk, true)?;

    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\nbar\n"));
    assert_eq!(
        repository.status(Path::new("a.txt"))?,
        FileStatus::new(DeltaStatus::Modified, DeltaStatus::Unmodified)
    );

    let hunk = first_hunk(repository.staged_diff(Path::new("a.txt"))?).expect("one hunk");
    repository.patch_index_file(Path::new("a.txt"), &hunk, false)?;

    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\n"));
    assert_eq!(
        repository.status(Path::new("a.txt"))?,
        FileStatus::new(DeltaStatus::Unmodified, DeltaStatus::Modified)
    );

    Ok(())
}

#[rstest]
fn stage_one_of_two_hunks(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    let original = (1..=12).map(|i| format!("line {i}\n")).collect::<String>();
    commit_files(&repository, &[("a.txt", original.as_str())], "first");

    let modified = original
        .replace("line 2\n", "line two\n")
        .replace("line 11\n", "line eleven\n");
    write_file(FileSpec::new(repository_dir.path().join("a.txt"), modified.clone()));

    let result = repository.unstaged_diff(Path::new("a.txt"))?;
    let hunks = result
        .as_ref()
        .and_then(PatchResult::delta)
        .map(|delta| delta.hunks.clone())
        .expect("text diff");
    assert_eq!(hunks.len(), 2);

    repository.patch_index_file(Path::new("a.txt"), &hunks[1], true)?;

    assert_eq!(
        index_text(&repository, "a.txt"),
        Some(original.replace("line 11\n", "line eleven\n"))
    );
    let remaining = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one left");
    assert_eq!(remaining.header(), "@@ -1,5 +1,5 @@");

    Ok(())
}

#[rstest]
fn stage_whole_untracked_file(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello\n".to_string(),
    ));

    let hunk = first_hunk(repository.unstaged_diff(Path::new("hello.txt"))?).expect("one hunk");
    repository.patch_index_file(Path::new("hello.txt"), &hunk, true)?;

    assert_eq!(index_text(&repository, "hello.txt").as_deref(), Some("hello\n"));
    assert_eq!(
        repository.status(Path::new("hello.txt"))?,
        FileStatus::new(DeltaStatus::Added, DeltaStatus::Unmodified)
    );

    Ok(())
}

#[rstest]
fn unstage_newly_added_file(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello\n".to_string(),
    ));
    repository.add(&["hello.txt"])?;

    let hunk = first_hunk(repository.staged_diff(Path::new("hello.txt"))?).expect("one hunk");
    assert_eq!(hunk.header(), "@@ -0,0 +1 @@");
    repository.patch_index_file(Path::new("hello.txt"), &hunk, false)?;

    assert_eq!(index_text(&repository, "hello.txt"), None);
    assert!(repository.status(Path::new("hello.txt"))?.is_untracked());

    Ok(())
}

#[rstest]
fn stage_and_unstage_a_deleted_file(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\nbar\n"), ("b.txt", "keep\n")], "first");
    delete_path(&repository_dir.path().join("a.txt"));

    let hunk = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one hunk");
    assert_eq!(hunk.header(), "@@ -1,2 +0,0 @@");
    repository.patch_index_file(Path::new("a.txt"), &hunk, true)?;

    assert_eq!(index_text(&repository, "a.txt"), None);
    assert_eq!(repository.status(Path::new("a.txt"))?.porcelain_code(), "D ");

    let hunk = first_hunk(repository.staged_diff(Path::new("a.txt"))?).expect("one hunk");
    repository.patch_index_file(Path::new("a.txt"), &hunk, false)?;

    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\nbar\n"));
    assert_eq!(repository.status(Path::new("a.txt"))?.porcelain_code(), " D");

    Ok(())
}

#[rstest]
fn mismatched_hunk_leaves_index_untouched(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "one\ntwo\nthree\n")], "first");
    let before = index_bytes(repository_dir.path());

    let hunk = DiffHunk::parse("@@ -2 +2 @@\n-nope\n+yes\n")?;
    let error = repository
        .patch_index_file(Path::new("a.txt"), &hunk, true)
        .expect_err("context does not match");

    assert!(error.is_mismatch());
    assert_eq!(index_bytes(repository_dir.path()), before);
    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("one\ntwo\nthree\n"));

    Ok(())
}

#[rstest]
fn partial_hunk_without_index_entry_is_rejected(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "one\n")], "first");
    write_file(FileSpec::new(
        repository_dir.path().join("new.txt"),
        "a\nb\nc\nd\ne\n".to_string(),
    ));
    let before = index_bytes(repository_dir.path());

    let hunk = DiffHunk::parse("@@ -3,0 +4 @@\n+d\n")?;
    let error = repository
        .patch_index_file(Path::new("new.txt"), &hunk, true)
        .expect_err("no entry to patch");

    assert!(error.is_mismatch());
    assert_eq!(index_bytes(repository_dir.path()), before);

    Ok(())
}

#[rstest]
fn hunk_of_non_utf8_workspace_file_is_a_mismatch(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    write_bytes(&repository_dir.path().join("a.txt"), b"foo\ncaf\xe9\n");
    let before = index_bytes(repository_dir.path());

    let hunk = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one hunk");
    let error = repository
        .patch_index_file(Path::new("a.txt"), &hunk, true)
        .expect_err("workspace bytes are not UTF-8");

    assert!(error.is_mismatch());
    assert_eq!(index_bytes(repository_dir.path()), before);
    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\n"));

    repository.add(&["a.txt"])?;
    assert_eq!(
        repository.status(Path::new("a.txt"))?,
        FileStatus::new(DeltaStatus::Modified, DeltaStatus::Unmodified)
    );

    Ok(())
}

#[rstest]
fn failed_index_save_keeps_session_and_file(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\n")], "first");
    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "foo\nbar\n".to_string(),
    ));

    let hunk = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one hunk");
    let staged_oid = |repository: &Repository| {
        repository
            .index()
            .entry_by_path(Path::new("a.txt"))
            .map(|entry| entry.oid.clone())
    };
    let oid_before = staged_oid(&repository);

    let lock_path = repository_dir.path().join(".git").join("index.lock");
    write_bytes(&lock_path, b"");
    let before = index_bytes(repository_dir.path());

    let error = repository
        .patch_index_file(Path::new("a.txt"), &hunk, true)
        .expect_err("index is locked");

    assert!(!error.is_mismatch());
    assert_eq!(staged_oid(&repository), oid_before);
    assert_eq!(index_bytes(repository_dir.path()), before);
    assert!(lock_path.exists());

    Ok(())
}

#[rstest]
fn restoring_deleted_file_ignores_hunk_lines(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo\nbar\n"), ("b.txt", "keep\n")], "first");
    delete_path(&repository_dir.path().join("a.txt"));
    repository.add(&["."])?;
    assert_eq!(repository.status(Path::new("a.txt"))?.porcelain_code(), "D ");

    let hunk = DiffHunk {
        old_start: 1,
        old_lines: 1,
        lines: vec![HunkLine {
            kind: LineKind::Context,
            content: "\u{0}@@ not a patch line".to_string(),
            newline: false,
        }],
        ..Default::default()
    };
    repository.patch_index_file(Path::new("a.txt"), &hunk, false)?;

    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\nbar\n"));
    assert_eq!(repository.status(Path::new("a.txt"))?.porcelain_code(), " D");

    Ok(())
}

#[rstest]
fn stage_line_without_trailing_newline(repository_dir: TempDir) -> anyhow::Result<()> {
    let (repository, _) = init_session(repository_dir.path());
    commit_files(&repository, &[("a.txt", "foo")], "first");
    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "foo\nbar".to_string(),
    ));

    let hunk = first_hunk(repository.unstaged_diff(Path::new("a.txt"))?).expect("one hunk");
    assert_eq!(
        hunk.to_string(),
        "@@ -1 +1,2 @@\n-foo\n\\ No newline at end of file\n+foo\n+bar\n\\ No newline at end of file\n"
    );

    repository.patch_index_file(Path::new("a.txt"), &hunk, true)?;
    assert_eq!(index_text(&repository, "a.txt").as_deref(), Some("foo\nbar"));

    Ok(())
}

#[rstest]
fn stage_hunk_from_the_command_line(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "modified one\n".to_string(),
    ));

    let staged = stdout_of(&mut run_bitdiff_command(
        repository_dir.path(),
        &["stage", "1.txt", "--hunk", "1"],
    ));
    assert_eq!(staged, "staged @@ -1 +1 @@\n");

    let status = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["status"]));
    assert_eq!(status, "M  1.txt\n");

    run_bitdiff_command(repository_dir.path(), &["unstage", "1.txt", "--hunk", "2"])
        .assert()
        .failure();

    run_bitdiff_command(repository_dir.path(), &["unstage", "1.txt"])
        .assert()
        .success();
    let status = stdout_of(&mut run_bitdiff_command(repository_dir.path(), &["status"]));
    assert_eq!(status, " M 1.txt\n");

    bitdiff_commit(repository_dir.path(), "nothing staged")
        .assert()
        .success();

    Ok(())
}

fn text_of(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

/// Stage (or unstage) the first hunk until none are left
fn drain_hunks(repository: &Repository, stage: bool) {
    for _ in 0..64 {
        let result = if stage {
            repository.unstaged_diff(Path::new("a.txt"))
        } else {
            repository.staged_diff(Path::new("a.txt"))
        }
        .expect("Failed to diff");

        let Some(hunk) = first_hunk(result) else {
            return;
        };
        repository
            .patch_index_file(Path::new("a.txt"), &hunk, stage)
            .expect("Failed to patch index");
    }
    panic!("hunks never drained");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn staging_every_hunk_then_unstaging_restores_head(
        original in prop::collection::vec("[a-c]{1,2}", 0..8),
        modified in prop::collection::vec("[a-c]{1,2}", 0..8),
    ) {
        common::redirect_temp_dir();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let (repository, _) = init_session(dir.path());
        commit_files(&repository, &[("a.txt", text_of(&original).as_str())], "first");
        write_file(FileSpec::new(dir.path().join("a.txt"), text_of(&modified)));

        drain_hunks(&repository, true);
        prop_assert_eq!(index_text(&repository, "a.txt"), Some(text_of(&modified)));

        drain_hunks(&repository, false);
        prop_assert_eq!(index_text(&repository, "a.txt"), Some(text_of(&original)));
    }
}
