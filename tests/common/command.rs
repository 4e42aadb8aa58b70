use crate::common::file::{FileSpec, write_file};
use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use bitdiff::areas::repository::Repository;
use bitdiff::artifacts::objects::commit::Author;
use bitdiff::artifacts::objects::object_id::ObjectId;
use bitdiff::config::Config;
use chrono::DateTime;
use rstest::fixture;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000"; // %Y-%m-%d %H:%M:%S %z

#[fixture]
pub fn repository_dir() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

/// Three committed files: `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_bitdiff_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three\n".to_string(),
    ));

    run_bitdiff_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    bitdiff_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_bitdiff_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bitdiff").expect("Failed to find bitdiff binary");
    cmd.envs(vec![("NO_COLOR", "1")]);
    cmd.env_remove("BITDIFF_CONTEXT_LINES");
    cmd.env_remove("BITDIFF_SNIFF_BYTES");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn bitdiff_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_bitdiff_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("GIT_AUTHOR_NAME", AUTHOR_NAME),
        ("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("GIT_AUTHOR_DATE", AUTHOR_DATE),
    ]);
    cmd
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout is not UTF-8")
}

/// In-memory writer shared between a session and the test inspecting its output
#[derive(Debug, Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is not UTF-8")
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn test_author() -> Author {
    let timestamp = DateTime::parse_from_str(AUTHOR_DATE, "%Y-%m-%d %H:%M:%S %z")
        .expect("Invalid author date");
    Author::new(AUTHOR_NAME.to_string(), AUTHOR_EMAIL.to_string(), timestamp)
}

/// A session with default settings whose printed output is captured
pub fn open_session(dir: &Path) -> (Repository, SharedOutput) {
    colored::control::set_override(false);

    let output = SharedOutput::default();
    let repository = Repository::with_config(dir, Config::default(), Box::new(output.clone()))
        .expect("Failed to open repository");
    (repository, output)
}

/// A fresh repository opened as a session
pub fn init_session(dir: &Path) -> (Repository, SharedOutput) {
    let (repository, output) = open_session(dir);
    repository.init().expect("Failed to init repository");
    output.clear();
    (repository, output)
}

/// Write `files`, add everything and commit
pub fn commit_files(
    repository: &Repository,
    files: &[(&str, &str)],
    message: &str,
) -> ObjectId {
    for (name, content) in files {
        write_file(FileSpec::new(
            repository.path().join(name),
            content.to_string(),
        ));
    }
    repository.add(&["."]).expect("Failed to add files");
    repository
        .commit(message, test_author())
        .expect("Failed to commit")
}

pub fn index_bytes(dir: &Path) -> Vec<u8> {
    std::fs::read(dir.join(".git").join("index")).expect("Failed to read index")
}
