#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_twig_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    repository_dir
}

pub fn run_twig_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("twig").expect("Failed to find twig binary");
    cmd.current_dir(dir)
        .env("NO_PAGER", "1")
        .env("GIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("GIT_AUTHOR_DATE", AUTHOR_DATE)
        .env_remove("TWIG_LOG")
        .args(args);
    cmd
}

/// Run a command that must succeed and return its trimmed stdout.
pub fn twig_stdout(dir: &Path, args: &[&str]) -> String {
    let output = run_twig_command(dir, args).assert().success();
    String::from_utf8(output.get_output().stdout.clone())
        .expect("stdout is not UTF-8")
        .trim_end()
        .to_string()
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(path, content).unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", path, e));
}

/// Write `count` files with random names and contents; returns their names.
pub fn write_generated_files(dir: &Path, count: usize) -> Vec<String> {
    use fake::Fake;
    use fake::faker::lorem::en::Words;

    (0..count)
        .map(|i| {
            let name = format!("file_{i}.txt");
            let content = Words(5..10).fake::<Vec<String>>().join(" ");
            write_file(&dir.join(&name), &content);
            name
        })
        .collect()
}

pub fn commit_all(dir: &Path, message: &str) -> String {
    run_twig_command(dir, &["add", "."]).assert().success();
    run_twig_command(dir, &["commit", "-m", message])
        .assert()
        .success();

    twig_stdout(dir, &["rev-parse", "HEAD"])
}
