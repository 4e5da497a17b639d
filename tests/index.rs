use assert_fs::TempDir;
use common::{commit_all, init_repository_dir, run_twig_command, twig_stdout, write_file, write_generated_files};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn add_single_file_to_index(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("hi.txt"), "hi\n");

    run_twig_command(dir, &["add", "hi.txt"]).assert().success();

    assert_eq!(
        twig_stdout(dir, &["ls-files", "-v"]),
        "100644 45b983be36b73c0788dc9cbcb76cbb80fc7bb057 0\thi.txt"
    );
}

#[rstest]
fn add_nested_directories_in_path_order(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("b.txt"), "b");
    write_file(&dir.join("a/b/c.txt"), "c");
    write_file(&dir.join("a/z.txt"), "z");

    run_twig_command(dir, &["add", "."]).assert().success();

    assert_eq!(twig_stdout(dir, &["ls-files"]), "a/b/c.txt\na/z.txt\nb.txt");
}

#[rstest]
fn add_from_subdirectory_uses_workspace_paths(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("src/lib.rs"), "pub fn f() {}\n");

    run_twig_command(&dir.join("src"), &["add", "lib.rs"]).assert().success();

    assert_eq!(twig_stdout(dir, &["ls-files"]), "src/lib.rs");
}

#[rstest]
fn add_executable_keeps_mode(init_repository_dir: TempDir) {
    use std::os::unix::fs::PermissionsExt;

    let dir = init_repository_dir.path();
    let script = dir.join("run.sh");
    write_file(&script, "#!/bin/sh\n");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    run_twig_command(dir, &["add", "run.sh"]).assert().success();

    assert!(twig_stdout(dir, &["ls-files", "-v"]).starts_with("100755 "));
}

#[rstest]
fn file_replacing_directory_drops_its_children(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("a/one.txt"), "1");
    write_file(&dir.join("a/two.txt"), "2");
    run_twig_command(dir, &["add", "."]).assert().success();

    std::fs::remove_dir_all(dir.join("a")).unwrap();
    write_file(&dir.join("a"), "now a file");
    run_twig_command(dir, &["add", "a"]).assert().success();

    assert_eq!(twig_stdout(dir, &["ls-files"]), "a");
}

#[rstest]
fn add_missing_path_leaves_index_untouched(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    let files = write_generated_files(dir, 2);

    run_twig_command(dir, &["add", &files[0], "missing.txt"])
        .assert()
        .failure()
        .code(128)
        .stderr(predicate::str::contains("did not match any files"));

    assert_eq!(twig_stdout(dir, &["ls-files"]), "");
    assert!(!dir.join(".git/index.lock").exists());
}

#[rstest]
fn add_fails_while_index_is_locked(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("hi.txt"), "hi\n");
    write_file(&dir.join(".git/index.lock"), "");

    run_twig_command(dir, &["add", "hi.txt"])
        .assert()
        .failure()
        .code(128)
        .stderr(predicate::str::contains("lock file already exists"));

    // the foreign lock is left alone
    assert!(dir.join(".git/index.lock").exists());
    assert!(!dir.join(".git/index").exists());
}

#[rstest]
fn rm_removes_from_index_and_workspace(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("keep.txt"), "keep");
    write_file(&dir.join("nested/gone.txt"), "gone");
    run_twig_command(dir, &["add", "."]).assert().success();

    run_twig_command(dir, &["rm", "nested/gone.txt"])
        .assert()
        .success()
        .stdout("rm 'nested/gone.txt'\n");

    assert_eq!(twig_stdout(dir, &["ls-files"]), "keep.txt");
    assert!(!dir.join("nested").exists());
}

#[rstest]
fn rm_cached_keeps_workspace_file(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("keep.txt"), "keep");
    run_twig_command(dir, &["add", "."]).assert().success();

    run_twig_command(dir, &["rm", "--cached", "keep.txt"]).assert().success();

    assert_eq!(twig_stdout(dir, &["ls-files"]), "");
    assert!(dir.join("keep.txt").exists());
}

#[rstest]
fn rm_untracked_path_fails(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("loose.txt"), "loose");

    run_twig_command(dir, &["rm", "loose.txt"])
        .assert()
        .failure()
        .code(128);
    assert!(dir.join("loose.txt").exists());
}

#[rstest]
fn rm_dot_untracks_and_deletes_every_file(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("a.txt"), "a");
    write_file(&dir.join("sub/b.txt"), "b");
    commit_all(dir, "both");

    run_twig_command(dir, &["rm", "."])
        .assert()
        .success()
        .stdout("rm 'a.txt'\nrm 'sub/b.txt'\n");

    assert_eq!(twig_stdout(dir, &["ls-files"]), "");
    assert!(!dir.join("a.txt").exists());
    assert!(!dir.join("sub").exists());
}

#[rstest]
fn rm_dot_in_subdirectory_only_touches_that_directory(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("a.txt"), "a");
    write_file(&dir.join("sub/b.txt"), "b");
    write_file(&dir.join("sub/inner/c.txt"), "c");
    commit_all(dir, "three");

    run_twig_command(&dir.join("sub/inner"), &["rm", "--cached", "./.."])
        .assert()
        .success()
        .stdout("rm 'sub/b.txt'\nrm 'sub/inner/c.txt'\n");

    assert_eq!(twig_stdout(dir, &["ls-files"]), "a.txt");
    assert!(dir.join("sub/b.txt").exists());
}
