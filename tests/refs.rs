use assert_fs::TempDir;
use common::{commit_all, init_repository_dir, run_twig_command, twig_stdout, write_file};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

mod common;

/// Repository with two commits on master; returns the directory and both ids.
#[fixture]
fn history_dir(init_repository_dir: TempDir) -> (TempDir, String, String) {
    let dir = init_repository_dir.path();
    write_file(&dir.join("a.txt"), "a");
    let first = commit_all(dir, "first");
    write_file(&dir.join("b.txt"), "b");
    let second = commit_all(dir, "second");

    (init_repository_dir, first, second)
}

#[rstest]
fn revision_expressions_resolve(history_dir: (TempDir, String, String)) {
    let (dir, first, second) = history_dir;
    let dir = dir.path();

    assert_eq!(twig_stdout(dir, &["rev-parse", "@"]), second);
    assert_eq!(twig_stdout(dir, &["rev-parse", "master"]), second);
    assert_eq!(twig_stdout(dir, &["rev-parse", "refs/heads/master"]), second);
    assert_eq!(twig_stdout(dir, &["rev-parse", "master^"]), first);
    assert_eq!(twig_stdout(dir, &["rev-parse", "HEAD~1"]), first);
    assert_eq!(twig_stdout(dir, &["rev-parse", &second[..8]]), second);
}

#[rstest]
fn walking_past_the_root_fails(history_dir: (TempDir, String, String)) {
    let (dir, _, _) = history_dir;

    run_twig_command(dir.path(), &["rev-parse", "HEAD~2"])
        .assert()
        .failure()
        .code(128);
}

#[rstest]
fn lightweight_and_annotated_tags(history_dir: (TempDir, String, String)) {
    let (dir, first, second) = history_dir;
    let dir = dir.path();

    run_twig_command(dir, &["tag", "v1", &first]).assert().success();
    run_twig_command(dir, &["tag", "-a", "-m", "release two", "v2"])
        .assert()
        .success();

    assert_eq!(twig_stdout(dir, &["tag"]), "v1\nv2");
    assert_eq!(twig_stdout(dir, &["rev-parse", "v1"]), first);

    // an annotated tag names the tag object, which peels to the commit
    let tag_oid = twig_stdout(dir, &["rev-parse", "v2"]);
    assert_ne!(tag_oid, second);
    assert_eq!(twig_stdout(dir, &["rev-parse", "--type", "commit", "v2"]), second);

    let tag_payload = twig_stdout(dir, &["cat-file", "tag", "v2"]);
    assert!(tag_payload.starts_with(&format!("object {second}\ntype commit\ntag v2\ntagger fake_user")));
    assert!(tag_payload.ends_with("\n\nrelease two"));
}

#[rstest]
fn existing_tag_is_not_overwritten(history_dir: (TempDir, String, String)) {
    let (dir, first, second) = history_dir;
    let dir = dir.path();
    run_twig_command(dir, &["tag", "v1", &first]).assert().success();

    run_twig_command(dir, &["tag", "v1", &second])
        .assert()
        .failure()
        .code(128)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(twig_stdout(dir, &["rev-parse", "v1"]), first);
}

#[rstest]
fn invalid_tag_name_is_rejected(history_dir: (TempDir, String, String)) {
    let (dir, _, _) = history_dir;

    run_twig_command(dir.path(), &["tag", "bad..name"])
        .assert()
        .failure()
        .code(128);
}

#[rstest]
fn show_ref_lists_sorted_refs(history_dir: (TempDir, String, String)) {
    let (dir, first, second) = history_dir;
    let dir = dir.path();
    run_twig_command(dir, &["tag", "v1", &first]).assert().success();

    assert_eq!(
        twig_stdout(dir, &["show-ref"]),
        format!("{second} refs/heads/master\n{first} refs/tags/v1")
    );
}

#[rstest]
fn show_ref_skips_dangling_symbolic_refs(history_dir: (TempDir, String, String)) {
    let (dir, _, second) = history_dir;
    let dir = dir.path();
    write_file(&dir.join(".git/refs/heads/alias"), "ref: refs/heads/nowhere\n");

    assert_eq!(
        twig_stdout(dir, &["show-ref"]),
        format!("{second} refs/heads/master")
    );
}

#[rstest]
fn symbolic_ref_cycle_is_fatal(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(&dir.join(".git/refs/heads/a"), "ref: refs/heads/b\n");
    write_file(&dir.join(".git/refs/heads/b"), "ref: refs/heads/a\n");

    run_twig_command(dir, &["rev-parse", "a"])
        .assert()
        .failure()
        .code(128)
        .stderr(predicate::str::contains("cycle"));
}

#[rstest]
fn commit_on_detached_head_moves_head_only(history_dir: (TempDir, String, String)) {
    let (dir, first, second) = history_dir;
    let dir = dir.path();
    write_file(&dir.join(".git/HEAD"), &format!("{first}\n"));

    write_file(&dir.join("c.txt"), "c");
    let third = commit_all(dir, "detached");

    assert_eq!(
        std::fs::read_to_string(dir.join(".git/HEAD")).unwrap(),
        format!("{third}\n")
    );
    assert_eq!(twig_stdout(dir, &["rev-parse", "master"]), second);
    assert_eq!(twig_stdout(dir, &["rev-parse", "HEAD^"]), first);
}
