use assert_fs::TempDir;
use common::{commit_all, init_repository_dir, run_twig_command, twig_stdout, write_file};
use filetime::FileTime;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

mod common;

/// Repository with `1.txt`, `a/2.txt` and `a/b/3.txt` committed.
#[fixture]
fn committed_repository_dir(init_repository_dir: TempDir) -> TempDir {
    let dir = init_repository_dir.path();
    write_file(&dir.join("1.txt"), "one");
    write_file(&dir.join("a/2.txt"), "two");
    write_file(&dir.join("a/b/3.txt"), "three");
    commit_all(dir, "Initial commit");

    init_repository_dir
}

#[rstest]
fn clean_tree_reports_nothing(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();

    assert_eq!(twig_stdout(dir, &["status", "-s"]), "");
    assert_eq!(
        twig_stdout(dir, &["status"]),
        "On branch master\n\nnothing to commit, working tree clean"
    );
}

#[rstest]
fn new_repository_has_no_commits(init_repository_dir: TempDir) {
    assert_eq!(
        twig_stdout(init_repository_dir.path(), &["status"]),
        "On branch master\n\nNo commits yet\n\nnothing to commit, working tree clean"
    );
}

#[rstest]
fn untracked_files_and_directories(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    write_file(&dir.join("new.txt"), "new");
    write_file(&dir.join("a/new.txt"), "nested new");
    write_file(&dir.join("fresh/deep/file.txt"), "deep");
    std::fs::create_dir_all(dir.join("empty/inner")).unwrap();

    assert_eq!(
        twig_stdout(dir, &["status", "-s"]),
        "?? a/new.txt\n?? fresh/\n?? new.txt"
    );
}

#[rstest]
fn modified_and_deleted_files_are_unstaged(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    write_file(&dir.join("1.txt"), "changed");
    std::fs::remove_dir_all(dir.join("a/b")).unwrap();

    assert_eq!(twig_stdout(dir, &["status", "-s"]), " M 1.txt\n D a/b/3.txt");
}

#[rstest]
fn same_size_edit_with_old_mtime_is_still_detected(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    let path = dir.join("1.txt");
    let before = std::fs::metadata(&path).unwrap();
    write_file(&path, "eno");
    filetime::set_file_mtime(&path, FileTime::from_last_modification_time(&before)).unwrap();

    assert_eq!(twig_stdout(dir, &["status", "-s"]), " M 1.txt");
}

#[rstest]
fn touched_file_is_unchanged(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    filetime::set_file_mtime(dir.join("1.txt"), FileTime::from_unix_time(1_000_000_000, 0)).unwrap();

    assert_eq!(twig_stdout(dir, &["status", "-s"]), "");
}

#[rstest]
fn staged_and_unstaged_changes_are_separate(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    write_file(&dir.join("1.txt"), "staged change");
    write_file(&dir.join("added.txt"), "added");
    run_twig_command(dir, &["add", "1.txt", "added.txt"]).assert().success();
    write_file(&dir.join("1.txt"), "and an unstaged one");
    run_twig_command(dir, &["rm", "--cached", "a/2.txt"]).assert().success();

    assert_eq!(
        twig_stdout(dir, &["status", "-s"]),
        "MM 1.txt\nD  a/2.txt\nA  added.txt\n?? a/2.txt"
    );

    let long = twig_stdout(dir, &["status"]);
    assert!(long.contains("Changes to be committed:\n\tmodified:   1.txt\n\tdeleted:    a/2.txt\n\tnew file:   added.txt"));
    assert!(long.contains("Changes not staged for commit:\n\tmodified:   1.txt"));
    assert!(long.contains("Untracked files:\n\ta/2.txt"));
}

#[rstest]
fn detached_head_is_reported(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    let head = twig_stdout(dir, &["rev-parse", "HEAD"]);
    write_file(&dir.join(".git/HEAD"), &format!("{head}\n"));

    assert_eq!(
        twig_stdout(dir, &["status"]),
        format!("HEAD detached at {}\n\nnothing to commit, working tree clean", &head[..7])
    );
}

#[rstest]
fn status_works_while_index_is_locked(committed_repository_dir: TempDir) {
    let dir = committed_repository_dir.path();
    write_file(&dir.join(".git/index.lock"), "");
    write_file(&dir.join("1.txt"), "changed");

    assert_eq!(twig_stdout(dir, &["status", "-s"]), " M 1.txt");
}
