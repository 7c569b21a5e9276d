//! End-to-end tests driving the `Kernel` facade.
//!
//! Tests verify:
//! - created paths exist and carry the caller's ownership
//! - pipelines thread stdout byte-for-byte
//! - validation precedes any side effect; committed effects survive later failures
//! - permission checks on shared directories
//! - confirmation requests and the `AssumeYes` policy

use vsh_kernel::vfs::Mode;
use vsh_kernel::{ConfirmPolicy, ErrorKind, Identity, Kernel, KernelConfig};

// ============================================================================
// Test Helpers
// ============================================================================

fn alice() -> Identity {
    Identity::new("alice", ["alice", "staff"])
}

fn make_kernel() -> Kernel {
    let kernel = Kernel::new(KernelConfig::default().with_identity(alice())).expect("kernel");
    let root = Identity::root();
    let fs = kernel.fs();
    fs.create_directory("/shared", &root, false).expect("mkdir /shared");
    kernel
}

const HOME: &str = "/home/alice";

// ============================================================================
// Filesystem round trips
// ============================================================================

#[tokio::test]
async fn created_paths_exist() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("mkdir -p a/b/c; touch a/b/c/x.txt; write a/y.txt hi", HOME, &alice())
        .await;
    assert!(result.success, "{:?}", result);

    let fs = kernel.fs();
    for path in ["a", "a/b", "a/b/c", "a/b/c/x.txt", "a/y.txt"] {
        let stat = fs.stat(&format!("{HOME}/{path}")).expect(path);
        assert_eq!(stat.owner, "alice", "{path}");
        assert_eq!(stat.group, "alice", "{path}");
    }
}

#[tokio::test]
async fn create_directory_with_parents_counts() {
    let kernel = Kernel::isolated().expect("kernel");
    let fs = kernel.fs();
    let root = Identity::root();

    assert_eq!(fs.create_directory("/a/b/c", &root, true).unwrap(), 3);
    assert_eq!(fs.create_directory("/a/b/c", &root, true).unwrap(), 0);
    assert_eq!(fs.stat("/a/b").unwrap().owner, "root");
}

#[tokio::test]
async fn recursive_delete_counts_every_node() {
    let kernel = make_kernel();
    kernel
        .run_line("mkdir -p t/d1/d2; write t/f1 x; write t/d1/f2 y; write t/d1/d2/f3 z", HOME, &alice())
        .await;

    let report = kernel
        .fs()
        .delete_recursive(&format!("{HOME}/t"), &alice(), true)
        .unwrap();
    // t, d1, d2 and three files.
    assert_eq!(report.deleted_count, 6);
    assert!(report.errors.is_empty());
    assert!(!kernel.fs().exists(&format!("{HOME}/t")));
}

// ============================================================================
// Pipelines
// ============================================================================

#[tokio::test]
async fn pipeline_threads_stdout_exactly() {
    let kernel = make_kernel();
    kernel
        .run_line("write data.txt 'alpha beta'", HOME, &alice())
        .await;
    kernel
        .run_line("write data.txt --append 'gamma'", HOME, &alice())
        .await;

    let result = kernel
        .run_line("cat data.txt | grep -n a | head -n 1", HOME, &alice())
        .await;
    assert!(result.success, "{:?}", result);
    assert_eq!(result.stdout, "1:alpha beta\n");

    let result = kernel.run_line("cat data.txt | cat | cat", HOME, &alice()).await;
    assert_eq!(result.stdout, "alpha beta\ngamma\n");
}

#[tokio::test]
async fn validation_failure_runs_nothing() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("write first.txt hi | mkdir", HOME, &alice())
        .await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::ValidationError));
    assert_eq!(result.error.as_deref(), Some("mkdir: missing operand"));
    assert!(!kernel.fs().exists(&format!("{HOME}/first.txt")));
}

#[tokio::test]
async fn first_stage_validation_error_is_reported() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("cat missing.txt | write out.txt", HOME, &alice())
        .await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("cat: /home/alice/missing.txt: no such file or directory")
    );
    assert!(!kernel.fs().exists(&format!("{HOME}/out.txt")));
}

#[tokio::test]
async fn earlier_effects_survive_later_failure() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("write kept.txt hi | false | write never.txt", HOME, &alice())
        .await;
    assert!(!result.success);
    assert!(kernel.fs().exists(&format!("{HOME}/kept.txt")));
    assert!(!kernel.fs().exists(&format!("{HOME}/never.txt")));
}

#[tokio::test]
async fn redirect_and_variables() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("export OUT=log.txt; echo first > $OUT; echo second >> $OUT; cat < $OUT", HOME, &alice())
        .await;
    assert!(result.success, "{:?}", result);
    assert_eq!(result.stdout, "first\nsecond\n");
}

#[tokio::test]
async fn repeated_output_redirect_is_rejected() {
    let kernel = make_kernel();
    let result = kernel.run_line("echo hi > /tmp/x > /tmp/y", HOME, &alice()).await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::ParseError));
    assert!(!kernel.fs().exists("/tmp/x"));
    assert!(!kernel.fs().exists("/tmp/y"));
}

#[tokio::test]
async fn comments_and_quoting() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("echo 'a | b' \"$USER\" # trailing comment", HOME, &alice())
        .await;
    assert_eq!(result.stdout, "a | b alice\n");
}

#[tokio::test]
async fn unterminated_quote_is_parse_error() {
    let kernel = make_kernel();
    let result = kernel.run_line("echo \"open", HOME, &alice()).await;
    assert_eq!(result.kind, Some(ErrorKind::ParseError));
}

// ============================================================================
// Permissions
// ============================================================================

#[tokio::test]
async fn shared_directory_without_write_permission() {
    let kernel = make_kernel();
    let result = kernel.run_line("touch /shared/x.txt", HOME, &alice()).await;
    assert_eq!(result.kind, Some(ErrorKind::PermissionError));
    assert!(!kernel.fs().exists("/shared/x.txt"));

    let err = kernel
        .fs()
        .create_file("/shared/x.txt", b"x".to_vec(), &alice(), false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionError);
    assert!(!kernel.fs().exists("/shared/x.txt"));
}

#[tokio::test]
async fn group_write_grants_access() {
    let kernel = make_kernel();
    let root = Identity::root();
    let fs = kernel.fs();
    fs.set_group("/shared", "staff", &root).unwrap();
    fs.set_mode("/shared", Mode::new(0o775), &root).unwrap();

    let result = kernel.run_line("write /shared/notes.txt hello", HOME, &alice()).await;
    assert!(result.success, "{:?}", result);

    let bob = Identity::new("bob", ["bob"]);
    let result = kernel.run_line("rm /shared/notes.txt", "/", &bob).await;
    assert_eq!(result.kind, Some(ErrorKind::PermissionError));
}

#[tokio::test]
async fn superuser_bypasses_permissions() {
    let kernel = make_kernel();
    let result = kernel
        .run_line("chmod 000 /shared; write /shared/x.txt y; cat /shared/x.txt", "/", &Identity::root())
        .await;
    assert!(result.success, "{:?}", result);
    assert_eq!(result.stdout, "y\n");
}

#[tokio::test]
async fn sticky_tmp_protects_other_users_files() {
    let kernel = make_kernel();
    kernel.run_line("write /tmp/mine.txt x", HOME, &alice()).await;

    let bob = Identity::new("bob", ["bob"]);
    let result = kernel.run_line("rm /tmp/mine.txt", "/", &bob).await;
    assert_eq!(result.kind, Some(ErrorKind::PermissionError));
    assert!(kernel.fs().exists("/tmp/mine.txt"));
}

// ============================================================================
// Confirmation
// ============================================================================

#[tokio::test]
async fn non_empty_directory_needs_confirmation() {
    let kernel = make_kernel();
    kernel.run_line("mkdir -p d/e", HOME, &alice()).await;

    let result = kernel.run_line("rm -r d", HOME, &alice()).await;
    assert_eq!(result.kind, Some(ErrorKind::ConfirmationRequired));
    assert!(kernel.fs().exists(&format!("{HOME}/d/e")));

    let result = kernel.run_line("rm -rf d", HOME, &alice()).await;
    assert!(result.success, "{:?}", result);
    assert!(!kernel.fs().exists(&format!("{HOME}/d")));
}

#[tokio::test]
async fn assume_yes_policy_answers_confirmation() {
    let config = KernelConfig::default()
        .with_identity(alice())
        .with_confirm(ConfirmPolicy::AssumeYes);
    let kernel = Kernel::new(config).expect("kernel");
    kernel.run_line("mkdir -p d/e", HOME, &alice()).await;

    let result = kernel.run_line("rm -r d", HOME, &alice()).await;
    assert!(result.success, "{:?}", result);
}

#[tokio::test]
async fn background_jobs_never_assume_yes() {
    let config = KernelConfig::default()
        .with_identity(alice())
        .with_confirm(ConfirmPolicy::AssumeYes);
    let kernel = Kernel::new(config).expect("kernel");
    kernel.run_line("mkdir -p d/e", HOME, &alice()).await;

    kernel.run_line("rm -r d &", HOME, &alice()).await;
    let jobs = kernel.list_jobs().await;
    let result = kernel.wait_job(jobs[0].id).await.unwrap();
    assert_eq!(result.kind, Some(ErrorKind::ConfirmationRequired));
    assert!(kernel.fs().exists(&format!("{HOME}/d/e")));
}
