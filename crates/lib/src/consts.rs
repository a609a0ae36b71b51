/// Application name, used in user-facing messages and env var prefixes.
pub const APP_NAME: &str = "targetdiff";

/// Set by `bazel run` to the root of the invoking workspace.
pub const WORKSPACE_DIR_ENV: &str = "BUILD_WORKSPACE_DIRECTORY";

/// Overrides the build tool binary used for queries.
pub const BAZEL_BIN_ENV: &str = "TARGETDIFF_BAZEL";

/// Build tool binary used when no override is given.
pub const DEFAULT_BAZEL_BIN: &str = "bazel";

/// Target universe used when no patterns are given.
pub const DEFAULT_UNIVERSE: &str = "//...";

/// Subtree of the execution and output roots holding external repositories.
pub const EXTERNAL_DIR: &str = "external";

/// Output tree symlink created by the build tool inside the workspace.
pub const OUTPUT_ROOT_LINK: &str = "bazel-bin";

/// Commit compared against in commit-pair mode when no base is given.
pub const DEFAULT_BASE: &str = "HEAD~1";
