//! Centralized command execution with consistent error handling.
//!
//! Every external tool realprep drives (apt-get, git, cmake, make, udevadm)
//! goes through this module, so failures carry the program name, exit code,
//! and captured stderr. Commands that mutate system state are marked
//! `elevate()`; elevation prefixes `sudo` only when the process is not
//! already running as root.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<std::path::PathBuf>,
    /// If true, prefix with sudo when not running as root.
    elevate: bool,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            elevate: false,
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set an environment variable for the command.
    ///
    /// For elevated commands the assignment is passed as a `VAR=value`
    /// argument to sudo so it survives the privilege boundary.
    pub fn env_var(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Run with elevated privileges (sudo) unless already root.
    pub fn elevate(mut self) -> Self {
        self.elevate = true;
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// The (program, args) pair that will actually be spawned.
    ///
    /// Elevation rewrites `prog args...` into
    /// `sudo [VAR=val...] prog args...` when `root` is false.
    fn effective_for(&self, root: bool) -> (String, Vec<String>) {
        if self.elevate && !root {
            let mut args = Vec::with_capacity(self.args.len() + self.envs.len() + 1);
            for (key, value) in &self.envs {
                args.push(format!("{}={}", key, value));
            }
            args.push(self.program.clone());
            args.extend(self.args.iter().cloned());
            ("sudo".to_string(), args)
        } else {
            (self.program.clone(), self.args.clone())
        }
    }

    /// Render the command as a single display line (for plans and errors).
    pub fn display_line(&self) -> String {
        let (program, args) = self.effective_for(is_root());
        let mut line = program;
        for arg in &args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn build(&self) -> Command {
        let root = is_root();
        let (program, args) = self.effective_for(root);
        let mut cmd = Command::new(program);
        cmd.args(args);

        // Non-elevated (or already-root) commands take env vars directly.
        if !self.elevate || root {
            for (key, value) in &self.envs {
                cmd.env(key, value);
            }
        }

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        let mut cmd = self.build();

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            let prefix = self
                .error_prefix
                .clone()
                .unwrap_or_else(|| format!("'{}' failed", self.program));

            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("{} (exit code {})", prefix, result.code());
            } else {
                bail!("{} (exit code {}):\n{}", prefix, result.code(), stderr);
            }
        }

        Ok(result)
    }

    /// Run the command with inherited stdio (interactive/streaming).
    ///
    /// Output goes directly to the terminal. Use for long-running commands
    /// where the user should see progress (apt-get, make).
    pub fn run_interactive(self) -> Result<ExitStatus> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd
            .status()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        if !self.allow_fail && !status.success() {
            let prefix = self
                .error_prefix
                .unwrap_or_else(|| format!("'{}' failed", self.program));
            bail!("{} (exit code {})", prefix, status.code().unwrap_or(-1));
        }

        Ok(status)
    }
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Run a command with arguments. Fails with stderr on error.
pub fn run<I, S>(program: &str, args: I) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Cmd::new(program);
    for arg in args {
        cmd = cmd.arg(arg);
    }
    cmd.run()
}

/// Run a command in a specific directory.
pub fn run_in<I, S>(program: &str, args: I, dir: &Path) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Cmd::new(program).dir(dir);
    for arg in args {
        cmd = cmd.arg(arg);
    }
    cmd.run()
}

/// Check if a program exists in PATH.
///
/// Returns the full path if found, None otherwise.
pub fn which(program: &str) -> Option<String> {
    which::which(program)
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Check if a program exists in PATH (bool version).
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}

/// Whether the current process runs with euid 0.
///
/// Cached for the process lifetime; elevation decisions depend on it.
pub fn is_root() -> bool {
    static IS_ROOT: OnceLock<bool> = OnceLock::new();
    *IS_ROOT.get_or_init(|| {
        Cmd::new("id")
            .arg("-u")
            .allow_fail()
            .run()
            .map(|r| r.success() && r.stdout_trimmed() == "0")
            .unwrap_or(false)
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = run("echo", ["hello"]).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_run_captures_stderr() {
        // `ls` on a non-existent file writes to stderr
        let result = Cmd::new("ls")
            .arg("/nonexistent_path_12345")
            .allow_fail()
            .run()
            .unwrap();

        assert!(!result.success());
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn test_run_failure_includes_stderr() {
        let err = run("ls", ["/nonexistent_path_12345"]).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn test_which_exists() {
        assert!(which("sh").is_some());
    }

    #[test]
    fn test_which_not_exists() {
        assert!(which("nonexistent_program_12345").is_none());
    }

    #[test]
    fn test_exists() {
        assert!(exists("sh"));
        assert!(!exists("nonexistent_program_12345"));
    }

    #[test]
    fn test_cmd_builder_chaining() {
        let result = Cmd::new("echo").arg("hello").arg("world").run().unwrap();

        assert_eq!(result.stdout_trimmed(), "hello world");
    }

    #[test]
    fn test_cmd_args_iterator() {
        let args = vec!["one", "two", "three"];
        let result = Cmd::new("echo").args(args).run().unwrap();

        assert_eq!(result.stdout_trimmed(), "one two three");
    }

    #[test]
    fn test_custom_error_message() {
        let err = Cmd::new("false")
            .error_msg("Provisioning step failed")
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("Provisioning step failed"));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new("false").allow_fail().run().unwrap();

        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_run_in_directory() {
        let result = run_in("pwd", [] as [&str; 0], Path::new("/tmp")).unwrap();
        assert!(result.stdout_trimmed().contains("tmp"));
    }

    #[test]
    fn test_env_var_applied() {
        let result = Cmd::new("sh")
            .args(["-c", "printf %s \"$REALPREP_TEST_VAR\""])
            .env_var("REALPREP_TEST_VAR", "42")
            .run()
            .unwrap();

        assert_eq!(result.stdout_trimmed(), "42");
    }

    #[test]
    fn test_effective_not_elevated() {
        let cmd = Cmd::new("apt-get").arg("update");
        let (program, args) = cmd.effective_for(false);
        assert_eq!(program, "apt-get");
        assert_eq!(args, vec!["update"]);
    }

    #[test]
    fn test_effective_elevated_as_user() {
        let cmd = Cmd::new("apt-get")
            .args(["install", "-y", "git"])
            .env_var("DEBIAN_FRONTEND", "noninteractive")
            .elevate();
        let (program, args) = cmd.effective_for(false);
        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec![
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                "git"
            ]
        );
    }

    #[test]
    fn test_effective_elevated_as_root() {
        let cmd = Cmd::new("make").arg("install").elevate();
        let (program, args) = cmd.effective_for(true);
        assert_eq!(program, "make");
        assert_eq!(args, vec!["install"]);
    }

    #[test]
    fn test_is_root_matches_id() {
        let id = run("id", ["-u"]).unwrap();
        assert_eq!(is_root(), id.stdout_trimmed() == "0");
    }
}
