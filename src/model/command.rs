//! Command-line model backend.
//!
//! Runs an LLM CLI (e.g. `llm`, `ollama run <model>`) once per prompt with
//! the prompt as the final positional argument, and treats stdout as the
//! reply. The binary is resolved on `PATH` up front so a missing tool is
//! reported before any flow runs.
//!
//! Debug logs never include the prompt text; the argv is logged with the
//! prompt replaced by `<prompt len=N>`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::ModelClient;
use crate::error::VaultError;
use crate::subprocess;

#[derive(Debug, Clone)]
pub struct CommandModel {
    program: PathBuf,
    leading_args: Vec<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl CommandModel {
    pub fn new(
        program: PathBuf,
        leading_args: Vec<String>,
        model: Option<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program,
            leading_args,
            model,
            timeout,
        }
    }

    /// Layout: `<leading args…> [--model <m>] <prompt>`.
    fn argv(&self, prompt: &str) -> Vec<String> {
        let mut args = self.leading_args.clone();
        if let Some(model) = &self.model {
            args.push("--model".to_owned());
            args.push(model.clone());
        }
        args.push(prompt.to_owned());
        args
    }
}

/// Copy of `args` with the trailing prompt replaced by its length.
fn args_for_log(args: &[String]) -> Vec<String> {
    let mut out = args.to_vec();
    if let Some(last) = out.last_mut() {
        *last = format!("<prompt len={}>", last.len());
    }
    out
}

impl ModelClient for CommandModel {
    fn complete(&self, prompt: &str) -> Result<String, VaultError> {
        let args = self.argv(prompt);
        info!(
            provider = "command",
            program = %self.program.display(),
            prompt_len = prompt.len(),
            "invoking model command"
        );
        debug!(args = ?args_for_log(&args), "model command argv");

        let out = subprocess::run_command(&self.program, &args, self.timeout).map_err(|e| {
            VaultError::ModelSpawnFailed {
                detail: e.to_string(),
            }
        })?;

        if out.timed_out {
            return Err(VaultError::ModelTimedOut {
                timeout_sec: self.timeout.map_or(0, |t| t.as_secs()),
            });
        }
        if !out.success() {
            debug!(stderr = %out.stderr, "model command stderr");
            return Err(VaultError::ModelNonZeroExit {
                exit_code: out.exit_code,
                stderr: out.stderr,
            });
        }
        Ok(out.stdout)
    }

    fn provider_name(&self) -> &'static str {
        "command"
    }

    fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or("default")
    }
}

/// Resolve `cmd` to an executable path.
///
/// A `cmd` containing a path separator is checked directly; a bare name is
/// searched for in each `PATH` directory.
pub fn resolve_model_cmd(cmd: &str) -> Result<PathBuf, VaultError> {
    resolve_model_cmd_with(cmd, std::env::var_os("PATH"))
}

fn resolve_model_cmd_with(
    cmd: &str,
    path_var: Option<std::ffi::OsString>,
) -> Result<PathBuf, VaultError> {
    let not_found = || VaultError::ModelCmdNotFound {
        cmd: cmd.to_owned(),
    };

    if cmd.trim().is_empty() {
        return Err(not_found());
    }

    if cmd.contains(std::path::MAIN_SEPARATOR) || cmd.contains('/') {
        let p = PathBuf::from(cmd);
        return if is_executable(&p) { Ok(p) } else { Err(not_found()) };
    }

    let paths = path_var.ok_or_else(not_found)?;
    std::env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, cmd))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn candidates(dir: &Path, cmd: &str) -> Vec<PathBuf> {
    vec![dir.join(cmd)]
}

/// On Windows a bare name without extension also matches `<name>.exe`.
#[cfg(not(unix))]
fn candidates(dir: &Path, cmd: &str) -> Vec<PathBuf> {
    if Path::new(cmd).extension().is_some() {
        vec![dir.join(cmd)]
    } else {
        vec![dir.join(cmd), dir.join(format!("{cmd}.exe"))]
    }
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = path.metadata() else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn model_for(program: &str, leading: &[&str], model: Option<&str>) -> CommandModel {
        CommandModel::new(
            resolve_model_cmd(program).expect("program on PATH"),
            leading.iter().map(|s| (*s).to_owned()).collect(),
            model.map(str::to_owned),
            Some(Duration::from_secs(10)),
        )
    }

    #[test]
    fn argv_puts_prompt_last() {
        let m = CommandModel::new(
            PathBuf::from("llm"),
            vec!["prompt".into()],
            Some("gpt-4o-mini".into()),
            None,
        );
        assert_eq!(
            m.argv("hello"),
            vec!["prompt", "--model", "gpt-4o-mini", "hello"]
        );
    }

    #[test]
    fn argv_omits_model_flag_when_unset() {
        let m = CommandModel::new(PathBuf::from("llm"), Vec::new(), None, None);
        assert_eq!(m.argv("hi"), vec!["hi"]);
    }

    #[test]
    fn log_args_hide_prompt_text() {
        let logged = args_for_log(&["-q".to_owned(), "secret recipe".to_owned()]);
        assert_eq!(logged, vec!["-q", "<prompt len=13>"]);
    }

    #[test]
    fn complete_returns_stdout() {
        let m = model_for("echo", &[], None);
        let reply = m.complete("{\"ok\":true}").unwrap();
        assert_eq!(reply.trim(), "{\"ok\":true}");
    }

    #[test]
    fn complete_reports_nonzero_exit() {
        let m = model_for("sh", &["-c", "echo broken >&2; exit 3", "sh"], None);
        match m.complete("ignored").unwrap_err() {
            VaultError::ModelNonZeroExit { exit_code, stderr } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected ModelNonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn complete_reports_timeout() {
        let m = CommandModel::new(
            resolve_model_cmd("sleep").unwrap(),
            Vec::new(),
            None,
            Some(Duration::from_millis(200)),
        );
        let err = m.complete("30").unwrap_err();
        assert!(matches!(err, VaultError::ModelTimedOut { .. }), "got {err:?}");
    }

    #[test]
    fn complete_reports_spawn_failure() {
        let m = CommandModel::new(PathBuf::from("/no/such/llm"), Vec::new(), None, None);
        let err = m.complete("hi").unwrap_err();
        assert!(matches!(err, VaultError::ModelSpawnFailed { .. }), "got {err:?}");
    }

    #[test]
    fn resolves_echo_on_real_path() {
        let p = resolve_model_cmd("echo").expect("echo on PATH");
        assert!(p.is_file());
    }

    #[test]
    fn fails_for_nonexistent_command() {
        let err = resolve_model_cmd("recipe-vault-nonexistent-xyz").unwrap_err();
        assert!(format!("{err}").contains("not found on PATH"), "got: {err}");
    }

    #[test]
    fn fails_for_empty_command() {
        assert!(resolve_model_cmd("").is_err());
    }

    #[test]
    fn fails_when_path_var_missing_or_empty() {
        assert!(resolve_model_cmd_with("echo", None).is_err());
        assert!(resolve_model_cmd_with("echo", Some(OsString::new())).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn finds_binary_in_custom_path_and_skips_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exec = dir.path().join("my-llm");
        std::fs::write(&exec, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exec, std::fs::Permissions::from_mode(0o755)).unwrap();
        let plain = dir.path().join("not-exec");
        std::fs::write(&plain, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = OsString::from(dir.path().as_os_str());
        assert_eq!(
            resolve_model_cmd_with("my-llm", Some(path_var.clone())).unwrap(),
            exec
        );
        assert!(resolve_model_cmd_with("not-exec", Some(path_var)).is_err());
    }

    #[test]
    fn skips_directory_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("my-llm")).unwrap();
        let path_var = OsString::from(dir.path().as_os_str());
        assert!(resolve_model_cmd_with("my-llm", Some(path_var)).is_err());
    }
}
