//! `git` / `git annex` command-line backend

use super::{ANNEX_BRANCH, Vcs};
use crate::annex::AnnexMode;
use crate::error::{CommandError, Result};
use async_trait::async_trait;
use log::{debug, trace};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

const DEFAULT_PROGRAM: &str = "git";

/// [`Vcs`] implementation spawning the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a different executable, e.g. a wrapper script
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Spawn the program in `cwd` and collect its output without checking the
    /// exit status
    async fn output(&self, cwd: Option<&Path>, args: &[OsString]) -> Result<Output> {
        let mut command = Command::new(&self.program);
        if let Some(cwd) = cwd {
            command.arg("-C").arg(cwd);
        }
        command.args(args);
        command.stdin(std::process::Stdio::null());

        debug!(
            "Running {} {}",
            self.program,
            display_args(args).join(" ")
        );
        let output = command
            .output()
            .await
            .map_err(|e| CommandError::spawn(&self.program, e))?;
        trace!(
            "{} exited with {:?}: {}",
            self.program,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(output)
    }

    /// Run and fail on a non-zero exit status, returning stdout
    async fn run(&self, cwd: Option<&Path>, args: &[OsString]) -> Result<String> {
        let output = self.output(cwd, args).await?;
        if !output.status.success() {
            return Err(CommandError::failed(
                &self.program,
                &display_args(args),
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn display_args(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$(OsString::from($arg)),*]
    };
}

#[async_trait]
impl Vcs for GitCli {
    async fn init(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        self.run(None, &args!["init", "--quiet", path]).await?;
        Ok(())
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.run(None, &clone_args(url, dest)).await?;
        Ok(())
    }

    async fn remotes(&self, path: &Path) -> Result<Vec<String>> {
        let stdout = self.run(Some(path), &args!["remote"]).await?;
        Ok(parse_lines(&stdout))
    }

    async fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>> {
        let key = format!("remote.{name}.url");
        let args = args!["config", "--get", key];
        let output = self.output(Some(path), &args).await?;

        // `git config --get` exits with 1 when the key is unset
        match output.status.code() {
            Some(0) => Ok(parse_lines(&String::from_utf8_lossy(&output.stdout))
                .into_iter()
                .next()),
            Some(1) => Ok(None),
            code => Err(CommandError::failed(
                &self.program,
                &display_args(&args),
                code,
                &String::from_utf8_lossy(&output.stderr),
            )
            .into()),
        }
    }

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        self.run(Some(path), &remote_args("add", name, url)).await?;
        Ok(())
    }

    async fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        self.run(Some(path), &remote_args("set-url", name, url))
            .await?;
        Ok(())
    }

    async fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        self.run(Some(path), &args!["config", "--local", key, value])
            .await?;
        Ok(())
    }

    async fn submodule_add(&self, superds: &Path, relative: &Path, url: &str) -> Result<()> {
        self.run(
            Some(superds),
            &args!["submodule", "add", "--quiet", "--", url, relative],
        )
        .await?;
        Ok(())
    }

    async fn commit_all(&self, path: &Path, message: &str) -> Result<()> {
        self.run(Some(path), &args!["add", "--all"]).await?;

        let status = self
            .run(Some(path), &args!["status", "--porcelain"])
            .await?;
        if status.trim().is_empty() {
            debug!("Nothing to commit in {}", path.display());
            return Ok(());
        }

        self.run(Some(path), &args!["commit", "--quiet", "-m", message])
            .await?;
        Ok(())
    }

    async fn has_annex_branch(&self, path: &Path) -> Result<bool> {
        let local = format!("refs/heads/{ANNEX_BRANCH}");
        let remote = format!("refs/remotes/*/{ANNEX_BRANCH}");
        let stdout = self
            .run(
                Some(path),
                &args!["for-each-ref", "--format=%(refname)", local, remote],
            )
            .await?;
        Ok(!parse_lines(&stdout).is_empty())
    }

    async fn annex_init(&self, path: &Path, description: Option<&str>) -> Result<()> {
        let mut args = args!["annex", "init", "--quiet"];
        if let Some(description) = description {
            args.push(description.into());
        }
        self.run(Some(path), &args).await?;
        Ok(())
    }

    async fn annex_addurl(
        &self,
        path: &Path,
        url: &str,
        file: &Path,
        mode: AnnexMode,
        options: &[String],
    ) -> Result<()> {
        let mut args = args!["annex", "addurl"];
        if let Some(flag) = mode.addurl_flag() {
            args.push(flag.into());
        }
        args.extend(options.iter().map(OsString::from));
        args.push("--file".into());
        args.push(file.into());
        args.push(url.into());

        self.run(Some(path), &args).await?;
        Ok(())
    }

    async fn annex_whereis(&self, path: &Path, file: &Path) -> Result<Vec<String>> {
        let stdout = self
            .run(Some(path), &args!["annex", "whereis", "--json", "--", file])
            .await?;
        parse_whereis(&stdout)
    }
}

/// Operands follow `--` so a source starting with `-` is not read as an option
fn clone_args(url: &str, dest: &Path) -> Vec<OsString> {
    args!["clone", "--quiet", "--", url, dest]
}

fn remote_args(subcommand: &str, name: &str, url: &str) -> Vec<OsString> {
    args!["remote", subcommand, "--", name, url]
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct WhereisRecord {
    #[serde(default)]
    whereis: Vec<WhereisLocation>,
}

#[derive(Debug, Deserialize)]
struct WhereisLocation {
    uuid: String,
}

/// Parse the JSON lines printed by `git annex whereis --json`
fn parse_whereis(stdout: &str) -> Result<Vec<String>> {
    let mut uuids = Vec::new();
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        let record: WhereisRecord = serde_json::from_str(line)?;
        uuids.extend(record.whereis.into_iter().map(|location| location.uuid));
    }
    Ok(uuids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_lines_skips_blank() {
        assert_eq!(
            parse_lines("origin\n\n  gitlab \n"),
            vec!["origin".to_string(), "gitlab".to_string()]
        );
        assert!(parse_lines("").is_empty());
    }

    #[test]
    fn test_operands_follow_separator() {
        let args = display_args(&clone_args("--upload-pack=touch x", Path::new("/tmp/ds")));
        assert_eq!(
            args,
            vec!["clone", "--quiet", "--", "--upload-pack=touch x", "/tmp/ds"]
        );

        let args = display_args(&remote_args("add", "-n", "https://example.com/ds.git"));
        assert_eq!(
            args,
            vec!["remote", "add", "--", "-n", "https://example.com/ds.git"]
        );
        assert_eq!(
            display_args(&remote_args("set-url", "gitlab", "u"))[..3],
            ["remote", "set-url", "--"]
        );
    }

    #[test]
    fn test_parse_whereis() {
        let stdout = concat!(
            r#"{"command":"whereis","file":"a.dat","whereis":[{"uuid":"u1","description":"here","here":true},{"uuid":"u2","description":"web","here":false}],"success":true}"#,
            "\n"
        );
        assert_eq!(parse_whereis(stdout).unwrap(), vec!["u1", "u2"]);
        assert!(parse_whereis("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_whereis_rejects_garbage() {
        assert!(matches!(parse_whereis("not json"), Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let git = GitCli::with_program("dsman-test-no-such-binary");
        let dir = tempfile::TempDir::new().unwrap();

        let result = git.remotes(dir.path()).await;
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::Spawn { .. }))
        ));
    }
}
