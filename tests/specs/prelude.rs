//! Shared helpers for driving the `xw` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A builder for one `xw` invocation.
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    dir: Option<PathBuf>,
}

/// `xw` in the current directory with color off.
pub fn cli() -> CliBuilder {
    CliBuilder { args: Vec::new(), envs: vec![("NO_COLOR".into(), "1".into())], dir: None }
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn run(self) -> RunAssert {
        let mut cmd = assert_cmd::Command::cargo_bin("xw").unwrap();
        cmd.args(&self.args).env_remove("XW_LOG").env_remove("COLOR");
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd.timeout(std::time::Duration::from_secs(20));
        let output = cmd.output().unwrap();
        RunAssert { args: self.args, output }
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> RunAssert {
        self.exits(0)
    }

    /// Run and require a non-zero exit code.
    pub fn fails(self) -> RunAssert {
        let run = self.run();
        assert!(!run.output.status.success(), "expected failure for {:?}\n{}", run.args, run.describe());
        run
    }

    /// Run and require a specific exit code.
    pub fn exits(self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(run.output.status.code(), Some(code), "for {:?}\n{}", run.args, run.describe());
        run
    }
}

/// Output of a finished invocation.
pub struct RunAssert {
    args: Vec<String>,
    output: std::process::Output,
}

impl RunAssert {
    fn describe(&self) -> String {
        format!("stdout:\n{}\nstderr:\n{}", self.stdout(), self.stderr())
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout lacks {:?}\n{}", needle, self.describe());
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout().contains(needle), "stdout has {:?}\n{}", needle, self.describe());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr lacks {:?}\n{}", needle, self.describe());
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }
}

/// A scratch directory holding state and log files.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `xw` running inside this project.
    pub fn xw(&self) -> CliBuilder {
        CliBuilder { dir: Some(self.dir.path().to_path_buf()), ..cli() }
    }
}
