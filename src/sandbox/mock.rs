//! Mock provisioner for testing.
//!
//! Provides a configurable mock that returns predetermined command
//! results and tracks every call for test assertions, without talking
//! to a real sandbox provider.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ExecOutput, Provisioner, SandboxHandle};

/// How the mock responds to a `run` call.
#[derive(Debug, Clone)]
pub(crate) enum MockRun {
    /// Complete with the given exit code, stdout and stderr.
    Complete {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// Never complete. The caller's timeout must fire.
    Hang,
}

/// A mock provisioner for testing the task runner.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockProvisioner {
    run_response: Arc<Mutex<Option<MockRun>>>,
    fail_create: bool,
    create_calls: Arc<AtomicUsize>,
    write_calls: Arc<AtomicUsize>,
    run_calls: Arc<AtomicUsize>,
    release_calls: Arc<AtomicUsize>,
    /// Last file written into the sandbox, as (path, contents).
    written: Arc<Mutex<Option<(String, String)>>>,
    /// Env vars passed to the last create call.
    envs: Arc<Mutex<HashMap<String, String>>>,
}

impl MockProvisioner {
    /// A mock whose command execution completes with the given output.
    pub fn completing(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            run_response: Arc::new(Mutex::new(Some(MockRun::Complete {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }))),
            ..Self::default()
        }
    }

    /// A mock whose command execution never completes.
    pub fn hanging() -> Self {
        Self {
            run_response: Arc::new(Mutex::new(Some(MockRun::Hang))),
            ..Self::default()
        }
    }

    /// A mock that refuses to create a sandbox.
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    /// The last file written into the sandbox, as (path, contents).
    pub fn written(&self) -> Option<(String, String)> {
        self.written.lock().expect("lock poisoned").clone()
    }

    /// Env vars passed to the last create call.
    pub fn envs(&self) -> HashMap<String, String> {
        self.envs.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    async fn create(
        &self,
        template_id: &str,
        _timeout: Duration,
        envs: &HashMap<String, String>,
    ) -> Result<SandboxHandle> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            anyhow::bail!("template '{template_id}' not found");
        }
        *self.envs.lock().expect("lock poisoned") = envs.clone();
        Ok(SandboxHandle {
            id: format!("mock-{template_id}"),
        })
    }

    async fn write_file(&self, _handle: &SandboxHandle, path: &str, contents: &str) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        *self.written.lock().expect("lock poisoned") =
            Some((path.to_string(), contents.to_string()));
        Ok(())
    }

    async fn run(
        &self,
        _handle: &SandboxHandle,
        _command: &str,
        _timeout: Duration,
    ) -> Result<ExecOutput> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .run_response
            .lock()
            .expect("lock poisoned")
            .clone()
            .unwrap_or(MockRun::Complete {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            });

        match response {
            MockRun::Complete {
                exit_code,
                stdout,
                stderr,
            } => Ok(ExecOutput {
                exit_code,
                stdout,
                stderr,
            }),
            MockRun::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future completed")
            }
        }
    }

    async fn release(&self, _handle: &SandboxHandle) -> Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tracks_calls() {
        let mock = MockProvisioner::completing(0, "ok", "");
        let handle = mock
            .create("tpl", Duration::from_secs(1), &HashMap::new())
            .await
            .unwrap();

        mock.write_file(&handle, "/tmp/x", "body").await.unwrap();
        let output = mock.run(&handle, "true", Duration::from_secs(1)).await.unwrap();
        mock.release(&handle).await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, "ok");
        assert_eq!(mock.create_calls(), 1);
        assert_eq!(mock.write_calls(), 1);
        assert_eq!(mock.run_calls(), 1);
        assert_eq!(mock.release_calls(), 1);
        assert_eq!(
            mock.written(),
            Some(("/tmp/x".to_string(), "body".to_string()))
        );
    }

    #[tokio::test]
    async fn test_mock_failing_create() {
        let mock = MockProvisioner::failing_create();
        let result = mock
            .create("missing", Duration::from_secs(1), &HashMap::new())
            .await;
        assert!(result.is_err());
        assert_eq!(mock.create_calls(), 1);
    }
}
