//! wait-for-completion polling for launched jobs.

use crate::config::WaitConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// awx job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    New,
    Pending,
    Waiting,
    Running,
    Successful,
    Failed,
    Error,
    Canceled,
    Unknown(String),
}

impl JobStatus {
    /// parse a status string as the api reports it.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "new" => JobStatus::New,
            "pending" => JobStatus::Pending,
            "waiting" => JobStatus::Waiting,
            "running" => JobStatus::Running,
            "successful" => JobStatus::Successful,
            "failed" => JobStatus::Failed,
            "error" => JobStatus::Error,
            "canceled" => JobStatus::Canceled,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::New => "new",
            JobStatus::Pending => "pending",
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Successful => "successful",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown(raw) => raw,
        }
    }

    /// true once the job will not change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Successful | JobStatus::Failed | JobStatus::Error | JobStatus::Canceled
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Successful)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        JobStatus::parse(&raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// where job statuses come from. transport is the caller's business.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn status(&self, job_id: u64) -> anyhow::Result<JobStatus>;
}

/// reasons a wait ended without success.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("job {job_id} finished with status {status}")]
    Finished { job_id: u64, status: JobStatus },
    #[error("timed out waiting for job {job_id} (last status {last})")]
    TimedOut { job_id: u64, last: JobStatus },
    #[error("reading status of job {job_id}")]
    Source {
        job_id: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// poll `source` until job `job_id` reaches a terminal status.
pub async fn wait_for_job(
    source: &dyn JobStatusSource,
    job_id: u64,
    config: &WaitConfig,
) -> Result<JobStatus, WaitError> {
    // a timeout past the clock's range means no deadline
    let deadline = Instant::now().checked_add(config.timeout());
    loop {
        let status = source
            .status(job_id)
            .await
            .map_err(|source| WaitError::Source { job_id, source })?;
        tracing::debug!(job_id, status = %status, "polled job");

        if status.is_terminal() {
            if status.is_success() {
                return Ok(status);
            }
            return Err(WaitError::Finished { job_id, status });
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(WaitError::TimedOut {
                job_id,
                last: status,
            });
        }
        sleep(config.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct Scripted {
        statuses: Mutex<Vec<JobStatus>>,
    }

    impl Scripted {
        fn new(statuses: &[&str]) -> Self {
            let mut statuses: Vec<JobStatus> =
                statuses.iter().map(|s| JobStatus::parse(s)).collect();
            statuses.reverse();
            Self {
                statuses: Mutex::new(statuses),
            }
        }
    }

    #[async_trait]
    impl JobStatusSource for Scripted {
        async fn status(&self, _job_id: u64) -> anyhow::Result<JobStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.pop().unwrap())
            } else {
                statuses.last().cloned().ok_or_else(|| anyhow!("no status"))
            }
        }
    }

    fn fast() -> WaitConfig {
        WaitConfig {
            poll_interval_ms: 1,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn returns_on_success() {
        let source = Scripted::new(&["pending", "running", "successful"]);
        let status = wait_for_job(&source, 7, &fast()).await.unwrap();
        assert_eq!(status, JobStatus::Successful);
    }

    #[tokio::test]
    async fn failed_job_is_an_error() {
        let source = Scripted::new(&["running", "failed"]);
        let err = wait_for_job(&source, 7, &fast()).await.unwrap_err();
        assert!(matches!(
            err,
            WaitError::Finished {
                job_id: 7,
                status: JobStatus::Failed
            }
        ));
    }

    #[tokio::test]
    async fn canceled_job_is_an_error() {
        let source = Scripted::new(&["canceled"]);
        let err = wait_for_job(&source, 3, &fast()).await.unwrap_err();
        assert_eq!(err.to_string(), "job 3 finished with status canceled");
    }

    #[tokio::test]
    async fn times_out_while_running() {
        let source = Scripted::new(&["running"]);
        let config = WaitConfig {
            poll_interval_ms: 1,
            timeout_secs: 0,
        };
        let err = wait_for_job(&source, 9, &config).await.unwrap_err();
        assert!(matches!(
            err,
            WaitError::TimedOut {
                job_id: 9,
                last: JobStatus::Running
            }
        ));
    }

    #[tokio::test]
    async fn huge_timeout_means_no_deadline() {
        let config: crate::EngineConfig =
            serde_yaml::from_str("wait:\n  timeout_secs: 18446744073709551615\n").unwrap();
        assert_eq!(config.wait.timeout_secs, u64::MAX);

        let source = Scripted::new(&["successful"]);
        let status = wait_for_job(&source, 5, &config.wait).await.unwrap();
        assert_eq!(status, JobStatus::Successful);

        let source = Scripted::new(&["running", "running", "failed"]);
        let err = wait_for_job(
            &source,
            5,
            &WaitConfig {
                poll_interval_ms: 1,
                ..config.wait
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WaitError::Finished { job_id: 5, .. }));
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let source = Scripted::new(&[]);
        let err = wait_for_job(&source, 1, &fast()).await.unwrap_err();
        assert!(matches!(err, WaitError::Source { job_id: 1, .. }));
    }

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(JobStatus::parse("waiting"), JobStatus::Waiting);
        assert_eq!(JobStatus::parse("odd").as_str(), "odd");
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        let decoded: JobStatus = serde_json::from_str("\"successful\"").unwrap();
        assert_eq!(decoded, JobStatus::Successful);
        let decoded: JobStatus = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(decoded, JobStatus::Unknown("mystery".to_string()));
    }
}
