#![warn(clippy::all, clippy::pedantic)]
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::jenkins::{job_url, Jenkins};
use crate::job::{BuildClass, BuildDetails, BuildInfo, Run};

/// A job and one concrete build of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReference {
    pub base_url: String,
    pub job: String,
    pub build_id: u32,
}

impl JobReference {
    pub fn build_url(&self) -> String {
        format!("{}/{}", job_url(&self.base_url, &self.job), self.build_id)
    }
}

/// Which runs of a matrix build get downloaded.
#[derive(Debug, Clone, Default)]
pub struct RunSelection {
    /// Substring a run url must contain. `None` accepts every run.
    pub filter: Option<String>,
    /// Stop after the first run that was downloaded.
    pub first_only: bool,
}

impl RunSelection {
    pub fn matches(&self, run: &Run) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |needle| run.url.contains(needle))
    }
}

pub struct LogFetcher {
    jenkins: Jenkins,
    selection: RunSelection,
}

async fn prepare_target(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::filesystem(dir, e))
}

impl LogFetcher {
    pub fn new(jenkins: Jenkins, selection: RunSelection) -> Self {
        Self { jenkins, selection }
    }

    /// Number of the most recent build, i.e. the first one the server lists.
    pub async fn resolve_build_id(&self, base_url: &str, job: &str) -> Result<u32> {
        let url = format!("{}/api/json", job_url(base_url, job));
        let info: BuildInfo = self.jenkins.get_json(&url).await?;

        info.builds
            .first()
            .map(|b| b.number)
            .ok_or_else(|| Error::MalformedResponse(format!("job {job} lists no builds")))
    }

    /// Pins `build_id`, asking the server only when none was given.
    pub async fn resolve(
        &self,
        base_url: &str,
        job: &str,
        build_id: Option<u32>,
    ) -> Result<JobReference> {
        let build_id = match build_id {
            Some(id) => id,
            None => {
                let id = self.resolve_build_id(base_url, job).await?;
                log::info!("last build of {job} is {id}");
                id
            }
        };

        Ok(JobReference {
            base_url: base_url.trim_end_matches('/').to_string(),
            job: job.to_string(),
            build_id,
        })
    }

    async fn build_details(&self, job: &JobReference) -> Result<BuildDetails> {
        self.jenkins
            .get_json(&format!("{}/api/json", job.build_url()))
            .await
    }

    pub async fn classify_build(&self, job: &JobReference) -> Result<BuildClass> {
        let details = self.build_details(job).await?;
        log::debug!("build {} is a {}", job.build_id, details.class);
        details.class.parse()
    }

    /// Writes the console log to `{target_dir}/{build_id}`.
    pub async fn fetch_simple_log(
        &self,
        job: &JobReference,
        target_dir: &Path,
    ) -> Result<PathBuf> {
        prepare_target(target_dir).await?;

        let dest = target_dir.join(job.build_id.to_string());
        self.jenkins
            .download(&format!("{}/consoleText", job.build_url()), &dest)
            .await?;
        log::debug!("wrote {}", dest.display());

        Ok(dest)
    }

    /// Writes one `{target_dir}/{build_id}_{params}` file per selected run.
    /// The first failed download aborts the rest.
    pub async fn fetch_matrix_log(
        &self,
        job: &JobReference,
        target_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let runs = self
            .build_details(job)
            .await?
            .runs
            .ok_or_else(|| {
                Error::MalformedResponse(format!("matrix build {} has no runs", job.build_id))
            })?;

        prepare_target(target_dir).await?;

        let mut written = Vec::new();
        for run in runs.iter().filter(|r| self.selection.matches(r)) {
            let token = run.param_token().ok_or_else(|| {
                Error::MalformedResponse(format!("unexpected run url {}", run.url))
            })?;
            let dest = target_dir.join(format!("{}_{token}", job.build_id));

            self.jenkins.download(&run.console_url(), &dest).await?;
            log::debug!("wrote {}", dest.display());
            written.push(dest);

            if self.selection.first_only {
                break;
            }
        }

        if written.is_empty() {
            log::warn!(
                "none of the {} runs of build {} matched the selection",
                runs.len(),
                job.build_id
            );
        }

        Ok(written)
    }

    /// Classifies the build and downloads its log(s), returning every file written.
    pub async fn download_logs(
        &self,
        job: &JobReference,
        target_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        match self.classify_build(job).await? {
            BuildClass::Simple => Ok(vec![self.fetch_simple_log(job, target_dir).await?]),
            BuildClass::Matrix => self.fetch_matrix_log(job, target_dir).await,
        }
    }
}
