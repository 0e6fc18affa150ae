use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// `/job/{name}/api/json`; builds are listed most recent first.
#[derive(Deserialize, Debug)]
pub struct BuildInfo {
    pub builds: Vec<Build>,
}

#[derive(Deserialize, Debug)]
pub struct Build {
    pub number: u32,
}

/// `/job/{name}/{build}/api/json`
#[derive(Deserialize, Debug)]
pub struct BuildDetails {
    #[serde(rename = "_class")]
    pub class: String,
    pub runs: Option<Vec<Run>>,
}

/// One configuration of a matrix build.
#[derive(Deserialize, Debug, Clone)]
pub struct Run {
    pub url: String,
}

impl Run {
    pub fn console_url(&self) -> String {
        format!("{}/consoleText", self.url.trim_end_matches('/'))
    }

    /// Filesystem-safe token from the axis segment of the run url, the one
    /// before the build number: `.../job/foo/TOXENV=py36,platform=bb5/42/`
    /// gives `TOXENV_py36_platform_bb5`. The trailing slash is optional.
    pub fn param_token(&self) -> Option<String> {
        let url = self.url.strip_suffix('/').unwrap_or(&self.url);
        url.rsplit('/')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .map(sanitize)
    }
}

fn sanitize(segment: &str) -> String {
    segment.replace(['=', ','], "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildClass {
    /// Freestyle or pipeline build, one console log.
    Simple,
    /// Fans out into runs, one console log each.
    Matrix,
}

impl FromStr for BuildClass {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hudson.model.FreeStyleBuild" | "org.jenkinsci.plugins.workflow.job.WorkflowRun" => {
                Ok(Self::Simple)
            }
            "hudson.matrix.MatrixBuild" => Ok(Self::Matrix),
            other => Err(Error::UnrecognizedBuildType(other.to_string())),
        }
    }
}
