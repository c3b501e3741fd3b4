use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Deserialize;
use std::io::Write;
use tempfile::NamedTempFile;

const API_BASE: &str = "https://api.scratch.mit.edu/projects";
const PROJECTS_BASE: &str = "https://projects.scratch.mit.edu";

#[derive(Debug, Deserialize)]
struct ProjectMetadata {
    #[serde(default)]
    project_token: Option<String>,
}

pub fn metadata_url(project_id: u64) -> String {
    format!("{}/{}", API_BASE, project_id)
}

pub fn content_url(project_id: u64, token: &str) -> String {
    format!("{}/{}?token={}", PROJECTS_BASE, project_id, token)
}

/// Downloads a shared project. The metadata lookup hands out the token the
/// content server requires.
pub fn fetch_project(project_id: u64) -> Result<NamedTempFile> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("sb3go/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build the HTTP client.")?;

    info!("Looking up project {}.", project_id);
    let metadata: ProjectMetadata = client
        .get(metadata_url(project_id))
        .send()
        .and_then(|resp| resp.error_for_status())
        .with_context(|| format!("Failed to look up project {}.", project_id))?
        .json()
        .with_context(|| format!("Invalid metadata for project {}.", project_id))?;
    let token = metadata
        .project_token
        .ok_or_else(|| anyhow!("Project {} has no access token. Is it shared?", project_id))?;

    info!("Downloading project {}.", project_id);
    let body = client
        .get(content_url(project_id, &token))
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .with_context(|| format!("Failed to download project {}.", project_id))?;

    let mut file = tempfile::Builder::new()
        .prefix("sb3go-")
        .suffix(".sb3")
        .tempfile()
        .context("Failed to create a temporary file for the download.")?;
    file.write_all(&body)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_match_the_scratch_endpoints() {
        assert_eq!(metadata_url(123), "https://api.scratch.mit.edu/projects/123");
        assert_eq!(
            content_url(123, "tok_en"),
            "https://projects.scratch.mit.edu/123?token=tok_en"
        );
    }

    #[test]
    fn metadata_token_is_optional() {
        let with: ProjectMetadata =
            serde_json::from_str(r#"{"id": 1, "project_token": "abc"}"#).unwrap();
        assert_eq!(with.project_token.as_deref(), Some("abc"));
        let without: ProjectMetadata = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(without.project_token.is_none());
    }
}
