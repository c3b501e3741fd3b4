use anyhow::{bail, Context, Result};
use log::debug;
use std::fs;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::result::ZipError;
use zip::ZipArchive;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
const PROJECT_JSON: &str = "project.json";

/// A `project.json` ready to parse. Keeps the extraction directory alive.
#[derive(Debug)]
pub struct ProjectSource {
    pub project_json: PathBuf,
    _extracted: Option<TempDir>,
}

/// Accepts either a bare `project.json` or an `.sb3` archive containing one.
pub fn locate_project_json(input: &Path) -> Result<ProjectSource> {
    if !is_zip_archive(input)? {
        debug!("'{}' is not an archive, reading it as project.json.", input.display());
        return Ok(ProjectSource {
            project_json: input.to_path_buf(),
            _extracted: None,
        });
    }
    let dir = extract_project_json(input)?;
    Ok(ProjectSource {
        project_json: dir.path().join(PROJECT_JSON),
        _extracted: Some(dir),
    })
}

/// Copies only `project.json` out of an `.sb3`; costumes and sounds stay in the archive.
pub fn extract_project_json(input: &Path) -> Result<TempDir> {
    let file =
        fs::File::open(input).with_context(|| format!("Failed to open '{}'.", input.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a valid zip/.sb3 file.", input.display()))?;
    let mut entry = match zip.by_name(PROJECT_JSON) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => bail!("project.json not found in '{}'.", input.display()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read '{}'.", input.display()))
        }
    };
    let dir = tempfile::Builder::new()
        .prefix("sb3-")
        .tempdir()
        .context("Failed to create a directory to extract the project into.")?;
    let path = dir.path().join(PROJECT_JSON);
    let mut out = fs::File::create(&path)
        .with_context(|| format!("Failed to create '{}'.", path.display()))?;
    let copied = io::copy(&mut entry, &mut out)
        .with_context(|| format!("Failed to extract project.json from '{}'.", input.display()))?;
    debug!(
        "Extracted project.json ({} bytes) from '{}'.",
        copied,
        input.display()
    );
    Ok(dir)
}

fn is_zip_archive(path: &Path) -> Result<bool> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Failed to open '{}'.", path.display()))?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ZIP_MAGIC),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to read '{}'.", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in entries {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn plain_json_is_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        fs::write(&path, r#"{"targets": []}"#).unwrap();
        let source = locate_project_json(&path).unwrap();
        assert_eq!(source.project_json, path);
    }

    #[test]
    fn sb3_archive_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.sb3");
        write_zip(
            &path,
            &[
                ("project.json", r#"{"targets": []}"#),
                ("abc.svg", "<svg/>"),
            ],
        );
        let source = locate_project_json(&path).unwrap();
        assert_ne!(source.project_json, path);
        let text = fs::read_to_string(&source.project_json).unwrap();
        assert_eq!(text, r#"{"targets": []}"#);
        let extracted = source.project_json.parent().unwrap();
        assert!(!extracted.join("abc.svg").exists());
        assert_eq!(fs::read_dir(extracted).unwrap().count(), 1);
    }

    #[test]
    fn archive_without_project_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.sb3");
        write_zip(&path, &[("readme.txt", "hi")]);
        let err = locate_project_json(&path).unwrap_err();
        assert!(err.to_string().contains("project.json not found"));
    }

    #[test]
    fn tiny_files_are_not_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        fs::write(&path, "{}").unwrap();
        assert!(!is_zip_archive(&path).unwrap());
    }
}
