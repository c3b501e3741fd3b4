use clap::{ArgGroup, Parser};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sb3go",
    version,
    about = "Compile a Scratch 3 project into a Go program for the ebiten runtime."
)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "project_id"])))]
pub struct Args {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "The Scratch project (.sb3 or project.json) to compile."
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        default_value = "output.go",
        help = "Where to write the generated Go source."
    )]
    pub output: PathBuf,

    #[arg(
        long,
        value_name = "ID",
        help = "Download and compile a shared project from scratch.mit.edu."
    )]
    pub project_id: Option<u64>,

    #[arg(
        long,
        default_value = "LIT Project",
        help = "Window title of the generated program."
    )]
    pub title: String,

    #[arg(
        long,
        help = "Skip stacks that fail to compile instead of aborting the whole project."
    )]
    pub keep_going: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectInput {
    Path(PathBuf),
    Remote(u64),
}

/// Bad command line usage; the binary prints usage text and exits with 1.
#[derive(Debug, Clone)]
pub struct UsageError {
    pub message: String,
}

impl Display for UsageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for UsageError {}

impl Args {
    pub fn project_input(&self) -> Result<ProjectInput, UsageError> {
        match (&self.input, self.project_id) {
            (Some(_), Some(_)) => Err(UsageError {
                message: "--input and --project-id cannot be used together.".to_string(),
            }),
            (Some(path), None) if !path.exists() => Err(UsageError {
                message: format!("{} does not exist.", path.display()),
            }),
            (Some(path), None) => Ok(ProjectInput::Path(path.clone())),
            (None, Some(id)) => Ok(ProjectInput::Remote(id)),
            (None, None) => Err(UsageError {
                message: "either --input (-i) or --project-id must be present.".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["sb3go", "-i", "game.sb3"]).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("game.sb3")));
        assert_eq!(args.output, PathBuf::from("output.go"));
        assert_eq!(args.title, "LIT Project");
        assert!(!args.keep_going);
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(Args::try_parse_from(["sb3go"]).is_err());
        assert!(
            Args::try_parse_from(["sb3go", "-i", "a.sb3", "--project-id", "10"]).is_err()
        );
        let remote = Args::try_parse_from(["sb3go", "--project-id", "10", "-o", "x.go"]).unwrap();
        assert_eq!(remote.project_input().unwrap(), ProjectInput::Remote(10));
        assert_eq!(remote.output, PathBuf::from("x.go"));
    }

    #[test]
    fn missing_input_path_is_a_usage_error() {
        let args = Args::try_parse_from(["sb3go", "--input", "/no/such/project.sb3"]).unwrap();
        let err = args.project_input().unwrap_err();
        assert_eq!(err.message, "/no/such/project.sb3 does not exist.");
    }

    #[test]
    fn neither_source_is_a_usage_error() {
        let args = Args {
            input: None,
            output: PathBuf::from("output.go"),
            project_id: None,
            title: String::new(),
            keep_going: false,
        };
        assert!(args.project_input().is_err());
    }
}
