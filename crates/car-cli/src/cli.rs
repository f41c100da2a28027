use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "car")]
#[command(about = "A copy-on-write archival tool for POSIX filesystem trees")]
#[command(after_help = "Exactly one of --create/--extract is required.")]
pub struct Cli {
    /// Create a new archive from the given paths
    #[arg(short = 'c', long, conflicts_with = "extract")]
    pub create: bool,

    /// Extract (or, with --list, inspect) an existing archive
    #[arg(short = 'x', long, conflicts_with = "create")]
    pub extract: bool,

    /// Archive path; omitted means stdout (create) or stdin (extract)
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// List archive contents instead of extracting them (requires --extract)
    #[arg(short = 't', long)]
    pub list: bool,

    /// Echo each entry's name as it is processed, or print detailed listing lines
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Directory to extract into (extract mode only, defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Paths to archive (create mode)
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Cross-flag checks `clap` can't express with derive attributes alone.
    pub fn validate(&self) -> Result<(), String> {
        if !self.create && !self.extract {
            return Err("exactly one of --create or --extract is required".to_string());
        }
        if self.list && !self.extract {
            return Err("--list is only valid together with --extract".to_string());
        }
        if self.create && self.paths.is_empty() {
            return Err("--create requires at least one path argument".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_without_paths_is_rejected() {
        let cli = Cli {
            create: true,
            extract: false,
            file: None,
            list: false,
            verbose: false,
            directory: None,
            paths: vec![],
        };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn list_without_extract_is_rejected() {
        let cli = Cli {
            create: false,
            extract: false,
            file: None,
            list: true,
            verbose: false,
            directory: None,
            paths: vec![],
        };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn extract_with_list_is_accepted() {
        let cli = Cli {
            create: false,
            extract: true,
            file: None,
            list: true,
            verbose: false,
            directory: None,
            paths: vec![],
        };
        assert!(cli.validate().is_ok());
    }
}
