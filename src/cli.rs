//! CLI argument definitions.

use clap::{Parser, Subcommand};
use rustddl::GeneratorOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (default: ./.rustddl.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a project snapshot as a T-SQL script
    Generate(GenerateArgs),
    /// Validate a snapshot and report foreign keys whose target table is missing
    Check {
        /// Project snapshot (JSON)
        input: PathBuf,
    },
    /// List the projects stored in a directory
    List {
        /// Directory holding one <id>.json per project
        dir: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Project snapshot (JSON)
    pub input: PathBuf,

    /// Output file, or a directory to write <project name>.sql into (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Schema used for tables without one
    #[arg(long)]
    pub schema: Option<String>,

    /// Batch separator line
    #[arg(long)]
    pub separator: Option<String>,

    /// Omit the header comment
    #[arg(long)]
    pub no_header: bool,

    /// Align column types within each table
    #[arg(long)]
    pub align: bool,
}

impl GenerateArgs {
    /// Flags win over configuration file values.
    pub fn apply(&self, options: &mut GeneratorOptions) {
        if let Some(schema) = &self.schema {
            options.default_schema = schema.clone();
        }
        if let Some(separator) = &self.separator {
            options.batch_separator = separator.clone();
        }
        if self.no_header {
            options.include_header = false;
        }
        if self.align {
            options.align_columns = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn generate_args(args: &[&str]) -> GenerateArgs {
        let argv = ["rustddl", "generate"].iter().chain(args);
        match Args::try_parse_from(argv).unwrap().command {
            Command::Generate(cmd) => cmd,
            other => panic!("Expected Generate command, got {:?}", other),
        }
    }

    #[rstest]
    fn test_generate_defaults() {
        let cmd = generate_args(&["shop.json"]);
        assert_eq!(cmd.input, PathBuf::from("shop.json"));
        assert_eq!(cmd.output, None);
        assert!(!cmd.no_header);
        assert!(!cmd.align);

        let mut options = GeneratorOptions::default();
        cmd.apply(&mut options);
        assert_eq!(options, GeneratorOptions::default());
    }

    #[rstest]
    fn test_flags_override_options() {
        let cmd = generate_args(&[
            "shop.json", "-o", "out", "--schema", "app", "--separator", "GO --", "--no-header", "--align",
        ]);
        assert_eq!(cmd.output, Some(PathBuf::from("out")));

        let mut options = GeneratorOptions::default();
        cmd.apply(&mut options);
        assert_eq!(options.default_schema, "app");
        assert_eq!(options.batch_separator, "GO --");
        assert!(!options.include_header);
        assert!(options.align_columns);
    }

    #[rstest]
    #[case(&["rustddl", "check", "shop.json"])]
    #[case(&["rustddl", "--config", "c.json", "check", "shop.json"])]
    #[case(&["rustddl", "check", "shop.json", "-c", "c.json"])]
    fn test_check_parses(#[case] argv: &[&str]) {
        let args = Args::try_parse_from(argv).unwrap();
        assert!(matches!(args.command, Command::Check { .. }));
    }

    #[rstest]
    fn test_global_config_flag() {
        let args = Args::try_parse_from(["rustddl", "list", "projects", "--config", "c.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        match args.command {
            Command::List { dir } => assert_eq!(dir, PathBuf::from("projects")),
            other => panic!("Expected List command, got {:?}", other),
        }
    }

    #[rstest]
    fn test_missing_input_is_error() {
        assert!(Args::try_parse_from(["rustddl", "generate"]).is_err());
    }
}
