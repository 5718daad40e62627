use clap::Parser;
use rustddl::config::ConfigFile;
use rustddl::generator::ScriptGenerator;
use rustddl::measure::ColumnAlignment;
use rustddl::snapshot::{self, script_file_name};
use rustddl::store::{JsonDirStore, ProjectStore};
use rustddl::Project;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command, GenerateArgs};

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ConfigFile::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_level.as_deref());

    match run(args.command, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so a script written to stdout stays clean.
fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: ConfigFile) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Command::Generate(args) => generate(&args, config),
        Command::Check { input } => check(&input, config),
        Command::List { dir } => list(&dir),
    }
}

fn load_snapshot(path: &Path) -> Result<Project, Box<dyn Error>> {
    let input = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let project = snapshot::from_json(&input)?;
    Ok(project)
}

fn generate(args: &GenerateArgs, config: ConfigFile) -> Result<ExitCode, Box<dyn Error>> {
    let project = load_snapshot(&args.input)?;

    let mut options = config.generator;
    args.apply(&mut options);
    let script = ScriptGenerator::new(options).generate(&project);

    match &args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(script_file_name(&project.name))
            } else {
                path.clone()
            };
            fs::write(&path, &script)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            tracing::info!(path = %path.display(), tables = project.tables.len(), "script written");
        }
        None => print!("{}", script),
    }

    Ok(ExitCode::SUCCESS)
}

fn check(input: &Path, config: ConfigFile) -> Result<ExitCode, Box<dyn Error>> {
    let project = load_snapshot(input)?;
    let generator = ScriptGenerator::new(config.generator);
    let project = generator.resolve_schemas(&project);
    let dangling = generator.lookup(&project).dangling(&project);

    if dangling.is_empty() {
        println!("{}: {} tables, no unresolved foreign keys", project.name, project.tables.len());
        return Ok(ExitCode::SUCCESS);
    }

    for d in &dangling {
        println!(
            "{}.{}: foreign key {} references unknown table {}.{}",
            d.table.schema,
            d.table.name,
            d.foreign_key.name.as_deref().unwrap_or("(unnamed)"),
            d.foreign_key.ref_schema,
            d.foreign_key.ref_table
        );
    }
    Ok(ExitCode::FAILURE)
}

fn list(dir: &Path) -> Result<ExitCode, Box<dyn Error>> {
    let store = JsonDirStore::new(dir);
    let projects = store.list()?;

    if projects.is_empty() {
        println!("No projects in {}", dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    let ids = ColumnAlignment::for_names(projects.iter().map(|p| p.id.as_str()).chain(["ID"]));
    let names = ColumnAlignment::for_names(projects.iter().map(|p| p.name.as_str()).chain(["NAME"]));

    println!("{}  {}  TABLES", ids.pad("ID"), names.pad("NAME"));
    for p in &projects {
        println!("{}  {}  {}", ids.pad(&p.id), names.pad(&p.name), p.tables_count);
    }
    Ok(ExitCode::SUCCESS)
}
