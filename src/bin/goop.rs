// This is the goop command line tool. Under `go generate` it receives the triggering file and
// its package through GOFILE and GOPACKAGE and runs in the package directory; flags override
// both and can redirect the output to stdout or print the resolved hierarchy. Logging goes
// through env_logger, with `-v` raising the default level. Any error is printed to stderr and
// the process exits with status 1 without writing a file.

//! goop command line.
//!
//! Meant to run from a `//go:generate go run github.com/tadnir/goop`
//! directive, which provides `GOFILE` and `GOPACKAGE`.

use bumpalo::Bump;
use clap::{ArgAction, Parser};
use goop::emit::write_file;
use goop::{GenerationSession, Generator, GeneratorConfig, GoopError, GoopResult};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "goop")]
#[command(version, about = "Generate dispatch tables and initializers for goop classes")]
struct Cli {
    /// File that triggered generation
    #[arg(long, env = "GOFILE")]
    file: String,

    /// Package the file belongs to
    #[arg(long, env = "GOPACKAGE")]
    package: String,

    /// Package directory (defaults to the current directory)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Print the generated source instead of writing it
    #[arg(long)]
    stdout: bool,

    /// Print the resolved class hierarchy
    #[arg(long)]
    dump: bool,

    /// Also analyze files marked as generated
    #[arg(long)]
    include_generated: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> GoopResult<()> {
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| GoopError::io(".", e))?,
    };
    let config = GeneratorConfig::new(&cli.package, dir, &cli.file).with_skip_generated(!cli.include_generated);

    let arena = Bump::new();
    let session = GenerationSession::new(&arena);
    let generator = Generator::new(&session, config);

    let package = generator.load_package()?;
    let registry = generator.build_registry(&package)?;
    if cli.dump {
        print!("{}", registry);
    }

    let output = generator.generate_for(&package, &registry)?;
    if cli.stdout {
        print!("{}", output.source);
    } else {
        let config = generator.config();
        write_file(&config.dir, &config.output_name(), &output.source)?;
    }

    log::debug!("{}", session.stats());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
