//! wpp-drv - The Wot++ driver.
//!
//! The driver is the entry point and orchestrator: it parses the command
//! line, feeds each input file through the evaluator, writes the evaluated
//! document to stdout, and renders any diagnostic with its file, line, and
//! column. With `--repl` it runs an interactive prompt instead, keeping one
//! environment alive across inputs and rolling it back to the pre-input
//! snapshot whenever an input fails.
//!
//! A file's output is buffered and written only after the whole document
//! evaluated successfully; an error discards whatever the document had
//! produced so far.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::debug;

use wpp_eval::{Config as EvalConfig, Evaluator};

/// Command line interface.
#[derive(Parser, Debug)]
#[command(name = "wpp", version, about = "The Wot++ macro language")]
pub struct Cli {
    /// Source files to evaluate, in order.
    pub inputs: Vec<PathBuf>,

    /// Start an interactive prompt.
    #[arg(long)]
    pub repl: bool,

    /// Disable the `run` and `pipe` intrinsics.
    #[arg(long)]
    pub no_exec: bool,

    /// Log pipeline phases to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Driver configuration, derived from the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub repl: bool,
    pub allow_exec: bool,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            inputs: cli.inputs.clone(),
            repl: cli.repl,
            allow_exec: !cli.no_exec,
        }
    }
}

/// One driver invocation.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Evaluate every input in order, then enter the REPL if requested.
    pub fn run(&self) -> anyhow::Result<()> {
        if self.config.inputs.is_empty() && !self.config.repl {
            anyhow::bail!("no input files (try --repl for an interactive prompt)");
        }

        for path in &self.config.inputs {
            self.run_file(path)?;
        }

        if self.config.repl {
            self.run_repl()?;
        }

        Ok(())
    }

    fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            allow_exec: self.config.allow_exec,
        }
    }

    /// Evaluate one file and write its document value to stdout.
    fn run_file(&self, path: &Path) -> anyhow::Result<()> {
        debug!("reading {}", path.display());
        let src = std::fs::read(path)
            .with_context(|| format!("cannot read {}", path.display()))?;

        debug!("evaluating {} ({} bytes)", path.display(), src.len());
        let mut evaluator = Evaluator::new(self.eval_config());
        let name = path.display().to_string();

        match evaluator.eval_source(&name, src) {
            Ok(output) => {
                debug!("{} produced {} bytes", path.display(), output.len());
                let mut stdout = std::io::stdout();
                stdout.write_all(&output)?;
                stdout.flush()?;
                Ok(())
            }
            Err(diag) => anyhow::bail!("{}", diag.render(evaluator.sources())),
        }
    }

    /// The interactive prompt. One environment lives across inputs; on an
    /// error the environment is restored to the pre-input snapshot.
    fn run_repl(&self) -> anyhow::Result<()> {
        let mut evaluator = Evaluator::new(self.eval_config());
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut inputs = 0usize;

        write!(stdout, ">>> ")?;
        stdout.flush()?;

        for line in stdin.lock().lines() {
            let line = line?;

            if !line.trim().is_empty() {
                inputs += 1;
                let snapshot = evaluator.snapshot();
                let name = format!("<repl:{}>", inputs);

                match evaluator.eval_source(&name, line.into_bytes()) {
                    Ok(output) => {
                        stdout.write_all(&output)?;
                        if !output.is_empty() && !output.ends_with(b"\n") {
                            writeln!(stdout)?;
                        }
                    }
                    Err(diag) => {
                        eprintln!("{}", diag.render(evaluator.sources()));
                        evaluator.restore(snapshot);
                    }
                }
            }

            write!(stdout, ">>> ")?;
            stdout.flush()?;
        }

        writeln!(stdout)?;
        Ok(())
    }
}

/// Parse the command line, set up logging, and run a session.
pub fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    Session::new(Config::from(&cli)).run()
}
