//! Binary entry point for the routeforge CLI.
//!
//! The binary is thin glue: it parses arguments, loads the machine
//! registry once, renders command strings through the registry, and hands
//! them to the runner. All failure handling funnels through the runner's
//! reporter or through [`report_error`] below.

use std::io::{self, Write};
use std::os::unix::process::CommandExt;
use std::process;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use shell_escape::unix::escape;
use thiserror::Error;

use routeforge::{
    CommandSpec, ConfigError, ExecError, MachineRegistry, Mode, RegistryError, Reporter, Role,
    Runner,
};

#[derive(Debug, Parser)]
#[command(
    name = "routeforge",
    about = "EdgeRoute developer tool: build, deploy, and reach router machines",
    arg_required_else_help = true
)]
struct Cli {
    /// Path to the configuration file (overrides discovery).
    #[arg(long, env = "ROUTEFORGE_CONFIG", global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open an interactive SSH session to a machine.
    Ssh {
        /// Machine to connect to; defaults to the default router.
        machine: Option<String>,
        #[command(flatten)]
        presentation: Presentation,
    },
    /// Run a command on a machine through the rendered SSH template.
    Exec {
        /// Machine on which the command runs.
        machine: String,
        /// Command to execute (use -- to separate flags).
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
        #[command(flatten)]
        presentation: Presentation,
    },
    /// Copy a local path onto a machine with scp.
    Push {
        /// Destination machine.
        machine: String,
        /// Local source path.
        src: String,
        /// Remote destination path.
        dst: String,
        #[command(flatten)]
        presentation: Presentation,
    },
    /// Mirror a local tree onto a machine with rsync, removing
    /// destination-only files.
    Sync {
        /// Destination machine.
        machine: String,
        /// Local source tree.
        src: String,
        /// Remote destination path.
        dst: String,
        #[command(flatten)]
        presentation: Presentation,
    },
    /// Stream a file from one machine to another through a local pipe.
    Copy {
        /// Machine the file is read from.
        from: String,
        /// Machine the file is written to.
        to: String,
        /// Path of the file on both machines.
        path: String,
        #[command(flatten)]
        presentation: Presentation,
    },
    /// Show the merged configuration.
    Show {
        /// Limit output to one machine.
        machine: Option<String>,
    },
}

/// Dry-run and verbosity flags shared by every workflow subcommand.
#[derive(Args, Clone, Copy, Debug)]
struct Presentation {
    /// Only show what would be done.
    #[arg(long, short = 'd')]
    dry: bool,
    /// Do not echo commands and output to the terminal.
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Presentation {
    const fn mode(self) -> Mode {
        if self.dry { Mode::Dry } else { Mode::Live }
    }

    const fn verbose(self) -> bool {
        !self.quiet
    }

    fn spec(self, text: impl Into<String>) -> CommandSpec {
        CommandSpec::new(text, self.mode(), self.verbose())
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("no default machine configured for role \"{0}\"")]
    NoDefault(String),
    #[error("could not start ssh session: {0}")]
    Session(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };
    process::exit(exit_code);
}

fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let registry = routeforge::load(cli.config.as_deref())?;
    let runner = Runner::new(Reporter::new());

    match cli.command {
        Command::Ssh {
            machine,
            presentation,
        } => ssh_session(&registry, machine.as_deref(), presentation),
        Command::Exec {
            machine,
            command,
            presentation,
        } => {
            let inner = render_command(&command);
            let rendered = registry.ssh_command(&machine, &inner, "", true)?;
            let result = runner.run(&presentation.spec(rendered), true)?;
            Ok(result.exit_code)
        }
        Command::Push {
            machine,
            src,
            dst,
            presentation,
        } => {
            let rendered = registry.scp_command(&machine, &src, &dst)?;
            let result = runner.run(&presentation.spec(rendered), true)?;
            Ok(result.exit_code)
        }
        Command::Sync {
            machine,
            src,
            dst,
            presentation,
        } => {
            let rendered = registry.rsync_command(&machine, &src, &dst)?;
            let result = runner.run(&presentation.spec(rendered), true)?;
            Ok(result.exit_code)
        }
        Command::Copy {
            from,
            to,
            path,
            presentation,
        } => {
            let read = registry.ssh_command(&from, &format!("cat {path}"), "", true)?;
            let write = registry.ssh_command(&to, &format!("cat - > {path}"), "", true)?;
            let result = runner.chain(&presentation.spec(read), &presentation.spec(write), true)?;
            Ok(result.exit_code)
        }
        Command::Show { machine } => show(&registry, machine.as_deref()),
    }
}

/// Replaces the current process with an interactive `ssh` session.
fn ssh_session(
    registry: &MachineRegistry,
    machine: Option<&str>,
    presentation: Presentation,
) -> Result<i32, CliError> {
    let name = match machine {
        Some(name) => name.to_owned(),
        None => registry
            .default_for(&Role::Router)
            .ok_or_else(|| CliError::NoDefault(Role::Router.to_string()))?
            .to_owned(),
    };
    let connect = registry.ssh_command(&name, "", "", true)?;

    if presentation.dry || presentation.verbose() {
        writeln!(io::stdout().lock(), "{connect}").ok();
    }
    if presentation.dry {
        return Ok(0);
    }
    if connect.is_empty() {
        // Local build machine: there is no hop to make.
        writeln!(io::stdout().lock(), "machine \"{name}\" is this host").ok();
        return Ok(0);
    }

    let mut argv = connect.split_whitespace();
    let Some(program) = argv.next() else {
        return Err(CliError::Session(String::from("empty connect command")));
    };
    let err = process::Command::new(program).args(argv).exec();
    Err(CliError::Session(err.to_string()))
}

fn show(registry: &MachineRegistry, machine: Option<&str>) -> Result<i32, CliError> {
    let mut out = io::stdout().lock();
    let global = registry.global();
    writeln!(out, "email: {}", global.email).ok();
    writeln!(out, "working_dir: {}", global.working_dir).ok();
    writeln!(out, "store: {}", global.store).ok();

    match machine {
        Some(name) => {
            let record = registry.resolve(name)?;
            show_record(&mut out, record);
        }
        None => {
            for record in registry.machines() {
                show_record(&mut out, record);
            }
        }
    }
    Ok(0)
}

fn show_record(out: &mut impl Write, record: &routeforge::MachineRecord) {
    let default_marker = if record.is_default { " (default)" } else { "" };
    writeln!(
        out,
        "{}: {} {}@{}:{}{}",
        record.name, record.role, record.user, record.host, record.port, default_marker
    )
    .ok();
}

/// Joins user-supplied command words into one shell command, escaping each
/// word for the remote shell.
fn render_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| escape(arg.as_str().into()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn report_error(err: &CliError) {
    let mut target = io::stderr().lock();
    writeln!(target, "{err}").ok();
}
