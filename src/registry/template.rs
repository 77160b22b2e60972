//! Shell command templates and their escaping rules.
//!
//! The rendered strings are the wire contract toward the system `ssh`,
//! `scp`, `rsync`, and `docker` clients and must match the remote hosts'
//! expectations exactly, so the escaping rules live here as standalone
//! functions rather than ad hoc concatenation at the call sites.

use super::record::{MachineRecord, Role};

/// Container image used for cross-compilation on build machines.
pub const BUILD_IMAGE: &str = "edgeroute/edgeroute-build:current";

/// Escapes literal `$` so the remote shell does not expand it prematurely.
#[must_use]
pub fn escape_dollars(text: &str) -> String {
    text.replace('$', "\\$")
}

/// Wraps `command` in double quotes when it contains whitespace.
#[must_use]
pub fn quote_if_spaced(command: &str) -> String {
    if command.contains(' ') {
        format!("\"{command}\"")
    } else {
        command.to_owned()
    }
}

/// True when commands for `machine` should skip the network hop entirely.
///
/// A build machine listening on the default SSH port of a loopback address
/// is this same host; wrapping the command in `ssh` would only add a round
/// trip through the local SSH daemon. This is what lets one workflow target
/// a local or remote build host transparently.
#[must_use]
pub fn short_circuits(machine: &MachineRecord) -> bool {
    machine.role == Role::Build && machine.is_local()
}

/// Renders `ssh <extra> -p <port> <user>@<host> <command>`.
///
/// Short-circuits to the raw command for a local build machine. Literal `$`
/// in the command is escaped, and the command is double-quoted when it
/// contains whitespace and `quote` is set. An identity file on the record
/// appends `-i <file>` to the extra flags.
#[must_use]
pub fn render_ssh(machine: &MachineRecord, command: &str, extra: &str, quote: bool) -> String {
    if short_circuits(machine) {
        return command.to_owned();
    }

    let mut flags = extra.to_owned();
    if let Some(file) = &machine.identity_file {
        if !flags.is_empty() {
            flags.push(' ');
        }
        flags.push_str("-i ");
        flags.push_str(file.as_str());
    }

    let escaped = escape_dollars(command);
    let inner = if quote {
        quote_if_spaced(&escaped)
    } else {
        escaped
    };

    let mut rendered = String::from("ssh");
    if !flags.is_empty() {
        rendered.push(' ');
        rendered.push_str(&flags);
    }
    rendered.push_str(&format!(
        " -p {} {}@{}",
        machine.port, machine.user, machine.host
    ));
    if !inner.is_empty() {
        rendered.push(' ');
        rendered.push_str(&inner);
    }
    rendered
}

/// Renders `scp -r -P <port> <src> <user>@<host>:<dst>`, or the plain local
/// copy `scp -r <src> <dst>` under the same short-circuit rule as
/// [`render_ssh`].
#[must_use]
pub fn render_scp(machine: &MachineRecord, src: &str, dst: &str) -> String {
    if short_circuits(machine) {
        return format!("scp -r {src} {dst}");
    }
    format!(
        "scp -r -P {} {src} {}@{}:{}",
        machine.port,
        machine.user,
        machine.host,
        escape_dollars(dst)
    )
}

/// Renders `rsync -avh --delete -e "ssh -p <port>" <src> <user>@<host>:<dst>`,
/// or the local mirror `rsync -avh --delete <src> <dst>` under the same
/// short-circuit rule. `--delete` mirrors the source tree, removing files
/// that only exist on the destination.
#[must_use]
pub fn render_rsync(machine: &MachineRecord, src: &str, dst: &str) -> String {
    if short_circuits(machine) {
        return format!("rsync -avh --delete {src} {dst}");
    }
    format!(
        "rsync -avh --delete -e \"ssh -p {}\" {src} {}@{}:{}",
        machine.port,
        machine.user,
        machine.host,
        escape_dollars(dst)
    )
}

/// Renders a privileged bind-mount invocation of the build image, rooted at
/// the machine's repository path and changed into `relative_workdir` before
/// running `command`.
#[must_use]
pub fn render_docker(machine: &MachineRecord, relative_workdir: &str, command: &str) -> String {
    let repo = &machine.repo;
    format!(
        "docker run --rm --privileged -v {repo}:{repo} -w {repo}/{relative_workdir} \
         {BUILD_IMAGE} {command}"
    )
}
