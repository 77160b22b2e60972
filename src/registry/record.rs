//! Machine records and roles resolved from the merged configuration.

use std::fmt;

use camino::Utf8PathBuf;

/// Function a machine performs; drives the command templating branches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// Compiles packages and images inside the build container.
    Build,
    /// Runs the packages; the deployment target.
    Router,
    /// Free-form role with no templating branch of its own.
    Other(String),
}

impl Role {
    /// Parses a role label; unrecognised labels become [`Role::Other`].
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "build" => Self::Build,
            "router" => Self::Router,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Role label as written in configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Router => "router",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully parameterised connection for one logical machine.
///
/// Records are built once by the configuration merge and are immutable for
/// the life of the process; every rendering function is a pure function of
/// this data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineRecord {
    /// Unique logical name, the registry key.
    pub name: String,
    /// Hostname or address, stored lowercased.
    pub host: String,
    /// SSH port.
    pub port: u16,
    /// Remote user.
    pub user: String,
    /// Optional SSH identity file, tilde-expanded at load time.
    pub identity_file: Option<Utf8PathBuf>,
    /// Build repository path on the machine, used by the Docker template.
    /// Kept literal (`$HOME/...` included) so the remote shell expands it.
    pub repo: Utf8PathBuf,
    /// Machine role.
    pub role: Role,
    /// Whether this machine is the default for its role.
    pub is_default: bool,
}

impl MachineRecord {
    /// True when the machine is reachable without a network hop.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1") && self.port == 22
    }
}
