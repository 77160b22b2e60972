//! Machine registry: logical names resolved to connection records and
//! rendered command lines.
//!
//! The registry is built once at process entry from the merged
//! configuration and passed by reference through every workflow; it is
//! immutable afterwards. All rendering goes through the templates in
//! [`template`], so identical inputs always yield byte-identical command
//! strings.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::GlobalSettings;

mod record;
mod template;

pub use record::{MachineRecord, Role};
pub use template::{BUILD_IMAGE, escape_dollars, quote_if_spaced, short_circuits};

/// Errors surfaced while building or querying the registry.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// Raised when a logical machine name is absent from the merged
    /// configuration. Fatal to the requested workflow; never retried.
    #[error("machine \"{name}\" is not configured")]
    UnknownMachine {
        /// Name that failed to resolve.
        name: String,
    },
    /// Raised at construction when two machines both claim default status
    /// for the same role.
    #[error("only one machine can be set as default \"{role}\" (claimed by \"{first}\" and \"{second}\")")]
    DuplicateRoleDefault {
        /// Role with more than one default.
        role: String,
        /// Machine that claimed the role first.
        first: String,
        /// Machine that claimed it again.
        second: String,
    },
}

/// Immutable map of logical machine names to connection records.
#[derive(Clone, Debug)]
pub struct MachineRegistry {
    global: GlobalSettings,
    machines: BTreeMap<String, MachineRecord>,
    defaults: BTreeMap<String, String>,
}

impl MachineRegistry {
    /// Builds a registry from merged records, validating role defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRoleDefault`] when two records are
    /// both marked default for the same role.
    pub fn new(
        global: GlobalSettings,
        records: Vec<MachineRecord>,
    ) -> Result<Self, RegistryError> {
        let mut defaults: BTreeMap<String, String> = BTreeMap::new();
        for machine in &records {
            if !machine.is_default {
                continue;
            }
            let role = machine.role.as_str().to_owned();
            if let Some(first) = defaults.get(&role) {
                return Err(RegistryError::DuplicateRoleDefault {
                    role,
                    first: first.clone(),
                    second: machine.name.clone(),
                });
            }
            defaults.insert(role, machine.name.clone());
        }

        let machines = records
            .into_iter()
            .map(|machine| (machine.name.clone(), machine))
            .collect();
        Ok(Self {
            global,
            machines,
            defaults,
        })
    }

    /// Returns the merged global settings.
    #[must_use]
    pub const fn global(&self) -> &GlobalSettings {
        &self.global
    }

    /// True when `name` is present in the merged configuration.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.machines.contains_key(name)
    }

    /// Resolves a logical machine name to its record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMachine`] when the name is absent;
    /// a partial record is never returned.
    pub fn resolve(&self, name: &str) -> Result<&MachineRecord, RegistryError> {
        self.machines
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMachine {
                name: name.to_owned(),
            })
    }

    /// Returns the machine marked default for `role`, if one is configured.
    #[must_use]
    pub fn default_for(&self, role: &Role) -> Option<&str> {
        self.defaults.get(role.as_str()).map(String::as_str)
    }

    /// Iterates over all records in name order.
    #[must_use]
    pub fn machines(&self) -> impl Iterator<Item = &MachineRecord> {
        self.machines.values()
    }

    /// Renders the SSH invocation for `command` on the named machine.
    ///
    /// See [`template::render_ssh`] for the template and its short-circuit
    /// and escaping rules.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMachine`] when the name is absent.
    pub fn ssh_command(
        &self,
        name: &str,
        command: &str,
        extra: &str,
        quote: bool,
    ) -> Result<String, RegistryError> {
        Ok(template::render_ssh(
            self.resolve(name)?,
            command,
            extra,
            quote,
        ))
    }

    /// Renders the scp invocation copying `src` to `dst` on the named
    /// machine.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMachine`] when the name is absent.
    pub fn scp_command(&self, name: &str, src: &str, dst: &str) -> Result<String, RegistryError> {
        Ok(template::render_scp(self.resolve(name)?, src, dst))
    }

    /// Renders the rsync invocation mirroring `src` onto `dst` on the named
    /// machine.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMachine`] when the name is absent.
    pub fn rsync_command(&self, name: &str, src: &str, dst: &str) -> Result<String, RegistryError> {
        Ok(template::render_rsync(self.resolve(name)?, src, dst))
    }

    /// Renders the privileged build-container invocation for `command`
    /// under `relative_workdir` of the machine's repository.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMachine`] when the name is absent.
    pub fn docker_command(
        &self,
        name: &str,
        relative_workdir: &str,
        command: &str,
    ) -> Result<String, RegistryError> {
        Ok(template::render_docker(
            self.resolve(name)?,
            relative_workdir,
            command,
        ))
    }
}

#[cfg(test)]
mod tests;
