//! Tests for the SSH template, its short-circuit, and its escaping rules.

use camino::Utf8PathBuf;
use rstest::rstest;

use super::fixtures::{build_local, registry_of, router_remote};
use crate::registry::{MachineRecord, Role};

#[rstest]
#[case("localhost")]
#[case("127.0.0.1")]
#[case("::1")]
fn local_build_machine_returns_the_inner_command_verbatim(
    build_local: MachineRecord,
    #[case] host: &str,
) {
    let machine = MachineRecord {
        host: host.to_owned(),
        ..build_local
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .ssh_command("build", "make iso", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "make iso");
}

#[rstest]
fn local_build_machine_on_a_custom_port_does_not_short_circuit(build_local: MachineRecord) {
    let machine = MachineRecord {
        port: 2200,
        ..build_local
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .ssh_command("build", "make iso", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2200 edge@localhost \"make iso\"");
}

#[rstest]
fn local_router_does_not_short_circuit(router_remote: MachineRecord) {
    let machine = MachineRecord {
        host: String::from("localhost"),
        port: 22,
        ..router_remote
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .ssh_command("router1", "reboot", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 22 edge@localhost reboot");
}

#[rstest]
fn remote_command_is_wrapped_in_the_ssh_template(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "show version", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2222 edge@192.0.2.10 \"show version\"");
}

#[rstest]
fn dollars_are_escaped_against_premature_expansion(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "echo $HOME", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2222 edge@192.0.2.10 \"echo \\$HOME\"");
}

#[rstest]
fn quoting_can_be_disabled(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "show version", "", false)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2222 edge@192.0.2.10 show version");
}

#[rstest]
fn single_word_commands_are_not_quoted(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "reboot", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2222 edge@192.0.2.10 reboot");
}

#[rstest]
fn extra_flags_are_placed_before_the_port(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "reboot", "-t", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -t -p 2222 edge@192.0.2.10 reboot");
}

#[rstest]
fn identity_file_appends_an_i_flag(router_remote: MachineRecord) {
    let machine = MachineRecord {
        identity_file: Some(Utf8PathBuf::from("/home/dev/.ssh/router_key")),
        ..router_remote
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .ssh_command("router1", "reboot", "", true)
        .expect("machine should resolve");
    assert_eq!(
        rendered,
        "ssh -i /home/dev/.ssh/router_key -p 2222 edge@192.0.2.10 reboot"
    );
}

#[rstest]
fn empty_command_renders_a_bare_connect_string(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .ssh_command("router1", "", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 2222 edge@192.0.2.10");
}

#[rstest]
fn rendering_is_a_pure_function_of_the_record(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let once = registry
        .ssh_command("router1", "show version", "-t", true)
        .expect("machine should resolve");
    let twice = registry
        .ssh_command("router1", "show version", "-t", true)
        .expect("machine should resolve");
    assert_eq!(once, twice);
}

#[rstest]
fn free_form_roles_never_short_circuit(build_local: MachineRecord) {
    let machine = MachineRecord {
        role: Role::Other(String::from("bastion")),
        ..build_local
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .ssh_command("build", "uptime", "", true)
        .expect("machine should resolve");
    assert_eq!(rendered, "ssh -p 22 edge@localhost uptime");
}
