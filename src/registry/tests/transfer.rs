//! Tests for the scp and rsync templates.

use rstest::rstest;

use super::fixtures::{build_local, registry_of, router_remote};
use crate::registry::MachineRecord;

#[rstest]
fn scp_to_a_local_build_machine_is_a_plain_copy(build_local: MachineRecord) {
    let registry = registry_of(vec![build_local]);

    let rendered = registry
        .scp_command("build", "./pkg", "/tmp/pkg")
        .expect("machine should resolve");
    assert_eq!(rendered, "scp -r ./pkg /tmp/pkg");
}

#[rstest]
fn scp_to_a_remote_machine_uses_the_resolved_port(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .scp_command("router1", "./pkg", "/tmp/pkg")
        .expect("machine should resolve");
    assert_eq!(rendered, "scp -r -P 2222 ./pkg edge@192.0.2.10:/tmp/pkg");
}

#[rstest]
fn scp_escapes_dollars_in_the_remote_destination(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .scp_command("router1", "./pkg", "$HOME/pkg")
        .expect("machine should resolve");
    assert_eq!(rendered, "scp -r -P 2222 ./pkg edge@192.0.2.10:\\$HOME/pkg");
}

#[rstest]
fn scp_on_a_custom_port_does_not_short_circuit(build_local: MachineRecord) {
    let machine = MachineRecord {
        port: 2200,
        ..build_local
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .scp_command("build", "./pkg", "/tmp/pkg")
        .expect("machine should resolve");
    assert_eq!(rendered, "scp -r -P 2200 ./pkg edge@localhost:/tmp/pkg");
}

#[rstest]
fn rsync_to_a_local_build_machine_mirrors_in_place(build_local: MachineRecord) {
    let registry = registry_of(vec![build_local]);

    let rendered = registry
        .rsync_command("build", ".", "/tmp/tree")
        .expect("machine should resolve");
    assert_eq!(rendered, "rsync -avh --delete . /tmp/tree");
}

#[rstest]
fn rsync_to_a_remote_machine_pipes_the_port_through_ssh(router_remote: MachineRecord) {
    let registry = registry_of(vec![router_remote]);

    let rendered = registry
        .rsync_command("router1", ".", "$HOME/tree")
        .expect("machine should resolve");
    assert_eq!(
        rendered,
        "rsync -avh --delete -e \"ssh -p 2222\" . edge@192.0.2.10:\\$HOME/tree"
    );
}
