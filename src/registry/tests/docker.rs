//! Tests for the privileged build-container template.

use camino::Utf8PathBuf;
use rstest::rstest;

use super::fixtures::{build_local, registry_of};
use crate::registry::MachineRecord;

#[rstest]
fn docker_binds_the_repository_and_changes_into_the_workdir(build_local: MachineRecord) {
    let registry = registry_of(vec![build_local]);

    let rendered = registry
        .docker_command("build", "packages/edge-core", "dpkg-buildpackage -uc -us -tc -b")
        .expect("machine should resolve");
    assert_eq!(
        rendered,
        "docker run --rm --privileged \
         -v $HOME/edgeroute/edgeroute-build:$HOME/edgeroute/edgeroute-build \
         -w $HOME/edgeroute/edgeroute-build/packages/edge-core \
         edgeroute/edgeroute-build:current dpkg-buildpackage -uc -us -tc -b"
    );
}

#[rstest]
fn docker_uses_the_machine_repository_path(build_local: MachineRecord) {
    let machine = MachineRecord {
        repo: Utf8PathBuf::from("/srv/build"),
        ..build_local
    };
    let registry = registry_of(vec![machine]);

    let rendered = registry
        .docker_command("build", "iso", "sudo make iso")
        .expect("machine should resolve");
    assert_eq!(
        rendered,
        "docker run --rm --privileged -v /srv/build:/srv/build -w /srv/build/iso \
         edgeroute/edgeroute-build:current sudo make iso"
    );
}
