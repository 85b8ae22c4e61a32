//! Prints the CustomResourceDefinitions served for this controller as a
//! multi-document YAML stream.
//!
//! `cargo run -p crds --bin crdgen > config/crds.yaml`

use crds::{ClusterDeployment, MachinePool, MachinePoolNameLease};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let crds = [
        ClusterDeployment::crd(),
        MachinePool::crd(),
        MachinePoolNameLease::crd(),
    ];

    for crd in &crds {
        println!("---");
        print!("{}", serde_yaml::to_string(crd)?);
    }

    Ok(())
}
