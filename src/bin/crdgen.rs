//! # CRD Generator
//!
//! Prints the `Pipeline` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/pipeline.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use fleet_pipeline_controller::crd::Pipeline;
use kube::core::CustomResourceExt;

fn main() {
    let crd = Pipeline::crd();

    match serde_yaml::to_string(&crd) {
        Ok(yaml) => {
            println!("# This file is auto-generated by crdgen");
            println!("# DO NOT EDIT THIS FILE MANUALLY");
            println!("# Change the types in src/crd/ and regenerate");
            println!("#");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
