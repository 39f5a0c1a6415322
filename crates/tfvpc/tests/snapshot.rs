//! Snapshot tests
//!
//! Synthesizes the configurations in /tests/fixtures/ and compares the
//! declared resources and outputs.

use std::path::{Path, PathBuf};
use tfvpc::config::{context, ConfigDocuments};
use tfvpc::stack::{AwsProvider, Stack};
use tfvpc::vpc::VpcModule;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn synth(documents: &ConfigDocuments) -> Stack {
    let vars = documents
        .resolve(&context("eu-west-1"))
        .expect("must resolve");

    let mut stack = Stack::new("VpcModule", AwsProvider::new("eu-west-1".to_string()));
    VpcModule::new(&mut stack, "main", &vars).expect("module must build");
    stack
}

fn complete() -> Stack {
    let mut documents = ConfigDocuments::default();
    documents
        .load_file(&fixtures().join("complete.vpc.hcl"))
        .expect("fixture must load");
    synth(&documents)
}

#[test]
fn complete_addresses() {
    let addresses = complete().addresses().join("\n");
    insta::assert_snapshot!(addresses);
}

#[test]
fn complete_outputs() {
    let outputs = complete()
        .outputs()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(outputs);
}

#[test]
fn complete_json() {
    let json = serde_json::to_value(complete()).expect("must serialize");

    let resource = &json["resource"];
    assert_eq!(
        resource["aws_nat_gateway"]["main-nat-gateway-0"]["depends_on"],
        serde_json::json!(["aws_internet_gateway.main-igw"])
    );
    assert_eq!(
        resource["aws_subnet"]["main-private-subnet-1"]["tags"],
        serde_json::json!({
            "Name": "complete-private-eu-west-1b",
            "Owner": "network",
            "Environment": "staging"
        })
    );
    assert_eq!(
        resource["aws_route_table_association"]["main-database-route-table-association-1"]
            ["route_table_id"],
        serde_json::json!("${aws_route_table.main-database-route-table.id}")
    );
    assert_eq!(
        json["provider"]["aws"],
        serde_json::json!([{ "region": "eu-west-1" }])
    );
}

#[test]
fn complete_hcl() {
    let rendered = complete().to_hcl_string().expect("must render");

    assert!(rendered.contains("resource \"aws_vpc\" \"main\""));
    assert!(rendered.contains("resource \"aws_default_network_acl\" \"main-default-network-acl\""));
    assert!(rendered.contains("output \"main_vpc_id\""));
}

#[test]
fn directory_cascades() {
    let mut documents = ConfigDocuments::default();
    documents
        .load_directory(&fixtures())
        .expect("fixtures must load");
    assert_eq!(documents.source_count(), 2);

    let stack = synth(&documents);
    let json = serde_json::to_value(&stack).expect("must serialize");
    let vpc_tags = &json["resource"]["aws_vpc"]["main"]["tags"];

    assert_eq!(vpc_tags["Name"], "staging-vpc");
    assert_eq!(
        json["resource"]["aws_subnet"]["main-intra-subnet-0"]["tags"]["Name"],
        "staging-intra-eu-west-1a"
    );
}
