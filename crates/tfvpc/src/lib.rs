//! # tfvpc - AWS VPC topologies for terraform
//!
//! Describe a VPC in a few lines of HCL, get a complete terraform configuration back.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tfvpc` works internally.
//!
//! ### Loading configuration
//!
//! Configuration files (`*.vpc.hcl`) only contain root attributes, one per module variable:
//!
//! ```hcl
//! name = "main"
//! cidr = "10.0.0.0/16"
//! azs  = ["${region}a", "${region}b"]
//!
//! enable_nat_gateway = true
//! single_nat_gateway = true
//!
//! public  = { subnets = ["10.0.101.0/24", "10.0.102.0/24"] }
//! private = { subnets = ["10.0.1.0/24", "10.0.2.0/24"] }
//! ```
//!
//! [config::ConfigDocuments] keeps the attributes of every loaded document together with its source path. Documents
//! cascade: an attribute in a later document replaces the one of an earlier document.
//!
//! ### Resolving variables
//!
//! see [config::ConfigDocuments::resolve]
//!
//! Each attribute expression is evaluated with [hcl::eval] (only `region` is known to the evaluation context), the
//! documents are merged with [util::merge] and the result is deserialized into [variables::VpcModuleVariables].
//! Unknown attributes are rejected so typos do not silently fall back to defaults.
//!
//! ### Declaring resources
//!
//! see [vpc::VpcModule::new]
//!
//! The module turns variables into [stack::Resource]s which are collected in a [stack::Stack]. Resources point at
//! each other via [stack::ResourceRef] which renders as terraform interpolation, e.g. `${aws_vpc.main.id}`.
//!
//! | variables                                    | resources                                       |
//! |----------------------------------------------|-------------------------------------------------|
//! | `public.subnets = ["10.0.101.0/24"]`         | subnet, route table, internet gateway + route   |
//! | `private.subnets = [...]`                    | subnets, one route table per NAT gateway        |
//! | `enable_nat_gateway = true`                  | elastic IPs, NAT gateways, private NAT routes   |
//! | `public.dedicated_network_acl = true`        | network ACL + one rule per inbound/outbound rule|
//!
//! ### Output
//!
//! A [stack::Stack] renders either as terraform JSON (`cdk.tf.json`) or as native syntax (`main.tf`), see
//! [stack::Stack::to_json_value] and [stack::Stack::to_hcl_body]. Attribute values are [value::Value]s.
//!
pub mod config;
pub mod stack;
pub mod util;
pub mod value;
pub mod variables;
pub mod vpc;
