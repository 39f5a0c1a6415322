//! AWS VPC module
//!
//! [VpcModule::new] declares a complete VPC topology in a [Stack]: the VPC itself, subnets for every
//! [SubnetClass], route tables and routes, internet and NAT gateways, network ACLs and subnet groups.
//!
//! Which resources exist, and how many, follows from [VpcModuleVariables] alone:
//!
//! | resource                  | count                                                                  |
//! |---------------------------|------------------------------------------------------------------------|
//! | subnets                   | one per CIDR of the class                                              |
//! | private route tables      | one per NAT gateway (when any NAT routed subnets exist)                |
//! | NAT gateways / EIPs       | 1 (`single_nat_gateway`), one per AZ, or one per NAT routed subnet      |
//! | database route tables     | 1 (single NAT or IGW route) or one per database subnet                 |
//! | network ACL rules         | one per configured inbound/outbound rule of a dedicated ACL            |
//!
//! Availability zones are picked with [util::element], so a short `azs` list wraps around a longer subnet
//! list.
mod nat;
mod network_acl;
mod routes;
mod subnets;

use crate::stack::{NestedBlock, Resource, ResourceKind, ResourceRef, Stack, StackError};
use crate::util::{self, coalesce, CoalesceError};
use crate::value::Value;
use crate::variables::{
    DefaultRoute, SecurityGroupRule, SubnetClass, Tags, VariablesError, VpcModuleVariables,
};
use indexmap::IndexMap;

/// Handles to everything the module declared
#[derive(Debug, Clone)]
pub struct VpcModule {
    id: String,
    vpc: Option<ResourceRef>,
    vpc_id: Option<Value>,
    internet_gateway: Option<ResourceRef>,
    egress_only_internet_gateway: Option<ResourceRef>,
    subnets: IndexMap<SubnetClass, Vec<ResourceRef>>,
    route_tables: IndexMap<SubnetClass, Vec<ResourceRef>>,
    network_acls: IndexMap<SubnetClass, ResourceRef>,
    subnet_groups: IndexMap<SubnetClass, ResourceRef>,
    nat_eips: Vec<ResourceRef>,
    nat_gateways: Vec<ResourceRef>,
}

impl VpcModule {
    /// Declare the VPC described by `vars` inside `stack`
    ///
    /// `id` prefixes every resource name, so several modules can share one stack.
    pub fn new(stack: &mut Stack, id: &str, vars: &VpcModuleVariables) -> Result<Self, ModuleError> {
        if !vars.create_vpc {
            tracing::info!(module = id, "create_vpc is disabled, nothing to declare");
            return Ok(Self::empty(id));
        }

        vars.validate()?;

        // a failing module leaves the stack as it was
        let checkpoint = stack.checkpoint();
        let result = Self::declare(stack, id, vars);
        if result.is_err() {
            stack.rollback(checkpoint);
        }
        result
    }

    fn empty(id: &str) -> Self {
        VpcModule {
            id: id.to_string(),
            vpc: None,
            vpc_id: None,
            internet_gateway: None,
            egress_only_internet_gateway: None,
            subnets: Default::default(),
            route_tables: Default::default(),
            network_acls: Default::default(),
            subnet_groups: Default::default(),
            nat_eips: Default::default(),
            nat_gateways: Default::default(),
        }
    }

    fn declare(stack: &mut Stack, id: &str, vars: &VpcModuleVariables) -> Result<Self, ModuleError> {
        let mut builder = Builder::new(stack, vars, Self::empty(id))?;
        builder.default_security_group()?;
        builder.dhcp_options()?;
        builder.internet_gateways()?;
        builder.default_route_table()?;
        builder.route_tables()?;
        builder.subnets()?;
        builder.subnet_groups()?;
        builder.default_network_acl()?;
        builder.network_acls()?;
        builder.nat_gateways()?;
        builder.nat_routes()?;
        builder.route_table_associations()?;
        builder.outputs()?;

        let module = builder.module;
        tracing::info!(module = id, resources = stack.resources().count(), "vpc module declared");
        Ok(module)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vpc(&self) -> Option<&ResourceRef> {
        self.vpc.as_ref()
    }

    /// The VPC id as other resources should reference it
    ///
    /// Points at the first secondary CIDR association when there is one, so dependants wait for it.
    pub fn vpc_id(&self) -> Option<&Value> {
        self.vpc_id.as_ref()
    }

    pub fn internet_gateway(&self) -> Option<&ResourceRef> {
        self.internet_gateway.as_ref()
    }

    pub fn egress_only_internet_gateway(&self) -> Option<&ResourceRef> {
        self.egress_only_internet_gateway.as_ref()
    }

    pub fn subnets(&self, class: SubnetClass) -> &[ResourceRef] {
        self.subnets.get(&class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn route_tables(&self, class: SubnetClass) -> &[ResourceRef] {
        self.route_tables
            .get(&class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn network_acl(&self, class: SubnetClass) -> Option<&ResourceRef> {
        self.network_acls.get(&class)
    }

    pub fn subnet_group(&self, class: SubnetClass) -> Option<&ResourceRef> {
        self.subnet_groups.get(&class)
    }

    pub fn nat_eips(&self) -> &[ResourceRef] {
        &self.nat_eips
    }

    pub fn nat_gateways(&self) -> &[ResourceRef] {
        &self.nat_gateways
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ModuleError {
    #[error(transparent)]
    Variables(#[from] VariablesError),
    #[error("{class} subnet {index} has no matching entry in `ipv6_prefixes`")]
    MissingIpv6Prefix { class: SubnetClass, index: usize },
    #[error("a name is required, set `name` or the resource specific name")]
    MissingName(#[from] CoalesceError),
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Accumulates resources while the module is being declared
struct Builder<'a> {
    stack: &'a mut Stack,
    vars: &'a VpcModuleVariables,
    vpc: ResourceRef,
    vpc_id: Value,
    module: VpcModule,
}

impl<'a> Builder<'a> {
    fn new(
        stack: &'a mut Stack,
        vars: &'a VpcModuleVariables,
        mut module: VpcModule,
    ) -> Result<Self, ModuleError> {
        let vpc = stack.add(
            Resource::new(ResourceKind::Vpc, module.id.clone())
                .attr("cidr_block", &vars.cidr)
                .attr("instance_tenancy", &vars.instance_tenancy)
                .attr("enable_dns_hostnames", vars.enable_dns_hostnames)
                .attr("enable_dns_support", vars.enable_dns_support)
                .attr_opt("enable_classiclink", vars.enable_classiclink)
                .attr_opt(
                    "enable_classiclink_dns_support",
                    vars.enable_classiclink_dns_support,
                )
                .attr("assign_generated_ipv6_cidr_block", vars.enable_ipv6)
                .attr("tags", tags(vars, vars.name.clone(), &vars.vpc_tags)),
        )?;

        let mut vpc_id = vpc.id();
        for (i, cidr_block) in vars.secondary_cidr_blocks.iter().enumerate() {
            let association = stack.add(
                Resource::new(
                    ResourceKind::VpcIpv4CidrBlockAssociation,
                    format!("{}-secondary-cidr-{i}", module.id),
                )
                .attr("vpc_id", vpc.id())
                .attr("cidr_block", cidr_block),
            )?;

            if i == 0 {
                vpc_id = association.attr("vpc_id");
            }
        }

        module.vpc = Some(vpc.clone());
        module.vpc_id = Some(vpc_id.clone());

        Ok(Self {
            stack,
            vars,
            vpc,
            vpc_id,
            module,
        })
    }

    fn add(&mut self, resource: Resource) -> Result<ResourceRef, ModuleError> {
        Ok(self.stack.add(resource)?)
    }

    /// Resource name, unique within the stack
    fn name(&self, role: impl std::fmt::Display) -> String {
        format!("{}-{}", self.module.id, role)
    }

    fn tags(&self, name: String, extra: &Tags) -> Value {
        tags(self.vars, name, extra)
    }

    fn default_security_group(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        if !vars.manage_default_security_group {
            return Ok(());
        }

        let name = coalesce([
            vars.default_security_group_name.clone(),
            Some(vars.name.clone()),
        ])?;

        self.add(
            Resource::new(
                ResourceKind::DefaultSecurityGroup,
                self.name("default-security-group"),
            )
            .attr("vpc_id", self.vpc_id.clone())
            .blocks(
                vars.default_security_group_ingress
                    .iter()
                    .map(|rule| security_group_block("ingress", rule)),
            )
            .blocks(
                vars.default_security_group_egress
                    .iter()
                    .map(|rule| security_group_block("egress", rule)),
            )
            .attr("tags", self.tags(name, &vars.default_security_group_tags)),
        )?;

        Ok(())
    }

    fn dhcp_options(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        if !vars.enable_dhcp_options {
            return Ok(());
        }

        let options = self.add(
            Resource::new(ResourceKind::VpcDhcpOptions, self.name("dhcp-options"))
                .attr_opt("domain_name", vars.dhcp_options_domain_name.as_ref())
                .attr_opt(
                    "domain_name_servers",
                    list(&vars.dhcp_options_domain_name_servers),
                )
                .attr_opt("ntp_servers", list(&vars.dhcp_options_ntp_servers))
                .attr_opt(
                    "netbios_name_servers",
                    list(&vars.dhcp_options_netbios_name_servers),
                )
                .attr_opt(
                    "netbios_node_type",
                    vars.dhcp_options_netbios_node_type.as_ref(),
                )
                .attr("tags", self.tags(vars.name.clone(), &vars.dhcp_options_tags)),
        )?;

        self.add(
            Resource::new(
                ResourceKind::VpcDhcpOptionsAssociation,
                self.name("dhcp-options-association"),
            )
            .attr("vpc_id", self.vpc_id.clone())
            .attr("dhcp_options_id", options.id()),
        )?;

        Ok(())
    }

    fn internet_gateways(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;

        if vars.create_igw && !vars.public.subnets.is_empty() {
            let igw = self.add(
                Resource::new(ResourceKind::InternetGateway, self.name("igw"))
                    .attr("vpc_id", self.vpc_id.clone())
                    .attr("tags", self.tags(vars.name.clone(), &vars.igw_tags)),
            )?;
            self.module.internet_gateway = Some(igw);
        }

        if vars.create_egress_only_igw && vars.enable_ipv6 && vars.max_subnet_length() > 0 {
            let egress_only = self.add(
                Resource::new(
                    ResourceKind::EgressOnlyInternetGateway,
                    self.name("egress-only-igw"),
                )
                .attr("vpc_id", self.vpc_id.clone())
                .attr("tags", self.tags(vars.name.clone(), &vars.igw_tags)),
            )?;
            self.module.egress_only_internet_gateway = Some(egress_only);
        }

        Ok(())
    }

    fn default_route_table(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        if !vars.manage_default_route_table {
            return Ok(());
        }

        let name = coalesce([vars.default_route_table_name.clone(), Some(vars.name.clone())])?;

        self.add(
            Resource::new(
                ResourceKind::DefaultRouteTable,
                self.name("default-route-table"),
            )
            .attr(
                "default_route_table_id",
                self.vpc.attr("default_route_table_id"),
            )
            .attr_opt(
                "propagating_vgws",
                list(&vars.default_route_table_propagating_vgws),
            )
            .blocks(vars.default_route_table_routes.iter().map(default_route_block))
            .block(timeouts(&[("create", "5m"), ("update", "5m")]))
            .attr("tags", self.tags(name, &vars.default_route_table_tags)),
        )?;

        Ok(())
    }

    fn outputs(&mut self) -> Result<(), ModuleError> {
        let prefix = self.module.id.replace('-', "_");
        let output = |name: &str| format!("{prefix}_{name}");

        self.stack.add_output(
            output("vpc_id"),
            self.vpc.id(),
            Some("The ID of the VPC"),
        )?;
        self.stack
            .add_output(output("vpc_arn"), self.vpc.attr("arn"), Some("The ARN of the VPC"))?;
        self.stack.add_output(
            output("vpc_cidr_block"),
            self.vpc.attr("cidr_block"),
            Some("The CIDR block of the VPC"),
        )?;

        if let Some(igw) = &self.module.internet_gateway {
            self.stack
                .add_output(output("igw_id"), igw.id(), Some("The ID of the Internet Gateway"))?;
        }

        for (class, subnets) in &self.module.subnets {
            if subnets.is_empty() {
                continue;
            }
            self.stack.add_output(
                output(&format!("{class}_subnets")),
                ids(subnets),
                Some(format!("List of IDs of {class} subnets").as_str()),
            )?;
        }

        if !self.module.nat_gateways.is_empty() {
            self.stack.add_output(
                output("natgw_ids"),
                ids(&self.module.nat_gateways),
                Some("List of NAT Gateway IDs"),
            )?;
        }

        if !self.module.nat_eips.is_empty() {
            let public_ips: Vec<Value> = self
                .module
                .nat_eips
                .iter()
                .map(|eip| eip.attr("public_ip"))
                .collect();
            self.stack.add_output(
                output("nat_public_ips"),
                public_ips,
                Some("List of public Elastic IPs created for AWS NAT Gateway"),
            )?;
        }

        for (class, group) in &self.module.subnet_groups {
            self.stack.add_output(
                output(&format!("{class}_subnet_group")),
                group.id(),
                Some(format!("ID of the {class} subnet group").as_str()),
            )?;
        }

        Ok(())
    }
}

/// `{Name = name}` merged with the module wide and the resource specific tags
fn tags(vars: &VpcModuleVariables, name: String, extra: &Tags) -> Value {
    let name_tag = Tags::from([("Name".to_string(), name)]);
    util::merge([name_tag, vars.tags.clone(), extra.clone()]).into()
}

fn ids(resources: &[ResourceRef]) -> Value {
    Value::Array(resources.iter().map(ResourceRef::id).collect())
}

/// Lists are left out entirely when empty
fn list(items: &[String]) -> Option<Value> {
    if items.is_empty() {
        return None;
    }

    Some(items.to_vec().into())
}

fn timeouts(entries: &[(&str, &str)]) -> NestedBlock {
    entries
        .iter()
        .fold(NestedBlock::new("timeouts"), |block, (key, value)| {
            block.attr(key, *value)
        })
}

fn security_group_block(ident: &str, rule: &SecurityGroupRule) -> NestedBlock {
    NestedBlock::new(ident)
        .attr("from_port", rule.from_port)
        .attr("to_port", rule.to_port)
        .attr("protocol", &rule.protocol)
        .attr_opt("cidr_blocks", list(&rule.cidr_blocks))
        .attr_opt("ipv6_cidr_blocks", list(&rule.ipv6_cidr_blocks))
        .attr_opt("prefix_list_ids", list(&rule.prefix_list_ids))
        .attr_opt("security_groups", list(&rule.security_groups))
        .attr_opt("self", rule.self_)
        .attr_opt("description", rule.description.as_ref())
}

fn default_route_block(route: &DefaultRoute) -> NestedBlock {
    NestedBlock::new("route")
        .attr_opt("cidr_block", route.cidr_block.as_ref())
        .attr_opt("ipv6_cidr_block", route.ipv6_cidr_block.as_ref())
        .attr_opt(
            "destination_prefix_list_id",
            route.destination_prefix_list_id.as_ref(),
        )
        .attr_opt("egress_only_gateway_id", route.egress_only_gateway_id.as_ref())
        .attr_opt("gateway_id", route.gateway_id.as_ref())
        .attr_opt("instance_id", route.instance_id.as_ref())
        .attr_opt("nat_gateway_id", route.nat_gateway_id.as_ref())
        .attr_opt("network_interface_id", route.network_interface_id.as_ref())
        .attr_opt("transit_gateway_id", route.transit_gateway_id.as_ref())
        .attr_opt("vpc_endpoint_id", route.vpc_endpoint_id.as_ref())
        .attr_opt(
            "vpc_peering_connection_id",
            route.vpc_peering_connection_id.as_ref(),
        )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stack::AwsProvider;
    use crate::variables::{NetworkAclRule, SubnetClassVariables};
    use pretty_assertions::assert_eq;

    pub(super) fn vars() -> VpcModuleVariables {
        VpcModuleVariables {
            name: "test".into(),
            cidr: "10.0.0.0/16".into(),
            azs: vec!["eu-west-1a".into(), "eu-west-1b".into(), "eu-west-1c".into()],
            ..Default::default()
        }
    }

    pub(super) fn subnets(cidrs: &[&str]) -> SubnetClassVariables {
        SubnetClassVariables {
            subnets: cidrs.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub(super) fn synth(vars: &VpcModuleVariables) -> (Stack, VpcModule) {
        let mut stack = Stack::new("test", AwsProvider::new("eu-west-1".to_string()));
        let module = VpcModule::new(&mut stack, "main", vars).expect("module must build");
        (stack, module)
    }

    pub(super) fn count(stack: &Stack, kind: ResourceKind) -> usize {
        stack.resources().filter(|r| r.kind == kind).count()
    }

    pub(super) fn resource<'s>(stack: &'s Stack, address: &str) -> &'s Resource {
        stack
            .get(address)
            .unwrap_or_else(|| panic!("missing {address}, have {:?}", stack.addresses()))
    }

    pub(super) fn tag(resource: &Resource, key: &str) -> String {
        let Some(Value::Object(tags)) = resource.get("tags") else {
            panic!("{} has no tags", resource.name);
        };
        tags[key].as_str().expect("string tag").to_string()
    }

    #[test]
    fn nothing_without_create_vpc() {
        let vars = VpcModuleVariables {
            create_vpc: false,
            public: subnets(&["10.0.101.0/24"]),
            ..vars()
        };
        let (stack, module) = synth(&vars);

        assert_eq!(stack.resources().count(), 0);
        assert_eq!(stack.outputs().count(), 0);
        assert!(module.vpc_id().is_none());
    }

    #[test]
    fn create_vpc_false_skips_validation() {
        let vars = VpcModuleVariables {
            create_vpc: false,
            azs: vec![],
            private: subnets(&["10.0.1.0/24"]),
            ..vars()
        };
        assert!(vars.validate().is_err());

        let (stack, module) = synth(&vars);
        assert_eq!(stack.resources().count(), 0);
        assert!(module.vpc().is_none());
    }

    #[test]
    fn failed_module_leaves_stack_untouched() {
        let mut stack = Stack::new("test", AwsProvider::new("eu-west-1".to_string()));
        VpcModule::new(&mut stack, "blue", &vars()).expect("module must build");
        let addresses = stack.addresses();
        let outputs = stack.outputs().count();

        let vars = VpcModuleVariables {
            enable_ipv6: true,
            private: SubnetClassVariables {
                ipv6_prefixes: vec![3],
                ..subnets(&["10.0.1.0/24", "10.0.2.0/24"])
            },
            ..vars()
        };
        let err = VpcModule::new(&mut stack, "main", &vars).expect_err("prefix 1 is missing");

        assert!(matches!(
            err,
            ModuleError::MissingIpv6Prefix { class: SubnetClass::Private, index: 1 }
        ));
        assert_eq!(stack.addresses(), addresses);
        assert_eq!(stack.outputs().count(), outputs);
        assert!(stack.get("aws_vpc.main").is_none());
    }

    #[test]
    fn vpc_tags_are_merged() {
        let mut vars = vars();
        vars.tags.insert("Env".into(), "dev".into());
        vars.tags.insert("Owner".into(), "team-a".into());
        vars.vpc_tags.insert("Owner".into(), "network".into());
        vars.vpc_tags.insert("Name".into(), "renamed".into());

        let (stack, module) = synth(&vars);
        let vpc = resource(&stack, "aws_vpc.main");

        assert_eq!(vpc.get("cidr_block"), Some(&Value::from("10.0.0.0/16")));
        assert_eq!(tag(vpc, "Env"), "dev");
        assert_eq!(tag(vpc, "Owner"), "network");
        assert_eq!(tag(vpc, "Name"), "renamed");
        assert_eq!(
            module.vpc_id(),
            Some(&Value::Template("${aws_vpc.main.id}".into()))
        );
    }

    #[test]
    fn secondary_cidr_blocks_gate_vpc_id() {
        let vars = VpcModuleVariables {
            secondary_cidr_blocks: vec!["10.1.0.0/16".into(), "10.2.0.0/16".into()],
            private: subnets(&["10.1.1.0/24"]),
            ..vars()
        };
        let (stack, module) = synth(&vars);

        assert_eq!(count(&stack, ResourceKind::VpcIpv4CidrBlockAssociation), 2);
        let expected = Value::Template(
            "${aws_vpc_ipv4_cidr_block_association.main-secondary-cidr-0.vpc_id}".into(),
        );
        assert_eq!(module.vpc_id(), Some(&expected));
        assert_eq!(
            resource(&stack, "aws_subnet.main-private-subnet-0").get("vpc_id"),
            Some(&expected)
        );
    }

    #[test]
    fn minimal_public_private() {
        let vars = VpcModuleVariables {
            public: subnets(&["10.0.101.0/24"]),
            private: subnets(&["10.0.1.0/24", "10.0.2.0/24"]),
            ..vars()
        };
        let (stack, module) = synth(&vars);

        assert_eq!(
            stack.addresses(),
            vec![
                "aws_vpc.main",
                "aws_internet_gateway.main-igw",
                "aws_route_table.main-public-route-table",
                "aws_route.main-public-internet-gateway",
                "aws_route_table.main-private-route-table-0",
                "aws_route_table.main-private-route-table-1",
                "aws_subnet.main-public-subnet-0",
                "aws_subnet.main-private-subnet-0",
                "aws_subnet.main-private-subnet-1",
                "aws_route_table_association.main-public-route-table-association-0",
                "aws_route_table_association.main-private-route-table-association-0",
                "aws_route_table_association.main-private-route-table-association-1",
            ]
        );

        assert_eq!(module.subnets(SubnetClass::Public).len(), 1);
        assert_eq!(module.route_tables(SubnetClass::Private).len(), 2);

        let route = resource(&stack, "aws_route.main-public-internet-gateway");
        assert_eq!(
            route.get("gateway_id"),
            Some(&Value::Template("${aws_internet_gateway.main-igw.id}".into()))
        );
        assert_eq!(route.nested("timeouts").count(), 1);

        assert_eq!(
            tag(resource(&stack, "aws_route_table.main-private-route-table-1"), "Name"),
            "test-private-1"
        );

        let outputs: Vec<_> = stack.outputs().map(|(name, _)| name.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                "main_vpc_id",
                "main_vpc_arn",
                "main_vpc_cidr_block",
                "main_igw_id",
                "main_public_subnets",
                "main_private_subnets",
            ]
        );
    }

    #[test]
    fn default_security_group_needs_a_name() {
        let vars = VpcModuleVariables {
            name: String::new(),
            manage_default_security_group: true,
            ..vars()
        };

        let mut stack = Stack::new("test", AwsProvider::new("eu-west-1".to_string()));
        let err = VpcModule::new(&mut stack, "main", &vars).expect_err("must fail");
        assert!(matches!(err, ModuleError::MissingName(_)));
    }

    #[test]
    fn default_security_group_rules() {
        let vars = VpcModuleVariables {
            manage_default_security_group: true,
            default_security_group_name: Some("locked-down".into()),
            default_security_group_egress: vec![SecurityGroupRule {
                from_port: 0,
                to_port: 0,
                protocol: "-1".into(),
                cidr_blocks: vec!["0.0.0.0/0".into()],
                ipv6_cidr_blocks: vec![],
                prefix_list_ids: vec![],
                security_groups: vec![],
                self_: None,
                description: None,
            }],
            ..vars()
        };
        let (stack, _) = synth(&vars);
        let group = resource(&stack, "aws_default_security_group.main-default-security-group");

        assert_eq!(tag(group, "Name"), "locked-down");
        assert_eq!(group.nested("ingress").count(), 0);
        let egress: Vec<_> = group.nested("egress").collect();
        assert_eq!(egress.len(), 1);
        assert_eq!(
            egress[0].attributes.get("cidr_blocks"),
            Some(&Value::from(vec!["0.0.0.0/0"]))
        );
        assert!(egress[0].attributes.get("ipv6_cidr_blocks").is_none());
    }

    #[test]
    fn dhcp_options_are_associated() {
        let vars = VpcModuleVariables {
            enable_dhcp_options: true,
            dhcp_options_domain_name: Some("service.consul".into()),
            dhcp_options_domain_name_servers: vec!["127.0.0.1".into(), "10.10.0.2".into()],
            ..vars()
        };
        let (stack, _) = synth(&vars);

        let options = resource(&stack, "aws_vpc_dhcp_options.main-dhcp-options");
        assert_eq!(
            options.get("domain_name"),
            Some(&Value::from("service.consul"))
        );
        assert!(options.get("ntp_servers").is_none());

        let association = resource(
            &stack,
            "aws_vpc_dhcp_options_association.main-dhcp-options-association",
        );
        assert_eq!(
            association.get("dhcp_options_id"),
            Some(&Value::Template(
                "${aws_vpc_dhcp_options.main-dhcp-options.id}".into()
            ))
        );
    }

    #[test]
    fn default_route_table_is_managed() {
        let vars = VpcModuleVariables {
            manage_default_route_table: true,
            default_route_table_routes: vec![DefaultRoute {
                cidr_block: Some("10.100.0.0/16".into()),
                vpc_peering_connection_id: Some("pcx-1234".into()),
                ..Default::default()
            }],
            ..vars()
        };
        let (stack, _) = synth(&vars);
        let table = resource(&stack, "aws_default_route_table.main-default-route-table");

        assert_eq!(
            table.get("default_route_table_id"),
            Some(&Value::Template(
                "${aws_vpc.main.default_route_table_id}".into()
            ))
        );
        assert_eq!(table.nested("route").count(), 1);
        let timeouts: Vec<_> = table.nested("timeouts").collect();
        assert_eq!(timeouts[0].attributes.len(), 2);
        assert_eq!(tag(table, "Name"), "test");
    }

    #[test]
    fn multiple_modules_share_a_stack() {
        let mut stack = Stack::new("test", AwsProvider::new("eu-west-1".to_string()));
        VpcModule::new(&mut stack, "blue", &vars()).unwrap();
        VpcModule::new(&mut stack, "green", &vars()).unwrap();

        assert_eq!(count(&stack, ResourceKind::Vpc), 2);

        let err = VpcModule::new(&mut stack, "blue", &vars()).expect_err("must collide");
        assert!(matches!(
            err,
            ModuleError::Stack(StackError::DuplicateResource(_))
        ));
    }

    #[test]
    fn network_acl_rule_defaults_allow_all() {
        assert_eq!(
            SubnetClassVariables::default().inbound_acl_rules,
            vec![NetworkAclRule::allow_all(100)]
        );
    }
}
