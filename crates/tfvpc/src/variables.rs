//! Input variables of the vpc module
//!
//! Every field has a default, so a configuration only has to name what differs. Settings that exist once
//! per subnet class (public, private, ...) live in [SubnetClassVariables].
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type Tags = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VpcModuleVariables {
    /// Controls if the VPC and everything inside of it should be created
    pub create_vpc: bool,
    /// Used as identifier on all resources
    pub name: String,
    /// The IPv4 CIDR block for the VPC. The default is valid syntax but not accepted by AWS
    pub cidr: String,
    pub secondary_cidr_blocks: Vec<String>,
    pub instance_tenancy: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub enable_classiclink: Option<bool>,
    pub enable_classiclink_dns_support: Option<bool>,
    /// Request an Amazon-provided IPv6 CIDR block for the VPC
    pub enable_ipv6: bool,
    /// IPv6 equivalent of `map_public_ip_on_launch`, a subnet class can override it
    pub assign_ipv6_address_on_creation: bool,
    pub map_public_ip_on_launch: bool,
    /// Availability zone names (`eu-west-1a`) or ids (`euw1-az1`)
    pub azs: Vec<String>,
    /// Added to every resource
    pub tags: Tags,
    pub vpc_tags: Tags,

    pub public: SubnetClassVariables,
    pub private: SubnetClassVariables,
    pub outpost: SubnetClassVariables,
    pub database: SubnetClassVariables,
    pub redshift: SubnetClassVariables,
    pub elasticache: SubnetClassVariables,
    pub intra: SubnetClassVariables,

    pub outpost_arn: Option<String>,
    pub outpost_az: Option<String>,

    pub manage_default_security_group: bool,
    pub default_security_group_name: Option<String>,
    pub default_security_group_ingress: Vec<SecurityGroupRule>,
    pub default_security_group_egress: Vec<SecurityGroupRule>,
    pub default_security_group_tags: Tags,

    pub enable_dhcp_options: bool,
    pub dhcp_options_domain_name: Option<String>,
    pub dhcp_options_domain_name_servers: Vec<String>,
    pub dhcp_options_ntp_servers: Vec<String>,
    pub dhcp_options_netbios_name_servers: Vec<String>,
    pub dhcp_options_netbios_node_type: Option<String>,
    pub dhcp_options_tags: Tags,

    pub create_igw: bool,
    pub create_egress_only_igw: bool,
    pub igw_tags: Tags,

    pub enable_nat_gateway: bool,
    pub single_nat_gateway: bool,
    pub one_nat_gateway_per_az: bool,
    /// Use `external_nat_ip_ids` instead of allocating elastic IPs
    pub reuse_nat_ips: bool,
    pub external_nat_ip_ids: Vec<String>,
    pub nat_gateway_destination_cidr_block: String,
    pub nat_gateway_tags: Tags,
    pub nat_eip_tags: Tags,

    pub manage_default_route_table: bool,
    pub default_route_table_name: Option<String>,
    pub default_route_table_propagating_vgws: Vec<String>,
    pub default_route_table_routes: Vec<DefaultRoute>,
    pub default_route_table_tags: Tags,

    pub manage_default_network_acl: bool,
    pub default_network_acl_name: Option<String>,
    pub default_network_acl_ingress: Vec<NetworkAclRule>,
    pub default_network_acl_egress: Vec<NetworkAclRule>,
    pub default_network_acl_tags: Tags,

    pub create_database_internet_gateway_route: bool,
    pub create_database_nat_gateway_route: bool,
}

impl Default for VpcModuleVariables {
    fn default() -> Self {
        Self {
            create_vpc: true,
            name: String::new(),
            cidr: "0.0.0.0/0".to_string(),
            secondary_cidr_blocks: vec![],
            instance_tenancy: "default".to_string(),
            enable_dns_hostnames: false,
            enable_dns_support: true,
            enable_classiclink: None,
            enable_classiclink_dns_support: None,
            enable_ipv6: false,
            assign_ipv6_address_on_creation: false,
            map_public_ip_on_launch: true,
            azs: vec![],
            tags: Tags::new(),
            vpc_tags: Tags::new(),
            public: Default::default(),
            private: Default::default(),
            outpost: Default::default(),
            database: Default::default(),
            redshift: Default::default(),
            elasticache: Default::default(),
            intra: Default::default(),
            outpost_arn: None,
            outpost_az: None,
            manage_default_security_group: false,
            default_security_group_name: None,
            default_security_group_ingress: vec![],
            default_security_group_egress: vec![],
            default_security_group_tags: Tags::new(),
            enable_dhcp_options: false,
            dhcp_options_domain_name: None,
            dhcp_options_domain_name_servers: vec!["AmazonProvidedDNS".to_string()],
            dhcp_options_ntp_servers: vec![],
            dhcp_options_netbios_name_servers: vec![],
            dhcp_options_netbios_node_type: None,
            dhcp_options_tags: Tags::new(),
            create_igw: true,
            create_egress_only_igw: true,
            igw_tags: Tags::new(),
            enable_nat_gateway: false,
            single_nat_gateway: false,
            one_nat_gateway_per_az: false,
            reuse_nat_ips: false,
            external_nat_ip_ids: vec![],
            nat_gateway_destination_cidr_block: "0.0.0.0/0".to_string(),
            nat_gateway_tags: Tags::new(),
            nat_eip_tags: Tags::new(),
            manage_default_route_table: false,
            default_route_table_name: None,
            default_route_table_propagating_vgws: vec![],
            default_route_table_routes: vec![],
            default_route_table_tags: Tags::new(),
            manage_default_network_acl: false,
            default_network_acl_name: None,
            default_network_acl_ingress: vec![
                NetworkAclRule::allow_all(100),
                NetworkAclRule::allow_all_ipv6(101),
            ],
            default_network_acl_egress: vec![
                NetworkAclRule::allow_all(100),
                NetworkAclRule::allow_all_ipv6(101),
            ],
            default_network_acl_tags: Tags::new(),
            create_database_internet_gateway_route: false,
            create_database_nat_gateway_route: false,
        }
    }
}

impl VpcModuleVariables {
    pub fn class(&self, class: SubnetClass) -> &SubnetClassVariables {
        match class {
            SubnetClass::Public => &self.public,
            SubnetClass::Private => &self.private,
            SubnetClass::Outpost => &self.outpost,
            SubnetClass::Database => &self.database,
            SubnetClass::Redshift => &self.redshift,
            SubnetClass::Elasticache => &self.elasticache,
            SubnetClass::Intra => &self.intra,
        }
    }

    /// Name suffix of a subnet class, configured or default
    pub fn suffix(&self, class: SubnetClass) -> &str {
        self.class(class)
            .suffix
            .as_deref()
            .unwrap_or(class.default_suffix())
    }

    /// Largest subnet count among the classes that are routed through NAT gateways
    pub fn max_subnet_length(&self) -> usize {
        [
            &self.private,
            &self.elasticache,
            &self.database,
            &self.redshift,
        ]
        .iter()
        .map(|class| class.subnets.len())
        .max()
        .unwrap_or_default()
    }

    /// One NAT gateway in total, one per AZ, or one per subnet
    pub fn nat_gateway_count(&self) -> usize {
        if self.single_nat_gateway {
            1
        } else if self.one_nat_gateway_per_az {
            self.azs.len()
        } else {
            self.max_subnet_length()
        }
    }

    /// Checks combinations the provisioning engine would reject later on
    pub fn validate(&self) -> Result<(), VariablesError> {
        for class in SubnetClass::ALL {
            if class == SubnetClass::Outpost {
                continue;
            }
            if !self.class(class).subnets.is_empty() && self.azs.is_empty() {
                return Err(VariablesError::NoAvailabilityZones(class));
            }
        }

        if !self.outpost.subnets.is_empty() && self.outpost_az.is_none() {
            return Err(VariablesError::MissingOutpostAz);
        }

        if self.enable_nat_gateway && self.public.subnets.is_empty() {
            return Err(VariablesError::NatGatewayWithoutPublicSubnets);
        }

        if self.enable_nat_gateway && self.reuse_nat_ips {
            let needed = self.nat_gateway_count();
            let got = self.external_nat_ip_ids.len();
            if got < needed {
                return Err(VariablesError::NotEnoughExternalNatIps { needed, got });
            }
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum VariablesError {
    #[error("{0} subnets require at least one availability zone in `azs`")]
    NoAvailabilityZones(SubnetClass),
    #[error("outpost subnets require `outpost_az`")]
    MissingOutpostAz,
    #[error("NAT gateways require at least one public subnet")]
    NatGatewayWithoutPublicSubnets,
    #[error("`reuse_nat_ips` needs {needed} `external_nat_ip_ids`, got {got}")]
    NotEnoughExternalNatIps { needed: usize, got: usize },
}

/// The kinds of subnets a VPC is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetClass {
    Public,
    Private,
    Outpost,
    Database,
    Redshift,
    Elasticache,
    /// private subnets without NAT gateway routing
    Intra,
}

impl SubnetClass {
    pub const ALL: [SubnetClass; 7] = [
        SubnetClass::Public,
        SubnetClass::Private,
        SubnetClass::Outpost,
        SubnetClass::Database,
        SubnetClass::Redshift,
        SubnetClass::Elasticache,
        SubnetClass::Intra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetClass::Public => "public",
            SubnetClass::Private => "private",
            SubnetClass::Outpost => "outpost",
            SubnetClass::Database => "database",
            SubnetClass::Redshift => "redshift",
            SubnetClass::Elasticache => "elasticache",
            SubnetClass::Intra => "intra",
        }
    }

    pub fn default_suffix(&self) -> &'static str {
        match self {
            SubnetClass::Database => "db",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for SubnetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that exist once per [SubnetClass]
///
/// `create_route_table` and the `subnet_group` settings are only read for database, redshift and
/// elasticache subnets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubnetClassVariables {
    /// IPv4 CIDR blocks, one subnet each
    pub subnets: Vec<String>,
    pub suffix: Option<String>,
    pub assign_ipv6_address_on_creation: Option<bool>,
    /// Used as `netnum` of `cidrsubnet(vpc_ipv6_cidr, 8, netnum)`, one per subnet
    pub ipv6_prefixes: Vec<u8>,
    pub subnet_tags: Tags,
    pub route_table_tags: Tags,
    pub dedicated_network_acl: bool,
    pub inbound_acl_rules: Vec<NetworkAclRule>,
    pub outbound_acl_rules: Vec<NetworkAclRule>,
    pub acl_tags: Tags,
    pub create_route_table: bool,
    pub create_subnet_group: bool,
    pub subnet_group_name: Option<String>,
    pub subnet_group_tags: Tags,
}

impl Default for SubnetClassVariables {
    fn default() -> Self {
        Self {
            subnets: vec![],
            suffix: None,
            assign_ipv6_address_on_creation: None,
            ipv6_prefixes: vec![],
            subnet_tags: Tags::new(),
            route_table_tags: Tags::new(),
            dedicated_network_acl: false,
            inbound_acl_rules: vec![NetworkAclRule::allow_all(100)],
            outbound_acl_rules: vec![NetworkAclRule::allow_all(100)],
            acl_tags: Tags::new(),
            create_route_table: false,
            create_subnet_group: true,
            subnet_group_name: None,
            subnet_group_tags: Tags::new(),
        }
    }
}

/// Network ACL entry, used for dedicated ACL rules and the default ACL
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkAclRule {
    #[serde(alias = "rule_no")]
    pub rule_number: i64,
    #[serde(alias = "action")]
    pub rule_action: String,
    #[serde(default)]
    pub from_port: i64,
    #[serde(default)]
    pub to_port: i64,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_cidr_block: Option<String>,
}

impl NetworkAclRule {
    pub fn allow_all(rule_number: i64) -> Self {
        Self {
            rule_number,
            rule_action: "allow".to_string(),
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            icmp_code: None,
            icmp_type: None,
            cidr_block: Some("0.0.0.0/0".to_string()),
            ipv6_cidr_block: None,
        }
    }

    pub fn allow_all_ipv6(rule_number: i64) -> Self {
        Self {
            cidr_block: None,
            ipv6_cidr_block: Some("::/0".to_string()),
            ..Self::allow_all(rule_number)
        }
    }
}

/// Ingress or egress rule of the default security group
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityGroupRule {
    pub from_port: i64,
    pub to_port: i64,
    pub protocol: String,
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
    #[serde(default)]
    pub ipv6_cidr_blocks: Vec<String>,
    #[serde(default)]
    pub prefix_list_ids: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Route of the default route table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultRoute {
    pub cidr_block: Option<String>,
    pub ipv6_cidr_block: Option<String>,
    pub destination_prefix_list_id: Option<String>,
    pub egress_only_gateway_id: Option<String>,
    pub gateway_id: Option<String>,
    pub instance_id: Option<String>,
    pub nat_gateway_id: Option<String>,
    pub network_interface_id: Option<String>,
    pub transit_gateway_id: Option<String>,
    pub vpc_endpoint_id: Option<String>,
    pub vpc_peering_connection_id: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars() -> VpcModuleVariables {
        VpcModuleVariables {
            name: "test".into(),
            azs: vec!["eu-west-1a".into(), "eu-west-1b".into(), "eu-west-1c".into()],
            ..Default::default()
        }
    }

    fn subnets(cidrs: &[&str]) -> SubnetClassVariables {
        SubnetClassVariables {
            subnets: cidrs.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn nat_gateway_count() {
        let mut vars = VpcModuleVariables {
            private: subnets(&["10.0.1.0/24", "10.0.2.0/24"]),
            database: subnets(&["10.0.21.0/24", "10.0.22.0/24", "10.0.23.0/24", "10.0.24.0/24"]),
            ..vars()
        };
        assert_eq!(vars.max_subnet_length(), 4);
        assert_eq!(vars.nat_gateway_count(), 4);

        vars.one_nat_gateway_per_az = true;
        assert_eq!(vars.nat_gateway_count(), 3);

        vars.single_nat_gateway = true;
        assert_eq!(vars.nat_gateway_count(), 1);
    }

    #[test]
    fn suffix_defaults() {
        let mut vars = vars();
        assert_eq!(vars.suffix(SubnetClass::Database), "db");
        assert_eq!(vars.suffix(SubnetClass::Intra), "intra");

        vars.public.suffix = Some("pub".into());
        assert_eq!(vars.suffix(SubnetClass::Public), "pub");
    }

    #[test]
    fn subnets_need_azs() {
        let vars = VpcModuleVariables {
            azs: vec![],
            redshift: subnets(&["10.0.41.0/24"]),
            ..vars()
        };
        assert_eq!(
            vars.validate(),
            Err(VariablesError::NoAvailabilityZones(SubnetClass::Redshift))
        );
    }

    #[test]
    fn outpost_needs_az() {
        let mut vars = VpcModuleVariables {
            outpost: subnets(&["10.0.50.0/24"]),
            ..vars()
        };
        assert_eq!(vars.validate(), Err(VariablesError::MissingOutpostAz));

        vars.outpost_az = Some("eu-west-1a".into());
        assert_eq!(vars.validate(), Ok(()));
    }

    #[test]
    fn nat_needs_public_subnets_and_ips() {
        let mut vars = VpcModuleVariables {
            enable_nat_gateway: true,
            private: subnets(&["10.0.1.0/24", "10.0.2.0/24"]),
            ..vars()
        };
        assert_eq!(
            vars.validate(),
            Err(VariablesError::NatGatewayWithoutPublicSubnets)
        );

        vars.public = subnets(&["10.0.101.0/24"]);
        vars.reuse_nat_ips = true;
        vars.external_nat_ip_ids = vec!["eipalloc-1".into()];
        assert_eq!(
            vars.validate(),
            Err(VariablesError::NotEnoughExternalNatIps { needed: 2, got: 1 })
        );

        vars.single_nat_gateway = true;
        assert_eq!(vars.validate(), Ok(()));
    }

    #[test]
    fn deserialize_with_defaults() {
        let vars: VpcModuleVariables = serde_json::from_value(serde_json::json!({
            "name": "json",
            "public": { "subnets": ["10.0.101.0/24"], "dedicated_network_acl": true },
            "default_network_acl_ingress": [
                { "rule_no": 100, "action": "deny", "protocol": "tcp", "from_port": 22, "to_port": 22, "cidr_block": "0.0.0.0/0" }
            ]
        }))
        .unwrap();

        assert!(vars.create_vpc);
        assert_eq!(vars.public.subnets, vec!["10.0.101.0/24".to_string()]);
        assert_eq!(vars.public.inbound_acl_rules, vec![NetworkAclRule::allow_all(100)]);
        assert_eq!(vars.default_network_acl_ingress[0].rule_action, "deny");
        assert_eq!(vars.default_network_acl_egress.len(), 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<VpcModuleVariables, _> =
            serde_json::from_value(serde_json::json!({ "nmae": "typo" }));
        assert!(result.is_err());
    }
}
