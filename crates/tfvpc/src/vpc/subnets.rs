//! Subnets and the database, redshift and elasticache subnet groups
use super::{ids, Builder, ModuleError};
use crate::stack::{Resource, ResourceKind};
use crate::util::{coalesce, element};
use crate::value::Value;
use crate::variables::{SubnetClass, VariablesError};
use regex::Regex;
use std::sync::LazyLock;

/// `eu-west-1a` is a zone name, `euw1-az1` a zone id
static ZONE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-").expect("static regex"));

pub fn is_zone_name(zone: &str) -> bool {
    ZONE_NAME.is_match(zone)
}

impl Builder<'_> {
    pub(super) fn subnets(&mut self) -> Result<(), ModuleError> {
        for class in SubnetClass::ALL {
            self.subnet_class(class)?;
        }

        Ok(())
    }

    fn subnet_class(&mut self, class: SubnetClass) -> Result<(), ModuleError> {
        let vars = self.vars;
        let class_vars = vars.class(class);

        let mut count = class_vars.subnets.len();
        if class == SubnetClass::Public && vars.one_nat_gateway_per_az && count < vars.azs.len() {
            if count > 0 {
                tracing::warn!(
                    public = count,
                    azs = vars.azs.len(),
                    "one_nat_gateway_per_az needs a public subnet per availability zone, skipping public subnets"
                );
            }
            count = 0;
        }

        let assign_ipv6 = class_vars
            .assign_ipv6_address_on_creation
            .unwrap_or(vars.assign_ipv6_address_on_creation);

        let mut subnets = Vec::with_capacity(count);
        for (i, cidr_block) in class_vars.subnets.iter().take(count).enumerate() {
            let mut subnet = Resource::new(
                ResourceKind::Subnet,
                self.name(format!("{class}-subnet-{i}")),
            )
            .attr("vpc_id", self.vpc_id.clone())
            .attr("cidr_block", cidr_block);

            let zone = if class == SubnetClass::Outpost {
                let zone = vars
                    .outpost_az
                    .clone()
                    .ok_or(VariablesError::MissingOutpostAz)?;
                subnet = subnet
                    .attr("availability_zone", &zone)
                    .attr_opt("outpost_arn", vars.outpost_arn.as_ref());
                zone
            } else {
                let zone = element(&vars.azs, i)
                    .ok_or(VariablesError::NoAvailabilityZones(class))?
                    .clone();
                let key = if is_zone_name(&zone) {
                    "availability_zone"
                } else {
                    "availability_zone_id"
                };
                subnet = subnet.attr(key, &zone);
                zone
            };

            if class == SubnetClass::Public {
                subnet = subnet.attr("map_public_ip_on_launch", vars.map_public_ip_on_launch);
            }

            subnet = subnet.attr("assign_ipv6_address_on_creation", assign_ipv6);

            if vars.enable_ipv6 && !class_vars.ipv6_prefixes.is_empty() {
                let prefix = class_vars
                    .ipv6_prefixes
                    .get(i)
                    .ok_or(ModuleError::MissingIpv6Prefix { class, index: i })?;
                subnet = subnet.attr(
                    "ipv6_cidr_block",
                    Value::Template(format!(
                        "${{cidrsubnet({}, 8, {prefix})}}",
                        self.vpc.expression("ipv6_cidr_block")
                    )),
                );
            }

            let tag_name = format!("{}-{}-{}", vars.name, vars.suffix(class), zone);
            subnet = subnet.attr("tags", self.tags(tag_name, &class_vars.subnet_tags));

            subnets.push(self.add(subnet)?);
        }

        tracing::debug!(%class, count = subnets.len(), "declared subnets");
        self.module.subnets.insert(class, subnets);
        Ok(())
    }

    pub(super) fn subnet_groups(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;

        for (class, kind, label) in [
            (SubnetClass::Database, ResourceKind::DbSubnetGroup, "Database"),
            (SubnetClass::Redshift, ResourceKind::RedshiftSubnetGroup, "Redshift"),
            (
                SubnetClass::Elasticache,
                ResourceKind::ElasticacheSubnetGroup,
                "Elasticache",
            ),
        ] {
            let class_vars = vars.class(class);
            let subnets = self.module.subnets(class).to_vec();
            if subnets.is_empty() || !class_vars.create_subnet_group {
                continue;
            }

            let group_name =
                coalesce([class_vars.subnet_group_name.clone(), Some(vars.name.clone())])?
                    .to_lowercase();

            let group = self.add(
                Resource::new(kind, self.name(format!("{class}-subnet-group")))
                    .attr("name", &group_name)
                    .attr("description", format!("{label} subnet group for {}", vars.name))
                    .attr("subnet_ids", ids(&subnets))
                    .attr("tags", self.tags(group_name.clone(), &class_vars.subnet_group_tags)),
            )?;
            self.module.subnet_groups.insert(class, group);
        }

        Ok(())
    }
}
