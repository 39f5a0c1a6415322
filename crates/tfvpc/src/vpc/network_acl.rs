//! Default network ACL and the dedicated per class ACLs
use super::{ids, Builder, ModuleError};
use crate::stack::{NestedBlock, Resource, ResourceKind};
use crate::util::coalesce;
use crate::variables::{NetworkAclRule, SubnetClass};

impl Builder<'_> {
    pub(super) fn default_network_acl(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        if !vars.manage_default_network_acl {
            return Ok(());
        }

        let name = coalesce([vars.default_network_acl_name.clone(), Some(vars.name.clone())])?;

        self.add(
            Resource::new(
                ResourceKind::DefaultNetworkAcl,
                self.name("default-network-acl"),
            )
            .attr(
                "default_network_acl_id",
                self.vpc.attr("default_network_acl_id"),
            )
            .blocks(
                vars.default_network_acl_ingress
                    .iter()
                    .map(|rule| default_acl_block("ingress", rule)),
            )
            .blocks(
                vars.default_network_acl_egress
                    .iter()
                    .map(|rule| default_acl_block("egress", rule)),
            )
            .attr("tags", self.tags(name, &vars.default_network_acl_tags))
            // subnets move to dedicated ACLs outside of this resource
            .lifecycle_ignore_changes(&["subnet_ids"]),
        )?;

        Ok(())
    }

    pub(super) fn network_acls(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;

        for class in SubnetClass::ALL {
            let class_vars = vars.class(class);
            let subnets = self.module.subnets(class).to_vec();
            if !class_vars.dedicated_network_acl || subnets.is_empty() {
                continue;
            }

            let tag_name = format!("{}-{}", vars.name, vars.suffix(class));
            let acl = self.add(
                Resource::new(ResourceKind::NetworkAcl, self.name(format!("{class}-network-acl")))
                    .attr("vpc_id", self.vpc_id.clone())
                    .attr("subnet_ids", ids(&subnets))
                    .attr("tags", self.tags(tag_name, &class_vars.acl_tags)),
            )?;

            for (direction, egress, rules) in [
                ("inbound", false, &class_vars.inbound_acl_rules),
                ("outbound", true, &class_vars.outbound_acl_rules),
            ] {
                for (i, rule) in rules.iter().enumerate() {
                    self.add(
                        Resource::new(
                            ResourceKind::NetworkAclRule,
                            self.name(format!("{class}-{direction}-acl-rule-{i}")),
                        )
                        .attr("network_acl_id", acl.id())
                        .attr("egress", egress)
                        .attr("rule_number", rule.rule_number)
                        .attr("rule_action", &rule.rule_action)
                        .attr("from_port", rule.from_port)
                        .attr("to_port", rule.to_port)
                        .attr_opt("icmp_code", rule.icmp_code)
                        .attr_opt("icmp_type", rule.icmp_type)
                        .attr("protocol", &rule.protocol)
                        .attr_opt("cidr_block", rule.cidr_block.as_ref())
                        .attr_opt("ipv6_cidr_block", rule.ipv6_cidr_block.as_ref()),
                    )?;
                }
            }

            tracing::debug!(%class, "declared dedicated network acl");
            self.module.network_acls.insert(class, acl);
        }

        Ok(())
    }
}

/// Default ACL entries are inline blocks and use the short attribute names
fn default_acl_block(ident: &str, rule: &NetworkAclRule) -> NestedBlock {
    NestedBlock::new(ident)
        .attr("rule_no", rule.rule_number)
        .attr("action", &rule.rule_action)
        .attr("from_port", rule.from_port)
        .attr("to_port", rule.to_port)
        .attr("protocol", &rule.protocol)
        .attr_opt("cidr_block", rule.cidr_block.as_ref())
        .attr_opt("ipv6_cidr_block", rule.ipv6_cidr_block.as_ref())
        .attr_opt("icmp_code", rule.icmp_code)
        .attr_opt("icmp_type", rule.icmp_type)
}
