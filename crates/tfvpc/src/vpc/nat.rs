//! NAT gateways and their elastic IPs
use super::{Builder, ModuleError};
use crate::stack::{Resource, ResourceKind};
use crate::util::element;
use crate::value::Value;
use crate::variables::{SubnetClass, VariablesError};

impl Builder<'_> {
    pub(super) fn nat_gateways(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        if !vars.enable_nat_gateway {
            return Ok(());
        }

        let public = self.module.subnets(SubnetClass::Public).to_vec();
        if public.is_empty() {
            return Err(VariablesError::NatGatewayWithoutPublicSubnets.into());
        }

        let count = vars.nat_gateway_count();
        for i in 0..count {
            let zone_index = if vars.single_nat_gateway { 0 } else { i };
            let zone = element(&vars.azs, zone_index)
                .ok_or(VariablesError::NoAvailabilityZones(SubnetClass::Public))?;
            let tag_name = format!("{}-{}", vars.name, zone);

            let allocation_id = if vars.reuse_nat_ips {
                let id = vars.external_nat_ip_ids.get(i).ok_or(
                    VariablesError::NotEnoughExternalNatIps {
                        needed: count,
                        got: vars.external_nat_ip_ids.len(),
                    },
                )?;
                Value::from(id)
            } else {
                let eip = self.add(
                    Resource::new(ResourceKind::Eip, self.name(format!("nat-eip-{i}")))
                        .attr("vpc", true)
                        .attr("tags", self.tags(tag_name.clone(), &vars.nat_eip_tags)),
                )?;
                self.module.nat_eips.push(eip.clone());
                eip.id()
            };

            let subnet = element(&public, zone_index)
                .ok_or(VariablesError::NatGatewayWithoutPublicSubnets)?;

            let gateway = self.add(
                Resource::new(ResourceKind::NatGateway, self.name(format!("nat-gateway-{i}")))
                    .attr("allocation_id", allocation_id)
                    .attr("subnet_id", subnet.id())
                    .attr("tags", self.tags(tag_name, &vars.nat_gateway_tags))
                    .depends_on(self.module.internet_gateway.iter()),
            )?;
            self.module.nat_gateways.push(gateway);
        }

        tracing::debug!(count, reuse_nat_ips = vars.reuse_nat_ips, "declared nat gateways");
        Ok(())
    }
}
