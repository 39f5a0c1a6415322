//! Route tables, routes and their subnet associations
use super::{timeouts, Builder, ModuleError};
use crate::stack::{Resource, ResourceKind, ResourceRef};
use crate::util::{coalesce, element};
use crate::value::Value;
use crate::variables::SubnetClass;

const ANYWHERE_IPV4: &str = "0.0.0.0/0";
const ANYWHERE_IPV6: &str = "::/0";

impl Builder<'_> {
    pub(super) fn route_tables(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;

        if !vars.public.subnets.is_empty() {
            let table = self.route_table(SubnetClass::Public, None)?;
            self.module
                .route_tables
                .insert(SubnetClass::Public, vec![table.clone()]);

            if let Some(igw) = self.module.internet_gateway.clone() {
                self.route(
                    "public-internet-gateway",
                    &table,
                    ("destination_cidr_block", ANYWHERE_IPV4),
                    ("gateway_id", igw.id()),
                )?;

                if vars.enable_ipv6 {
                    self.route(
                        "public-internet-gateway-ipv6",
                        &table,
                        ("destination_ipv6_cidr_block", ANYWHERE_IPV6),
                        ("gateway_id", igw.id()),
                    )?;
                }
            }
        }

        if vars.max_subnet_length() > 0 {
            let count = vars.nat_gateway_count();
            let shared = vars.single_nat_gateway;
            let mut tables = Vec::with_capacity(count);
            for i in 0..count {
                tables.push(self.route_table(SubnetClass::Private, (!shared).then_some(i))?);
            }
            self.module.route_tables.insert(SubnetClass::Private, tables);
        }

        self.database_route_tables()?;

        for class in [
            SubnetClass::Redshift,
            SubnetClass::Elasticache,
            SubnetClass::Intra,
        ] {
            let class_vars = vars.class(class);
            let wanted = class == SubnetClass::Intra || class_vars.create_route_table;
            if !wanted || class_vars.subnets.is_empty() {
                continue;
            }

            let table = self.route_table(class, None)?;
            self.module.route_tables.insert(class, vec![table]);
        }

        Ok(())
    }

    fn database_route_tables(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        let database = &vars.database;
        if !database.create_route_table || database.subnets.is_empty() {
            return Ok(());
        }

        let shared = vars.single_nat_gateway || vars.create_database_internet_gateway_route;
        let count = if shared { 1 } else { database.subnets.len() };

        let mut tables = Vec::with_capacity(count);
        for i in 0..count {
            tables.push(self.route_table(SubnetClass::Database, (!shared).then_some(i))?);
        }
        let first = tables[0].clone();
        self.module.route_tables.insert(SubnetClass::Database, tables);

        if !vars.create_database_internet_gateway_route {
            return Ok(());
        }

        if let Some(igw) = self.module.internet_gateway.clone() {
            if !vars.create_database_nat_gateway_route {
                self.route(
                    "database-internet-gateway",
                    &first,
                    ("destination_cidr_block", ANYWHERE_IPV4),
                    ("gateway_id", igw.id()),
                )?;
            }
        }

        if let Some(egress_only) = self.module.egress_only_internet_gateway.clone() {
            self.route(
                "database-ipv6-egress",
                &first,
                ("destination_ipv6_cidr_block", ANYWHERE_IPV6),
                ("egress_only_gateway_id", egress_only.id()),
            )?;
        }

        Ok(())
    }

    /// Routes that need the NAT gateways and the egress only gateway
    pub(super) fn nat_routes(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        let nat_gateways = self.module.nat_gateways.clone();
        let private_tables = self.module.route_tables(SubnetClass::Private).to_vec();

        for (i, (table, gateway)) in private_tables.iter().zip(&nat_gateways).enumerate() {
            self.route(
                format!("private-nat-gateway-{i}"),
                table,
                (
                    "destination_cidr_block",
                    vars.nat_gateway_destination_cidr_block.as_str(),
                ),
                ("nat_gateway_id", gateway.id()),
            )?;
        }

        let database_tables = self.module.route_tables(SubnetClass::Database).to_vec();
        let database_nat = vars.create_database_nat_gateway_route
            && !vars.create_database_internet_gateway_route
            && !nat_gateways.is_empty();
        if database_nat && !database_tables.is_empty() {
            let count = if vars.single_nat_gateway {
                1
            } else {
                vars.database.subnets.len()
            };

            for i in 0..count {
                let (Some(table), Some(gateway)) =
                    (element(&database_tables, i), element(&nat_gateways, i))
                else {
                    continue;
                };

                self.route(
                    format!("database-nat-gateway-{i}"),
                    table,
                    ("destination_cidr_block", ANYWHERE_IPV4),
                    ("nat_gateway_id", gateway.id()),
                )?;
            }
        }

        // one ::/0 route per table, tables can be shared by several subnets
        let private_subnets = self.module.subnets(SubnetClass::Private).len();
        if let Some(egress_only) = self.module.egress_only_internet_gateway.clone() {
            for (i, table) in private_tables.iter().take(private_subnets).enumerate() {
                self.route(
                    format!("private-ipv6-egress-{i}"),
                    table,
                    ("destination_ipv6_cidr_block", ANYWHERE_IPV6),
                    ("egress_only_gateway_id", egress_only.id()),
                )?;
            }
        }

        Ok(())
    }

    pub(super) fn route_table_associations(&mut self) -> Result<(), ModuleError> {
        let vars = self.vars;
        let single = vars.single_nat_gateway;
        let private_tables = self.module.route_tables(SubnetClass::Private).to_vec();

        for class in SubnetClass::ALL {
            let subnets = self.module.subnets(class).to_vec();
            if subnets.is_empty() {
                continue;
            }

            let own_tables = self.module.route_tables(class).to_vec();
            let (tables, shared) = match class {
                SubnetClass::Public | SubnetClass::Intra => (own_tables.as_slice(), true),
                SubnetClass::Private | SubnetClass::Outpost => (private_tables.as_slice(), single),
                SubnetClass::Database => {
                    let shared = if vars.database.create_route_table {
                        single || vars.create_database_internet_gateway_route
                    } else {
                        single
                    };
                    let tables = coalesce([
                        Some(own_tables.as_slice()),
                        Some(private_tables.as_slice()),
                    ])
                    .unwrap_or_default();
                    (tables, shared)
                }
                SubnetClass::Redshift | SubnetClass::Elasticache => {
                    let shared = single || vars.class(class).create_route_table;
                    let tables = coalesce([
                        Some(own_tables.as_slice()),
                        Some(private_tables.as_slice()),
                    ])
                    .unwrap_or_default();
                    (tables, shared)
                }
            };

            for (i, subnet) in subnets.iter().enumerate() {
                let index = if shared { 0 } else { i };
                let Some(table) = element(tables, index) else {
                    tracing::warn!(%class, index = i, "no route table to associate subnet with");
                    continue;
                };

                self.add(
                    Resource::new(
                        ResourceKind::RouteTableAssociation,
                        self.name(format!("{class}-route-table-association-{i}")),
                    )
                    .attr("subnet_id", subnet.id())
                    .attr("route_table_id", table.id()),
                )?;
            }
        }

        Ok(())
    }

    /// Route table of a subnet class, `index` is appended to its `Name` tag when tables are per subnet
    fn route_table(
        &mut self,
        class: SubnetClass,
        index: Option<usize>,
    ) -> Result<ResourceRef, ModuleError> {
        let vars = self.vars;
        let mut tag_name = format!("{}-{}", vars.name, vars.suffix(class));
        let mut name = format!("{class}-route-table");
        if let Some(index) = index {
            tag_name = format!("{tag_name}-{index}");
            name = format!("{name}-{index}");
        }

        self.add(
            Resource::new(ResourceKind::RouteTable, self.name(name))
                .attr("vpc_id", self.vpc_id.clone())
                .attr("tags", self.tags(tag_name, &vars.class(class).route_table_tags)),
        )
    }

    fn route(
        &mut self,
        role: impl std::fmt::Display,
        table: &ResourceRef,
        destination: (&str, &str),
        target: (&str, Value),
    ) -> Result<ResourceRef, ModuleError> {
        self.add(
            Resource::new(ResourceKind::Route, self.name(role))
                .attr("route_table_id", table.id())
                .attr(destination.0, destination.1)
                .attr(target.0, target.1)
                .block(timeouts(&[("create", "5m")])),
        )
    }
}
