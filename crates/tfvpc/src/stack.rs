//! declarative resource graph
//!
//! A [Stack] is the unit that gets synthesized: one provider configuration, a list of [Resource]s and the
//! outputs that should be exported. Resources refer to each other through [ResourceRef]s which render
//! as terraform interpolations (`${aws_vpc.main.id}`), so the provisioning engine can work out the
//! ordering on its own.
//!
//! Rendering is available in two flavours
//! - terraform JSON ([Stack::to_json_value], also via [serde::Serialize])
//! - terraform native syntax ([Stack::to_hcl_body])
use crate::value::Value;
use indexmap::IndexMap;

/// Version constraint used for the aws provider requirement
pub const AWS_PROVIDER_VERSION: &str = "~> 4.0";

#[derive(Debug)]
pub struct Stack {
    name: String,
    provider: AwsProvider,
    /// keyed by address
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
}

/// Resource and output counts of a [Stack] at some point in time
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    resources: usize,
    outputs: usize,
}

impl Stack {
    pub fn new(name: impl Into<String>, provider: AwsProvider) -> Self {
        Self {
            name: name.into(),
            provider,
            resources: Default::default(),
            outputs: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &AwsProvider {
        &self.provider
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Resource addresses (`type.name`) in insertion order
    pub fn addresses(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    /// Look up a resource by its address
    pub fn get(&self, address: &str) -> Option<&Resource> {
        self.resources.get(address)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&String, &Output)> {
        self.outputs.iter()
    }

    /// Add a resource, returns a reference that other resources can point to
    pub fn add(&mut self, resource: Resource) -> Result<ResourceRef, StackError> {
        if !is_valid_name(&resource.name) {
            return Err(StackError::InvalidName(resource.name));
        }

        let reference = resource.reference();
        let address = reference.address();
        if self.resources.contains_key(&address) {
            tracing::debug!(%address, "collision");
            return Err(StackError::DuplicateResource(address));
        }

        tracing::debug!(%address, "add resource");
        self.resources.insert(address, resource);
        Ok(reference)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            resources: self.resources.len(),
            outputs: self.outputs.len(),
        }
    }

    /// Drop everything that was added after `checkpoint` was taken
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        tracing::debug!(
            resources = self.resources.len().saturating_sub(checkpoint.resources),
            outputs = self.outputs.len().saturating_sub(checkpoint.outputs),
            "rollback"
        );
        self.resources.truncate(checkpoint.resources);
        self.outputs.truncate(checkpoint.outputs);
    }

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        description: Option<&str>,
    ) -> Result<(), StackError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(StackError::InvalidName(name));
        }

        if self.outputs.contains_key(&name) {
            return Err(StackError::DuplicateOutput(name));
        }

        self.outputs.insert(
            name,
            Output {
                value: value.into(),
                description: description.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Terraform JSON document
    pub fn to_json_value(&self) -> Value {
        let mut document = IndexMap::new();

        document.insert(
            "terraform".to_string(),
            object([(
                "required_providers",
                object([(
                    "aws",
                    object([
                        ("source", Value::from("hashicorp/aws")),
                        ("version", Value::from(AWS_PROVIDER_VERSION)),
                    ]),
                )]),
            )]),
        );

        document.insert(
            "provider".to_string(),
            object([("aws", Value::Array(vec![self.provider.attributes().into()]))]),
        );

        if !self.resources.is_empty() {
            let mut by_kind: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
            for resource in self.resources.values() {
                by_kind
                    .entry(resource.kind.to_string())
                    .or_default()
                    .insert(resource.name.clone(), resource.to_json_value());
            }
            document.insert("resource".to_string(), by_kind.into());
        }

        if !self.outputs.is_empty() {
            let outputs: IndexMap<String, Value> = self
                .outputs
                .iter()
                .map(|(name, output)| (name.clone(), output.attributes().into()))
                .collect();
            document.insert("output".to_string(), outputs.into());
        }

        Value::Object(document)
    }

    /// Terraform native syntax document
    pub fn to_hcl_body(&self) -> hcl::Body {
        let required_providers = hcl::Block::builder("required_providers")
            .add_attribute(hcl::Attribute::new(
                "aws",
                object([
                    ("source", Value::from("hashicorp/aws")),
                    ("version", Value::from(AWS_PROVIDER_VERSION)),
                ]),
            ))
            .build();

        let mut body = hcl::Body::builder()
            .add_block(
                hcl::Block::builder("terraform")
                    .add_block(required_providers)
                    .build(),
            )
            .add_block(
                hcl::Block::builder("provider")
                    .add_label("aws")
                    .add_attributes(hcl_attributes(self.provider.attributes()))
                    .build(),
            );

        for resource in self.resources.values() {
            body = body.add_block(resource.to_hcl_block());
        }

        for (name, output) in &self.outputs {
            body = body.add_block(
                hcl::Block::builder("output")
                    .add_label(name.as_str())
                    .add_attributes(hcl_attributes(output.attributes()))
                    .build(),
            );
        }

        body.build()
    }

    pub fn to_hcl_string(&self) -> Result<String, hcl::Error> {
        hcl::to_string(&self.to_hcl_body())
    }
}

impl serde::ser::Serialize for Stack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json_value().serialize(serializer)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StackError {
    #[error("resource {0} already exists")]
    DuplicateResource(String),
    #[error("output {0} already exists")]
    DuplicateOutput(String),
    #[error("{0:?} is not a valid terraform name")]
    InvalidName(String),
}

/// AWS provider configuration
#[derive(Debug, Clone, derive_new::new)]
pub struct AwsProvider {
    pub region: String,
    #[new(default)]
    pub access_key: Option<String>,
    #[new(default)]
    pub secret_key: Option<String>,
}

impl AwsProvider {
    pub fn with_credentials(mut self, access_key: Option<String>, secret_key: Option<String>) -> Self {
        self.access_key = access_key;
        self.secret_key = secret_key;
        self
    }

    fn attributes(&self) -> IndexMap<String, Value> {
        let mut attributes = IndexMap::new();
        attributes.insert("region".to_string(), Value::from(&self.region));
        if let Some(access_key) = &self.access_key {
            attributes.insert("access_key".to_string(), access_key.into());
        }
        if let Some(secret_key) = &self.secret_key {
            attributes.insert("secret_key".to_string(), secret_key.into());
        }
        attributes
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
}

impl Output {
    fn attributes(&self) -> IndexMap<String, Value> {
        let mut attributes = IndexMap::new();
        attributes.insert("value".to_string(), self.value.clone());
        if let Some(description) = &self.description {
            attributes.insert("description".to_string(), description.into());
        }
        attributes
    }
}

/// A single terraform resource
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
    pub attributes: IndexMap<String, Value>,
    pub blocks: Vec<NestedBlock>,
}

impl Resource {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attributes: Default::default(),
            blocks: Default::default(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Set an attribute only when a value is present
    pub fn attr_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn blocks(mut self, blocks: impl IntoIterator<Item = NestedBlock>) -> Self {
        self.blocks.extend(blocks);
        self
    }

    /// Explicit dependencies, rendered as `depends_on`
    pub fn depends_on<'r>(self, resources: impl IntoIterator<Item = &'r ResourceRef>) -> Self {
        let dependencies: Vec<Value> = resources
            .into_iter()
            .map(|resource| Value::Keyword(resource.address()))
            .collect();

        if dependencies.is_empty() {
            return self;
        }

        self.attr("depends_on", dependencies)
    }

    pub fn lifecycle_ignore_changes(self, attributes: &[&str]) -> Self {
        let ignored: Vec<Value> = attributes
            .iter()
            .map(|attribute| Value::Keyword(attribute.to_string()))
            .collect();

        self.block(NestedBlock::new("lifecycle").attr("ignore_changes", ignored))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn nested(&self, ident: &str) -> impl Iterator<Item = &NestedBlock> {
        let ident = ident.to_string();
        self.blocks.iter().filter(move |block| block.ident == ident)
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind,
            name: self.name.clone(),
        }
    }

    fn to_json_value(&self) -> Value {
        let mut body = self.attributes.clone();

        let mut grouped: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for block in &self.blocks {
            grouped
                .entry(block.ident.as_str())
                .or_default()
                .push(Value::Object(block.attributes.clone()));
        }

        for (ident, mut blocks) in grouped {
            let value = if blocks.len() == 1 {
                blocks.remove(0)
            } else {
                Value::Array(blocks)
            };
            body.insert(ident.to_string(), value);
        }

        Value::Object(body)
    }

    fn to_hcl_block(&self) -> hcl::Block {
        let mut block = hcl::Block::builder("resource")
            .add_label(self.kind.as_str())
            .add_label(self.name.as_str())
            .add_attributes(hcl_attributes(self.attributes.clone()));

        for nested in &self.blocks {
            block = block.add_block(
                hcl::Block::builder(nested.ident.as_str())
                    .add_attributes(hcl_attributes(nested.attributes.clone()))
                    .build(),
            );
        }

        block.build()
    }
}

/// A nested block inside a resource, e.g. `timeouts` or `ingress`
#[derive(Debug, Clone, PartialEq)]
pub struct NestedBlock {
    pub ident: String,
    pub attributes: IndexMap<String, Value>,
}

impl NestedBlock {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            attributes: Default::default(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attr_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }
}

/// Pointer to a resource that was added to a [Stack]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    /// `type.name`
    pub fn address(&self) -> String {
        format!("{}.{}", self.kind, self.name)
    }

    /// `type.name.attribute`, without interpolation markers
    pub fn expression(&self, attribute: &str) -> String {
        format!("{}.{}", self.address(), attribute)
    }

    /// Interpolated reference to an attribute of this resource
    pub fn attr(&self, attribute: &str) -> Value {
        Value::Template(format!("${{{}}}", self.expression(attribute)))
    }

    pub fn id(&self) -> Value {
        self.attr("id")
    }
}

/// Resource types the vpc module knows how to declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vpc,
    VpcIpv4CidrBlockAssociation,
    DefaultSecurityGroup,
    VpcDhcpOptions,
    VpcDhcpOptionsAssociation,
    InternetGateway,
    EgressOnlyInternetGateway,
    DefaultRouteTable,
    RouteTable,
    Route,
    RouteTableAssociation,
    Subnet,
    DbSubnetGroup,
    RedshiftSubnetGroup,
    ElasticacheSubnetGroup,
    DefaultNetworkAcl,
    NetworkAcl,
    NetworkAclRule,
    Eip,
    NatGateway,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "aws_vpc",
            ResourceKind::VpcIpv4CidrBlockAssociation => "aws_vpc_ipv4_cidr_block_association",
            ResourceKind::DefaultSecurityGroup => "aws_default_security_group",
            ResourceKind::VpcDhcpOptions => "aws_vpc_dhcp_options",
            ResourceKind::VpcDhcpOptionsAssociation => "aws_vpc_dhcp_options_association",
            ResourceKind::InternetGateway => "aws_internet_gateway",
            ResourceKind::EgressOnlyInternetGateway => "aws_egress_only_internet_gateway",
            ResourceKind::DefaultRouteTable => "aws_default_route_table",
            ResourceKind::RouteTable => "aws_route_table",
            ResourceKind::Route => "aws_route",
            ResourceKind::RouteTableAssociation => "aws_route_table_association",
            ResourceKind::Subnet => "aws_subnet",
            ResourceKind::DbSubnetGroup => "aws_db_subnet_group",
            ResourceKind::RedshiftSubnetGroup => "aws_redshift_subnet_group",
            ResourceKind::ElasticacheSubnetGroup => "aws_elasticache_subnet_group",
            ResourceKind::DefaultNetworkAcl => "aws_default_network_acl",
            ResourceKind::NetworkAcl => "aws_network_acl",
            ResourceKind::NetworkAclRule => "aws_network_acl_rule",
            ResourceKind::Eip => "aws_eip",
            ResourceKind::NatGateway => "aws_nat_gateway",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource and output names have to be valid HCL identifiers
fn is_valid_name(name: &str) -> bool {
    hcl::Identifier::new(name).is_ok()
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn hcl_attributes(attributes: IndexMap<String, Value>) -> Vec<hcl::Attribute> {
    attributes
        .into_iter()
        .map(|(key, value)| hcl::Attribute::new(hcl::Identifier::unchecked(key), value))
        .collect()
}
