//! cascading configuration documents
//!
//! [ConfigDocuments] tracks
//! - the source path of each document
//! - the root attributes of each document
//!
//! Documents are resolved in insertion order. An attribute in a later document replaces the attribute of the
//! same name in an earlier one, so a shared base file can be refined by more specific files.
//!
//! ```hcl
//! # base.vpc.hcl
//! name = "shared"
//! azs  = ["${region}a", "${region}b"]
//!
//! # prod.vpc.hcl
//! name = "prod"
//! ```
use crate::util;
use crate::variables::VpcModuleVariables;
use hcl::eval::Evaluate;
use hcl_edit::structure::{Attribute, Body, Structure};
use indexmap::IndexMap;
use std::path::Path;

/// File name suffix picked up by [ConfigDocuments::load_directory]
pub const FILE_SUFFIX: &str = "vpc.hcl";

#[derive(Default, Debug)]
pub struct ConfigDocuments {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, String)>,
}

impl ConfigDocuments {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<std::path::PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document.into_iter() {
            match structure {
                Structure::Block(block) => self
                    .root_blocks
                    .push((source_index, block.ident.value().as_str().to_string())),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .map(|(source_index, attribute)| (&self.sources[*source_index], attribute))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Evaluate all documents and merge them into module variables
    ///
    /// `context` provides the variables that attribute expressions may use, see [context].
    pub fn resolve(&self, context: &hcl::eval::Context) -> Result<VpcModuleVariables, ConfigError> {
        if let Some((source_index, ident)) = self.root_blocks.first() {
            return Err(ConfigError::UnexpectedBlock {
                ident: ident.clone(),
                path: display_source(&self.sources[*source_index]),
            });
        }

        let mut documents: Vec<IndexMap<String, hcl::Value>> =
            vec![IndexMap::new(); self.sources.len()];

        for (source_index, attribute) in &self.root_attributes {
            let key = attribute.key.value().as_str().to_string();
            let expression: hcl::Expression = attribute.value.clone().into();

            let value = expression
                .evaluate(context)
                .map_err(|error| ConfigError::Evaluation {
                    key: key.clone(),
                    path: display_source(&self.sources[*source_index]),
                    error,
                })?;

            tracing::trace!(%key, ?value, "evaluated attribute");
            documents[*source_index].insert(key, value);
        }

        let merged = util::merge(documents);
        tracing::debug!(keys = ?merged.keys().collect::<Vec<_>>(), "merged configuration");

        let json = serde_json::to_value(&merged)?;
        Ok(serde_json::from_value(json)?)
    }
}

impl ConfigDocuments {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        self.insert(body, Some(file_path));
        Ok(())
    }

    /// Loads every `*vpc.hcl` file of a directory, in file name order
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_config_file = dir_entry
                .file_name()
                .to_string_lossy()
                .ends_with(FILE_SUFFIX);
            if !is_config_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        // read_dir order is platform dependent, cascading needs a stable one
        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

/// Evaluation context for configuration expressions
///
/// Exposes `region` so zone lists can be written as `"${region}a"`.
pub fn context(region: &str) -> hcl::eval::Context<'static> {
    let mut context = hcl::eval::Context::new();
    context.declare_var("region", region.to_string());
    context
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unexpected block `{ident}` in {path}, only attributes are allowed at the root")]
    UnexpectedBlock { ident: String, path: String },
    #[error("failed to evaluate `{key}` in {path}")]
    Evaluation {
        key: String,
        path: String,
        #[source]
        error: hcl::eval::Error,
    },
    #[error("invalid module variables")]
    Variables(#[from] serde_json::Error),
}

impl From<Body> for ConfigDocuments {
    fn from(value: Body) -> Self {
        let mut documents = ConfigDocuments::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [ConfigDocuments]
///
/// Create from a single document
/// ```
/// # use tfvpc::config_documents;
/// config_documents!("name = \"main\"");
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use tfvpc::config_documents;
/// config_documents! {
///   "base.vpc.hcl" => "name = \"base\"",
///   "prod.vpc.hcl" => "name = \"prod\""
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use tfvpc::config_documents;
/// config_documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! config_documents {
    // single document without source
    { $expr:expr } => {
        $crate::config::ConfigDocuments::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::config::ConfigDocuments::default();
        $(
            docs.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
        )+

        docs
    }};
}

pub type Source = Option<std::path::PathBuf>;
pub type SourceAttribute<'a> = (&'a Source, &'a Attribute);

fn display_source(source: &Source) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    }
}
