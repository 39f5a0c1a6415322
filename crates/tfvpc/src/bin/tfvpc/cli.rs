//! tfvpc cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; tfvpc ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize the vpc module into a terraform configuration
    ///
    /// Reads HCL from stdin unless any other source is provided (via --input-*)
    Synth(SynthCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct SynthCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub provider: ProviderArgs,

    /// Name of the stack, used as directory below <OUTDIR>/stacks
    #[arg(long = "stack", default_value = "VpcModule")]
    pub stack: String,

    /// Prefix of all resource and output names
    #[arg(long = "module-id", default_value = "main")]
    pub module_id: String,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load *vpc.hcl files from work directory
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Load a file
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load *vpc.hcl files from given directory
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ProviderArgs {
    /// AWS region, also available as `region` inside configuration files
    #[arg(long = "region", default_value = "us-east-1")]
    pub region: String,

    #[arg(long = "access-key", env = "CDKTF_AWS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    #[arg(long = "secret-key", env = "CDKTF_AWS_SECRET", hide_env_values = true)]
    pub secret_key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,

    /// Output directory, the configuration lands in <OUTDIR>/stacks/<STACK>
    #[arg(short = 'o', long = "output", default_value = "cdktf.out")]
    pub outdir: PathBuf,

    /// Write the configuration to stdout instead
    #[arg(long = "stdout")]
    pub stdout: bool,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Hcl,
}

impl OutputFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "cdk.tf.json",
            OutputFormat::Hcl => "main.tf",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Hcl => f.write_str("hcl"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[arg(long = "region", default_value = "us-east-1")]
    pub region: String,

    /// Prefix of all resource and output names
    #[arg(long = "module-id", default_value = "main")]
    pub module_id: String,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Resolved module variables
    Variables,
    /// Addresses of all declared resources
    Resources,
}
