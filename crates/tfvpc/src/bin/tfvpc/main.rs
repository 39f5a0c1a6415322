mod cli;

use tfvpc::config::ConfigDocuments;
use tfvpc::stack::{AwsProvider, Stack};
use tfvpc::vpc::VpcModule;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFVPC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Synth(synth_cli) => synth(synth_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn synth(cli: cli::SynthCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let vars = documents.resolve(&tfvpc::config::context(&cli.provider.region))?;

    let mut stack = Stack::new(cli.stack.as_str(), provider(&cli.provider));
    VpcModule::new(&mut stack, &cli.module_id, &vars)?;

    let rendered = match cli.output.format {
        cli::OutputFormat::Json => serde_json::to_string_pretty(&stack)?,
        cli::OutputFormat::Hcl => stack.to_hcl_string()?,
    };

    if cli.output.stdout {
        println!("{rendered}");
        return Ok(());
    }

    let stack_dir = cli.output.outdir.join("stacks").join(stack.name());
    std::fs::create_dir_all(&stack_dir)?;

    let file_path = stack_dir.join(cli.output.format.file_name());
    std::fs::write(&file_path, rendered)?;
    tracing::info!(path=%file_path.display(), resources = stack.resources().count(), "wrote stack");

    println!("synth complete");
    Ok(())
}

fn provider(args: &cli::ProviderArgs) -> AwsProvider {
    AwsProvider::new(args.region.clone())
        .with_credentials(args.access_key.clone(), args.secret_key.clone())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<ConfigDocuments> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(body.into());
    }

    let mut documents = ConfigDocuments::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

/// (tfvpc-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let documents = load(&cli.input)?;
    let vars = documents.resolve(&tfvpc::config::context(&cli.region))?;

    match cli.command {
        Variables => serde_yaml::to_writer(std::io::stdout(), &vars)?,
        Resources => {
            let mut stack = Stack::new("dev", AwsProvider::new(cli.region.clone()));
            VpcModule::new(&mut stack, &cli.module_id, &vars)?;
            for address in stack.addresses() {
                println!("{address}");
            }
        }
    }

    Ok(())
}
