//! `refset` command line tool
//!
//! Inspects translation paths and augments a single inline value using the
//! built-in providers.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use refset_augment::{AugmentorConfig, ProviderRegistry, ReferenceSetAugmentor};
use refset_types::{
    InlineByteArrayReference, InlineStringReference, ReferenceHandle, ReferenceContext,
    ReferenceSet, ReferenceType,
};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn cli() -> Command {
    Command::new("refset")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reference set augmentation over a translator type graph")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML augmentor configuration"),
        )
        .subcommand(
            Command::new("paths")
                .about("Print the cheapest translation path from every type into a target")
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(value_parser!(ReferenceType))
                        .help("Target reference type"),
                ),
        )
        .subcommand(
            Command::new("augment")
                .about("Add a reference of a target type to a one-value reference set")
                .arg(
                    Arg::new("value")
                        .long("value")
                        .required(true)
                        .help("Initial value"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .default_value(InlineStringReference::TYPE_NAME)
                        .value_parser([
                            InlineStringReference::TYPE_NAME,
                            InlineByteArrayReference::TYPE_NAME,
                        ])
                        .help("Type of the initial reference"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(ReferenceType))
                        .help("Acceptable target types"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<AugmentorConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let config = AugmentorConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(AugmentorConfig::default()),
    }
}

fn run_paths(engine: &ReferenceSetAugmentor, args: &ArgMatches) -> Result<()> {
    let target = args
        .get_one::<ReferenceType>("to")
        .context("missing --to")?;
    let paths = engine.translation_paths(target)?;

    if paths.is_empty() {
        println!("No translation paths to {target}");
        return Ok(());
    }
    println!("Translation paths to {target}:");
    for (i, path) in paths.iter().enumerate() {
        println!("  {}) {}", i + 1, path);
    }
    Ok(())
}

fn initial_reference(from: &str, value: &str) -> Result<ReferenceHandle> {
    match from {
        InlineStringReference::TYPE_NAME => Ok(Arc::new(InlineStringReference::new(value))),
        InlineByteArrayReference::TYPE_NAME => Ok(Arc::new(InlineByteArrayReference::new(
            value.as_bytes().to_vec(),
        ))),
        other => bail!("unsupported initial type '{other}'"),
    }
}

fn render(reference: &ReferenceHandle) -> serde_json::Value {
    let value = if let Some(text) = reference.downcast_ref::<InlineStringReference>() {
        json!(text.value())
    } else if let Some(bytes) = reference.downcast_ref::<InlineByteArrayReference>() {
        json!(bytes.value())
    } else {
        serde_json::Value::Null
    };
    json!({
        "type": reference.reference_type().name(),
        "description": reference.describe(),
        "value": value,
    })
}

fn run_augment(engine: &ReferenceSetAugmentor, args: &ArgMatches) -> Result<()> {
    let value = args.get_one::<String>("value").context("missing --value")?;
    let from = args.get_one::<String>("from").context("missing --from")?;
    let targets: BTreeSet<ReferenceType> = args
        .get_many::<ReferenceType>("to")
        .context("missing --to")?
        .cloned()
        .collect();

    let set = ReferenceSet::with_references([initial_reference(from, value)?]);
    let added = engine.augment(&set, &targets, &ReferenceContext::new())?;

    if args.get_flag("json") {
        let output = json!({
            "set": set.id(),
            "added": added.iter().map(render).collect::<Vec<_>>(),
            "total": set.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if added.is_empty() {
        println!("Reference set {} already holds a target type", set.id());
    } else {
        println!("Added {} reference(s) to set {}:", added.len(), set.id());
        for reference in &added {
            println!("  {}", reference.describe());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refset=info,refset_augment=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    let engine = ReferenceSetAugmentor::new(ProviderRegistry::with_defaults(), config);

    match matches.subcommand() {
        Some(("paths", args)) => run_paths(&engine, args),
        Some(("augment", args)) => run_augment(&engine, args),
        _ => Ok(()),
    }
}
