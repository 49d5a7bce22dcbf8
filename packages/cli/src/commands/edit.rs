use super::Context;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use ordtree_codec::{encode_prototype, FileDocumentStore, PrototypeDocument, StoreSource};
use ordtree_prototype::{EditSession, Fill, Operation, OperationOutcome};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Prototype document
    pub document: PathBuf,

    /// JSON array of operations
    pub operations: PathBuf,

    /// Write the updated document here (defaults to overwriting the input)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InstantiateArgs {
    /// Prototype document
    pub document: PathBuf,

    /// JSON array of placeholder fills
    #[arg(long)]
    pub fill: Option<PathBuf>,

    /// Write the message here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Prototype document
    pub document: PathBuf,
}

fn load_document(ctx: &Context, path: &std::path::Path) -> Result<PrototypeDocument> {
    Ok(PrototypeDocument::load(&ctx.resolve(path))?)
}

/// Apply an operation stream to a document. Union targets are looked up by
/// id in the configured document directory.
pub fn apply(args: ApplyArgs, ctx: &mut Context) -> Result<()> {
    let mut document = load_document(ctx, &args.document)?;
    let tree = document.to_tree(&ctx.registry, &mut ctx.cache)?;
    let operations: Vec<Operation> = serde_json::from_value(ctx.read_json(&args.operations)?)?;

    let store = FileDocumentStore::open(ctx.config.get_document_dir(&ctx.cwd))?;
    let mut source = StoreSource::new(&store, &ctx.registry, &mut ctx.cache);
    let mut session = EditSession::new(document.id.clone(), tree);
    let outcomes = session.apply_all(&operations, &mut source)?;

    for (op, outcome) in operations.iter().zip(&outcomes) {
        match outcome {
            OperationOutcome::Applied { version } => {
                println!("  {} {} (v{})", "✓".green(), op.description(), version)
            }
            OperationOutcome::Ignored => println!("  {} {} (ignored)", "-".yellow(), op.description()),
            OperationOutcome::Detached(sub) => {
                println!("  {} {} ({} nodes)", "✓".green(), op.description(), sub.len());
                println!("{}", encode_prototype(sub).to_json_string()?);
            }
        }
    }

    document.update_tree(session.tree());
    let out = args.out.unwrap_or(args.document);
    let text = serde_json::to_string_pretty(&document)?;
    ctx.emit(&text, Some(&out))
}

pub fn instantiate(args: InstantiateArgs, ctx: &mut Context) -> Result<()> {
    let document = load_document(ctx, &args.document)?;
    let tree = document.to_tree(&ctx.registry, &mut ctx.cache)?;
    let fills: Vec<Fill> = match &args.fill {
        Some(path) => serde_json::from_value(ctx.read_json(path)?)?,
        None => Vec::new(),
    };

    let message = tree.instantiate(&ctx.registry, &fills)?;
    let json = ctx.registry.message_to_json(&message)?;
    ctx.emit(&serde_json::to_string_pretty(&json)?, args.out.as_deref())
}

pub fn check(args: CheckArgs, ctx: &mut Context) -> Result<()> {
    let document = load_document(ctx, &args.document)?;
    let tree = document.to_tree(&ctx.registry, &mut ctx.cache)?;
    let violations = tree.check();

    let placeholders = tree.placeholder_nodes().len() + tree.placeholder_edges().len();
    if violations.is_empty() {
        println!(
            "{} {} is consistent ({} nodes, {} placeholders)",
            "✓".green(),
            document.name,
            tree.len(),
            placeholders
        );
        return Ok(());
    }
    for violation in &violations {
        println!("  {} {}", "✗".red(), violation);
    }
    Err(anyhow!("{} violations in {}", violations.len(), document.name))
}
