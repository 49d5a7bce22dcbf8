use super::{slug, Context};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ordtree_codec::PrototypeDocument;
use ordtree_prototype::PrototypeTree;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Root message type of the prototype
    pub message_type: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Version label
    #[arg(long, default_value = "draft")]
    pub version: String,

    /// Start from the full skeleton instead of the root alone
    #[arg(long)]
    pub skeleton: bool,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct FromMessageArgs {
    /// Message type of the instance
    pub message_type: String,

    /// Message instance as JSON
    pub message: PathBuf,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Version label
    #[arg(long, default_value = "draft")]
    pub version: String,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn new(args: NewArgs, ctx: &mut Context) -> Result<()> {
    let mtt = ctx.cache.get_or_build(&ctx.registry, &args.message_type)?;
    let tree = if args.skeleton {
        PrototypeTree::from_mtt(mtt)?
    } else {
        PrototypeTree::new(mtt)
    };
    eprintln!(
        "{} {} prototype with {} nodes",
        "Created".green().bold(),
        args.message_type,
        tree.len()
    );
    write_document(ctx, &args.name, &args.version, &tree, args.out)
}

pub fn from_message(args: FromMessageArgs, ctx: &mut Context) -> Result<()> {
    let message = ctx.read_message(&args.message_type, &args.message)?;
    let tree = PrototypeTree::from_message(&ctx.registry, &message)?;
    eprintln!(
        "{} prototype from {} with {} nodes",
        "Created".green().bold(),
        args.message.display(),
        tree.len()
    );
    write_document(ctx, &args.name, &args.version, &tree, args.out)
}

fn write_document(ctx: &Context, name: &str, version: &str, tree: &PrototypeTree, out: Option<PathBuf>) -> Result<()> {
    let document = PrototypeDocument::from_tree(slug(name), name, version, tree);
    let text = serde_json::to_string_pretty(&document)?;
    ctx.emit(&text, out.as_deref())
}
