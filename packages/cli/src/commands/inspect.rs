use super::Context;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use ordtree_codec::{encode_mot, encode_mtt};
use ordtree_tree::MessageObjectTree;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MttArgs {
    /// Fully qualified message type, e.g. ord.Reaction
    pub message_type: String,

    /// Print node-link JSON instead of the path listing
    #[arg(long)]
    pub json: bool,

    /// Write output to a file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MessageArgs {
    /// Fully qualified message type
    pub message_type: String,

    /// Message instance as JSON
    pub message: PathBuf,

    /// Write output to a file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn mtt(args: MttArgs, ctx: &mut Context) -> Result<()> {
    let mtt = ctx.cache.get_or_build(&ctx.registry, &args.message_type)?;

    if args.json {
        let text = encode_mtt(&mtt).to_json_string()?;
        return ctx.emit(&text, args.out.as_deref());
    }

    let graph = mtt.graph();
    let mut lines = Vec::with_capacity(mtt.len());
    for id in graph.root().map(|root| graph.preorder(root)).unwrap_or_default() {
        let node = graph.node(id)?;
        let depth = graph.depth(id)?;
        let label = node.relation.as_deref().unwrap_or(&node.path);
        let mut line = format!(
            "{:indent$}{:<width$} {:<16} {}",
            "",
            label,
            node.kind.to_string(),
            node.class,
            indent = depth * 2,
            width = 32usize.saturating_sub(depth * 2)
        );
        if let Some(group) = &node.oneof_group {
            line.push_str(&format!("  (oneof {})", group));
        }
        lines.push(line);
    }
    ctx.emit(&lines.join("\n"), args.out.as_deref())
}

pub fn mot(args: MessageArgs, ctx: &mut Context) -> Result<()> {
    let message = ctx.read_message(&args.message_type, &args.message)?;
    let mtt = ctx.cache.get_or_build(&ctx.registry, &args.message_type)?;
    let mot = MessageObjectTree::build(&ctx.registry, &mtt, &message)?;
    let text = encode_mot(&mot).to_json_string()?;
    ctx.emit(&text, args.out.as_deref())
}

/// Build the MOT, reduce it, and compare the message JSON before and after
pub fn roundtrip(args: MessageArgs, ctx: &mut Context) -> Result<()> {
    let message = ctx.read_message(&args.message_type, &args.message)?;
    let mtt = ctx.cache.get_or_build(&ctx.registry, &args.message_type)?;
    let mot = MessageObjectTree::build(&ctx.registry, &mtt, &message)?;
    let reduced = mot.reduce_message(&ctx.registry)?;

    let before = ctx.registry.message_to_json(&message)?;
    let after = ctx.registry.message_to_json(&reduced)?;
    if before != after {
        eprintln!("{}", serde_json::to_string_pretty(&after)?.dimmed());
        return Err(anyhow!(
            "{} does not survive the round trip ({} MOT nodes)",
            args.message.display(),
            mot.len()
        ));
    }
    println!(
        "{} {} survives the round trip ({} MOT nodes)",
        "✓".green(),
        args.message.display(),
        mot.len()
    );
    Ok(())
}
