use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kgtree::utils::{
    build_pipeline, default_trees_path, ensure_parent_directory, load_entity_records, open_cache,
};
use kgtree::{
    Config, MergeError, TreeStoreError, VocabularyError, categorize_entities, clean_entity_name,
    merge_all, render_tree, store,
};
use tracing_subscriber::EnvFilter;

/// kgtree - concept hierarchies from a SPARQL knowledge base
#[derive(Parser)]
#[command(name = "kgtree")]
#[command(about = "Build, merge and inspect concept trees resolved from a knowledge graph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Build concept trees for every relevant entity in a recogniser output file
    Build(BuildCommand),
    /// Resolve a single entity and print its concept tree
    Resolve(ResolveCommand),
    /// Merge text trees sharing a root, left to right
    Merge(MergeCommand),
    /// Print a stored text tree or tree batch
    Show(ShowCommand),
    /// Manage the query result cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Parser)]
struct BuildCommand {
    /// JSON array of entity records
    #[arg(value_name = "ENTITIES")]
    input: PathBuf,

    /// Where to write the tree batch (defaults to the data directory)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON vocabulary replacing the built-in relevance keywords
    #[arg(long, value_name = "FILE")]
    vocabulary: Option<PathBuf>,
}

#[derive(Parser)]
struct ResolveCommand {
    /// Entity name, parenthetical qualifiers are stripped
    #[arg(value_name = "ENTITY")]
    entity: String,

    /// Also write the tree as indented text
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON vocabulary replacing the built-in relevance keywords
    #[arg(long, value_name = "FILE")]
    vocabulary: Option<PathBuf>,
}

#[derive(Parser)]
struct MergeCommand {
    /// Indented text trees, merged in the order given
    #[arg(value_name = "TREES", required = true, num_args = 1..)]
    trees: Vec<PathBuf>,

    /// Write the merged tree as indented text
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct ShowCommand {
    /// A `.json` tree batch or an indented text tree
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Remove cached results that hold no bindings
    Clean {
        /// Report what would be removed without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match &cli.command {
        Commands::Build(cmd) => handle_build(cmd, &config),
        Commands::Resolve(cmd) => handle_resolve(cmd, &config),
        Commands::Merge(cmd) => handle_merge(cmd),
        Commands::Show(cmd) => handle_show(cmd),
        Commands::Cache(CacheCommand::Clean { dry_run }) => handle_cache_clean(*dry_run, &config),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so tree output on stdout stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kgtree=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input: empty arguments, trees that do not share a root
/// and malformed tree or vocabulary files. Network, cache and I/O failures are
/// internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.downcast_ref::<MergeError>().is_some()
            || cause
                .downcast_ref::<TreeStoreError>()
                .is_some_and(|e| !matches!(e, TreeStoreError::Io { .. }))
            || cause
                .downcast_ref::<VocabularyError>()
                .is_some_and(|e| !matches!(e, VocabularyError::Io { .. }))
            || cause.to_string().contains("cannot be empty")
    })
}

fn handle_build(cmd: &BuildCommand, config: &Config) -> Result<()> {
    let records = load_entity_records(&cmd.input)?;
    let categorized = categorize_entities(&records);

    let builder = build_pipeline(config, cmd.vocabulary.as_deref())?;
    let trees = builder.build_batch(&categorized);

    let output = cmd.output.clone().unwrap_or_else(default_trees_path);
    ensure_parent_directory(&output)?;
    store::save_batch(&output, &trees)
        .with_context(|| format!("Failed to save trees: {}", output.display()))?;

    for (category, entities) in &categorized {
        if entities.is_empty() {
            continue;
        }
        println!("{category}:");
        for entity in entities {
            println!("- {entity}");
        }
    }
    println!("{} concept trees saved to {}", trees.len(), output.display());

    Ok(())
}

fn handle_resolve(cmd: &ResolveCommand, config: &Config) -> Result<()> {
    let entity = clean_entity_name(&cmd.entity);
    if entity.is_empty() {
        anyhow::bail!("Entity name cannot be empty");
    }

    let builder = build_pipeline(config, cmd.vocabulary.as_deref())?;
    let tree = builder
        .build_tree(&entity)
        .with_context(|| format!("Failed to resolve '{entity}'"))?;

    print!("{}", render_tree(&tree, &BTreeSet::new()));
    if let Some(output) = &cmd.output {
        write_text_tree(output, &tree)?;
    }

    Ok(())
}

fn handle_merge(cmd: &MergeCommand) -> Result<()> {
    let trees = cmd
        .trees
        .iter()
        .map(|path| {
            store::read_tree(path).with_context(|| format!("Failed to load tree: {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(outcome) = merge_all(&trees)? else {
        anyhow::bail!("Tree list cannot be empty");
    };

    print!("{}", render_tree(&outcome.tree, &outcome.shared));
    println!("[*] shared nodes: {}", outcome.shared.len());
    if let Some(output) = &cmd.output {
        write_text_tree(output, &outcome.tree)?;
    }

    Ok(())
}

fn handle_show(cmd: &ShowCommand) -> Result<()> {
    let is_batch = cmd
        .path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_batch {
        let trees = store::load_batch(&cmd.path)
            .with_context(|| format!("Failed to load trees: {}", cmd.path.display()))?;
        for (category, entity, tree) in trees.iter() {
            println!("[{category}] {entity}");
            print!("{}", render_tree(tree, &BTreeSet::new()));
            println!();
        }
    } else {
        let tree = store::read_tree(&cmd.path)
            .with_context(|| format!("Failed to load tree: {}", cmd.path.display()))?;
        print!("{}", render_tree(&tree, &BTreeSet::new()));
    }

    Ok(())
}

fn handle_cache_clean(dry_run: bool, config: &Config) -> Result<()> {
    let cache = open_cache(config)?;
    let report = cache
        .purge_empty(dry_run)
        .context("Failed to clean cache")?;

    let verb = if dry_run { "Would remove" } else { "Removed" };
    println!(
        "{verb} {} of {} cache entries in {}",
        report.removed,
        report.scanned,
        cache.dir().display()
    );

    Ok(())
}

fn write_text_tree(path: &Path, tree: &kgtree::ConceptNode) -> Result<()> {
    ensure_parent_directory(path)?;
    store::write_tree(path, tree).with_context(|| format!("Failed to write tree: {}", path.display()))
}
