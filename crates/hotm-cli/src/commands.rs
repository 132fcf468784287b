use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use hotm_core::catalog::NodeId;
use hotm_core::optimizer::{Optimizer, OptimizerOptions, Outcome, Tree};
use hotm_core::profile::{ConfigError, Profile};
use hotm_core::tables::GameData;
use hotm_data::{load_config, load_or_builtin};
use hotm_path::PathAssembler;
use tracing::{info, warn};

use crate::args::{Cli, Commands};
use crate::report;

pub fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Optimize {
            config,
            data_dir,
            no_fast_path,
        } => optimize(config, data_dir.as_deref(), !no_fast_path),
        Commands::Paths {
            config,
            data_dir,
            limit,
        } => paths(config, data_dir.as_deref(), *limit),
        Commands::Catalog { data_dir } => {
            let data = load_data(data_dir.as_deref())?;
            header("Heart of the Mountain");
            print!("{}", report::render_catalog(&data.catalog));
            Ok(())
        }
    }
}

fn header(title: &str) {
    println!("{}", title.cyan().bold());
}

fn load_data(dir: Option<&Path>) -> Result<GameData> {
    let data = load_or_builtin(dir).context("loading game data")?;
    Ok(data)
}

fn load_profile(path: &Path, data: &GameData) -> Result<Profile> {
    let config = load_config(path).with_context(|| format!("reading {}", path.display()))?;
    let profile = Profile::new(config, data).context("invalid configuration")?;
    Ok(profile)
}

/// Required nodes plus the forced ability, if any, as ids.
fn required_ids(profile: &Profile, data: &GameData) -> Result<(Vec<NodeId>, Vec<NodeId>)> {
    let catalog = &data.catalog;
    let nodes = profile
        .config()
        .required_nodes
        .iter()
        .map(|name| catalog.id(name).ok_or_else(|| ConfigError::UnknownNode(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    let abilities = profile.force_ability().into_iter().collect();
    Ok((nodes, abilities))
}

/// Trees to optimize: the given tree, or every assembled candidate.
fn candidate_trees(profile: &Profile, data: &GameData) -> Result<Vec<Tree>> {
    let catalog = &data.catalog;
    if let Some(names) = &profile.config().given_tree {
        return Ok(vec![Tree::from_names(catalog, names)?]);
    }
    if profile.config().required_nodes.is_empty() {
        return Err(ConfigError::NoTree.into());
    }

    let (nodes, abilities) = required_ids(profile, data)?;
    let assembler = PathAssembler::new(catalog, profile.hotm(), profile.tokens());
    let found = assembler.find_trees(&abilities, &nodes);
    if found.truncated {
        warn!("tree search was cut short; the best tree may be missing");
    }
    if found.is_empty() {
        bail!(
            "no tree connects the required nodes within {} tokens at heart of the mountain {}",
            profile.tokens(),
            profile.hotm()
        );
    }
    info!(candidates = found.trees.len(), "assembled candidate trees");
    Ok(found.to_trees(catalog))
}

fn optimize(config: &Path, data_dir: Option<&Path>, fast_path: bool) -> Result<()> {
    let data = load_data(data_dir)?;
    let profile = load_profile(config, &data)?;
    let options = OptimizerOptions { fast_path };

    let mut best: Option<Outcome> = None;
    for tree in candidate_trees(&profile, &data)? {
        let outcome = Optimizer::new(&data, &profile).with_options(options).optimize(&tree)?;
        // First tree wins ties.
        if best.as_ref().is_none_or(|b| outcome.per_minute() > b.per_minute()) {
            best = Some(outcome);
        }
    }
    let Some(best) = best else {
        return Err(ConfigError::NoTree.into());
    };

    header("Profile");
    print!("{}", report::render_profile(&profile));
    header("Tree");
    print!("{}", report::render_grid(&data.catalog, &best.tree));
    header("Results");
    print!("{}", report::render_outcome(&data.catalog, &profile, &best));
    Ok(())
}

fn paths(config: &Path, data_dir: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let data = load_data(data_dir)?;
    let profile = load_profile(config, &data)?;
    let catalog = &data.catalog;
    let (nodes, abilities) = required_ids(&profile, &data)?;
    if nodes.is_empty() && abilities.is_empty() {
        return Err(ConfigError::NoTree.into());
    }

    let found = PathAssembler::new(catalog, profile.hotm(), profile.tokens()).find_trees(&abilities, &nodes);
    header(&format!("{} candidate trees", found.trees.len()));
    if found.truncated {
        println!("{}", "search truncated, list may be incomplete".yellow());
    }
    let trees = found.to_trees(catalog);
    for (i, tree) in trees.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
        println!("#{} ({} tokens)", i + 1, tree.token_cost(catalog));
        print!("{}", report::render_grid(catalog, tree));
        println!("{}", report::node_list(catalog, tree));
    }
    Ok(())
}
