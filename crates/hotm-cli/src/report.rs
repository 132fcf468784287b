//! Plain-text rendering of profiles, trees and optimization results.
//!
//! Everything here returns a `String` so the output can be tested; the
//! caller decides where it goes.

use std::fmt::Write;
use std::time::Duration;

use hotm_core::catalog::{NodeCatalog, NodeKind, Position, PowderType};
use hotm_core::optimizer::{Outcome, Tree};
use hotm_core::profile::Profile;

/// `great_explorer` -> `Great Explorer`.
pub fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// One line per tier, top tier first: `C` core, `1` selected, `0` not
/// selected, blank for an empty cell.
pub fn render_grid(catalog: &NodeCatalog, tree: &Tree) -> String {
    let mut out = String::new();
    for tier in (0..catalog.tiers()).rev() {
        let row: Vec<&str> = (0..catalog.slots())
            .map(|slot| match catalog.at(Position::new(tier, slot)) {
                Some(id) if id == catalog.core() => "C",
                Some(id) if tree.contains(id) => "1",
                Some(_) => "0",
                None => " ",
            })
            .collect();
        let _ = writeln!(out, "{}", row.join(" ").trim_end());
    }
    out
}

/// Node names of `tree`, title-cased, in grid order.
pub fn node_list(catalog: &NodeCatalog, tree: &Tree) -> String {
    catalog
        .row_major()
        .iter()
        .filter(|&&id| tree.contains(id))
        .map(|&id| title_case(catalog.name(id)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `H:MM:SS`, with a day count in front past 24 hours.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

pub fn render_profile(profile: &Profile) -> String {
    let c = profile.config();
    let mut out = String::new();
    let _ = writeln!(out, "Mode: {}", profile.mode());
    let _ = writeln!(out, "Target: {}", profile.unit_name());
    let _ = writeln!(
        out,
        "Heart of the Mountain {} / Core of the Mountain {} ({} tokens)",
        profile.hotm(),
        profile.cotm(),
        profile.tokens()
    );
    let _ = writeln!(out, "Mining Speed: {}", c.mining_speed);
    let _ = writeln!(out, "Mining Fortune: {}", c.mining_fortune);
    let _ = writeln!(
        out,
        "Powder: {} mithril, {} gemstone, {} glacite",
        c.mithril_powder, c.gemstone_powder, c.glacite_powder
    );
    out
}

pub fn render_outcome(catalog: &NodeCatalog, profile: &Profile, outcome: &Outcome) -> String {
    let unit = profile.unit_name();
    let mut out = String::new();

    if !outcome.invested.is_empty() {
        let _ = writeln!(out, "Invested levels:");
        for &(id, level) in &outcome.invested {
            let max = catalog.max_level(id).unwrap_or(level);
            let _ = writeln!(out, "  {}: {level}/{max}", title_case(catalog.name(id)));
        }
    }
    if !outcome.fast_path.is_empty() {
        let maxed: Vec<&str> = outcome.fast_path.iter().map(|p| p.name()).collect();
        let _ = writeln!(out, "Maxed outright with {} powder", maxed.join(" and "));
    }

    let _ = writeln!(out, "Optimized Efficiency: {:.2} {unit} per minute", outcome.per_minute());
    let _ = writeln!(out, "Optimized Efficiency: {:.2} {unit} per hour", outcome.per_hour());
    let left: Vec<String> = PowderType::ALL
        .iter()
        .map(|&p| format!("{} {}", outcome.budget.get(p), p))
        .collect();
    let _ = writeln!(out, "Powder Left: {}", left.join(", "));

    if let Some(target) = profile.target_amount() {
        match outcome.time_to_target(target) {
            Some(d) => {
                let _ = writeln!(out, "Time Estimation: {} for {target} {unit}", format_duration(d));
            }
            None => {
                let _ = writeln!(out, "Time Estimation: never, the rate is zero");
            }
        }
    }
    out
}

/// Layout grid followed by one line per node.
pub fn render_catalog(catalog: &NodeCatalog) -> String {
    let everything = Tree::from_ids(catalog.row_major().iter().copied());
    let mut out = render_grid(catalog, &everything);
    let _ = writeln!(out);
    for &id in catalog.row_major() {
        let node = catalog.node(id);
        let kind = match node.kind {
            NodeKind::Stat => "stat",
            NodeKind::Ability => "ability",
            NodeKind::Misc => "misc",
        };
        let levels = match catalog.max_level(id) {
            Some(max) => format!(", max level {max}, {} powder", catalog.funding_currency(id)),
            None => String::new(),
        };
        let _ = writeln!(
            out,
            "{} {:<26} {kind}{levels}",
            node.position,
            title_case(&node.name)
        );
    }
    out
}
