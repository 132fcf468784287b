//! Name resolution from data file structs into validated core types.

use hotm_core::catalog::{CostCurve, Leveling, NodeCatalog, NodeCatalogBuilder, NodeDef, Position};
use hotm_core::tables::MiningTables;
use std::collections::HashMap;
use std::path::Path;

use crate::loader::{DataLoadError, check_duplicate, resolve_name};
use crate::schema::{LayoutData, MiningData, NodeData};

/// Place every node on the grid described by `layout` and build the catalog.
///
/// Every node must be placed exactly once, and every non-empty cell must name
/// a known node.
pub fn build_catalog(
    nodes: &[NodeData],
    layout: &LayoutData,
    nodes_file: &Path,
    layout_file: &Path,
) -> Result<NodeCatalog, DataLoadError> {
    let mut by_name: HashMap<String, &NodeData> = HashMap::new();
    for node in nodes {
        check_duplicate(&by_name, &node.name, nodes_file)?;
        by_name.insert(node.name.clone(), node);
    }

    let shape_error = |detail: String| DataLoadError::Parse {
        file: layout_file.to_path_buf(),
        detail,
    };
    let width = layout.rows.iter().map(Vec::len).max().unwrap_or(0);
    let tiers = u8::try_from(layout.rows.len()).map_err(|_| shape_error(format!("{} tiers", layout.rows.len())))?;
    let slots = u8::try_from(width).map_err(|_| shape_error(format!("{width} slots")))?;

    let mut builder = NodeCatalogBuilder::new(tiers, slots);
    builder
        .tier_powder(layout.powder.clone())
        .token_tables(layout.tokens_hotm.clone(), layout.tokens_cotm.clone())
        .entry(&layout.entry)
        .core(&layout.core);

    let mut placed: HashMap<String, Position> = HashMap::new();
    for (tier, row) in layout.rows.iter().enumerate() {
        for (slot, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            check_duplicate(&placed, cell, layout_file)?;
            let node = resolve_name(&by_name, cell, layout_file, "node")?;
            // Both indices are below the u8 bounds checked above.
            let position = Position::new(tier as u8, slot as u8);
            builder.register(node_def(node, position, nodes_file)?);
            placed.insert(cell.clone(), position);
        }
    }

    if let Some(node) = nodes.iter().find(|n| !placed.contains_key(&n.name)) {
        return Err(shape_error(format!("node '{}' is not placed on the grid", node.name)));
    }

    Ok(builder.build()?)
}

fn node_def(node: &NodeData, position: Position, file: &Path) -> Result<NodeDef, DataLoadError> {
    let leveling = match (node.max_level, node.exponent) {
        (Some(max_level), Some(exponent)) => Some(Leveling {
            max_level,
            curve: CostCurve {
                pad: node.pad,
                exponent,
            },
        }),
        (None, None) => None,
        _ => {
            return Err(DataLoadError::Parse {
                file: file.to_path_buf(),
                detail: format!("node '{}' needs both max_level and exponent", node.name),
            });
        }
    };
    Ok(NodeDef {
        name: node.name.clone(),
        position,
        kind: node.kind,
        effects: node.effects.clone(),
        related_stats: node.related_stats.clone(),
        leveling,
    })
}

/// Resolve the chest lock perk against `catalog` and validate block coverage.
pub fn build_tables(mining: MiningData, catalog: &NodeCatalog, file: &Path) -> Result<MiningTables, DataLoadError> {
    let chest_lock_perk = mining
        .chest_lock_perk
        .as_deref()
        .map(|name| {
            catalog.id(name).ok_or_else(|| DataLoadError::UnresolvedRef {
                file: file.to_path_buf(),
                name: name.to_string(),
                expected_kind: "node",
            })
        })
        .transpose()?;

    Ok(MiningTables::new(
        mining.blocks,
        mining.compact_chances,
        mining.task_stats,
        chest_lock_perk,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotm_core::catalog::{CatalogError, NodeKind, PowderType};

    fn node(name: &str) -> NodeData {
        NodeData {
            name: name.to_string(),
            kind: NodeKind::Misc,
            effects: Vec::new(),
            related_stats: Vec::new(),
            max_level: None,
            pad: 1,
            exponent: None,
        }
    }

    fn layout(rows: &[&[&str]]) -> LayoutData {
        LayoutData {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            powder: vec![PowderType::Mithril; rows.len()],
            entry: "a".to_string(),
            core: "b".to_string(),
            tokens_hotm: vec![1; rows.len()],
            tokens_cotm: vec![0],
        }
    }

    fn paths() -> (&'static Path, &'static Path) {
        (Path::new("nodes.ron"), Path::new("layout.ron"))
    }

    #[test]
    fn empty_cells_are_skipped() {
        let (n, l) = paths();
        let catalog = build_catalog(&[node("a"), node("b")], &layout(&[&["", "a"], &["b", ""]]), n, l).unwrap();
        assert_eq!(catalog.slots(), 2);
        assert_eq!(catalog.position(catalog.core()), Position::new(1, 0));
    }

    #[test]
    fn unknown_cell_name() {
        let (n, l) = paths();
        let result = build_catalog(&[node("a"), node("b")], &layout(&[&["a"], &["c"]]), n, l);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, .. }) if name == "c"
        ));
    }

    #[test]
    fn node_placed_twice() {
        let (n, l) = paths();
        let result = build_catalog(&[node("a"), node("b")], &layout(&[&["a", "b"], &["a", ""]]), n, l);
        assert!(matches!(result, Err(DataLoadError::DuplicateName { ref file, .. }) if file == l));
    }

    #[test]
    fn duplicate_node_definition() {
        let (n, l) = paths();
        let result = build_catalog(&[node("a"), node("a")], &layout(&[&["a"]]), n, l);
        assert!(matches!(result, Err(DataLoadError::DuplicateName { ref file, .. }) if file == n));
    }

    #[test]
    fn unplaced_node() {
        let (n, l) = paths();
        let result = build_catalog(&[node("a"), node("b"), node("c")], &layout(&[&["a"], &["b"]]), n, l);
        assert!(matches!(result, Err(DataLoadError::Parse { ref detail, .. }) if detail.contains("'c'")));
    }

    #[test]
    fn half_specified_leveling() {
        let (n, l) = paths();
        let mut a = node("a");
        a.kind = NodeKind::Stat;
        a.max_level = Some(5);
        let result = build_catalog(&[a, node("b")], &layout(&[&["a"], &["b"]]), n, l);
        assert!(matches!(result, Err(DataLoadError::Parse { ref file, .. }) if file == n));
    }

    #[test]
    fn catalog_errors_are_wrapped() {
        let (n, l) = paths();
        let mut bad = layout(&[&["a"], &["b"]]);
        bad.core = "missing".to_string();
        let result = build_catalog(&[node("a"), node("b")], &bad, n, l);
        assert!(matches!(
            result,
            Err(DataLoadError::Catalog(CatalogError::UnknownAnchor { .. }))
        ));
    }
}
