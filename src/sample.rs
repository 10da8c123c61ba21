//! Random demo trees.
//!
//! A test fixture, not production logic: the only contract is a finite,
//! cycle-free, depth-bounded tree whose leaves have no children list at all.
//! The random source is injected so tests can seed it.

use rand::Rng;

use crate::arena::{NodeRef, TreeArena};
use crate::error::TreeError;

/// Shape of the generated tree.
#[derive(Clone, Copy, Debug)]
pub struct SampleTreeConfig {
    /// Number of depth levels, roots included.
    pub depth: usize,
    /// Number of root nodes.
    pub root_width: usize,
    /// Probability that a node of the previous level receives children.
    /// Values outside `[0, 1]` are clamped; a non-finite value never
    /// branches.
    pub branch_probability: f64,
    /// Upper bound (inclusive) on children per branching node.
    pub max_children: usize,
}

impl Default for SampleTreeConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            root_width: 30,
            branch_probability: 0.5,
            max_children: 20,
        }
    }
}

/// Fills one section of the arena with a random tree.
///
/// Levels are generated breadth-wise: every node of the previous level flips
/// a coin to decide whether it branches, and branching nodes receive a
/// uniform number of children in `1..=max_children`. Nodes that never branch
/// keep an absent children list and render as leaves.
///
/// # Errors
/// `IndexOutOfRange` if the section does not exist.
pub fn populate_sample_tree<R>(
    arena: &mut TreeArena,
    section: usize,
    rng: &mut R,
    config: &SampleTreeConfig,
) -> Result<(), TreeError>
where
    R: Rng + ?Sized,
{
    // gen_bool rejects probabilities outside [0, 1].
    let branch_probability = if config.branch_probability.is_finite() {
        config.branch_probability.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut last_level: Vec<NodeRef> = Vec::with_capacity(config.root_width);
    for _ in 0..config.root_width {
        last_level.push(arena.add_root(section, random_ident(rng))?);
    }

    for _ in 1..config.depth {
        let mut next_level = Vec::new();
        for node in last_level {
            if !rng.gen_bool(branch_probability) {
                continue;
            }
            let count = rng.gen_range(1..=config.max_children.max(1));
            for _ in 0..count {
                next_level.push(arena.add_child(node, random_ident(rng))?);
            }
        }
        last_level = next_level;
    }
    Ok(())
}

fn random_ident<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.r#gen::<u32>().to_string()
}
