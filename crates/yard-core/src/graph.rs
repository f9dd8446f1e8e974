//! Dependency graph.
//!
//! Nodes are registered resources, identified by their registration index.
//! An edge `from -> to` means `from` must be applied before `to` starts.
//! The graph is derived from `depends_on` on every build and is guaranteed
//! to be acyclic; the build fails otherwise.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::Write;
use tracing::debug;

use crate::resolver::{ResolvedDependencies, resolve};
use crate::{Address, Config, Error, Result};

/// A directed edge between registry indices: `from` is the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

/// An acyclic graph over the resources of a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    addresses: Vec<Address>,
    /// Incoming edges per node, in declaration order.
    dependencies: Vec<Vec<usize>>,
    /// Outgoing edges per node, in registration order.
    dependents: Vec<Vec<usize>>,
    /// Topological order, ties broken by registration index.
    order: Vec<usize>,
}

impl DependencyGraph {
    /// Resolve every `depends_on` in `config` and build the graph.
    ///
    /// Fails on the first unresolvable address or on a cycle. The registry is
    /// only read.
    pub fn build(config: &Config) -> Result<Self> {
        let resolved = resolve(config)?;
        Self::from_resolved(config, &resolved)
    }

    /// Build the graph from dependencies that were already resolved against `config`.
    ///
    /// Fails with [`Error::StaleResolution`] if `resolved` was computed for a
    /// registry of a different size.
    pub fn from_resolved(config: &Config, resolved: &ResolvedDependencies) -> Result<Self> {
        let addresses: Vec<Address> = config.resources().iter().map(|r| r.address()).collect();
        let n = addresses.len();
        if resolved.len() != n {
            return Err(Error::StaleResolution {
                registered: n,
                resolved: resolved.len(),
            });
        }

        let mut dependencies = vec![Vec::new(); n];
        let mut dependents = vec![Vec::new(); n];
        for (to, deps) in resolved.iter() {
            for &from in deps {
                debug!(from = %addresses[from], to = %addresses[to], "adding edge");
                dependencies[to].push(from);
                dependents[from].push(to);
            }
        }

        let order = sort(&dependencies, &dependents);
        if order.len() != n {
            let cycle = find_cycle(&dependencies, &order)
                .into_iter()
                .map(|i| addresses[i].clone())
                .collect();
            return Err(Error::DependencyCycle { cycle });
        }

        debug!(nodes = n, "dependency graph built");
        Ok(Self {
            addresses,
            dependencies,
            dependents,
            order,
        })
    }

    pub fn node_count(&self) -> usize {
        self.addresses.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(Vec::len).sum()
    }

    /// Address of the node at a registration index.
    pub fn address(&self, index: usize) -> Option<&Address> {
        self.addresses.get(index)
    }

    /// Registration index of the node with `address`.
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.addresses.iter().position(|a| a == address)
    }

    /// Nodes that must be applied before `index`.
    pub fn dependencies_of(&self, index: usize) -> &[usize] {
        self.dependencies
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes waiting on `index`.
    pub fn dependents_of(&self, index: usize) -> &[usize] {
        self.dependents
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes without dependencies, in registration order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&i| self.dependencies[i].is_empty())
            .collect()
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .dependencies
            .iter()
            .enumerate()
            .flat_map(|(to, deps)| deps.iter().map(move |&from| Edge { from, to }))
            .collect();
        edges.sort();
        edges
    }

    /// Apply order: every dependency precedes its dependents, and among
    /// resources that are ready at the same time the earlier registered
    /// one comes first.
    pub fn topological_order(&self) -> &[usize] {
        &self.order
    }

    /// Destroy order: the apply order reversed.
    pub fn reverse_order(&self) -> Vec<usize> {
        self.order.iter().rev().copied().collect()
    }

    /// Addresses in apply order.
    pub fn ordered_addresses(&self) -> Vec<&Address> {
        self.order.iter().map(|&i| &self.addresses[i]).collect()
    }

    /// Render the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph yard {\n");
        for &i in &self.order {
            let _ = writeln!(out, "  \"{}\";", self.addresses[i]);
        }
        for edge in self.edges() {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\";",
                self.addresses[edge.from], self.addresses[edge.to]
            );
        }
        out.push_str("}\n");
        out
    }
}

/// Kahn's algorithm with a min-heap on registration index.
///
/// Returns fewer than `n` nodes when the graph has a cycle.
fn sort(dependencies: &[Vec<usize>], dependents: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(dependencies.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order
}

/// Find a cycle among the nodes Kahn's algorithm could not order.
///
/// The returned path follows `depends_on` and repeats its first node at the end.
fn find_cycle(dependencies: &[Vec<usize>], sorted: &[usize]) -> Vec<usize> {
    let n = dependencies.len();
    let mut candidate = vec![true; n];
    for &i in sorted {
        candidate[i] = false;
    }

    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];

    for start in 0..n {
        if !candidate[start] || visited[start] {
            continue;
        }

        // Depth-first walk along `depends_on`; each frame holds a node and
        // the index of the next dependency to visit.
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        visited[start] = true;
        on_stack[start] = true;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&dep) = dependencies[node].get(frame.1) else {
                on_stack[node] = false;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if !candidate[dep] {
                continue;
            }
            if on_stack[dep] {
                let from = stack.iter().position(|&(p, _)| p == dep).unwrap_or(0);
                let mut cycle: Vec<usize> = stack[from..].iter().map(|&(p, _)| p).collect();
                cycle.push(dep);
                return cycle;
            }
            if !visited[dep] {
                visited[dep] = true;
                on_stack[dep] = true;
                stack.push((dep, 0));
            }
        }
    }

    // Every unsorted node lies on or behind a cycle, so the search above
    // always finds one; fall back to the unsorted set regardless.
    (0..n).filter(|&i| candidate[i]).collect()
}
