//! Immutable problem instances.
//!
//! A [`Problem`] is loaded once per experiment and only ever borrowed
//! afterwards. The raw combinatorial data is validated on construction so
//! that operators can index it without further checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Benchmark problem families supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemFamily {
    /// Graph coloring: primary = colors used, secondary = conflicting edges.
    GraphColoring,
    /// 0/1 knapsack: primary = negated packed value, secondary = slack.
    Knapsack,
    /// Vehicle routing with time windows: primary = vehicles, secondary = distance.
    Vrptw,
}

impl ProblemFamily {
    /// Short tag used in keys and records (`gcp`, `kbp`, `vrptw`).
    pub fn tag(self) -> &'static str {
        match self {
            ProblemFamily::GraphColoring => "gcp",
            ProblemFamily::Knapsack => "kbp",
            ProblemFamily::Vrptw => "vrptw",
        }
    }

    /// Whether the primary objective is a count (colors, vehicles).
    ///
    /// Count axes report a worse-than-BKS result as an infinite gap.
    pub fn primary_is_count(self) -> bool {
        matches!(self, ProblemFamily::GraphColoring | ProblemFamily::Vrptw)
    }
}

impl fmt::Display for ProblemFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Errors raised while building a problem instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    #[error("instance has no vertices, items or customers")]
    Empty,
    #[error("edge ({u}, {v}) references a vertex outside 0..{n}")]
    EdgeOutOfRange { u: usize, v: usize, n: usize },
    #[error("self-loop on vertex {0}")]
    SelfLoop(usize),
    #[error("capacity must be positive")]
    ZeroCapacity,
    #[error("customer {id} has a negative coordinate")]
    NegativeCoordinate { id: usize },
    #[error("customer {id} has ready_time {ready} after due_date {due}")]
    InvalidTimeWindow { id: usize, ready: f64, due: f64 },
    #[error("the depot must be the first customer row with id 0")]
    DepotNotFirst,
    #[error("customer ids must be 0..n in order, found {found} at position {position}")]
    NonSequentialIds { position: usize, found: usize },
}

/// Undirected simple graph stored as a sorted edge list and adjacency lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    n: usize,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// Builds a graph on `n` vertices (0-indexed). Duplicate edges are merged.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Result<Self, ProblemError> {
        if n == 0 {
            return Err(ProblemError::Empty);
        }
        let mut normalized = Vec::with_capacity(edges.len());
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(ProblemError::EdgeOutOfRange { u, v, n });
            }
            if u == v {
                return Err(ProblemError::SelfLoop(u));
            }
            normalized.push((u.min(v), u.max(v)));
        }
        normalized.sort_unstable();
        normalized.dedup();

        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in &normalized {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        Ok(Self {
            n,
            edges: normalized,
            adjacency,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// Edges as `(u, v)` with `u < v`, sorted.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        u < self.n && self.adjacency[u].binary_search(&v).is_ok()
    }
}

/// A knapsack item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub value: u64,
    pub weight: u64,
}

/// 0/1 knapsack data.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackData {
    pub capacity: u64,
    pub items: Vec<Item>,
}

impl KnapsackData {
    /// Value density used by greedy operators; zero-weight items rank first.
    pub fn ratio(&self, i: usize) -> f64 {
        let item = self.items[i];
        if item.weight == 0 {
            f64::INFINITY
        } else {
            item.value as f64 / item.weight as f64
        }
    }
}

/// A VRPTW node. Row 0 is the depot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: u64,
    pub ready_time: f64,
    pub due_date: f64,
    pub service_time: f64,
}

/// Vehicle routing data; `customers[0]` is the depot.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingData {
    pub capacity: u64,
    pub customers: Vec<Customer>,
}

impl RoutingData {
    pub fn depot(&self) -> &Customer {
        &self.customers[0]
    }

    /// Number of customers excluding the depot.
    pub fn num_customers(&self) -> usize {
        self.customers.len() - 1
    }
}

/// Dense square cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Euclidean distances between `points`.
    pub fn euclidean(points: &[(f64, f64)]) -> Self {
        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = points[i].0 - points[j].0;
                let dy = points[i].1 - points[j].1;
                let d = (dx * dx + dy * dy).sqrt();
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Reference values used for gap reporting and early termination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestKnown {
    /// In the minimization convention (KBP values already negated).
    pub primary: f64,
    pub secondary: Option<f64>,
}

impl BestKnown {
    pub fn primary(primary: f64) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: f64) -> Self {
        self.secondary = Some(secondary);
        self
    }
}

/// Family-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemData {
    Graph(Graph),
    Knapsack(KnapsackData),
    Routing(RoutingData),
}

/// A read-only benchmark instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    instance_id: String,
    family: ProblemFamily,
    data: ProblemData,
    matrix: Option<DistanceMatrix>,
    best_known: Option<BestKnown>,
}

impl Problem {
    /// Graph coloring instance over 0-indexed edges.
    pub fn graph_coloring(
        instance_id: impl Into<String>,
        n: usize,
        edges: &[(usize, usize)],
    ) -> Result<Self, ProblemError> {
        Ok(Self {
            instance_id: instance_id.into(),
            family: ProblemFamily::GraphColoring,
            data: ProblemData::Graph(Graph::new(n, edges)?),
            matrix: None,
            best_known: None,
        })
    }

    /// Knapsack instance from `(value, weight)` pairs.
    pub fn knapsack(
        instance_id: impl Into<String>,
        capacity: u64,
        items: &[(u64, u64)],
    ) -> Result<Self, ProblemError> {
        if items.is_empty() {
            return Err(ProblemError::Empty);
        }
        if capacity == 0 {
            return Err(ProblemError::ZeroCapacity);
        }
        let items = items
            .iter()
            .map(|&(value, weight)| Item { value, weight })
            .collect();
        Ok(Self {
            instance_id: instance_id.into(),
            family: ProblemFamily::Knapsack,
            data: ProblemData::Knapsack(KnapsackData { capacity, items }),
            matrix: None,
            best_known: None,
        })
    }

    /// VRPTW instance. `customers[0]` must be the depot with id 0 and the
    /// remaining ids must follow in order.
    pub fn vrptw(
        instance_id: impl Into<String>,
        capacity: u64,
        customers: Vec<Customer>,
    ) -> Result<Self, ProblemError> {
        if customers.len() < 2 {
            return Err(ProblemError::Empty);
        }
        if capacity == 0 {
            return Err(ProblemError::ZeroCapacity);
        }
        if customers[0].id != 0 {
            return Err(ProblemError::DepotNotFirst);
        }
        for (position, c) in customers.iter().enumerate() {
            if c.id != position {
                return Err(ProblemError::NonSequentialIds {
                    position,
                    found: c.id,
                });
            }
            if c.x < 0.0 || c.y < 0.0 {
                return Err(ProblemError::NegativeCoordinate { id: c.id });
            }
            if c.ready_time > c.due_date {
                return Err(ProblemError::InvalidTimeWindow {
                    id: c.id,
                    ready: c.ready_time,
                    due: c.due_date,
                });
            }
        }
        let points: Vec<(f64, f64)> = customers.iter().map(|c| (c.x, c.y)).collect();
        Ok(Self {
            instance_id: instance_id.into(),
            family: ProblemFamily::Vrptw,
            data: ProblemData::Routing(RoutingData {
                capacity,
                customers,
            }),
            matrix: Some(DistanceMatrix::euclidean(&points)),
            best_known: None,
        })
    }

    pub fn with_best_known(mut self, best_known: BestKnown) -> Self {
        self.best_known = Some(best_known);
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn family(&self) -> ProblemFamily {
        self.family
    }

    pub fn data(&self) -> &ProblemData {
        &self.data
    }

    pub fn matrix(&self) -> Option<&DistanceMatrix> {
        self.matrix.as_ref()
    }

    pub fn best_known(&self) -> Option<BestKnown> {
        self.best_known
    }

    pub fn graph(&self) -> Option<&Graph> {
        match &self.data {
            ProblemData::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn knapsack_data(&self) -> Option<&KnapsackData> {
        match &self.data {
            ProblemData::Knapsack(k) => Some(k),
            _ => None,
        }
    }

    pub fn routing(&self) -> Option<&RoutingData> {
        match &self.data {
            ProblemData::Routing(r) => Some(r),
            _ => None,
        }
    }
}
