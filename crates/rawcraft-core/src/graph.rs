use crate::extract::IngredientMap;
use crate::id::MaterialId;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

// ---------------------------------------------------------------------------
// Edge data
// ---------------------------------------------------------------------------

/// An incoming edge: `weight` units of `ingredient` are consumed per unit of
/// the product that owns the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub ingredient: MaterialId,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    inputs: Vec<Edge>,
    outputs: Vec<MaterialId>,
}

// ---------------------------------------------------------------------------
// CraftGraph
// ---------------------------------------------------------------------------

/// Directed weighted graph from ingredients to products.
///
/// Built once from the compiled recipe book, read-only afterwards, and safe
/// to share between worker threads.
#[derive(Debug, Clone, Default)]
pub struct CraftGraph {
    names: Vec<String>,
    index: HashMap<String, MaterialId>,
    adjacency: Vec<Adjacency>,
    self_duplicating: BTreeSet<MaterialId>,
    edge_count: usize,
}

impl CraftGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(product, recipe)` pairs. Tags must already be
    /// resolved.
    pub fn build<'a, N, I>(recipes: I) -> Self
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, &'a IngredientMap)>,
    {
        let mut graph = Self::new();
        for (product, recipe) in recipes {
            graph.add_recipe(product.as_ref(), recipe);
        }
        graph
    }

    /// Add one recipe's edges. Every ingredient gets an edge with weight
    /// `occurrences / batch size`; an existing edge between the same pair is
    /// replaced. A product listed among its own ingredients marks the product
    /// as self-duplicating instead of producing a self-edge.
    pub fn add_recipe(&mut self, product: &str, recipe: &IngredientMap) {
        let product_id = self.ensure(product);
        for (ingredient, occurrences) in recipe.iter() {
            if ingredient == product {
                debug!(product, "self-reference recorded as self-duplicating");
                self.self_duplicating.insert(product_id);
                continue;
            }
            let ingredient_id = self.ensure(ingredient);
            self.set_edge(ingredient_id, product_id, occurrences / recipe.count());
        }
    }

    fn ensure(&mut self, name: &str) -> MaterialId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = MaterialId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.adjacency.push(Adjacency::default());
        id
    }

    fn set_edge(&mut self, from: MaterialId, to: MaterialId, weight: f64) {
        let inputs = &mut self.adjacency[to.index()].inputs;
        if let Some(edge) = inputs.iter_mut().find(|e| e.ingredient == from) {
            edge.weight = weight;
            return;
        }
        inputs.push(Edge {
            ingredient: from,
            weight,
        });
        self.adjacency[from.index()].outputs.push(to);
        self.edge_count += 1;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn id(&self, name: &str) -> Option<MaterialId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: MaterialId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Incoming edges of `id`, in the order the ingredients were first added.
    pub fn predecessors(&self, id: MaterialId) -> &[Edge] {
        self.adjacency
            .get(id.index())
            .map(|a| a.inputs.as_slice())
            .unwrap_or(&[])
    }

    /// Products that consume `id`.
    pub fn successors(&self, id: MaterialId) -> &[MaterialId] {
        self.adjacency
            .get(id.index())
            .map(|a| a.outputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn weight(&self, ingredient: MaterialId, product: MaterialId) -> Option<f64> {
        self.predecessors(product)
            .iter()
            .find(|e| e.ingredient == ingredient)
            .map(|e| e.weight)
    }

    pub fn is_self_duplicating(&self, id: MaterialId) -> bool {
        self.self_duplicating.contains(&id)
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (MaterialId(i as u32), name.as_str()))
    }

    /// Every edge as `(ingredient, product, weight)`, sorted by names. Two
    /// graphs built from the same recipes yield identical edge lists.
    pub fn edges(&self) -> Vec<(&str, &str, f64)> {
        let mut edges: Vec<(&str, &str, f64)> = self
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(product, adj)| {
                adj.inputs.iter().map(move |edge| {
                    (
                        self.names[edge.ingredient.index()].as_str(),
                        self.names[product].as_str(),
                        edge.weight,
                    )
                })
            })
            .collect();
        edges.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
        edges
    }
}
