// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Lazy dependency graph over named build steps.
//!
//! A [`Graph`] holds one build function per named node plus the names it
//! depends on. Resolving a node builds its transitive dependencies first,
//! each at most once per graph instance. Concurrent resolutions of the same
//! node share the in-flight build instead of running it twice.

use std::collections::{BTreeMap, HashMap};

use futures::future::BoxFuture;
use tokio::sync::OnceCell;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown node {name:?}")]
    UnknownNode { name: String },
    #[error("node {name:?} is declared twice")]
    Duplicate { name: String },
    #[error("{node:?} depends on unknown node {dependency:?}")]
    UnknownDependency { node: String, dependency: String },
    #[error("dependency cycle: {path}")]
    Cycle { path: String },
    #[error("node {name:?} has not been resolved")]
    Unresolved { name: String },
    #[error("building {name} failed: {source}")]
    Build {
        name: String,
        source: Box<crate::Error>,
    },
}

/// Build function for one node. Receives a clone of the resolution context
/// and the already-built values of the node's declared dependencies.
pub type BuildFn<C, T> =
    Box<dyn Fn(C, Deps<T>) -> BoxFuture<'static, crate::Result<T>> + Send + Sync>;

/// Values of the dependencies a node declared, keyed by node name.
#[derive(Debug)]
pub struct Deps<T>(BTreeMap<String, T>);

impl<T> Deps<T> {
    /// Looks up a declared dependency. Undeclared names are an error even if
    /// the graph has already resolved them.
    pub fn get(&self, name: &str) -> crate::Result<&T> {
        self.0.get(name).ok_or_else(|| {
            crate::Error::from(GraphError::Unresolved {
                name: name.to_string(),
            })
        })
    }
}

struct Node<C, T> {
    name: String,
    deps: Vec<String>,
    build: BuildFn<C, T>,
    /// Indices of this node's transitive dependencies in build order, ending
    /// with the node itself.
    order: Vec<usize>,
    cell: OnceCell<T>,
}

pub struct GraphBuilder<C, T> {
    nodes: Vec<(String, Vec<String>, BuildFn<C, T>)>,
}

impl<C, T> GraphBuilder<C, T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Declares a node along with the names it depends on.
    pub fn node(mut self, name: &str, deps: &[&str], build: BuildFn<C, T>) -> Self {
        let deps = deps.iter().map(|dep| dep.to_string()).collect();
        self.nodes.push((name.to_string(), deps, build));
        self
    }

    /// Validates the declarations and freezes them into a [`Graph`].
    ///
    /// Cycles are rejected here, naming the offending path, so resolution
    /// never has to worry about them.
    pub fn build(self) -> Result<Graph<C, T>, GraphError> {
        let mut index = HashMap::new();
        for (i, (name, _, _)) in self.nodes.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(GraphError::Duplicate { name: name.clone() });
            }
        }

        let names: Vec<String> = self.nodes.iter().map(|(name, _, _)| name.clone()).collect();
        let mut dep_indices = Vec::with_capacity(self.nodes.len());
        for (name, deps, _) in &self.nodes {
            let mut indices = Vec::with_capacity(deps.len());
            for dep in deps {
                let Some(&i) = index.get(dep) else {
                    return Err(GraphError::UnknownDependency {
                        node: name.clone(),
                        dependency: dep.clone(),
                    });
                };
                indices.push(i);
            }
            dep_indices.push(indices);
        }

        let mut orders = Vec::with_capacity(self.nodes.len());
        for root in 0..self.nodes.len() {
            orders.push(build_order(root, &names, &dep_indices)?);
        }

        let nodes = self
            .nodes
            .into_iter()
            .zip(orders)
            .map(|((name, deps, build), order)| Node {
                name,
                deps,
                build,
                order,
                cell: OnceCell::new(),
            })
            .collect();
        Ok(Graph { nodes, index })
    }
}

impl<C, T> Default for GraphBuilder<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks depth-first from `root`, returning every reachable node in
/// dependencies-first order.
fn build_order(
    root: usize,
    names: &[String],
    deps: &[Vec<usize>],
) -> Result<Vec<usize>, GraphError> {
    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    fn visit(
        i: usize,
        names: &[String],
        deps: &[Vec<usize>],
        state: &mut [u8],
        stack: &mut Vec<usize>,
        out: &mut Vec<usize>,
    ) -> Result<(), GraphError> {
        match state[i] {
            BLACK => return Ok(()),
            GREY => {
                let start = stack.iter().position(|&n| n == i).unwrap_or(0);
                let mut path: Vec<&str> =
                    stack[start..].iter().map(|&n| names[n].as_str()).collect();
                path.push(names[i].as_str());
                return Err(GraphError::Cycle {
                    path: path.join(" -> "),
                });
            }
            _ => {}
        }
        state[i] = GREY;
        stack.push(i);
        for &dep in &deps[i] {
            visit(dep, names, deps, state, stack, out)?;
        }
        stack.pop();
        state[i] = BLACK;
        out.push(i);
        Ok(())
    }

    let mut state = vec![WHITE; names.len()];
    let mut stack = Vec::new();
    let mut out = Vec::new();
    visit(root, names, deps, &mut state, &mut stack, &mut out)?;
    Ok(out)
}

/// A frozen set of nodes whose values are built on demand and memoized.
pub struct Graph<C, T> {
    nodes: Vec<Node<C, T>>,
    index: HashMap<String, usize>,
}

impl<C, T> Graph<C, T>
where
    C: Clone,
    T: Clone,
{
    /// Resolves one node, building whatever it transitively needs first.
    pub async fn resolve(&self, ctx: &C, name: &str) -> crate::Result<&T> {
        let Some(&root) = self.index.get(name) else {
            return Err(crate::Error::from(GraphError::UnknownNode {
                name: name.to_string(),
            }));
        };

        for &i in &self.nodes[root].order {
            let node = &self.nodes[i];
            node.cell
                .get_or_try_init(|| async {
                    let mut deps = BTreeMap::new();
                    for dep in &node.deps {
                        deps.insert(dep.clone(), self.node_value(dep)?.clone());
                    }
                    (node.build)(ctx.clone(), Deps(deps)).await.map_err(|source| {
                        crate::Error::from(GraphError::Build {
                            name: node.name.clone(),
                            source: Box::new(source),
                        })
                    })
                })
                .await?;
        }
        self.node_value(name)
    }

    /// Resolves every node and returns the full name to value mapping.
    pub async fn resolve_all(&self, ctx: &C) -> crate::Result<BTreeMap<String, T>> {
        let mut all = BTreeMap::new();
        for i in 0..self.nodes.len() {
            let name = self.nodes[i].name.clone();
            let value = self.resolve(ctx, &name).await?;
            all.insert(name, value.clone());
        }
        Ok(all)
    }

    fn node_value(&self, name: &str) -> crate::Result<&T> {
        let Some(&i) = self.index.get(name) else {
            return Err(crate::Error::from(GraphError::UnknownNode {
                name: name.to_string(),
            }));
        };
        self.nodes[i].cell.get().ok_or_else(|| {
            crate::Error::from(GraphError::Unresolved {
                name: name.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use futures::FutureExt;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        builds: Arc<AtomicUsize>,
    }

    impl Recorder {
        fn record(&self, name: &str) {
            self.calls.lock().unwrap().push(name.to_string());
            self.builds.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample() -> Graph<Recorder, String> {
        GraphBuilder::new()
            .node(
                "weth",
                &[],
                Box::new(|ctx: Recorder, _deps: Deps<String>| {
                    async move {
                        ctx.record("weth");
                        Ok::<_, crate::Error>("0xweth".to_string())
                    }
                    .boxed()
                }),
            )
            .node(
                "feed",
                &["weth"],
                Box::new(|ctx: Recorder, deps: Deps<String>| {
                    async move {
                        ctx.record("feed");
                        Ok(format!("feed({})", deps.get("weth")?))
                    }
                    .boxed()
                }),
            )
            .node(
                "registry",
                &["feed", "weth"],
                Box::new(|ctx: Recorder, deps: Deps<String>| {
                    async move {
                        ctx.record("registry");
                        Ok(format!("registry({}, {})", deps.get("weth")?, deps.get("feed")?))
                    }
                    .boxed()
                }),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn resolves_dependencies_first() {
        let graph = sample();
        let ctx = Recorder::default();

        let registry = graph.resolve(&ctx, "registry").await.unwrap();
        assert_eq!(registry, "registry(0xweth, feed(0xweth))");
        assert_eq!(
            *ctx.calls.lock().unwrap(),
            vec!["weth".to_string(), "feed".to_string(), "registry".to_string()],
        );
    }

    #[tokio::test]
    async fn every_node_builds_at_most_once() {
        let graph = sample();
        let ctx = Recorder::default();

        graph.resolve(&ctx, "feed").await.unwrap();
        graph.resolve(&ctx, "feed").await.unwrap();
        graph.resolve(&ctx, "registry").await.unwrap();
        assert_eq!(ctx.builds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn resolve_all_returns_the_flat_map() {
        let graph = sample();
        let ctx = Recorder::default();

        let all = graph.resolve_all(&ctx).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["weth"], "0xweth");
        assert!(all.contains_key("feed") && all.contains_key("registry"));
        assert_eq!(ctx.builds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unknown_nodes_are_an_error() {
        let graph = sample();
        let err = graph.resolve(&Recorder::default(), "ghost").await.unwrap_err();
        assert!(err.to_string().contains("unknown node"));
    }

    #[test]
    fn cycles_are_rejected_at_construction() {
        let err = GraphBuilder::new()
            .node(
                "a",
                &["b"],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("a".to_string()) }.boxed()
                }),
            )
            .node(
                "b",
                &["a"],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("b".to_string()) }.boxed()
                }),
            )
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn unknown_dependencies_are_rejected_at_construction() {
        let err = GraphBuilder::new()
            .node(
                "a",
                &["ghost"],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("a".to_string()) }.boxed()
                }),
            )
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::UnknownDependency { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected_at_construction() {
        let err = GraphBuilder::new()
            .node(
                "a",
                &[],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("a".to_string()) }.boxed()
                }),
            )
            .node(
                "a",
                &[],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("a".to_string()) }.boxed()
                }),
            )
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn undeclared_dependencies_cannot_be_fetched() {
        let graph = GraphBuilder::new()
            .node(
                "loner",
                &[],
                Box::new(|_: (), deps: Deps<String>| {
                    async move { Ok(deps.get("weth")?.clone()) }.boxed()
                }),
            )
            .node(
                "weth",
                &[],
                Box::new(|_: (), _: Deps<String>| {
                    async { Ok::<_, crate::Error>("0xweth".to_string()) }.boxed()
                }),
            )
            .build()
            .unwrap();

        let err = graph.resolve(&(), "loner").await.unwrap_err();
        assert!(err.to_string().contains("has not been resolved"));
    }
}
