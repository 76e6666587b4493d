use std::{collections::HashMap, sync::Arc};

use log::info;
use petgraph::{algo::toposort, graph::NodeIndex, Graph};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

use crate::{
    error::{ImportError, Result},
    framework::Framework,
    opdefs::{OpDescriptorCatalog, OpDescriptorRegistry},
    process::OpMappingRegistry,
};

use super::{ImportedGraph, ImportedNode};

/// Node weights are positions in the framework's node list, edges go from producer to consumer.
type DependencyGraph = Graph<usize, ()>;

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Threads used to map nodes, 0 lets rayon decide.
    pub num_threads: usize,
}

/// Imports whole graphs of framework `F`.
pub struct GraphImporter<F: Framework> {
    registry: Arc<OpDescriptorRegistry>,
    mappings: OpMappingRegistry<F>,
    config: Config,
    thread_pool: ThreadPool,
}

impl<F: Framework> GraphImporter<F> {
    pub fn new(registry: Arc<OpDescriptorRegistry>, mappings: OpMappingRegistry<F>) -> Result<Self> {
        Self::with_config(registry, mappings, Config::default())
    }

    pub fn with_config(
        registry: Arc<OpDescriptorRegistry>,
        mappings: OpMappingRegistry<F>,
        config: Config,
    ) -> Result<Self> {
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
            .map_err(|e| ImportError::Configuration(format!("unable to create thread pool: {}", e)))?;

        Ok(Self {
            registry,
            mappings,
            config,
            thread_pool,
        })
    }

    pub fn current_config(&self) -> Config {
        self.config.clone()
    }

    pub fn mappings(&self) -> &OpMappingRegistry<F> {
        &self.mappings
    }

    /// Maps every node of `graph`, constants excepted, and returns them in topological order.
    ///
    /// The first failure aborts the import; it names the node that could not be mapped.
    pub fn import(&self, graph: &F::Graph) -> Result<ImportedGraph> {
        let nodes = F::nodes(graph);
        let constants = F::graph_constants(graph);
        let catalog = self.registry.catalog_for(F::NAME)?;
        let order = dependency_order::<F>(nodes)?;

        let pending = order
            .into_iter()
            .filter(|&position| !is_constant::<F>(&nodes[position], &constants))
            .collect::<Vec<_>>();

        let mapped = self.thread_pool.install(|| {
            pending
                .par_iter()
                .map(|&position| self.import_node(&nodes[position], &catalog, &constants))
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            "Imported {} {} nodes ({} constants)",
            mapped.len(),
            F::NAME,
            nodes.len() - mapped.len()
        );
        Ok(ImportedGraph { nodes: mapped })
    }

    fn import_node(
        &self,
        node: &F::Node,
        catalog: &OpDescriptorCatalog,
        constants: &HashMap<String, F::Tensor>,
    ) -> Result<ImportedNode> {
        let node_name = F::node_name(node);
        let op = F::node_op(node);

        let descriptor = catalog
            .find_op(op)
            .and_then(|op_def| F::mapping_context(node, op_def, constants))
            .and_then(|context| {
                self.mappings
                    .find_mapping(op)?
                    .map_node(&self.registry, &context)
            })
            .map_err(|source| ImportError::NodeMapping {
                node: String::from(node_name),
                op: String::from(op),
                source: Box::new(source),
            })?;

        Ok(ImportedNode {
            node_name: String::from(node_name),
            input_framework_op_name: String::from(op),
            inputs: F::node_inputs(node),
            descriptor,
        })
    }
}

/// A node whose outputs are all graph constants only carries data.
fn is_constant<F: Framework>(node: &F::Node, constants: &HashMap<String, F::Tensor>) -> bool {
    let outputs = F::node_outputs(node);
    !outputs.is_empty() && outputs.iter().all(|output| constants.contains_key(output))
}

/// Positions of `nodes` ordered so that every producer comes before its consumers.
fn dependency_order<F: Framework>(nodes: &[F::Node]) -> Result<Vec<usize>> {
    let mut graph = DependencyGraph::new();
    let indices = (0..nodes.len())
        .map(|position| graph.add_node(position))
        .collect::<Vec<NodeIndex>>();

    let mut producers: HashMap<String, NodeIndex> = HashMap::new();
    for (node, index) in nodes.iter().zip(&indices) {
        for output in F::node_outputs(node) {
            producers.insert(output, *index);
        }
    }

    for (node, index) in nodes.iter().zip(&indices) {
        // graph inputs and initializers have no producer node
        for producer in F::node_inputs(node)
            .iter()
            .filter_map(|input| producers.get(input))
        {
            graph.update_edge(*producer, *index, ());
        }
    }

    toposort(&graph, None)
        .map(|sorted| sorted.into_iter().map(|index| graph[index]).collect())
        .map_err(|cycle| ImportError::GraphCycle {
            node: String::from(F::node_name(&nodes[graph[cycle.node_id()]])),
        })
}
