// Run the witness searches edge based contraction would run for a sample of center nodes
// and report how many shortcuts they require and how much effort they take.
// Usage: witness_search_stats GRAPH_DIR
// Env: NUM_WITNESS_CENTERS (default 1000), WITNESS_SEED (default 0)

#[macro_use]
extern crate edge_ch_witness;
use edge_ch_witness::{
    algo::witness_search::{stats::Stats, *},
    cli::*,
    datastr::graph::*,
    io::*,
    report::*,
};

use rand::prelude::*;
use rayon::prelude::*;
use std::{env, error::Error, path::Path};

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    num_source_edges: u64,
    num_target_edges: u64,
    num_bridge_paths: u64,
}

impl Counts {
    fn merge(mut self, other: Counts) -> Counts {
        self.num_source_edges += other.num_source_edges;
        self.num_target_edges += other.num_target_edges;
        self.num_bridge_paths += other.num_bridge_paths;
        self
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("witness_search_stats");

    let arg = &env::args().nth(1).ok_or(CliErr("No graph directory arg given"))?;
    let path = Path::new(arg);

    let num_centers: usize = env_param("NUM_WITNESS_CENTERS", 1000)?;
    let seed: u64 = env_param("WITNESS_SEED", 0)?;
    report!("seed", seed);
    report!("num_threads", rayon::current_num_threads());

    let road = RoadGraph::reconstruct_from(path)?;
    report!("graph", { "num_nodes": road.num_nodes(), "num_segments": road.num_segments(), "num_turns": road.num_turns() });
    if road.num_nodes() == 0 {
        return Err(Box::new(CliErr("Graph without nodes")));
    }
    let graph = PreparationGraph::new(&road);

    let config = WitnessSearchConfig::default();
    report!("config", { "sigma_factor": config.sigma_factor, "minimum_max_settled_edges": config.minimum_max_settled_edges, "settled_edge_stats_reset_interval": config.settled_edge_stats_reset_interval });

    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<NodeId> = (0..num_centers).map(|_| rng.gen_range(0..road.num_nodes() as NodeId)).collect();
    let chunk_size = (centers.len() + rayon::current_num_threads() - 1) / rayon::current_num_threads();

    let per_worker: Vec<(Counts, Stats)> = report_time("witness searches", || {
        centers
            .par_chunks(chunk_size.max(1))
            .map(|chunk| {
                let mut searcher = WitnessPathSearcher::new(&graph, config);
                let mut counts = Counts::default();
                for &center in chunk {
                    counts = counts.merge(search_around(&mut searcher, &road, center));
                }
                (counts, *searcher.total_stats())
            })
            .collect()
    });

    let mut counts = Counts::default();
    let mut stats = Stats::default();
    {
        let mut workers_ctxt = push_collection_context("workers".to_string());
        for (worker_counts, worker_stats) in &per_worker {
            let _worker_ctxt = workers_ctxt.push_collection_item();
            report!("num_bridge_paths", worker_counts.num_bridge_paths);
            worker_stats.report();
            counts = counts.merge(*worker_counts);
            stats.merge(worker_stats);
        }
    }

    eprintln!("{}", stats);
    report!("num_centers", centers.len());
    report!("num_source_edges", counts.num_source_edges);
    report!("num_target_edges", counts.num_target_edges);
    report!("num_bridge_paths", counts.num_bridge_paths);
    let _stats_ctxt = push_context("witness_search".to_string());
    stats.report();

    Ok(())
}

// All searches needed to contract `center`, without actually inserting shortcuts.
fn search_around<G: EdgeBasedChGraph>(searcher: &mut WitnessPathSearcher<G>, road: &RoadGraph, center: NodeId) -> Counts {
    let mut counts = Counts::default();
    let sources = neighbors(road, road.original_in_edges(center), center);
    let targets = neighbors(road, road.original_out_edges(center), center);

    for &source in &sources {
        for source_edge in road.original_in_edges(source) {
            counts.num_source_edges += 1;
            if searcher.init_search(center, source, source_edge) == 0 {
                continue;
            }
            for &target in &targets {
                for target_edge in road.original_out_edges(target) {
                    counts.num_target_edges += 1;
                    if searcher.run_search(target, target_edge).is_some() {
                        counts.num_bridge_paths += 1;
                    }
                }
            }
        }
    }

    counts
}

fn neighbors(road: &RoadGraph, edges: impl Iterator<Item = EdgeId>, center: NodeId) -> Vec<NodeId> {
    let mut neighbors: Vec<NodeId> = edges.map(|edge| road.other_node(edge, center)).filter(|&node| node != center).collect();
    neighbors.sort_unstable();
    neighbors.dedup();
    neighbors
}
