use acyclic::executor::{Mode, ThreadDispatcher};
use acyclic::kernel::{CsrKernel, InterpretedKernel, Kernel};
use acyclic::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// =============================================================================
// Graph Fixtures
// =============================================================================

/// Layered graph: every vertex points at three vertices in the next layer.
fn layered(vertex_count: usize) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let width = 32.min(vertex_count.max(1));
    let mut out_edges = vec![Vec::new(); vertex_count];
    let mut in_edges = vec![Vec::new(); vertex_count];

    for from in 0..vertex_count {
        let next_layer = (from / width + 1) * width;
        for offset in [0, 7, 19] {
            let to = next_layer + (from + offset) % width;
            if to < vertex_count {
                out_edges[from].push(to);
                in_edges[to].push(from);
            }
        }
    }

    (out_edges, in_edges)
}

fn layered_dag(vertex_count: usize, config: DagConfig) -> Dag<usize> {
    let (out_edges, _) = layered(vertex_count);
    Dag::builder()
        .vertices(0..vertex_count)
        .edges(Edges::Adjacency(out_edges))
        .config(config)
        .build()
        .unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");

    for vertex_count in [64, 1_024, 16_384] {
        let (out_edges, in_edges) = layered(vertex_count);

        group.bench_with_input(
            BenchmarkId::new("interpreted_sort", vertex_count),
            &out_edges,
            |b, out_edges| b.iter(|| black_box(InterpretedKernel.topological_sort(out_edges))),
        );
        group.bench_with_input(
            BenchmarkId::new("compiled_sort", vertex_count),
            &out_edges,
            |b, out_edges| b.iter(|| black_box(CsrKernel.topological_sort(out_edges))),
        );
        group.bench_function(BenchmarkId::new("interpreted_verify", vertex_count), |b| {
            b.iter(|| black_box(InterpretedKernel.verify_acyclicity(&out_edges, &in_edges)))
        });
        group.bench_function(BenchmarkId::new("compiled_verify", vertex_count), |b| {
            b.iter(|| black_box(CsrKernel.verify_acyclicity(&out_edges, &in_edges)))
        });
    }

    group.finish();
}

fn bench_execution_paths(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("execution_path");
    let vertex_count = 4_096;

    let paths = [
        ("in_process", ExecutionConfig::IN_PROCESS),
        (
            "compiled_in_process",
            ExecutionConfig::IN_PROCESS.with_acceleration(Mode::Always),
        ),
        (
            "compiled_blocking_pool",
            ExecutionConfig::AUTO
                .with_acceleration(Mode::Always)
                .with_worker(Mode::Always),
        ),
    ];

    for (name, execution) in paths {
        let dag = layered_dag(vertex_count, DagConfig::default().with_execution(execution));
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(async {
                    // Clone so every iteration misses the cache.
                    let mut dag = dag.clone();
                    black_box(dag.topological_sort().await.unwrap())
                })
            })
        });
    }

    let dispatcher = Arc::new(ThreadDispatcher::new());
    let (out_edges, _) = layered(vertex_count);
    let dag = Dag::builder()
        .vertices(0..vertex_count)
        .edges(Edges::Adjacency(out_edges))
        .config(DagConfig::default().with_execution(ExecutionConfig::AUTO.with_worker(Mode::Always)))
        .dispatcher(dispatcher)
        .build()
        .unwrap();
    group.bench_function("compiled_thread", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut dag = dag.clone();
                black_box(dag.topological_sort().await.unwrap())
            })
        })
    });

    group.finish();
}

fn bench_cached_sort(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut dag = layered_dag(4_096, DagConfig::default());
    rt.block_on(dag.topological_sort()).unwrap();

    c.bench_function("cached_sort", |b| {
        b.iter(|| rt.block_on(async { black_box(dag.topological_sort().await.unwrap()) }))
    });
}

fn bench_mutation(c: &mut Criterion) {
    c.bench_function("add_edge_and_remove_vertex", |b| {
        b.iter(|| {
            let mut dag = layered_dag(1_024, DagConfig::default());
            dag.try_add_edge(0, 1_000);
            black_box(dag.remove_vertex(512))
        })
    });
}

criterion_group!(
    benches,
    bench_kernels,
    bench_execution_paths,
    bench_cached_sort,
    bench_mutation
);
criterion_main!(benches);
