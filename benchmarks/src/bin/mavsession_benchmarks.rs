use mavsession_benchmarks::session::{benchmark_registry, benchmark_session_throughput};

fn main() {
    // Setup logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Info) // Suppress everything below `info` for third-party modules.
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Trace) // Allow everything from current package
        .init();

    for chunk_size in [1, 16, 256, 4096] {
        log::info!("[benchmark_session_throughput] chunk size: {chunk_size}");
        benchmark_session_throughput(100_000, chunk_size);
    }

    log::info!("[benchmark_registry]");
    benchmark_registry(64, 10_000);
}
