mod benchmark;
pub use benchmark::Benchmark;

mod bootstrap;
pub use bootstrap::Bootstrap;
