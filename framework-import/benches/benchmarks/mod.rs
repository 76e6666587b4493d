pub mod bench_conversion;
pub mod bench_import;
