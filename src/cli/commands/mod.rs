// CLIコマンド実装

pub mod count_evens;

pub use count_evens::{execute_count_evens, run_count_evens, CountEvensOptions, CountEvensReport};
