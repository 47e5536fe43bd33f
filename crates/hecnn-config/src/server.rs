// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Server CLI surface, per spec.md §6: `-p port`, `-q max_concurrent_queries`,
//! `-r max_results`, `-l max_result_lifetime_sec`, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_main.cpp`'s
//! `getopt` table.

use clap::Parser;

/// Default result lifetime, per spec.md §5: "the result lifetime (default
/// large, e.g. 50,000 s)".
pub const DEFAULT_RESULT_LIFETIME_SEC: i64 = 50_000;

#[derive(Debug, Clone, Parser)]
#[command(name = "hecnn-server", about = "Privacy-preserving CNN inference server")]
pub struct ServerArgs {
    /// TCP port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = 9999)]
    pub port: u16,

    /// Maximum number of queries that may be queued awaiting a worker.
    #[arg(short = 'q', long = "max-queries", default_value_t = 128)]
    pub max_concurrent_queries: usize,

    /// Maximum number of completed results retained awaiting client pickup.
    #[arg(short = 'r', long = "max-results", default_value_t = 128)]
    pub max_results: usize,

    /// Seconds a result may sit unclaimed before the Result Lifetime
    /// Manager evicts it.
    #[arg(short = 'l', long = "result-lifetime", default_value_t = DEFAULT_RESULT_LIFETIME_SEC)]
    pub max_result_lifetime_sec: i64,

    /// Number of calculation worker threads.
    #[arg(short = 't', long = "threads", default_value_t = 2)]
    pub worker_threads: usize,

    /// Root directory holding `<dataset>/saved_models/<model>_{structure,weights}.{json,bin}`.
    #[arg(long = "models-path", default_value = "./experiments/")]
    pub plaintext_experiment_path: std::path::PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_with_no_arguments() {
        let args = ServerArgs::parse_from(["hecnn-server"]);
        assert_eq!(args.port, 9999);
        assert_eq!(args.max_concurrent_queries, 128);
        assert_eq!(args.max_result_lifetime_sec, DEFAULT_RESULT_LIFETIME_SEC);
    }

    #[test]
    fn short_flags_override_defaults() {
        let args = ServerArgs::parse_from(["hecnn-server", "-p", "8080", "-q", "64", "-r", "32", "-l", "10"]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.max_concurrent_queries, 64);
        assert_eq!(args.max_results, 32);
        assert_eq!(args.max_result_lifetime_sec, 10);
    }
}
