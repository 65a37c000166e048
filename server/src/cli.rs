//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use ragctx_retrieval::config::DEFAULT_MAX_LENGTH;
use ragctx_retrieval::{
    BackendKind, EncoderConfig, RetrievalConfig, SearchConfig, SearchStrategy, DEFAULT_MODEL,
    DEFAULT_TOP_K,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ragctx")]
#[command(about = "Passage retrieval over a prebuilt vector index")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer one question and print the JSON response
    Ask {
        #[command(flatten)]
        index: IndexArgs,

        /// Number of passages to return
        #[arg(long, short, allow_negative_numbers = true)]
        k: Option<i64>,

        /// The question to retrieve context for
        question: String,
    },

    /// Serve line-delimited JSON requests over stdin/stdout
    Serve {
        #[command(flatten)]
        index: IndexArgs,
    },

    /// Load the index, check it against the encoder and print statistics
    Inspect {
        #[command(flatten)]
        index: IndexArgs,
    },
}

impl Command {
    pub fn index_args(&self) -> &IndexArgs {
        match self {
            Self::Ask { index, .. } | Self::Serve { index } | Self::Inspect { index } => index,
        }
    }
}

/// Options shared by every command that loads an index
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Directory holding manifest.json and passages.bin
    #[arg(long, short, env = "RAGCTX_INDEX", default_value = "vector_db")]
    pub index: PathBuf,

    /// Embedding model identifier
    #[arg(long, env = "RAGCTX_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Embedding backend (fastembed or hashing)
    #[arg(long, env = "RAGCTX_BACKEND", default_value = "fastembed")]
    pub backend: BackendKind,

    /// Output dimension of the hashing backend
    #[arg(long, env = "RAGCTX_DIMENSION", default_value_t = 384)]
    pub dimension: usize,

    /// Model cache directory
    #[arg(long, env = "RAGCTX_MODELS_PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Token limit; longer input is truncated
    #[arg(long, env = "RAGCTX_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Passages returned when a request has no k
    #[arg(long, env = "RAGCTX_DEFAULT_K", default_value_t = DEFAULT_TOP_K)]
    pub default_k: usize,

    /// Nearest-neighbor strategy (exact, hnsw or auto)
    #[arg(long, env = "RAGCTX_STRATEGY", default_value = "auto")]
    pub strategy: SearchStrategy,

    /// Passage count at which auto switches to HNSW
    #[arg(long, env = "RAGCTX_HNSW_MIN_PASSAGES", default_value_t = 20_000)]
    pub hnsw_min_passages: usize,
}

impl IndexArgs {
    pub fn to_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            index_dir: self.index.clone(),
            default_top_k: self.default_k,
            encoder: EncoderConfig {
                backend: self.backend,
                model: self.model.clone(),
                max_length: self.max_length,
                cache_dir: self.cache_dir.clone(),
                hashing_dimension: self.dimension,
                ..Default::default()
            },
            search: SearchConfig {
                strategy: self.strategy,
                hnsw_min_passages: self.hnsw_min_passages,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_defaults() {
        let cli = Cli::try_parse_from(["ragctx", "ask", "請問ETF是什麼？"]).unwrap();
        let Command::Ask { index, k, question } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(question, "請問ETF是什麼？");
        assert_eq!(k, None);

        let config = index.to_config();
        assert_eq!(config.default_top_k, 4);
        assert_eq!(config.encoder.model, "intfloat/multilingual-e5-small");
        assert_eq!(config.encoder.backend, BackendKind::FastEmbed);
        assert_eq!(config.search.strategy, SearchStrategy::Auto);
    }

    #[test]
    fn test_ask_negative_k_reaches_validation() {
        let cli = Cli::try_parse_from(["ragctx", "ask", "-k", "-2", "question"]).unwrap();
        let Command::Ask { k, .. } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(k, Some(-2));
    }

    #[test]
    fn test_serve_options() {
        let cli = Cli::try_parse_from([
            "ragctx",
            "serve",
            "--index",
            "/srv/faiss_db",
            "--backend",
            "hashing",
            "--dimension",
            "128",
            "--strategy",
            "exact",
            "--default-k",
            "6",
        ])
        .unwrap();

        let config = cli.command.index_args().to_config();
        assert_eq!(config.index_dir, PathBuf::from("/srv/faiss_db"));
        assert_eq!(config.encoder.backend, BackendKind::Hashing);
        assert_eq!(config.encoder.hashing_dimension, 128);
        assert_eq!(config.search.strategy, SearchStrategy::Exact);
        assert_eq!(config.default_top_k, 6);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["ragctx", "serve", "--backend", "openai"]).is_err());
    }

    #[test]
    fn test_every_index_option_reads_env() {
        use clap::CommandFactory;

        let command = Cli::command();
        let inspect = command
            .get_subcommands()
            .find(|c| c.get_name() == "inspect")
            .unwrap();
        for arg in inspect.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }
            let env = arg
                .get_env()
                .unwrap_or_else(|| panic!("--{} has no env fallback", id));
            assert!(env.to_string_lossy().starts_with("RAGCTX_"), "{}", id);
        }
    }
}
