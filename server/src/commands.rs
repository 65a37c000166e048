//! Command implementations behind the `ragctx` binary

use crate::error::ServerResult;
use crate::transport::StdioServer;
use ragctx_retrieval::{RetrievalConfig, RetrieveOutcome, RetrieveRequest, Retriever, ServiceContext};
use std::sync::Arc;

/// Build the service context off the async runtime; model loading blocks
pub async fn load_retriever(config: RetrievalConfig) -> ServerResult<Retriever> {
    tracing::info!("Loading index from {}", config.index_dir.display());
    let context = tokio::task::spawn_blocking(move || ServiceContext::load(&config)).await??;
    tracing::info!(
        "Ready: {} passages, {}d, model {}",
        context.index().len(),
        context.index().dimension(),
        context.encoder().model_id()
    );
    Ok(Retriever::new(Arc::new(context)))
}

/// Answer a single question
pub async fn ask(
    config: RetrievalConfig,
    question: String,
    k: Option<i64>,
) -> ServerResult<RetrieveOutcome> {
    let retriever = load_retriever(config).await?;
    let request = RetrieveRequest { question: Some(question), k };
    Ok(tokio::task::spawn_blocking(move || retriever.handle(&request)).await?)
}

/// Exit status for a finished `ask`
pub fn exit_status(outcome: &RetrieveOutcome) -> u8 {
    match outcome.status {
        200 => 0,
        400 => 2,
        _ => 1,
    }
}

/// Serve stdio until input closes
pub async fn serve(config: RetrievalConfig) -> ServerResult<()> {
    let retriever = load_retriever(config).await?;
    StdioServer::new(retriever).run().await
}

/// Load everything a `serve` would and describe it
pub async fn inspect(config: RetrievalConfig) -> ServerResult<serde_json::Value> {
    let summary = serde_json::to_value(&config)?;
    let retriever = load_retriever(config).await?;
    let context = retriever.context();

    Ok(serde_json::json!({
        "config": summary,
        "encoder": {
            "model": context.encoder().model_id(),
            "dimension": context.encoder().dimension(),
        },
        "index": context.index().stats(),
        "defaultTopK": context.default_top_k(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragctx_retrieval::{
        BackendKind, IndexSnapshot, Metric, Passage, RetrievalError, RetrieveResponse,
        TextEncoder,
    };
    use tempfile::TempDir;

    fn fixture(tmp: &TempDir) -> RetrievalConfig {
        let mut config = RetrievalConfig {
            index_dir: tmp.path().join("vector_db"),
            ..Default::default()
        };
        config.encoder.backend = BackendKind::Hashing;
        config.encoder.hashing_dimension = 96;

        let encoder = TextEncoder::from_config(&config.encoder).unwrap();
        let passages = ["ETF是指數股票型基金", "債券基金投資公債", "房貸利率", "保險"]
            .iter()
            .map(|t| Passage::new(*t))
            .collect();
        IndexSnapshot::embed(&encoder, Metric::Cosine, passages)
            .unwrap()
            .write_to(&config.index_dir)
            .unwrap();
        config
    }

    #[tokio::test]
    async fn test_ask() {
        let tmp = TempDir::new().unwrap();
        let config = fixture(&tmp);

        let outcome = ask(config.clone(), "ETF是什麼？".to_string(), Some(3))
            .await
            .unwrap();
        assert_eq!(exit_status(&outcome), 0);
        match outcome.body {
            RetrieveResponse::Success { context, .. } => assert_eq!(context.len(), 3),
            other => panic!("unexpected body: {:?}", other),
        }

        let outcome = ask(config.clone(), "  ".to_string(), None).await.unwrap();
        assert_eq!(exit_status(&outcome), 2);

        let outcome = ask(config, "ETF".to_string(), Some(0)).await.unwrap();
        assert_eq!(exit_status(&outcome), 2);
    }

    #[tokio::test]
    async fn test_missing_index_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = RetrievalConfig {
            index_dir: tmp.path().join("nowhere"),
            ..Default::default()
        };
        config.encoder.backend = BackendKind::Hashing;

        let err = load_retriever(config).await.err().unwrap();
        assert!(matches!(
            err,
            crate::ServerError::Retrieval(RetrievalError::IndexLoad { .. })
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_inspect() {
        let tmp = TempDir::new().unwrap();
        let config = fixture(&tmp);

        let report = inspect(config).await.unwrap();
        assert_eq!(report["encoder"]["dimension"], 96);
        assert_eq!(report["index"]["passages"], 4);
        assert_eq!(report["defaultTopK"], 4);
        assert_eq!(report["config"]["encoder"]["backend"], "hashing");
    }
}
