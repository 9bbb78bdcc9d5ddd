//! Builds the classifier and its collaborators from configuration.

use std::sync::Arc;

use smishguard_classifier::{KnownItemStore, SmishingClassifier};
use smishguard_common::SmishError;
use smishguard_config::Config;
use smishguard_embed::{EmbeddingGateway, GatewayConfig};
use smishguard_llm::{
    build_http_client, CachingTokenProvider, IamTokenProvider, TokenProvider,
    WatsonxEmbeddingClient, WatsonxGenerationClient,
};
use tracing::info;

/// Everything `main` needs after startup.
pub struct Components {
    pub classifier: Arc<SmishingClassifier>,
    pub bind: String,
}

pub fn build_components(config: Config) -> Result<Components, SmishError> {
    let Config { secrets, settings } = config;

    let known = KnownItemStore::load(
        &settings.known_items.messages_path,
        &settings.known_items.urls_path,
    )?;

    let client = build_http_client(settings.timeouts.http())
        .map_err(|e| SmishError::Config(format!("cannot build HTTP client: {e}")))?;

    let identity = IamTokenProvider::new(
        settings.watsonx.identity_url.clone(),
        secrets.api_key,
        client.clone(),
    );
    let tokens: Arc<dyn TokenProvider> = Arc::new(CachingTokenProvider::new(Arc::new(identity)));

    let generation = WatsonxGenerationClient::new(
        &secrets.cloud_url,
        settings.watsonx.deployment_id.clone(),
        &settings.watsonx.generation_api_version,
        tokens.clone(),
        client.clone(),
    );
    info!(endpoint = generation.endpoint(), "reasoning client ready");

    let embedder = WatsonxEmbeddingClient::new(
        &secrets.cloud_url,
        settings.watsonx.embedding_model.clone(),
        secrets.project_id,
        &settings.watsonx.embedding_api_version,
        tokens,
        client,
    );

    let gateway = EmbeddingGateway::new(
        GatewayConfig::default()
            .with_index_dir(settings.index.dir.clone())
            .with_build_command(settings.index.build_command.clone())
            .with_build_timeout(settings.timeouts.index_build()),
        Arc::new(embedder),
    );

    let classifier = SmishingClassifier::new(Arc::new(known), Arc::new(gateway), Arc::new(generation))
        .with_top_k(settings.retrieval.top_k);

    Ok(Components { classifier: Arc::new(classifier), bind: settings.server.bind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smishguard_config::{Secrets, Settings};

    fn secrets() -> Secrets {
        Secrets::from_lookup(|name| Some(format!("test-{name}"))).unwrap()
    }

    #[test]
    fn test_missing_known_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.known_items.messages_path = dir.path().join("absent_messages.txt");
        settings.known_items.urls_path = dir.path().join("absent_urls.txt");

        let err = build_components(Config { secrets: secrets(), settings })
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("absent_messages.txt"));
    }

    #[test]
    fn test_components_follow_settings() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("messages.txt");
        let urls = dir.path().join("urls.txt");
        std::fs::write(&messages, "pay the overdue toll now\n").unwrap();
        std::fs::write(&urls, "http://known-scam.biz/claim\nhttp://toll-pay.top\n").unwrap();

        let mut settings = Settings::default();
        settings.known_items.messages_path = messages;
        settings.known_items.urls_path = urls;
        settings.retrieval.top_k = 5;
        settings.server.bind = "127.0.0.1:8088".to_string();

        let components = build_components(Config { secrets: secrets(), settings }).unwrap();
        assert_eq!(components.bind, "127.0.0.1:8088");
        assert_eq!(components.classifier.top_k(), 5);
        assert_eq!(components.classifier.known().url_count(), 2);
        assert!(!components.classifier.gateway().is_ready());
    }
}
