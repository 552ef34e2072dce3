use crate::commands::SourceArgs;
use clap::Args;
use geofeed_core::{BasicCredentials, ODataConfig, DEFAULT_NAMESPACE, DEFAULT_REALM};
use geofeed_odata::{configure_routes, ODataState};
use geofeed_query::EwkbDecoder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:8004", env = "GEOFEED_ADDRESS")]
    pub address: String,

    /// Public base URL used in @odata.context and @odata.id
    #[arg(long, default_value = "http://localhost:8004", env = "GEOFEED_ENDPOINT")]
    pub endpoint: String,

    /// Schema namespace of the metadata document
    #[arg(long, default_value = DEFAULT_NAMESPACE, env = "GEOFEED_NAMESPACE")]
    pub namespace: String,

    /// Username accepted on collection feeds
    #[arg(long, env = "GEOFEED_USERNAME")]
    pub username: String,

    /// Password accepted on collection feeds
    #[arg(long, env = "GEOFEED_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Realm announced in the Basic challenge
    #[arg(long, default_value = DEFAULT_REALM, env = "GEOFEED_REALM")]
    pub realm: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl ServeCommand {
    pub fn config(&self) -> anyhow::Result<ODataConfig> {
        let config = ODataConfig::new(
            self.namespace.clone(),
            &self.endpoint,
            BasicCredentials::new(self.username.clone(), self.password.clone()),
        )?
        .with_realm(self.realm.clone());

        Ok(config)
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = Arc::new(self.config()?);
        let source = self.source.build()?;

        let state = Arc::new(ODataState::new(
            config.clone(),
            source,
            Arc::new(EwkbDecoder),
        ));
        let app = configure_routes()
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&self.address).await?;
        info!(
            "OData service listening on {} (endpoint {}, namespace {})",
            self.address,
            config.endpoint(),
            config.namespace()
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("OData service exited");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeCommand,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from([
            "geofeed",
            "--username",
            "conwat",
            "--password",
            "password",
            "--feature-file",
            "depots.geojson",
        ])
        .unwrap();

        let config = cli.serve.config().unwrap();
        assert_eq!(config.namespace(), "ODataExperiments");
        assert_eq!(config.endpoint(), "http://localhost:8004");
        assert_eq!(config.realm(), "OData Experiments");
        assert_eq!(cli.serve.address, "127.0.0.1:8004");
        assert_eq!(cli.serve.source.feature_table, "depot");
        assert_eq!(cli.serve.source.feature_key, "identifier");
    }

    #[test]
    fn test_sources_are_mutually_exclusive() {
        let result = TestCli::try_parse_from([
            "geofeed",
            "--username",
            "conwat",
            "--password",
            "password",
            "--feature-file",
            "depots.geojson",
            "--database-url",
            "postgres://localhost/fleet",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_excluded_tables_accept_lists() {
        let cli = TestCli::try_parse_from([
            "geofeed",
            "--username",
            "conwat",
            "--password",
            "password",
            "--database-url",
            "postgres://localhost/fleet",
            "--exclude-table",
            "audit_log,staging",
            "--exclude-table",
            "scratch",
        ])
        .unwrap();

        assert_eq!(
            cli.serve.source.exclude_tables,
            vec!["audit_log", "staging", "scratch"]
        );
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let cli = TestCli::try_parse_from([
            "geofeed",
            "--username",
            "conwat",
            "--password",
            "password",
            "--feature-file",
            "depots.geojson",
            "--endpoint",
            "ftp://example.com",
        ])
        .unwrap();

        assert!(cli.serve.config().is_err());
    }
}
