use actix_web::*;
use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct HttpServerConfig {
    pub port: u16,
    pub bind_address: Option<String>,
    pub workers: Option<usize>,
}

impl HttpServerConfig {
    pub async fn run_server<F>(&self, scopes: F) -> anyhow::Result<()>
    where
        F: Fn() -> Vec<Scope> + Send + Clone + 'static,
    {
        let bind_address = self.bind_address.clone().unwrap_or_else(|| "0.0.0.0".to_string());

        let http_server = HttpServer::new(move || {
            let mut app = App::new().wrap(tracing_actix_web::TracingLogger::default());

            for scope in scopes() {
                app = app.service(scope);
            }

            app
        })
        .workers(self.workers.unwrap_or(1))
        .disable_signals()
        .bind((bind_address.as_str(), self.port))?;

        http_server
            .run()
            .await
            .with_context(|| format!("Error starting HTTP server on {}:{}", bind_address, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpServerConfig;

    #[test]
    fn config_with_port_only_uses_defaults() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.bind_address.is_none());
        assert!(config.workers.is_none());
    }

    #[test]
    fn config_accepts_explicit_bind_address_and_workers() {
        let config: HttpServerConfig =
            serde_json::from_str(r#"{"port": 9090, "bind_address": "127.0.0.1", "workers": 4}"#).unwrap();

        assert_eq!(config.bind_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.workers, Some(4));
    }
}
