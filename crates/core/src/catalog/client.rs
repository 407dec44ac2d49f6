use std::future::Future;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::{image, Catalog, ImageProbe, ProbeStatus};
use crate::{config::AppConfig, models::CatalogItem};

/// Events emitted by the background catalog fetch.
#[derive(Debug)]
pub enum CatalogEvent {
    /// The catalog was fetched and decoded.
    Loaded(Catalog),
    /// The fetch failed. It is not retried.
    Error(anyhow::Error),
}

/// Talks to the store API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    image_extensions: Vec<String>,
}

impl CatalogClient {
    /// Create a client from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            image_extensions: config.image_extensions.clone(),
        })
    }

    /// URL of the laptop listing.
    pub fn catalog_url(&self) -> String {
        format!("{}/computers", self.base_url)
    }

    /// Fetch and decode the full laptop listing.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let url = self.catalog_url();
        let items: Vec<CatalogItem> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to request {url}"))?
            .error_for_status()
            .with_context(|| format!("catalog request to {url} failed"))?
            .json()
            .await
            .context("failed to decode catalog response")?;

        let catalog = Catalog::from_items(items);
        info!(total = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }

    /// Fetch the catalog once and report the outcome on `sender`.
    pub async fn run(self, sender: mpsc::Sender<CatalogEvent>) -> Result<()> {
        let event = match self.fetch_catalog().await {
            Ok(catalog) => CatalogEvent::Loaded(catalog),
            Err(err) => {
                error!(?err, "Catalog fetch failed");
                CatalogEvent::Error(err)
            }
        };

        sender
            .send(event)
            .await
            .context("failed to send catalog event")?;
        Ok(())
    }

    /// Find a displayable image URL for `item`.
    pub async fn resolve_image(&self, item: &CatalogItem) -> Option<String> {
        image::resolve_image(self, &self.base_url, &self.image_extensions, item).await
    }
}

impl ImageProbe for CatalogClient {
    fn probe(&self, url: &str) -> impl Future<Output = Result<ProbeStatus>> + Send {
        let request = self.http.get(url);
        let url = url.to_string();
        async move {
            let response = request
                .send()
                .await
                .with_context(|| format!("failed to request {url}"))?;
            let status = response.status();
            Ok(if status.is_success() {
                ProbeStatus::Found
            } else if status == StatusCode::NOT_FOUND {
                ProbeStatus::NotFound
            } else {
                ProbeStatus::Other(status.as_u16())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    const CATALOG_JSON: &str = r#"[
        {"id": 3, "title": "Gamma", "price": 700, "image": "assets/images/3.png", "specs": ["8GB"]},
        {"id": 1, "title": "Alpha", "price": 199.99, "image": "assets/images/1.png"},
        {"id": 3, "title": "Gamma again", "price": 1, "image": "assets/images/3.png"},
        {"id": 2, "title": "Beta", "price": 450, "image": "assets/images/2.jpg", "stock": 4, "active": true}
    ]"#;

    /// Answer a single HTTP request on a local port with `body` as JSON.
    async fn serve_once(body: &'static str) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(read) => request.extend_from_slice(&buf[..read]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        Ok(format!("http://{addr}"))
    }

    #[test]
    fn catalog_url_ignores_trailing_slash() -> Result<()> {
        let config = AppConfig {
            api_base_url: "http://localhost:3000/".to_string(),
            ..AppConfig::default()
        };
        let client = CatalogClient::new(&config)?;
        assert_eq!(client.catalog_url(), "http://localhost:3000/computers");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_keeps_server_order_and_drops_duplicate_ids() -> Result<()> {
        let config = AppConfig {
            api_base_url: serve_once(CATALOG_JSON).await?,
            ..AppConfig::default()
        };
        let client = CatalogClient::new(&config)?;

        let catalog = client.fetch_catalog().await?;
        let ids: Vec<_> = catalog.items().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        let items = catalog.items();
        assert_eq!(items[0].title, "Gamma");
        assert_eq!(items[0].specs, vec!["8GB"]);
        assert_eq!(items[1].price, Money::from_cents(19_999));
        assert_eq!(items[2].stock, Some(4));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_api_reports_error_event() -> Result<()> {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            ..AppConfig::default()
        };
        let client = CatalogClient::new(&config)?;
        let (tx, mut rx) = mpsc::channel(1);
        client.run(tx).await?;
        assert!(matches!(rx.recv().await, Some(CatalogEvent::Error(_))));
        Ok(())
    }
}
