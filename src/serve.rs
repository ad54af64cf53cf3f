//! Delivery of chart pages: written to a file or served over HTTP

use crate::html_output::ChartPage;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the page as a standalone HTML file
pub fn save_page(path: impl AsRef<Path>, page: &ChartPage) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, page.to_html())
        .with_context(|| format!("Failed to write chart page: {}", path.display()))?;
    info!("Wrote charts page to {}", path.display());
    Ok(())
}

#[cfg(feature = "serve")]
pub use server::{router, ChartServer};

#[cfg(feature = "serve")]
mod server {
    use super::*;
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;
    use std::future::Future;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// Router serving the rendered page on `/`
    pub fn router(html: Arc<String>) -> Router {
        Router::new().route(
            "/",
            get(move || {
                let html = Arc::clone(&html);
                async move { Html(html.as_str().to_owned()) }
            }),
        )
    }

    /// HTTP server for one rendered chart page
    ///
    /// The page is rendered once up front; every request gets the same bytes.
    pub struct ChartServer {
        bind: String,
        html: Arc<String>,
    }

    impl ChartServer {
        pub fn new(bind: impl Into<String>, page: &ChartPage) -> Self {
            Self {
                bind: bind.into(),
                html: Arc::new(page.to_html()),
            }
        }

        pub fn bind_addr(&self) -> &str {
            &self.bind
        }

        /// Serve until Ctrl-C
        pub fn serve(self) -> Result<()> {
            let runtime = runtime()?;
            runtime.block_on(async move {
                let listener = TcpListener::bind(&self.bind)
                    .await
                    .with_context(|| format!("Failed to bind {}", self.bind))?;
                run(listener, self.html, shutdown_signal()).await
            })
        }

        /// Serve on an already bound listener until `shutdown` resolves
        pub fn serve_listener<F>(self, listener: std::net::TcpListener, shutdown: F) -> Result<()>
        where
            F: Future<Output = ()> + Send + 'static,
        {
            listener
                .set_nonblocking(true)
                .context("Failed to configure listener")?;
            let runtime = runtime()?;
            runtime.block_on(async move {
                let listener =
                    TcpListener::from_std(listener).context("Failed to register listener")?;
                run(listener, self.html, shutdown).await
            })
        }
    }

    fn runtime() -> Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")
    }

    async fn run<F>(listener: TcpListener, html: Arc<String>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;
        info!("Serving charts page at http://{}/", addr);
        axum::serve(listener, router(html))
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;
        info!("Chart server stopped");
        Ok(())
    }

    async fn shutdown_signal() {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; serve until the process is killed
            std::future::pending::<()>().await;
        }
    }
}
