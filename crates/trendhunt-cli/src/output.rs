//! JSON-lines persistence for finished products.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use trendhunt_core::{ProductSink, ScoredProduct, SinkError};

/// Writes one JSON object per line, flushing after every record so a
/// cancelled run still leaves complete lines behind.
pub(crate) struct JsonLinesSink {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesSink {
    pub(crate) fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    /// Creates (or truncates) `path`.
    pub(crate) async fn create(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::from_writer(Box::new(file)))
    }

    fn from_writer(writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl ProductSink for JsonLinesSink {
    async fn emit(&self, product: &ScoredProduct) -> Result<(), SinkError> {
        let fail = |reason: String| SinkError {
            title: product.title.clone(),
            reason,
        };

        let mut line = serde_json::to_vec(product).map_err(|e| fail(e.to_string()))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| fail(e.to_string()))?;
        writer.flush().await.map_err(|e| fail(e.to_string()))
    }
}
