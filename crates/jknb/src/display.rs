//! Rich display content.

use serde_json::{Map, Value, json};

use crate::error::Result;

/// A value that can produce rich display content for the host.
///
/// The produced value must be a JSON object; [`KernelBridge::display`] rejects
/// anything else after resolution. Producers that have the content at hand
/// return without suspending.
///
/// [`KernelBridge::display`]: crate::KernelBridge::display
#[async_trait::async_trait]
pub trait Displayable: Send + Sync {
    async fn to_display(&self) -> Result<Value>;
}

/// MIME bundle with optional per-type metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayMessage {
    data: Map<String, Value>,
    metadata: Map<String, Value>,
}

impl DisplayMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, mime: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(mime.into(), value.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_data("text/plain", text.into())
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.with_data("text/html", html.into())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait::async_trait]
impl Displayable for DisplayMessage {
    async fn to_display(&self) -> Result<Value> {
        Ok(json!({
            "data": self.data,
            "metadata": self.metadata,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundle_resolves_to_data_and_metadata() {
        let message = DisplayMessage::new()
            .with_text("x = 1")
            .with_html("<b>x</b> = 1")
            .with_metadata("isolated", true);

        let content = message.to_display().await.unwrap();
        assert_eq!(
            content,
            json!({
                "data": {"text/plain": "x = 1", "text/html": "<b>x</b> = 1"},
                "metadata": {"isolated": true},
            })
        );
    }

    #[tokio::test]
    async fn empty_bundle_is_still_an_object() {
        let message = DisplayMessage::new();
        assert!(message.is_empty());
        assert!(message.to_display().await.unwrap().is_object());
    }

    #[test]
    fn later_data_replaces_same_mime() {
        let message = DisplayMessage::new()
            .with_data("application/json", json!({"v": 1}))
            .with_data("application/json", json!({"v": 2}));
        assert_eq!(message.data().get("application/json"), Some(&json!({"v": 2})));
    }
}
