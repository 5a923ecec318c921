//! Blob-to-viewable rendering strategies.
//!
//! The panel shows PDFs inline in a browser-hosted view, and no single
//! embedding method works across every browser and storage setup. Rendering
//! is therefore an ordered fallback chain: each [`EmbedStrategy`] turns
//! "object at key K" into an HTML fragment, and [`render_with_fallback`]
//! walks the chain until one succeeds, recording which strategy produced the
//! view. When every strategy fails the result is an inline error placeholder
//! — one broken document never takes down the rest of the panel.
//!
//! Built-in strategies, in default order:
//!
//! | Name | Method |
//! |------|--------|
//! | `base64-embed` | `<embed>` with a base64 data URL |
//! | `base64-object` | `<object>` with a base64 data URL |
//! | `pdfjs-viewer` | PDF.js viewer iframe over a presigned URL |
//! | `presigned-frame` | `<iframe>` pointing at a presigned URL |
//! | `presigned-embed` | `<embed>` pointing at a presigned URL |

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::storage::{uri_encode, ObjectStore, StorageError};

/// Names of the built-in strategies, in default chain order.
pub const STRATEGY_NAMES: [&str; 5] = [
    "base64-embed",
    "base64-object",
    "pdfjs-viewer",
    "presigned-frame",
    "presigned-embed",
];

/// One way of turning a stored blob into an inline-viewable HTML fragment.
#[async_trait]
pub trait EmbedStrategy: Send + Sync {
    /// Strategy identifier recorded on success (e.g. `"base64-embed"`).
    fn name(&self) -> &'static str;

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError>;
}

/// Result of driving the fallback chain for one document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedView {
    pub html: String,
    /// Strategy that produced the view; `None` when every strategy failed
    /// and `html` is the error placeholder.
    pub strategy: Option<String>,
}

/// Build the strategy chain named by the viewer configuration.
pub fn build_strategies(names: &[String], url_ttl_secs: u64) -> Vec<Box<dyn EmbedStrategy>> {
    names
        .iter()
        .filter_map(|name| strategy_by_name(name, url_ttl_secs))
        .collect()
}

fn strategy_by_name(name: &str, url_ttl_secs: u64) -> Option<Box<dyn EmbedStrategy>> {
    match name {
        "base64-embed" => Some(Box::new(Base64Embed)),
        "base64-object" => Some(Box::new(Base64Object)),
        "pdfjs-viewer" => Some(Box::new(PdfJsViewer { url_ttl_secs })),
        "presigned-frame" => Some(Box::new(PresignedFrame { url_ttl_secs })),
        "presigned-embed" => Some(Box::new(PresignedEmbed { url_ttl_secs })),
        _ => None,
    }
}

/// Try each strategy in order; the first success wins.
///
/// A total failure yields an inline placeholder instead of an error so the
/// other comparison pane and the rest of the session stay usable.
pub async fn render_with_fallback(
    strategies: &[Box<dyn EmbedStrategy>],
    store: &dyn ObjectStore,
    key: &str,
) -> RenderedView {
    let mut last_error = None;
    for strategy in strategies {
        match strategy.render(store, key).await {
            Ok(html) => {
                tracing::debug!(strategy = strategy.name(), %key, "rendered document view");
                return RenderedView {
                    html,
                    strategy: Some(strategy.name().to_string()),
                };
            }
            Err(err) => {
                tracing::warn!(strategy = strategy.name(), %key, error = %err, "embed strategy failed");
                last_error = Some(err);
            }
        }
    }
    RenderedView {
        html: error_placeholder(key, last_error.as_ref()),
        strategy: None,
    }
}

// ============ Built-in strategies ============

/// `<embed>` element carrying the whole document as a base64 data URL.
struct Base64Embed;

#[async_trait]
impl EmbedStrategy for Base64Embed {
    fn name(&self) -> &'static str {
        "base64-embed"
    }

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
        let bytes = store.read_blob(key).await?;
        let encoded = BASE64.encode(bytes);
        Ok(format!(
            r#"<div style="width:100%; height:60vh;">
  <embed type="application/pdf" src="data:application/pdf;base64,{}" width="100%" height="100%" style="border: 1px solid #ddd; border-radius: 4px;" />
</div>"#,
            encoded
        ))
    }
}

/// `<object>` element with a data URL; some browsers render this where they
/// refuse a data-URL `<embed>`.
struct Base64Object;

#[async_trait]
impl EmbedStrategy for Base64Object {
    fn name(&self) -> &'static str {
        "base64-object"
    }

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
        let bytes = store.read_blob(key).await?;
        let encoded = BASE64.encode(bytes);
        Ok(format!(
            r#"<object type="application/pdf" data="data:application/pdf;base64,{}" width="100%" height="100%">
  <p>This browser cannot display the document inline.</p>
</object>"#,
            encoded
        ))
    }
}

/// Hosted PDF.js viewer loading the document from a presigned URL.
struct PdfJsViewer {
    url_ttl_secs: u64,
}

#[async_trait]
impl EmbedStrategy for PdfJsViewer {
    fn name(&self) -> &'static str {
        "pdfjs-viewer"
    }

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
        let url = store.signed_url(key, self.url_ttl_secs).await?;
        Ok(format!(
            r#"<iframe src="https://mozilla.github.io/pdf.js/web/viewer.html?file={}" width="100%" height="100%" style="border: none;"></iframe>"#,
            uri_encode(&url)
        ))
    }
}

/// Plain `<iframe>` over a presigned URL; relies on the browser's native
/// PDF plugin.
struct PresignedFrame {
    url_ttl_secs: u64,
}

#[async_trait]
impl EmbedStrategy for PresignedFrame {
    fn name(&self) -> &'static str {
        "presigned-frame"
    }

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
        let url = store.signed_url(key, self.url_ttl_secs).await?;
        Ok(format!(
            r#"<iframe src="{}" width="100%" height="100%" style="border: 1px solid #ddd;"></iframe>"#,
            escape_html(&url)
        ))
    }
}

/// `<embed>` over a presigned URL.
struct PresignedEmbed {
    url_ttl_secs: u64,
}

#[async_trait]
impl EmbedStrategy for PresignedEmbed {
    fn name(&self) -> &'static str {
        "presigned-embed"
    }

    async fn render(&self, store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
        let url = store.signed_url(key, self.url_ttl_secs).await?;
        Ok(format!(
            r#"<embed type="application/pdf" src="{}" width="100%" height="100%" />"#,
            escape_html(&url)
        ))
    }
}

// ============ Placeholder and escaping ============

fn error_placeholder(key: &str, error: Option<&StorageError>) -> String {
    let detail = error.map(|e| e.to_string()).unwrap_or_default();
    format!(
        r#"<div class="viewer-error" style="padding:20px; border:1px solid #ddd; background:#f9f9f9;">
  <h3>Error Loading Document</h3>
  <p>{}</p>
  <code>{}</code>
</div>"#,
        escape_html(key),
        escape_html(&detail)
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    struct AlwaysFails;

    #[async_trait]
    impl EmbedStrategy for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }
        async fn render(&self, _store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
            Err(StorageError::NotFound(key.to_string()))
        }
    }

    struct AlwaysRenders;

    #[async_trait]
    impl EmbedStrategy for AlwaysRenders {
        fn name(&self) -> &'static str {
            "always-renders"
        }
        async fn render(&self, _store: &dyn ObjectStore, _key: &str) -> Result<String, StorageError> {
            Ok("<div>ok</div>".to_string())
        }
    }

    #[tokio::test]
    async fn test_first_success_wins_and_is_recorded() {
        let strategies: Vec<Box<dyn EmbedStrategy>> =
            vec![Box::new(AlwaysRenders), Box::new(AlwaysFails)];
        let store = MemoryStore::new();

        let view = render_with_fallback(&strategies, &store, "CI/B001/B001_1.pdf").await;
        assert_eq!(view.strategy.as_deref(), Some("always-renders"));
        assert_eq!(view.html, "<div>ok</div>");
    }

    #[tokio::test]
    async fn test_fallback_skips_failing_strategy() {
        let strategies: Vec<Box<dyn EmbedStrategy>> =
            vec![Box::new(AlwaysFails), Box::new(AlwaysRenders)];
        let store = MemoryStore::new();

        let view = render_with_fallback(&strategies, &store, "CI/B001/B001_1.pdf").await;
        assert_eq!(view.strategy.as_deref(), Some("always-renders"));
    }

    #[tokio::test]
    async fn test_total_failure_yields_placeholder() {
        let strategies: Vec<Box<dyn EmbedStrategy>> =
            vec![Box::new(AlwaysFails), Box::new(AlwaysFails)];
        let store = MemoryStore::new();

        let view = render_with_fallback(&strategies, &store, "CI/B001/B001_1.pdf").await;
        assert!(view.strategy.is_none());
        assert!(view.html.contains("Error Loading Document"));
        assert!(view.html.contains("CI/B001/B001_1.pdf"));
    }

    #[tokio::test]
    async fn test_base64_embed_renders_stored_object() {
        let store = MemoryStore::new();
        store.insert("CI/B001/B001_1.pdf", b"%PDF-1.4 minimal".to_vec());

        let strategies = build_strategies(
            &STRATEGY_NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            900,
        );
        let view = render_with_fallback(&strategies, &store, "CI/B001/B001_1.pdf").await;
        assert_eq!(view.strategy.as_deref(), Some("base64-embed"));
        assert!(view.html.contains("data:application/pdf;base64,"));
    }

    #[tokio::test]
    async fn test_pdfjs_viewer_embeds_encoded_presigned_url() {
        let store = MemoryStore::new();
        store.insert("PL/B002/B002_1.pdf", b"%PDF-1.4".to_vec());

        let strategies = build_strategies(&["pdfjs-viewer".to_string()], 300);
        let view = render_with_fallback(&strategies, &store, "PL/B002/B002_1.pdf").await;
        assert_eq!(view.strategy.as_deref(), Some("pdfjs-viewer"));
        assert!(view.html.contains("pdf.js"));
        assert!(view.html.contains(&uri_encode("memory://PL/B002/B002_1.pdf?ttl=300")));
    }

    #[test]
    fn test_build_strategies_honors_configured_order() {
        let strategies = build_strategies(
            &["presigned-frame".to_string(), "base64-embed".to_string()],
            900,
        );
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["presigned-frame", "base64-embed"]);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&"), "&lt;a href=&quot;x&quot;&gt;&amp;");
    }
}
