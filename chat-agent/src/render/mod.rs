use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clients::Message;

pub const TEXT_KIND: &str = "text";
pub const AGENT_LABEL: &str = "The Agent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => TEXT_KIND,
        }
    }
}

pub fn decompose(message: &Message) -> Vec<ContentBlock> {
    vec![ContentBlock::text(message.content())]
}

pub trait BlockRenderer: Send + Sync {
    /// Returns the text to write for `block`, or `None` to write nothing.
    fn render(&self, block: &ContentBlock) -> Option<String>;
}

pub struct TextRenderer {
    label: String,
}

impl TextRenderer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(AGENT_LABEL)
    }
}

impl BlockRenderer for TextRenderer {
    fn render(&self, block: &ContentBlock) -> Option<String> {
        match block {
            ContentBlock::Text { text } => {
                Some(format!("{}: {}\n", self.label.bright_yellow(), text))
            }
        }
    }
}

#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<&'static str, Box<dyn BlockRenderer>>,
}

impl RendererRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(TEXT_KIND, Box::new(TextRenderer::default()));
        registry
    }

    pub fn register(&mut self, kind: &'static str, renderer: Box<dyn BlockRenderer>) {
        self.renderers.insert(kind, renderer);
    }

    pub fn render(&self, blocks: &[ContentBlock]) -> String {
        let mut out = String::new();
        for block in blocks {
            match self.renderers.get(block.kind()) {
                Some(renderer) => {
                    if let Some(rendered) = renderer.render(block) {
                        out.push_str(&rendered);
                    }
                }
                None => tracing::trace!(kind = block.kind(), "no renderer for content block"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl BlockRenderer for Shout {
        fn render(&self, block: &ContentBlock) -> Option<String> {
            match block {
                ContentBlock::Text { text } => Some(text.to_uppercase()),
            }
        }
    }

    #[test]
    fn test_decompose_single_text_block() {
        let blocks = decompose(&Message::assistant("hello"));
        assert_eq!(blocks, vec![ContentBlock::text("hello")]);
        assert_eq!(blocks[0].kind(), TEXT_KIND);
    }

    #[test]
    fn test_text_block_wire_shape() {
        let value = serde_json::to_value(ContentBlock::text("hello")).unwrap();
        assert_eq!(value, serde_json::json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_default_registry_renders_text_once() {
        let registry = RendererRegistry::with_defaults();
        let rendered = registry.render(&decompose(&Message::assistant("hello")));

        assert_eq!(rendered.matches("hello").count(), 1);
        assert!(rendered.contains(AGENT_LABEL));
        assert!(rendered.ends_with("hello\n"));
    }

    #[test]
    fn test_unregistered_kind_renders_nothing() {
        let registry = RendererRegistry::empty();
        assert_eq!(registry.render(&[ContentBlock::text("ignored")]), "");
    }

    #[test]
    fn test_register_overrides_kind() {
        let mut registry = RendererRegistry::with_defaults();
        registry.register(TEXT_KIND, Box::new(Shout));

        let rendered = registry.render(&[ContentBlock::text("a"), ContentBlock::text("b")]);
        assert_eq!(rendered, "AB");
    }
}
