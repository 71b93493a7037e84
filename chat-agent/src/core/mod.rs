use crate::clients::{LLMClient, LLMError, Message};
use crate::input::LineSource;
use crate::memory::Conversation;
use crate::render::{RendererRegistry, decompose};
use crate::tools::{ToolManager, default_tools};
use colored::Colorize;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

pub const BANNER: &str = "Chat with The Agent (use 'ctrl-c' to quit)";
pub const USER_LABEL: &str = "You";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Inference(#[from] LLMError),
    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),
    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

pub struct Agent<L, W> {
    client: Arc<dyn LLMClient>,
    tools: ToolManager,
    renderers: RendererRegistry,
    conversation: Conversation,
    lines: L,
    output: W,
}

impl<L, W> Agent<L, W>
where
    L: LineSource,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(client: Arc<dyn LLMClient>, lines: L, output: W) -> Self {
        Self {
            client,
            tools: default_tools(),
            renderers: RendererRegistry::with_defaults(),
            conversation: Conversation::new(),
            lines,
            output,
        }
    }

    pub fn with_tools(mut self, tools: ToolManager) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until the input ends or `cancel` fires while waiting for input.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), AgentError> {
        self.write(&format!("{BANNER}\n")).await?;

        loop {
            self.write(&format!("{}: ", USER_LABEL.bright_blue())).await?;

            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                line = self.lines.next_line() => line.map_err(AgentError::Input)?,
            };
            let Some(line) = line else {
                tracing::debug!(messages = self.conversation.len(), "input ended");
                break;
            };

            self.conversation.push(Message::user(line));

            let reply = self
                .client
                .complete(self.conversation.messages(), self.tools.definitions(), cancel)
                .await?;

            let rendered = self.renderers.render(&decompose(&reply));
            self.conversation.push(reply);
            self.write(&rendered).await?;
        }

        Ok(())
    }

    async fn write(&mut self, text: &str) -> Result<(), AgentError> {
        self.output
            .write_all(text.as_bytes())
            .await
            .map_err(AgentError::Output)?;
        self.output.flush().await.map_err(AgentError::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MessageRole, ModelInfo, ToolDefinition};
    use crate::input::ScriptedLines;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoClient {
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl LLMClient for EchoClient {
        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _cancel: &CancellationToken,
        ) -> Result<Message, LLMError> {
            self.seen.lock().unwrap().push(messages.len());
            let last = messages.last().map(Message::content).unwrap_or_default();
            Ok(Message::assistant(format!("echo: {last}")))
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                name: "echo".to_string(),
                max_tokens: 0,
            }
        }
    }

    #[tokio::test]
    async fn test_conversation_grows_across_turns() {
        let client = Arc::new(EchoClient {
            seen: Mutex::new(Vec::new()),
        });
        let mut agent = Agent::new(
            Arc::clone(&client) as Arc<dyn LLMClient>,
            ScriptedLines::new(["one", "two", "three"]),
            Vec::new(),
        );

        agent.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(*client.seen.lock().unwrap(), vec![1, 3, 5]);
        assert_eq!(agent.conversation().len(), 6);
        assert_eq!(agent.conversation().count_role(MessageRole::User), 3);
        assert_eq!(
            agent.conversation().last(),
            Some(&Message::assistant("echo: three"))
        );
    }

    #[tokio::test]
    async fn test_banner_and_replies_written() {
        let client = Arc::new(EchoClient {
            seen: Mutex::new(Vec::new()),
        });
        let mut agent = Agent::new(client, ScriptedLines::new(["ping"]), Vec::new());

        agent.run(&CancellationToken::new()).await.unwrap();

        let output = String::from_utf8(agent.into_output()).unwrap();
        assert!(output.starts_with(BANNER));
        assert_eq!(output.matches("echo: ping").count(), 1);
        assert_eq!(output.matches(USER_LABEL).count(), 2);
    }

    #[tokio::test]
    async fn test_reply_without_renderer_is_kept_but_not_printed() {
        let client = Arc::new(EchoClient {
            seen: Mutex::new(Vec::new()),
        });
        let mut agent = Agent::new(client, ScriptedLines::new(["ping"]), Vec::new())
            .with_renderers(RendererRegistry::empty());

        agent.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(agent.conversation().len(), 2);
        let output = String::from_utf8(agent.into_output()).unwrap();
        assert!(!output.contains("echo: ping"));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_input_ends_cleanly() {
        let client = Arc::new(EchoClient {
            seen: Mutex::new(Vec::new()),
        });
        let mut agent = Agent::new(client, ScriptedLines::new(["never read"]), Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        agent.run(&cancel).await.unwrap();

        assert!(agent.conversation().is_empty());
    }
}
