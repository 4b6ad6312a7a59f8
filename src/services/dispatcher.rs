//! Builds one generation request and runs it in streaming or batched mode.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ResolvedOptions;
use crate::history::ConversationHistory;
use crate::models::{ChatMessage, RawResponse, RetrievedDocument};
use crate::services::llm::{GenerationRequest, LlmClient, LlmError};

const BASE_PROMPT: &str = "You are an AI assistant that is helpful, harmless, and honest. \
You answer questions using the user's own documents where they are relevant.";

const FORMAT_INSTRUCTION: &str =
    "Always format your responses in markdown. Be concise unless asked to elaborate.";

/// Who the assistant is told it is
#[derive(Debug, Clone, Default)]
pub struct Persona {
    pub role: Option<String>,
    pub work_context: Option<String>,
}

impl Persona {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    pub fn with_work_context(mut self, work_context: Option<String>) -> Self {
        self.work_context = work_context;
        self
    }

    pub fn system_prompt(&self) -> String {
        let mut sections = vec![BASE_PROMPT.to_string()];
        sections.extend(self.role.iter().map(|role| role.trim().to_string()));
        sections.extend(
            self.work_context
                .iter()
                .map(|context| context.trim().to_string()),
        );
        sections.push(FORMAT_INSTRUCTION.to_string());

        sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Retrieved documents as one block, separated by blank lines
pub fn format_context(retrieved: &[RetrievedDocument]) -> String {
    retrieved
        .iter()
        .map(RetrievedDocument::to_context_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_message(query: &str, retrieved: &[RetrievedDocument]) -> String {
    format!(
        "Consider the following context:\n\n{}\n\nNow, please respond to this query: {query}",
        format_context(retrieved)
    )
}

/// Result of one dispatch.
///
/// A failed remote call still produces a response: its text is the error
/// message and `remote_error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub response: RawResponse,
    pub remote_error: Option<String>,
}

impl Dispatched {
    fn failed(error: LlmError) -> Self {
        let message = error.to_string();
        Self {
            response: RawResponse::Text(message.clone()),
            remote_error: Some(message),
        }
    }
}

pub struct Dispatcher {
    client: Arc<dyn LlmClient>,
    persona: Persona,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn LlmClient>, persona: Persona) -> Self {
        Self { client, persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Assemble the request without sending it
    pub fn build_request(
        &self,
        query: &str,
        history: &ConversationHistory,
        retrieved: &[RetrievedDocument],
        options: &ResolvedOptions,
    ) -> GenerationRequest {
        let mut messages: Vec<ChatMessage> = history
            .context_slice()
            .iter()
            .flat_map(|turn| turn.to_messages())
            .collect();
        messages.push(ChatMessage::user(build_user_message(query, retrieved)));

        GenerationRequest {
            system_prompt: self.persona.system_prompt(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    /// Send the query and wait for the complete reply.
    ///
    /// In streaming mode `on_fragment` sees every fragment as it arrives;
    /// in batched mode it is never called.
    pub async fn dispatch<F>(
        &self,
        query: &str,
        history: &ConversationHistory,
        retrieved: &[RetrievedDocument],
        options: &ResolvedOptions,
        on_fragment: F,
    ) -> Dispatched
    where
        F: FnMut(&str),
    {
        let request = self.build_request(query, history, retrieved, options);
        info!(
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            stream = options.stream,
            history_turns = history.context_slice().len(),
            documents = retrieved.len(),
            "Sending generation request"
        );

        let result = if options.stream {
            self.stream(&request, on_fragment).await
        } else {
            self.client.generate(&request).await
        };

        match result {
            Ok(response) => Dispatched {
                response,
                remote_error: None,
            },
            Err(e) => {
                warn!(error = %e, "Generation failed, returning error text as the reply");
                Dispatched::failed(e)
            }
        }
    }

    async fn stream<F>(
        &self,
        request: &GenerationRequest,
        mut on_fragment: F,
    ) -> Result<RawResponse, LlmError>
    where
        F: FnMut(&str),
    {
        let mut stream = self.client.generate_stream(request).await?;
        let mut text = String::new();
        let mut fragments = 0usize;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            text.push_str(&fragment);
            fragments += 1;
        }

        debug!(fragments, characters = text.len(), "Stream finished");
        Ok(RawResponse::Text(text))
    }
}
