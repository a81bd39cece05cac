//! Agent runner
//!
//! The step scheduler driving the Director → ToolDispatch → Validation cycle
//! for one session. One run is strictly sequential; many agents (sessions)
//! run concurrently because each owns its memory and run state outright.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::agent::events::{Event, ProgressSink, RunEvent, RunResult, Section};
use crate::agent::memory::ConversationMemory;
use crate::core::{Config, InsulaError, Message, Result, ToolCallRequest};
use crate::extract::{ExtractorEvent, SectionExtractor};
use crate::llm::{format_context, HttpGateway, ModelGateway, Retriever};
use crate::tools::{CodeRunnerTool, ToolRegistry};

/// Fallback when the validation model call fails
const REFINE_MESSAGE: &str =
    "I wasn't able to complete the request. Please refine your query and try again.";

/// Fallback when a turn produces no text at all
const EMPTY_MESSAGE: &str = "I apologize, but I couldn't generate a response.";

/// Ephemeral state scoped to one run, destroyed at the terminal event
struct RunState {
    /// Incremental section recognition over the response stream
    extractor: SectionExtractor,
    /// Sections closed so far, in order
    sections: Vec<Section>,
    /// Tool-dispatch rounds executed
    rounds: usize,
}

impl RunState {
    fn new(tags: &[String]) -> Self {
        Self {
            extractor: SectionExtractor::new(tags.iter().cloned()),
            sections: Vec::new(),
            rounds: 0,
        }
    }

    /// Feed a delta through the extractor, forwarding events to the observer
    fn feed(&mut self, delta: &str, sink: &ProgressSink) {
        for event in self.extractor.feed(delta) {
            match event {
                ExtractorEvent::Section { tag, content } => {
                    sink.section(&tag, &content);
                    self.sections.push(Section { tag, content });
                }
                ExtractorEvent::Progress { delta } => sink.delta(delta),
            }
        }
    }

    fn into_result(self, response: String) -> RunResult {
        RunResult {
            response,
            sections: self.sections,
            rounds: self.rounds,
        }
    }
}

/// An agent session: configuration, gateway, tools, and conversation memory
pub struct Agent {
    config: Config,
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolRegistry>,
    retriever: Option<Arc<dyn Retriever>>,
    memory: ConversationMemory,
}

impl Agent {
    /// Create an agent from configuration, wiring the HTTP gateway and the
    /// default tool set
    pub fn from_config(config: Config) -> Self {
        let gateway = Arc::new(HttpGateway::from_config(&config.gateway));

        let mut tools = ToolRegistry::new();
        if config.sandbox.enabled {
            tools.register(Arc::new(CodeRunnerTool::from_config(&config.sandbox)));
        }

        Self::new(config, gateway, Arc::new(tools))
    }

    /// Create an agent with explicit gateway and tools
    pub fn new(config: Config, gateway: Arc<dyn ModelGateway>, tools: Arc<ToolRegistry>) -> Self {
        let memory = match &config.agent.system_prompt {
            Some(prompt) => ConversationMemory::with_system_prompt(prompt.clone()),
            None => ConversationMemory::new(),
        };

        Self {
            config,
            gateway,
            tools,
            retriever: None,
            memory,
        }
    }

    /// Attach a document retriever
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the conversation length
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Get a snapshot of the conversation memory
    pub fn memory_snapshot(&self) -> Vec<Message> {
        self.memory.get()
    }

    /// Reset conversation memory between runs (keeps the system prompt)
    pub fn reset_memory(&mut self) {
        self.memory.reset();
    }

    /// Run to completion, discarding progress events
    pub async fn run(&mut self, input: &str) -> Result<RunResult> {
        self.run_inner(input, ProgressSink::disabled()).await
    }

    /// Run to completion, streaming progress events to the given channel
    ///
    /// Delivery is best-effort: if the receiver lags or is dropped, events
    /// are discarded and the run continues.
    pub async fn run_with_events(
        &mut self,
        input: &str,
        events: mpsc::Sender<RunEvent>,
    ) -> Result<RunResult> {
        self.run_inner(input, ProgressSink::new(events)).await
    }

    async fn run_inner(&mut self, input: &str, sink: ProgressSink) -> Result<RunResult> {
        let timeout_secs = self.config.agent.run_timeout_secs;
        let deadline = Duration::from_secs(timeout_secs);

        match tokio::time::timeout(deadline, self.drive(input, &sink)).await {
            Ok(result) => result,
            Err(_) => Err(InsulaError::Timeout(timeout_secs)),
        }
    }

    /// Dispatch events to steps until a step returns the terminal event
    async fn drive(&mut self, input: &str, sink: &ProgressSink) -> Result<RunResult> {
        let mut state = RunState::new(&self.config.agent.section_tags);
        let mut event = Event::Start {
            input: input.to_string(),
        };

        loop {
            event = match event {
                Event::Start { input } => self.director(&input, &mut state, sink).await?,
                Event::ToolDispatch { requests, round } => {
                    self.dispatch_step(requests, round, &mut state, sink).await?
                }
                Event::Validate { round } => self.validate_step(round, &mut state, sink).await?,
                Event::Stop { response } => {
                    let response = if response.is_empty() {
                        EMPTY_MESSAGE.to_string()
                    } else {
                        response
                    };
                    let result = state.into_result(response);
                    info!(
                        rounds = result.rounds,
                        sections = result.sections.len(),
                        "run complete"
                    );
                    return Ok(result);
                }
            };
        }
    }

    /// Director step: compose the prompt, call the model, route on tool calls
    async fn director(
        &mut self,
        input: &str,
        state: &mut RunState,
        sink: &ProgressSink,
    ) -> Result<Event> {
        sink.status("Starting query processing...");

        let prompt = match &self.retriever {
            Some(retriever) => {
                sink.status("Retrieving relevant documents...");
                let chunks = retriever.retrieve(input).await?;
                format!("{}\n\n{}", input, format_context(&chunks))
            }
            None => input.to_string(),
        };

        self.memory.put(Message::user(prompt));

        if self.tools.is_empty() {
            return self.director_streaming(state, sink).await;
        }

        let response = self
            .gateway
            .chat_with_tools(&self.memory.get(), &self.tools.definitions())
            .await?;

        state.feed(&response.content, sink);
        self.memory.put(Message::assistant(&response.content));

        if response.wants_tools() {
            info!(count = response.tool_calls.len(), "model requested tools");
            return Ok(Event::ToolDispatch {
                requests: response.tool_calls,
                round: 0,
            });
        }

        Ok(Event::Stop {
            response: response.content,
        })
    }

    /// Streaming variant of the director for agents without tools
    async fn director_streaming(
        &mut self,
        state: &mut RunState,
        sink: &ProgressSink,
    ) -> Result<Event> {
        let mut stream = self.gateway.stream_complete(&self.memory.get()).await?;
        let mut full_response = String::new();

        while let Some(delta) = stream.next().await {
            let delta = delta?;
            full_response.push_str(&delta);
            state.feed(&delta, sink);
        }

        self.memory.put(Message::assistant(&full_response));
        Ok(Event::Stop {
            response: full_response,
        })
    }

    /// ToolDispatch step: execute the batch, record every result in memory
    async fn dispatch_step(
        &mut self,
        requests: Vec<ToolCallRequest>,
        round: usize,
        state: &mut RunState,
        sink: &ProgressSink,
    ) -> Result<Event> {
        sink.status(format!("Executing {} tool call(s)...", requests.len()));

        let results = self.tools.dispatch(&requests).await;
        state.rounds += 1;

        for result in results {
            sink.tool_result(&result.tool_name, result.success);
            self.memory
                .put(Message::tool(&result.id, &result.tool_name, &result.output));
        }

        Ok(Event::Validate { round })
    }

    /// Validation step: re-submit tool output to the model for review
    ///
    /// The only step that catches gateway errors; a transport failure here
    /// becomes a graceful terminal message instead of failing the run.
    async fn validate_step(
        &mut self,
        round: usize,
        state: &mut RunState,
        sink: &ProgressSink,
    ) -> Result<Event> {
        sink.status("Reviewing tool results...");

        let response = match self
            .gateway
            .chat_with_tools(&self.memory.get(), &self.tools.definitions())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "validation call failed");
                self.memory.put(Message::assistant(REFINE_MESSAGE));
                return Ok(Event::Stop {
                    response: REFINE_MESSAGE.to_string(),
                });
            }
        };

        state.feed(&response.content, sink);
        self.memory.put(Message::assistant(&response.content));

        if response.wants_tools() {
            let next_round = round + 1;
            if next_round >= self.config.agent.max_tool_rounds {
                // Give up with whatever the model said last rather than
                // looping forever.
                warn!(rounds = next_round, "tool round limit reached");
                return Ok(Event::Stop {
                    response: response.content,
                });
            }

            return Ok(Event::ToolDispatch {
                requests: response.tool_calls,
                round: next_round,
            });
        }

        Ok(Event::Stop {
            response: response.content,
        })
    }
}
