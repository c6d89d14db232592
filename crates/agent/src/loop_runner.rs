//! The agent reasoning loop implementation.

use std::sync::Arc;

use chrono::Utc;
use codewright_config::AppConfig;
use codewright_core::error::ProviderError;
use codewright_core::provider::{Provider, ProviderRequest};
use codewright_core::tool::{ToolArgs, ToolRegistry, ToolResult};
use codewright_core::{ChatMessage, ExecutionContext, Role};
use codewright_memory::MemoryStore;
use tracing::{debug, info, warn};

use crate::action::{self, ParsedAction};
use crate::event::{AgentEvent, OutputSink};
use crate::prompt;

pub const DEFAULT_MAX_TURNS: usize = 15;
pub const DEFAULT_CONTEXT_TOKENS: usize = 6000;
pub const DEFAULT_OBSERVATION_MAX_CHARS: usize = 8000;

const BUDGET_EXHAUSTED_REPLY: &str = "Maximum tool calls reached. Task may not be complete.";

/// How failed tool calls are charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Every executed action, failed or not, uses one turn.
    #[default]
    SharedBudget,
    /// Failed actions are free, but more than `max_retries` failures in a
    /// row end the run.
    SeparateBudget,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(FailurePolicy::SharedBudget),
            "separate" => Ok(FailurePolicy::SeparateBudget),
            other => Err(format!("unknown failure policy '{other}'")),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The model replied without an action.
    FinalAnswer,
    /// The turn budget ran out.
    BudgetExhausted,
    /// Too many consecutive tool failures under [`FailurePolicy::SeparateBudget`].
    FailureBudgetExhausted,
    /// The model call itself failed.
    ModelFailure(String),
}

/// The result of one [`AgentLoop::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Text for the user: the final answer, or an explanation of why the
    /// run stopped.
    pub reply: String,
    pub termination: Termination,
    /// Actions executed.
    pub turns: usize,
    /// Actions that failed.
    pub failures: usize,
}

enum LoopState {
    AwaitModel,
    Parse(String),
    ExecuteTool(ParsedAction),
    AppendObservation {
        action: ParsedAction,
        result: ToolResult,
        commit: Option<ToolResult>,
    },
    Done(Termination, String),
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Settings every tool call runs with
    ctx: ExecutionContext,

    /// Maximum actions per run
    max_turns: usize,

    failure_policy: FailurePolicy,

    /// Token budget for the history window sent to the model
    context_tokens: usize,

    /// Tool output longer than this is cut before it reaches the model
    observation_max_chars: usize,

    /// Consume replies as a stream of fragments
    stream: bool,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        ctx: ExecutionContext,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            ctx,
            max_turns: DEFAULT_MAX_TURNS,
            failure_policy: FailurePolicy::default(),
            context_tokens: DEFAULT_CONTEXT_TOKENS,
            observation_max_chars: DEFAULT_OBSERVATION_MAX_CHARS,
            stream: false,
        }
    }

    /// A loop configured from the `[agent]`, `[memory]` and model settings.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        ctx: ExecutionContext,
        config: &AppConfig,
    ) -> Self {
        let failure_policy = config.agent.failure_policy.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to the shared failure budget");
            FailurePolicy::default()
        });

        Self::new(provider, &config.model, tools, ctx)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_max_turns(config.agent.max_turns)
            .with_failure_policy(failure_policy)
            .with_context_tokens(config.memory.context_tokens)
            .with_observation_max_chars(config.agent.observation_max_chars)
            .with_streaming(config.stream)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool calls per run.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_context_tokens(mut self, tokens: usize) -> Self {
        self.context_tokens = tokens;
        self
    }

    pub fn with_observation_max_chars(mut self, max: usize) -> Self {
        self.observation_max_chars = max;
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.stream = enabled;
        self
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one user message: call the model, run the actions it asks
    /// for, and feed the results back until it answers without an action
    /// or a budget runs out.
    ///
    /// Every reply and observation is written to `memory` as soon as it is
    /// complete. A failed model call writes nothing.
    pub async fn run(&self, memory: &mut MemoryStore, user_input: &str, sink: &mut dyn OutputSink) -> RunOutcome {
        info!(
            model = %self.model,
            history = memory.len(),
            max_turns = self.max_turns,
            "Processing message"
        );

        memory.add(Role::User, user_input, serde_json::Map::new()).await;
        let system = prompt::system_prompt(&self.tools.describe(), Utc::now());

        let mut turns = 0usize;
        let mut failures = 0usize;
        let mut charged = 0usize;
        let mut consecutive_failures = 0u32;
        let mut state = LoopState::AwaitModel;

        let (termination, reply) = loop {
            state = match state {
                LoopState::AwaitModel => {
                    let window = latest_window(memory, self.context_tokens);
                    let messages = prompt::build_messages(&system, window);
                    debug!(turn = turns, messages = messages.len(), "Calling model");

                    match self.call_model(messages, sink).await {
                        Ok(reply) => {
                            memory.add(Role::Assistant, reply.as_str(), serde_json::Map::new()).await;
                            LoopState::Parse(reply)
                        }
                        Err(e) => {
                            warn!(error = %e, "Model call failed");
                            sink.emit(AgentEvent::Error { message: e.to_string() });
                            LoopState::Done(Termination::ModelFailure(e.to_string()), format!("Error: {e}"))
                        }
                    }
                }

                LoopState::Parse(reply) => {
                    if let Some(thought) = action::extract_thought(&reply) {
                        sink.emit(AgentEvent::Thought { content: thought });
                    }
                    match action::parse_action(&reply) {
                        Some(parsed) => {
                            memory.annotate_last("action", parsed.tool_name.as_str()).await;
                            if charged >= self.max_turns {
                                warn!(tool = %parsed.tool_name, max_turns = self.max_turns, "No turns left for action");
                                LoopState::Done(Termination::BudgetExhausted, BUDGET_EXHAUSTED_REPLY.to_string())
                            } else {
                                LoopState::ExecuteTool(parsed)
                            }
                        }
                        None => LoopState::Done(Termination::FinalAnswer, reply),
                    }
                }

                LoopState::ExecuteTool(parsed) => {
                    sink.emit(AgentEvent::ToolCall {
                        name: parsed.tool_name.clone(),
                        arguments: parsed.arguments.to_json(),
                    });
                    debug!(tool = %parsed.tool_name, args = parsed.arguments.len(), "Executing action");

                    let result = self.tools.dispatch(&parsed.tool_name, &self.ctx, &parsed.arguments).await;
                    let commit = if result.success && self.ctx.auto_commit && parsed.tool_name == "edit_file" {
                        Some(self.auto_commit(&parsed.arguments).await)
                    } else {
                        None
                    };

                    sink.emit(AgentEvent::ToolResult {
                        name: parsed.tool_name.clone(),
                        success: result.success,
                        output: result.output.clone(),
                        error: result.error.clone(),
                    });

                    LoopState::AppendObservation {
                        action: parsed,
                        result,
                        commit,
                    }
                }

                LoopState::AppendObservation { action, result, commit } => {
                    let mut observation =
                        prompt::format_observation(&action.tool_name, &action.arguments, &result, self.observation_max_chars);
                    if let Some(commit) = &commit {
                        let status = if commit.success { &commit.output } else { &commit.error };
                        observation.push_str(&format!("\n\nAuto-commit: {status}"));
                    }

                    let mut metadata = serde_json::Map::new();
                    metadata.insert("kind".into(), "observation".into());
                    metadata.insert("tool".into(), action.tool_name.as_str().into());
                    metadata.insert("success".into(), result.success.into());
                    memory.add(Role::User, observation, metadata).await;

                    turns += 1;
                    if result.success {
                        consecutive_failures = 0;
                        charged += 1;
                    } else {
                        failures += 1;
                        consecutive_failures += 1;
                        warn!(tool = %action.tool_name, error = %result.error, "Action failed");
                        if self.failure_policy == FailurePolicy::SharedBudget {
                            charged += 1;
                        }
                    }

                    if self.failure_policy == FailurePolicy::SeparateBudget && consecutive_failures > self.ctx.max_retries {
                        LoopState::Done(
                            Termination::FailureBudgetExhausted,
                            format!(
                                "Stopped after {consecutive_failures} consecutive failed tool calls. Last error: {}",
                                result.error
                            ),
                        )
                    } else if charged >= self.max_turns {
                        warn!(turns, max_turns = self.max_turns, "Turn budget exhausted");
                        LoopState::Done(Termination::BudgetExhausted, BUDGET_EXHAUSTED_REPLY.to_string())
                    } else {
                        LoopState::AwaitModel
                    }
                }

                LoopState::Done(termination, reply) => break (termination, reply),
            };
        };

        info!(turns, failures, termination = ?termination, "Run finished");
        sink.emit(AgentEvent::Done {
            reply: reply.clone(),
            turns,
        });

        RunOutcome {
            reply,
            termination,
            turns,
            failures,
        }
    }

    async fn call_model(&self, messages: Vec<ChatMessage>, sink: &mut dyn OutputSink) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::new(&self.model, messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        if !self.stream {
            let response = self.provider.complete(request).await?;
            if let Some(usage) = &response.usage {
                debug!(model = %response.model, tokens = usage.total_tokens, "Model replied");
            }
            return Ok(response.content);
        }

        request.stream = true;
        let mut rx = self.provider.stream(request).await?;
        let mut reply = String::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                reply.push_str(&content);
                sink.emit(AgentEvent::Chunk { content });
            }
            if chunk.done {
                break;
            }
        }
        Ok(reply)
    }

    async fn auto_commit(&self, edit_args: &ToolArgs) -> ToolResult {
        let file = edit_args.get("file_path").unwrap_or("files");
        let args: ToolArgs = [("message", format!("Update {file}"))].into_iter().collect();
        let result = self.tools.dispatch("commit_changes", &self.ctx, &args).await;
        if !result.success {
            warn!(error = %result.error, "Auto-commit failed");
        }
        result
    }
}

/// The token-budgeted window, never without the newest message. An entry
/// larger than the whole budget is sent alone.
fn latest_window(memory: &MemoryStore, max_tokens: usize) -> Vec<ChatMessage> {
    let mut window = memory.get_context_window(max_tokens);
    if window.is_empty()
        && let Some(newest) = memory.messages().last()
    {
        debug!(chars = newest.content.chars().count(), "Newest message exceeds the context budget");
        window.push(newest.to_chat());
    }
    window
}
