//! Centralized error escalation.
//!
//! [`ErrorPipeline::handle`] is the single place errors end up: command
//! failures, component-interaction failures and event-level failures all go
//! through it. It never fails.
//!
//! For an unexpected error the operator receives, in order:
//!
//! 1. `Error on: <jump url>` when the originating message is known,
//! 2. the rendered error text, in line groups wrapped as code blocks.
//!
//! The invoker (if any) receives a short red notice carrying only the
//! error's display form.

use std::sync::Arc;

use tracing::{error, warn};

use warden_core::embed::MAX_DESCRIPTION;
use warden_core::{
    BoxedPlatform, Colour, ComponentInteraction, Embed, OutgoingMessage, PlatformError,
    PlatformResult, embed_check,
};

use crate::context::InvocationContext;
use crate::operator::{MAX_CHUNK_CHARS, Operator, OwnerMessage, string_split};

/// Maximum number of text lines per delivered chunk.
pub const LINES_PER_CHUNK: usize = 20;

/// Opens each delivered chunk.
pub const CODE_BLOCK_OPEN: &str = "```rs\n";

/// Closes each delivered chunk.
pub const CODE_BLOCK_CLOSE: &str = "\n```";

/// Sent to the operator for a dropped platform connection.
pub const DISCONNECTED_NOTICE: &str = "Disconnected from server!";

const NOTICE_HEADER: &str = "An internal error has occurred. The bot owner has been notified.\n";

/// Where an error came from.
#[derive(Debug, Clone, Copy)]
pub enum ErrorOrigin<'a> {
    /// A text command.
    Command(&'a InvocationContext),
    /// An interactive component.
    Component(&'a ComponentInteraction),
}

impl ErrorOrigin<'_> {
    /// Link to the originating message, if it is addressable.
    pub fn jump_url(&self) -> Option<String> {
        match self {
            Self::Command(ctx) => Some(ctx.message().jump_url()),
            Self::Component(_) => None,
        }
    }

    /// Sends `message` back to whoever triggered the error.
    pub async fn respond(
        &self,
        platform: &BoxedPlatform,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        match self {
            Self::Command(ctx) => ctx.reply(message).await.map(|_| ()),
            Self::Component(interaction) => {
                platform.respond_to_interaction(interaction, message).await
            }
        }
    }
}

/// How an error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A known connection-level condition that resolves on reconnect.
    Transient,
    /// Anything else.
    Unexpected,
}

impl ErrorKind {
    /// Classifies `error` by looking through its whole cause chain.
    pub fn of(error: &anyhow::Error) -> Self {
        let transient = error.chain().any(|cause| {
            cause
                .downcast_ref::<PlatformError>()
                .is_some_and(PlatformError::is_transient)
        });
        if transient {
            Self::Transient
        } else {
            Self::Unexpected
        }
    }
}

/// An error on its way through the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ErrorReport<'a> {
    pub error: &'a anyhow::Error,
    pub origin: Option<ErrorOrigin<'a>>,
    pub kind: ErrorKind,
}

impl<'a> ErrorReport<'a> {
    /// Classifies `error` and pairs it with its origin.
    pub fn new(error: &'a anyhow::Error, origin: Option<ErrorOrigin<'a>>) -> Self {
        Self {
            error,
            origin,
            kind: ErrorKind::of(error),
        }
    }

    /// The parts delivered to the operator, in order.
    pub fn operator_parts(&self) -> OwnerMessage {
        match self.kind {
            ErrorKind::Transient => OwnerMessage::Text(DISCONNECTED_NOTICE.to_string()),
            ErrorKind::Unexpected => {
                let text = render_error(self.error);
                let mut parts = Vec::new();
                if let Some(url) = self.origin.and_then(|origin| origin.jump_url()) {
                    parts.push(format!("Error on: {url}"));
                }
                parts.extend(chunk_error_text(&text));
                OwnerMessage::Chunks(parts)
            }
        }
    }
}

/// Renders an error with its cause chain (and backtrace, when captured).
pub fn render_error(error: &anyhow::Error) -> String {
    let rendered = format!("{error:?}");
    if !rendered.trim().is_empty() {
        return rendered;
    }
    let display = error.to_string();
    if display.trim().is_empty() {
        "unknown error".to_string()
    } else {
        display
    }
}

/// Splits rendered error text into code-block chunks for delivery.
///
/// Lines are packed greedily: a chunk takes whole lines until it holds
/// [`LINES_PER_CHUNK`] of them or the next line would push it past
/// [`MAX_CHUNK_CHARS`] including the delimiters. The line limit counts text
/// lines only; the fences sit on lines of their own. Only a line that is too
/// long on its own is cut, and its pieces are delivered as chunks of their
/// own. Joining the unwrapped chunk bodies with `\n` gives back `text`
/// whenever no single line is over the budget.
pub fn chunk_error_text(text: &str) -> Vec<String> {
    let budget =
        MAX_CHUNK_CHARS - CODE_BLOCK_OPEN.chars().count() - CODE_BLOCK_CLOSE.chars().count();

    let mut bodies = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if line_len > budget {
            flush_lines(&mut lines, &mut bodies);
            len = 0;
            bodies.extend(string_split(line, budget));
            continue;
        }

        let added = if lines.is_empty() { line_len } else { line_len + 1 };
        if lines.len() == LINES_PER_CHUNK || len + added > budget {
            flush_lines(&mut lines, &mut bodies);
            len = line_len;
        } else {
            len += added;
        }
        lines.push(line);
    }
    flush_lines(&mut lines, &mut bodies);

    bodies
        .into_iter()
        .map(|body| format!("{CODE_BLOCK_OPEN}{body}{CODE_BLOCK_CLOSE}"))
        .collect()
}

fn flush_lines(lines: &mut Vec<&str>, bodies: &mut Vec<String>) {
    if !lines.is_empty() {
        bodies.push(lines.join("\n"));
        lines.clear();
    }
}

/// Builds the red notice shown to the invoker.
///
/// The error text is cut short if the notice would exceed the payload
/// limits.
pub fn user_notice(error: &anyhow::Error) -> Embed {
    let description = format!("{NOTICE_HEADER}Error (for bot owner purposes): {error}");
    let embed = Embed::new()
        .colour(Colour::RED)
        .description(description.clone());
    if embed_check(&embed) {
        return embed;
    }
    let truncated: String = description.chars().take(MAX_DESCRIPTION).collect();
    embed.description(truncated)
}

/// Formats errors and delivers them to the operator and the invoker.
#[derive(Debug, Clone)]
pub struct ErrorPipeline {
    platform: BoxedPlatform,
    operator: Arc<Operator>,
}

impl ErrorPipeline {
    pub fn new(platform: BoxedPlatform, operator: Arc<Operator>) -> Self {
        Self { platform, operator }
    }

    /// Reports `error`, optionally tied to where it came from.
    ///
    /// Delivery failures are logged and otherwise ignored.
    pub async fn handle(&self, error: &anyhow::Error, origin: Option<ErrorOrigin<'_>>) {
        let report = ErrorReport::new(error, origin);

        match report.kind {
            ErrorKind::Transient => warn!(error = %error, "Transient platform error"),
            ErrorKind::Unexpected => error!("{}", render_error(error)),
        }

        if let Err(err) = self
            .operator
            .notify(self.platform.as_ref(), report.operator_parts())
            .await
        {
            warn!(error = %err, "Failed to deliver error report to operator");
        }

        if let Some(origin) = origin {
            let notice = OutgoingMessage::embed(user_notice(error));
            if let Err(err) = origin.respond(&self.platform, notice).await {
                warn!(error = %err, "Failed to send error notice to invoker");
            }
        }
    }

    /// Reports an error from an interactive component.
    pub async fn handle_component(&self, error: &anyhow::Error, interaction: &ComponentInteraction) {
        self.handle(error, Some(ErrorOrigin::Component(interaction)))
            .await;
    }
}
