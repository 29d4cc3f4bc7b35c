//! Replay a recorded backend stream through the streaming pipeline

use crate::args::ReplayArgs;
use crate::console::CliConsole;
use chatgate_core::config::{ChatConfig, WireFormat, load_config};
use chatgate_core::llm::{
    AdapterKind, ChatMessage, ChatRequest, ChunkTransport, CompletionOptions, ReplayProvider,
    ResponseStrategySelector, SseTransport,
};
use chatgate_core::types::RequestContext;
use chatgate_session::{LocalMessageStore, Message, MessageStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const REPLAY_ADDR: &str = "127.0.0.1";
const REPLAY_ROUTE: &str = "POST /chats/:id/messages";

/// Stream the capture to stdout and persist the reply
pub async fn execute(
    config_file: Option<&Path>,
    args: &ReplayArgs,
    verbose: bool,
) -> anyhow::Result<()> {
    let console = CliConsole::stderr(verbose);
    let config = load_config(config_file)?;

    let kind: AdapterKind = args.provider.parse().map_err(anyhow::Error::msg)?;
    let format = match args.format.as_deref() {
        Some(format) => format.parse::<WireFormat>().map_err(anyhow::Error::msg)?,
        None => config.chat.wire_format,
    };

    let mut provider = ReplayProvider::from_path(&args.capture, kind).await?;
    if let Some(delay) = args.delay {
        provider = provider.with_delay(Duration::from_millis(delay));
    }

    let store: Arc<dyn MessageStore> = Arc::new(match &args.store {
        Some(dir) => LocalMessageStore::with_path(dir),
        None => LocalMessageStore::new()?,
    });
    store
        .append(Message::user(args.chat_id.clone(), args.prompt.clone()))
        .await?;

    let chat = ChatConfig {
        streaming_enabled: true,
        wire_format: format,
    };
    let selector = ResponseStrategySelector::new(Arc::new(provider), store.clone(), chat);

    let context = RequestContext::new(REPLAY_ADDR, REPLAY_ROUTE);
    let messages = vec![ChatMessage::user(args.prompt.clone())];
    let options = CompletionOptions::default();
    let cancel = CancellationToken::new();
    let interrupt = cancel_on_ctrl_c(cancel.clone());

    console.info(&format!(
        "Replaying {} as {:?} into chat {}",
        args.capture.display(),
        kind,
        args.chat_id
    ));

    let mut transport = SseTransport::with_format(tokio::io::stdout(), format);
    let request =
        ChatRequest::new(&context, &args.chat_id, &messages, &options).with_cancellation(cancel);
    let result = selector
        .execute_request(request, Some(&mut transport as &mut dyn ChunkTransport))
        .await;
    interrupt.abort();

    let stored = store.count(&args.chat_id).await?;
    match result {
        Ok(reply) => {
            let message = reply.message();
            console.print_header("Replay complete");
            console.field("Content", format!("{} chars", message.content.chars().count()));
            console.field("Tool calls", message.tool_calls.len());
            console.field(
                "Finish reason",
                message.finish_reason.as_deref().unwrap_or("-"),
            );
            if let Some(usage) = &message.usage {
                console.field(
                    "Tokens",
                    format!("{} in / {} out", usage.input_tokens, usage.output_tokens),
                );
            }
            console.field("Messages in chat", stored);
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Replay failed: {e}"));
            console.field("Messages in chat", stored);
            Err(e.into())
        }
    }
}

fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling replay");
            token.cancel();
        }
    })
}
