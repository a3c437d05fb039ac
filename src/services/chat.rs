//! One chat turn: load or create the user's context, generate the reply,
//! compact the history, persist.

use crate::AppCore;
use crate::agent::prompt;
use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse, Message, UserContext};

/// Process one validated chat request end to end.
///
/// Store unavailability and primary-LLM failures abort the turn with no
/// partial mutation persisted. A missing record is only an error when the
/// request did not opt in via `chatInterest`.
pub async fn handle_turn(core: &AppCore, request: ChatRequest) -> Result<ChatResponse, ChatError> {
    request.validate()?;

    let user_id = request.user_id.clone();
    let stored = core.store.get(&user_id).await?;

    let (mut context, first_contact) = match stored {
        Some(context) => (context, false),
        None if request.chat_interest => {
            // interest_topic presence is guaranteed by validate()
            let topic = request.interest_topic.clone().unwrap_or_default();
            tracing::info!(%user_id, %topic, "creating context for first-contact user");
            (UserContext::seeded(topic), true)
        }
        None => {
            tracing::info!(%user_id, "no prior context and no opt-in");
            return Err(ChatError::OptInRequired);
        }
    };

    // A first-contact turn opens the conversation with the stated interest
    // rather than the (absent) chat message.
    let user_message = if first_contact {
        context.chat_interest.clone().unwrap_or_default()
    } else {
        request.user_message.clone()
    };

    let system_prompt = prompt::build_system_prompt(&context, first_contact);

    let window = core.settings.context_window;
    let recent_start = context.chat_history.len().saturating_sub(window);
    let mut turn_history = context.chat_history[recent_start..].to_vec();
    turn_history.push(Message::user(&user_message));

    let reply = core.agent.generate(&system_prompt, &turn_history).await?;

    context.chat_history.push(Message::user(user_message));
    context.chat_history.push(Message::assistant(&reply));

    let context = core
        .compactor
        .maybe_compact(context, core.llm.as_ref())
        .await;

    core.store.put(&user_id, &context).await?;

    tracing::info!(
        %user_id,
        history_len = context.chat_history.len(),
        first_contact,
        "turn completed"
    );

    Ok(ChatResponse { response: reply })
}
