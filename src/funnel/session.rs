use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use teloxide::{
    dispatching::dialogue::{Dialogue, Storage},
    types::ChatId,
};
use tokio::sync::Mutex;

use super::{Action, FunnelController, FunnelState};

/// Applies funnel actions to chat dialogues.
///
/// Reading, transitioning and writing back a state happens under a per-chat
/// lock so the delayed reveal can never interleave with a restart of the same
/// chat. Different chats never wait on each other.
pub struct Sessions {
    controller: FunnelController,
    locks: StdMutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl Sessions {
    pub fn new(controller: FunnelController) -> Self {
        Self {
            controller,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    fn chat_lock(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(chat_id).or_default().clone()
    }

    pub fn controller(&self) -> &FunnelController {
        &self.controller
    }

    /// Returns the new state, or `None` if the action was ignored and the
    /// stored state is untouched.
    pub async fn transition<S>(
        &self,
        dialogue: &Dialogue<FunnelState, S>,
        action: Action,
    ) -> Result<Option<FunnelState>, S::Error>
    where
        S: Storage<FunnelState> + ?Sized,
    {
        let lock = self.chat_lock(dialogue.chat_id());
        let _guard = lock.lock().await;

        let current = dialogue.get().await?.unwrap_or_default();
        let Some(next) = self.controller.apply(&current, action) else {
            log::debug!(
                "chat {}: {:?} ignored in {:?}",
                dialogue.chat_id().0,
                action,
                current.step()
            );
            return Ok(None);
        };

        dialogue.update(next.clone()).await?;
        log::debug!(
            "chat {}: {:?} -> {:?} (generation {}, diagnosis {:?})",
            dialogue.chat_id().0,
            current.step(),
            next.step(),
            next.generation(),
            next.diagnosis()
        );
        Ok(Some(next))
    }

    /// Waits out the analyzing pause, then reveals the result unless the chat
    /// was reset in the meantime.
    pub async fn reveal_after<S>(
        &self,
        dialogue: &Dialogue<FunnelState, S>,
        generation: u64,
        delay: Duration,
    ) -> Result<Option<FunnelState>, S::Error>
    where
        S: Storage<FunnelState> + ?Sized,
    {
        tokio::time::sleep(delay).await;
        self.transition(dialogue, Action::Reveal { generation }).await
    }
}
