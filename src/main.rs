mod config;
mod funnel;

use std::{error::Error, sync::Arc, time::Duration};

use config::Config;
use dotenv::dotenv;
use funnel::{
    content::{Question, QuizContent},
    render,
    session::Sessions,
    Action, Category, FunnelController, FunnelState, ScoreState,
};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode},
    utils::command::BotCommands,
};

type FunnelDialogue = Dialogue<FunnelState, ErasedStorage<FunnelState>>;
type FunnelStorage = Arc<ErasedStorage<FunnelState>>;
type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Comandos disponíveis:")]
enum Command {
    #[command(description = "abrir a página inicial.")]
    Start,
    #[command(description = "refazer o diagnóstico do zero.")]
    Restart,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting funnel bot...");

    let config = Config::from_env()?;
    let content = match &config.content_path {
        Some(path) => {
            log::info!("Loading quiz content from {}", path.display());
            QuizContent::from_path(path)?
        }
        None => QuizContent::reference(),
    };
    log::info!(
        "Quiz content ready: {} questions, analyzing delay {:?}",
        content.questions().len(),
        config.analyzing_delay
    );
    for category in Category::ALL {
        log::debug!("{:?} -> {}", category, content.diagnosis(category).title);
    }

    let sessions = Arc::new(Sessions::new(FunnelController::new(Arc::new(content))));
    // Funnel progress only lives as long as the process.
    let storage: FunnelStorage = InMemStorage::<FunnelState>::new().erase();
    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<FunnelState>, FunnelState>()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(command),
            )
            .branch(dptree::case![FunnelState::Landing { generation }].endpoint(landing))
            .branch(
                dptree::case![FunnelState::Quiz {
                    generation,
                    index,
                    scores
                }]
                .endpoint(quiz),
            )
            .branch(
                dptree::case![FunnelState::Analyzing {
                    generation,
                    scores,
                    diagnosis
                }]
                .endpoint(analyzing),
            )
            .branch(
                dptree::case![FunnelState::Result {
                    generation,
                    scores,
                    diagnosis
                }]
                .endpoint(result),
            ),
    )
    .dependencies(dptree::deps![storage, sessions, Arc::new(config)])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

async fn command(
    bot: Bot,
    dialogue: FunnelDialogue,
    sessions: Arc<Sessions>,
    msg: Message,
    cmd: Command,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            sessions.transition(&dialogue, Action::Home).await?;
            send_landing(&bot, msg.chat.id).await
        }
        Command::Restart => start_quiz(&bot, &dialogue, &sessions).await,
    }
}

async fn landing(
    bot: Bot,
    dialogue: FunnelDialogue,
    sessions: Arc<Sessions>,
    msg: Message,
) -> HandlerResult {
    if msg.text() == Some(render::START_BUTTON) {
        return start_quiz(&bot, &dialogue, &sessions).await;
    }
    send_landing(&bot, msg.chat.id).await
}

async fn quiz(
    bot: Bot,
    dialogue: FunnelDialogue,
    sessions: Arc<Sessions>,
    config: Arc<Config>,
    (generation, index, scores): (u64, usize, ScoreState),
    msg: Message,
) -> HandlerResult {
    let controller = sessions.controller();
    let answer = msg.text().and_then(|text| controller.answer_for(index, text));

    let Some(category) = answer else {
        bot.send_message(msg.chat.id, render::PICK_AN_OPTION).await?;
        let current = FunnelState::Quiz {
            generation,
            index,
            scores,
        };
        return send_question(&bot, msg.chat.id, controller, &current).await;
    };

    match sessions.transition(&dialogue, Action::Answer(category)).await? {
        Some(next @ FunnelState::Quiz { .. }) => {
            send_question(&bot, msg.chat.id, controller, &next).await
        }
        Some(FunnelState::Analyzing { generation, .. }) => {
            // Scheduled before sending: the chat must leave ANALYZING even if
            // the copy below fails to go out.
            schedule_reveal(
                bot.clone(),
                dialogue,
                sessions.clone(),
                generation,
                config.analyzing_delay,
            );
            bot.send_message(msg.chat.id, render::analyzing())
                .parse_mode(ParseMode::Html)
                .reply_markup(KeyboardRemove::new())
                .await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn analyzing(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, render::STILL_ANALYZING)
        .await?;
    Ok(())
}

async fn result(
    bot: Bot,
    dialogue: FunnelDialogue,
    sessions: Arc<Sessions>,
    (_generation, _scores, diagnosis): (u64, ScoreState, Category),
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(render::RESTART_BUTTON) | Some(render::START_BUTTON) => {
            start_quiz(&bot, &dialogue, &sessions).await
        }
        _ => send_result(&bot, msg.chat.id, sessions.controller(), diagnosis).await,
    }
}

async fn start_quiz(bot: &Bot, dialogue: &FunnelDialogue, sessions: &Sessions) -> HandlerResult {
    if let Some(state) = sessions.transition(dialogue, Action::Start).await? {
        log::info!(
            "chat {}: quiz started (generation {})",
            dialogue.chat_id().0,
            state.generation()
        );
        send_question(bot, dialogue.chat_id(), sessions.controller(), &state).await?;
    }
    Ok(())
}

/// Moves the chat from ANALYZING to RESULT once the pause is over. A restart
/// in between bumps the generation and turns this into a no-op.
fn schedule_reveal(
    bot: Bot,
    dialogue: FunnelDialogue,
    sessions: Arc<Sessions>,
    generation: u64,
    delay: Duration,
) {
    tokio::spawn(async move {
        let chat_id = dialogue.chat_id();
        match sessions.reveal_after(&dialogue, generation, delay).await {
            Ok(Some(FunnelState::Result {
                scores, diagnosis, ..
            })) => {
                log::info!(
                    "chat {}: diagnosis {:?} (knee {}, shin {}, {} answers)",
                    chat_id.0,
                    diagnosis,
                    scores.knee,
                    scores.shin,
                    scores.total()
                );
                if let Err(err) = send_result(&bot, chat_id, sessions.controller(), diagnosis).await
                {
                    log::error!("chat {}: failed to send result: {}", chat_id.0, err);
                }
            }
            Ok(_) => log::debug!(
                "chat {}: reveal for generation {} is stale",
                chat_id.0,
                generation
            ),
            Err(err) => log::error!("chat {}: reveal failed: {}", chat_id.0, err),
        }
    });
}

async fn send_landing(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, render::landing())
        .parse_mode(ParseMode::Html)
        .reply_markup(single_button(render::START_BUTTON))
        .await?;
    Ok(())
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    controller: &FunnelController,
    state: &FunnelState,
) -> HandlerResult {
    let Some((question, progress)) = controller.current_question(state) else {
        return Ok(());
    };
    bot.send_message(chat_id, render::question(question, progress))
        .parse_mode(ParseMode::Html)
        .reply_markup(options_keyboard(question))
        .await?;
    Ok(())
}

async fn send_result(
    bot: &Bot,
    chat_id: ChatId,
    controller: &FunnelController,
    diagnosis: Category,
) -> HandlerResult {
    let content = controller.content().diagnosis(diagnosis);
    bot.send_message(chat_id, render::result(content, diagnosis))
        .parse_mode(ParseMode::Html)
        .reply_markup(single_button(render::RESTART_BUTTON))
        .await?;
    Ok(())
}

fn single_button(label: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(label)]])
}

// One option per row, the labels are full sentences.
fn options_keyboard(question: &Question) -> KeyboardMarkup {
    KeyboardMarkup::new(
        question
            .options
            .iter()
            .map(|option| vec![KeyboardButton::new(option.text.clone())])
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(chat_id: i64, text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000,
            "chat": { "id": chat_id, "type": "private", "first_name": "Ana" },
            "from": { "id": chat_id, "is_bot": false, "first_name": "Ana" },
            "text": text,
        }))
        .unwrap()
    }

    // Every request fails: nothing listens on the discard port.
    fn offline_bot() -> Bot {
        Bot::new("12345:offline").set_api_url("http://127.0.0.1:9/".parse().unwrap())
    }

    #[tokio::test]
    async fn result_is_revealed_even_if_analyzing_copy_fails() {
        let content = Arc::new(QuizContent::reference());
        let last_answer = content.question(4).unwrap().options[0].text.clone();
        let sessions = Arc::new(Sessions::new(FunnelController::new(content)));
        let storage: FunnelStorage = InMemStorage::<FunnelState>::new().erase();
        let dialogue = FunnelDialogue::new(storage, ChatId(42));
        let scores = ScoreState {
            knee: 4.0,
            shin: 0.0,
        };
        dialogue
            .update(FunnelState::Quiz {
                generation: 1,
                index: 4,
                scores,
            })
            .await
            .unwrap();
        let config = Arc::new(Config {
            analyzing_delay: Duration::from_millis(10),
            content_path: None,
        });

        let handled = quiz(
            offline_bot(),
            dialogue.clone(),
            sessions,
            config,
            (1, 4, scores),
            text_message(42, &last_answer),
        )
        .await;
        assert!(handled.is_err());

        let mut state = None;
        for _ in 0..200 {
            state = dialogue.get().await.unwrap();
            if matches!(state, Some(FunnelState::Result { .. })) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            state,
            Some(FunnelState::Result {
                generation: 1,
                scores: ScoreState {
                    knee: 5.0,
                    shin: 0.0
                },
                diagnosis: Category::Knee,
            })
        );
    }
}
