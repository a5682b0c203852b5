mod quiz;

use std::sync::Arc;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use dotenv::dotenv;
use quiz::ai_helper::QuizHelper;
use quiz::difficulty::{BasemapStyle, Difficulty};
use quiz::engine::QuizEngine;
use quiz::geometry::{Geometry, PlanarOracle, Point, Polygon};
use quiz::source::{FileQuestionSource, MemoryQuestionSource, QuestionRecord, QuestionSource};
use quiz::GamePhase;
use rand::seq::SliceRandom;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    InGame {
        engine: QuizEngine,
    },
}

type GameStorage = std::sync::Arc<ErasedStorage<State>>;

const DECK_PATH: &str = "questions.json";

#[tokio::main]
async fn main() {
    dotenv().expect("Failed to load .env file");
    let chatgpt_api_key = std::env::var("CHATGPT_API_KEY").expect("CHATGPT_API_KEY is not set");

    pretty_env_logger::init();
    log::info!("Starting geo trivia bot...");

    let bot = Bot::from_env();

    println!("Establishing connection to the database...");
    let storage: GameStorage = SqliteStorage::open("db.sqlite", Json)
        .await
        .unwrap()
        .erase();
    println!("Connection established");

    // Load the question deck
    println!("Loading the question deck");
    let deck: Arc<dyn QuestionSource> = match FileQuestionSource::from_path(DECK_PATH) {
        Ok(deck) => Arc::new(deck),
        Err(err) => {
            log::warn!("Could not load '{}' ({}), using the built-in deck", DECK_PATH, err);
            Arc::new(MemoryQuestionSource::new(builtin_deck()))
        }
    };
    println!("Deck loaded: {} questions", deck.len());

    let gpt = {
        let mut gpt = ChatGPT::new(chatgpt_api_key).expect("Unable to connect with ChatGPT");

        gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
        gpt.config.timeout = std::time::Duration::from_secs(15);

        gpt
    };

    let quiz_helper = Arc::new(QuizHelper::new(gpt, quiz::ai_helper::Personality::Humboldt));

    let deck_for_start = deck.clone();
    let deck_for_game = deck.clone();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    start(deck_for_start.clone(), bot, dialogue, msg)
                },
            ))
            .branch(dptree::case![State::InGame { engine }].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, engine: QuizEngine, msg: Message| {
                    in_game(
                        deck_for_game.clone(),
                        quiz_helper.clone(),
                        bot,
                        dialogue,
                        engine,
                        msg,
                    )
                },
            )),
    )
    .dependencies(dptree::deps![storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hi! I'm the geo trivia bot. I'll ask you where places are, and you answer by dropping a pin on the map. Pick a difficulty to begin!";
const NEXT_QUESTION: &str = "Next question";

async fn start(
    deck: Arc<dyn QuestionSource>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let mut engine = QuizEngine::new(deck.len());
    // The first question is staged while the player is still choosing a
    // difficulty, so the round can begin the moment they pick one.
    if let Err(err) = engine.advance_question(deck.as_ref()).await {
        log::warn!("Failed to stage the first question: {}", err);
    }
    drain_events(&mut engine);

    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(difficulty_keyboard())
        .await?;

    dialogue.update(State::InGame { engine }).await?;
    Ok(())
}

async fn in_game(
    deck: Arc<dyn QuestionSource>,
    helper: Arc<QuizHelper>,
    bot: Bot,
    dialogue: QuizDialogue,
    engine: QuizEngine,
    msg: Message,
) -> HandlerResult {
    match engine.phase() {
        GamePhase::ChoosingDifficulty => choose_difficulty(helper, bot, dialogue, engine, msg).await,
        GamePhase::Playing => receive_answer(deck, helper, bot, dialogue, engine, msg).await,
        GamePhase::AnswerSubmitted => next_question(deck, helper, bot, dialogue, engine, msg).await,
    }
}

async fn choose_difficulty(
    helper: Arc<QuizHelper>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut engine: QuizEngine,
    msg: Message,
) -> HandlerResult {
    let Some(difficulty) = msg.text().and_then(Difficulty::from_label) else {
        bot.send_message(msg.chat.id, "Please pick Easy, Medium or Hard")
            .reply_markup(difficulty_keyboard())
            .await?;
        return Ok(());
    };

    engine.set_difficulty(difficulty);
    engine.start()?;
    drain_events(&mut engine);

    bot.send_message(
        msg.chat.id,
        format!(
            "Difficulty set to {} — picture {} in your head. A correct pin is worth {} point(s).",
            difficulty.label(),
            describe_basemap(difficulty.basemap()),
            difficulty.multiplier()
        ),
    )
    .await?;

    send_current_question(&helper, &bot, &msg, &engine).await?;

    dialogue.update(State::InGame { engine }).await?;
    Ok(())
}

async fn receive_answer(
    deck: Arc<dyn QuestionSource>,
    helper: Arc<QuizHelper>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut engine: QuizEngine,
    msg: Message,
) -> HandlerResult {
    // The Next button stays usable mid-round.
    if msg.text() == Some(NEXT_QUESTION) {
        return next_question(deck, helper, bot, dialogue, engine, msg).await;
    }

    let Some(location) = msg.location() else {
        bot.send_message(
            msg.chat.id,
            "Answer by sending a location — attach a pin where you think it is!",
        )
        .await?;
        return Ok(());
    };
    let point = Point::new(location.longitude, location.latitude);

    let evaluation = match engine.submit_user_answer(point, &PlanarOracle) {
        Ok(evaluation) => evaluation,
        Err(err) => {
            log::warn!("Rejected answer submission: {}", err);
            bot.send_message(msg.chat.id, "I can't take an answer right now.")
                .await?;
            return Ok(());
        }
    };
    drain_events(&mut engine);

    if evaluation.is_correct {
        let praise = ["Correct!", "Spot on!", "Bullseye!", "Well navigated!"]
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Correct!");
        bot.send_message(
            msg.chat.id,
            format!(
                "{} +{} point(s). Your score is {}.",
                praise,
                engine.difficulty().multiplier(),
                engine.points()
            ),
        )
        .reply_markup(next_keyboard())
        .await?;
    } else {
        // Best effort; the game goes on even if the flourish fails.
        let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

        let reply = match engine.current_question() {
            Some(question) => helper
                .generate_reply_to_wrong_answer(question.clone())
                .await
                .unwrap_or(format!("It was {}.", question.answer_text)),
            None => String::from("Better luck on the next one!"),
        };
        bot.send_message(msg.chat.id, format!("Wrong!\n\n{}", reply))
            .reply_markup(next_keyboard())
            .await?;
    }

    dialogue.update(State::InGame { engine }).await?;
    Ok(())
}

async fn next_question(
    deck: Arc<dyn QuestionSource>,
    helper: Arc<QuizHelper>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut engine: QuizEngine,
    msg: Message,
) -> HandlerResult {
    if engine.cursor().is_exhausted() {
        let (hits, misses) = engine
            .overlays()
            .map(|overlays| (overlays.correct().len(), overlays.incorrect().len()))
            .unwrap_or((0, 0));
        bot.send_message(
            msg.chat.id,
            format!(
                "That was the last question! Final score: {} point(s), {} hit(s) and {} miss(es). Send anything to play again.",
                engine.points(),
                hits,
                misses
            ),
        )
        .await?;
        dialogue.update(State::Start).await?;
        return Ok(());
    }

    if let Err(err) = engine.request_next_question(deck.as_ref()).await {
        log::warn!("Failed to load the next question: {}", err);
        bot.send_message(
            msg.chat.id,
            "That question's data was missing, skipping it. Tap again to continue.",
        )
        .reply_markup(next_keyboard())
        .await?;
        dialogue.update(State::InGame { engine }).await?;
        return Ok(());
    }
    drain_events(&mut engine);

    send_current_question(&helper, &bot, &msg, &engine).await?;

    dialogue.update(State::InGame { engine }).await?;
    Ok(())
}

async fn send_current_question(
    helper: &QuizHelper,
    bot: &Bot,
    msg: &Message,
    engine: &QuizEngine,
) -> HandlerResult {
    let Some(question) = engine.current_question() else {
        bot.send_message(msg.chat.id, "No question is available right now.")
            .await?;
        return Ok(());
    };

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;
    let hint = helper
        .generate_hint_for_question(question.clone())
        .await
        .unwrap_or_default();

    let mut text = format!(
        "Question #{}:\n{}\n\n",
        engine.cursor().index + 1,
        question.prompt
    );
    if !hint.is_empty() {
        text.push_str(&format!("Hint:\n{}\n\n", hint));
    }
    text.push_str("Drop a pin on the map!");

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

fn drain_events(engine: &mut QuizEngine) {
    for event in engine.take_events() {
        log::debug!("engine event: {:?}", event);
    }
}

fn describe_basemap(style: BasemapStyle) -> &'static str {
    match style {
        BasemapStyle::ImageryWithLabels => "satellite imagery with every label on it",
        BasemapStyle::LightGrayCanvas => "a plain light gray canvas",
        BasemapStyle::Imagery => "unlabeled satellite imagery",
    }
}

fn difficulty_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("Easy"),
        KeyboardButton::new("Medium"),
        KeyboardButton::new("Hard"),
    ]])
}

fn next_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(NEXT_QUESTION)]])
}

// Fallback questions for running without a deck file.
fn builtin_deck() -> Vec<QuestionRecord> {
    let bbox = |x0: f64, y0: f64, x1: f64, y1: f64| {
        Geometry::Polygon(Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]))
    };
    vec![
        QuestionRecord {
            question: Some("Where does the Eiffel Tower stand?".to_string()),
            answer: Some("Paris, France".to_string()),
            geometry: bbox(2.22, 48.81, 2.47, 48.91),
        },
        QuestionRecord {
            question: Some("Where is the Great Pyramid of Giza?".to_string()),
            answer: Some("Giza, Egypt".to_string()),
            geometry: bbox(31.0, 29.9, 31.25, 30.05),
        },
        QuestionRecord {
            question: Some("Where is Uluru?".to_string()),
            answer: Some("The Northern Territory, Australia".to_string()),
            geometry: bbox(130.9, -25.5, 131.15, -25.25),
        },
    ]
}
