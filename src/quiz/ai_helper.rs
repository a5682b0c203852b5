use crate::quiz::Question;
use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;
use log::debug;

/// Wraps ChatGPT to flavor the game: hints before an answer, consolation
/// facts after a wrong one, all voiced by a famous explorer.
pub struct QuizHelper {
    personality: Personality,
    chat_gpt: ChatGPT,
}

impl QuizHelper {
    pub fn new(chat_gpt: ChatGPT, personality: Personality) -> Self {
        Self {
            personality,
            chat_gpt,
        }
    }

    pub async fn generate_hint_for_question(&self, question: Question) -> Result<String> {
        debug!("Generating hint for question: {:?}", question.prompt);
        let prompt = format!(
            "You are a chat bot hosting a geography trivia game. The player was asked: \"{}\".
        The answer is \"{}\". Write a short hint about this place without naming it or any
        part of its name. Write it as if you were {}. Limit: 2 sentences.",
            question.prompt,
            question.answer_text,
            self.personality.get_personality()
        );

        let response: CompletionResponse = self.chat_gpt.send_message(&prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }

    pub async fn generate_reply_to_wrong_answer(&self, question: Question) -> Result<String> {
        debug!(
            "Generating reply to wrong answer for question: {:?}",
            question.prompt
        );
        let prompt = format!(
            "You are a chat bot hosting a geography trivia game. The player was asked: \"{}\"
        and placed their guess in the wrong spot. The correct answer is \"{}\". Tell them
        where it actually is and share one fun fact about the place. Write it as if you
        were {}. Limit: 2 short sentences.",
            question.prompt,
            question.answer_text,
            self.personality.get_personality()
        );

        let response: CompletionResponse = self.chat_gpt.send_message(&prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }
}

pub enum Personality {
    Magellan,
    Humboldt,
    MarcoPolo,
}
impl Personality {
    pub fn get_personality(&self) -> String {
        match self {
            Personality::Magellan => "Ferdinand Magellan",
            Personality::Humboldt => "Alexander von Humboldt",
            Personality::MarcoPolo => "Marco Polo",
        }
        .to_string()
    }
}
