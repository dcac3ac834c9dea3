//! Console game: one chat played from a terminal.
//!
//! Lines starting with `/` are commands, everything else is a guess from the
//! current player. `/as <id>` switches who is typing.

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use croc_common::util::format_duration;
use croc_game::{ChatId, GameEngine, GameError, NewWord, ParticipantId};

pub const HELP: &str = "\
Commands:
  /as <id>             type as another player
  /play                start a round as host
  /next                take over hosting after a round
  /skip                host: draw another word
  /word                host: show the secret word
  /def                 host: show a definition hint
  /stop                host: end the round
  /pack <lang> <pack>  choose the word pack
  /packs               list word packs
  /stats               game statistics
  /quit                leave
Anything else is a guess.";

const SHUTDOWN_NOTICE: &str = "The game is shutting down. The current round is over.";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    As(ParticipantId),
    Play,
    Next,
    Skip,
    Word,
    Definition,
    Stop,
    Pack { language_id: String, pack_id: String },
    Packs,
    Stats,
    Help,
    Quit,
    Guess(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Guess(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("as", [id]) => Self::As(
                id.parse()
                    .with_context(|| format!("'{id}' is not a player id"))?,
            ),
            ("play" | "start", []) => Self::Play,
            ("next", []) => Self::Next,
            ("skip", []) => Self::Skip,
            ("word", []) => Self::Word,
            ("def", []) => Self::Definition,
            ("stop", []) => Self::Stop,
            ("pack", [language_id, pack_id]) => Self::Pack {
                language_id: (*language_id).to_string(),
                pack_id: (*pack_id).to_string(),
            },
            ("packs", []) => Self::Packs,
            ("stats" | "stat", []) => Self::Stats,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            ("as" | "pack", _) => bail!("Wrong arguments for /{name}, see /help"),
            _ => bail!("Unknown command /{name}, see /help"),
        };
        Ok(command)
    }
}

/// Console state: the engine, the chat being played and who is typing.
pub struct Console {
    engine: Arc<GameEngine>,
    chat_id: ChatId,
    player: ParticipantId,
}

impl Console {
    pub fn new(engine: Arc<GameEngine>, chat_id: ChatId, player: ParticipantId) -> Self {
        Self {
            engine,
            chat_id,
            player,
        }
    }

    pub fn player(&self) -> ParticipantId {
        self.player
    }

    /// Run one command and return the lines to print.
    pub fn handle(&mut self, command: Command) -> Vec<String> {
        let (chat, player) = (self.chat_id, self.player);

        match command {
            Command::As(id) => {
                self.player = id;
                vec![format!("You are now player {id}.")]
            }
            Command::Play => match self.engine.play(chat, player) {
                Ok(word) => self.new_round(&word),
                Err(err) => self.explain(&err),
            },
            Command::Next => match self.engine.next_host(chat, player) {
                Ok(word) => self.new_round(&word),
                Err(err) => self.explain(&err),
            },
            Command::Skip => match self.engine.skip_word(chat, player) {
                Ok(word) => vec![secret_line(&word)],
                Err(err) => self.explain(&err),
            },
            Command::Word => match self.engine.peek_word(chat, player) {
                Ok(word) => vec![format!("Your word: {word}")],
                Err(err) => self.explain(&err),
            },
            Command::Definition => match self.engine.peek_definition_text(chat, player) {
                Ok(text) => vec![text],
                Err(err) => self.explain(&err),
            },
            Command::Stop => match self.engine.stop(chat, player) {
                Ok(()) => vec!["The round is over.".to_string()],
                Err(err) => self.explain(&err),
            },
            Command::Pack {
                language_id,
                pack_id,
            } => match self
                .engine
                .set_word_pack(chat, player, &language_id, &pack_id)
            {
                Ok(rerolled) => {
                    let name = self
                        .engine
                        .catalog()
                        .pack_name(&language_id, &pack_id)
                        .unwrap_or(pack_id.as_str());
                    let mut lines = vec![format!("Word pack set to {name}.")];
                    lines.extend(rerolled.as_ref().map(secret_line));
                    lines
                }
                Err(err) => self.explain(&err),
            },
            Command::Packs => self.pack_menu(),
            Command::Stats => self.stats(),
            Command::Help => vec![HELP.to_string()],
            Command::Quit => Vec::new(),
            Command::Guess(text) => self.guess(&text),
        }
    }

    fn new_round(&self, word: &NewWord) -> Vec<String> {
        vec![
            format!("Player {} explains the word.", self.player),
            secret_line(word),
        ]
    }

    fn guess(&self, text: &str) -> Vec<String> {
        let Some(solved) = self.engine.check_guess(self.chat_id, self.player, text) else {
            return Vec::new();
        };

        let mut lines = vec![format!(
            "Player {} guessed the word: {}!",
            self.player, solved.word
        )];
        if let Some(definition) = self.engine.reveal_definition(&solved) {
            lines.push(format!("{}: {definition}", solved.word));
        }
        lines.push("Send /next to explain the next word.".to_string());
        lines
    }

    fn explain(&self, err: &GameError) -> Vec<String> {
        let text = match err {
            GameError::AlreadyActive => "A round is already running.".to_string(),
            GameError::NoActiveRound => "No round is running, send /play.".to_string(),
            GameError::NotHost { .. } => "Only the host can do that.".to_string(),
            GameError::NoDefinition => "No definition for this word.".to_string(),
            GameError::NoWordPack | GameError::UnknownPack { .. } => err.to_string(),
        };

        let mut lines = vec![text];
        if err.needs_pack_selection() {
            lines.extend(self.pack_menu());
        }
        lines
    }

    fn pack_menu(&self) -> Vec<String> {
        let catalog = self.engine.catalog();
        let mut lines = vec!["Word packs (choose with /pack <lang> <pack>):".to_string()];

        for language_id in catalog.language_ids() {
            let language = catalog.language_name(language_id).unwrap_or(language_id);
            lines.push(format!("  {language} [{language_id}]"));
            for pack_id in catalog.pack_ids(language_id).unwrap_or_default() {
                let name = catalog.pack_name(language_id, pack_id).unwrap_or(pack_id);
                lines.push(format!("    {pack_id}: {name}"));
            }
        }
        lines
    }

    fn stats(&self) -> Vec<String> {
        let stats = self.engine.stats();
        vec![
            format!("Uptime: {}", format_duration(stats.uptime)),
            format!("Active rounds: {}", stats.active_rounds),
            format!("Sessions: {}", stats.stored_sessions),
            format!("Rounds started: {}", stats.rounds_started),
            format!("Words skipped: {}", stats.words_skipped),
            format!("Guesses: {}", stats.guesses_checked),
            format!("Words guessed: {}", stats.words_guessed),
        ]
    }
}

fn secret_line(word: &NewWord) -> String {
    if word.has_definition {
        format!("Your word: {} (hint available, /def)", word.word)
    } else {
        format!("Your word: {}", word.word)
    }
}

/// Tell every chat with a running round that the game is going away.
pub fn broadcast_shutdown(engine: &GameEngine) -> Vec<(ChatId, String)> {
    let notices: Vec<(ChatId, String)> = engine
        .list_active_conversations()
        .into_iter()
        .map(|chat_id| (chat_id, SHUTDOWN_NOTICE.to_string()))
        .collect();

    for (chat_id, _) in &notices {
        tracing::info!(chat_id, "Sending shutdown notice");
    }
    notices
}
