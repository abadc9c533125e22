//! Line-oriented front end over the sync controller.

use std::io::{self, BufRead, Write};

use clue_core::game::snapshot::KnowledgeSnapshot;
use clue_core::knowledge::BeliefState;
use clue_core::model::card::Card;
use clue_core::model::category::Category;
use clue_core::model::clue::{OwnerChoice, RefutingCard, Suggestion};
use clue_core::model::roster::Roster;
use clue_sync::{
    ErrorKind, PendingRequest, ReplyOutcome, SyncController, SyncError, SyncState, Transport,
};
use thiserror::Error;
use tracing::debug;

const PROMPT: &str = "clue> ";

const HELP: &str = "\
Commands:
  players <n>                      set the number of players (2-6) and start a new game
  name <player> <name>             rename a player
  cards <player> <count>           set how many cards a player holds and start a new game
  new                              start a new game
  owns <card> <player|solution|none>
                                   record who holds a card
  suggest <player> <suspect> <weapon> <room> [<refuter|none> [<card|none|unknown>]]
                                   record a suggestion and how it was refuted
  show [--json]                    print what is known about every card
  history                          list the clues recorded this game
  status                           print players, card counts and connection state
  help                             print this text
  quit                             leave
Players are numbered from 1 or named. Cards accept ids (LeadPipe) or labels (lead pipe).";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Players(usize),
    Name { player: String, name: String },
    Cards { player: String, count: u8 },
    New,
    Owns { card: Card, owner: String },
    Suggest {
        suggester: String,
        suspect: Card,
        weapon: Card,
        room: Card,
        refuter: Option<String>,
        shown: Option<String>,
    },
    Show { json: bool },
    History,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'; type 'help' for a list")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("unknown card '{0}'")]
    UnknownCard(String),
    #[error("unknown player '{0}'")]
    UnknownPlayer(String),
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let command = match head.to_ascii_lowercase().as_str() {
            "players" => {
                let count = args
                    .first()
                    .ok_or(CommandError::MissingArgument("players <n>"))?;
                Command::Players(parse_number(count)?)
            }
            "name" | "rename" => {
                if args.len() < 2 {
                    return Err(CommandError::MissingArgument("name <player> <name>"));
                }
                Command::Name {
                    player: args[0].to_string(),
                    name: args[1..].join(" "),
                }
            }
            "cards" => {
                let [player, count] = args[..] else {
                    return Err(CommandError::MissingArgument("cards <player> <count>"));
                };
                Command::Cards {
                    player: player.to_string(),
                    count: parse_number(count)?,
                }
            }
            "new" => Command::New,
            "owns" | "own" => {
                let [card, owner] = args[..] else {
                    return Err(CommandError::MissingArgument(
                        "owns <card> <player|solution|none>",
                    ));
                };
                Command::Owns {
                    card: parse_card(card)?,
                    owner: owner.to_string(),
                }
            }
            "suggest" | "suggestion" => {
                if !(4..=6).contains(&args.len()) {
                    return Err(CommandError::MissingArgument(
                        "suggest <player> <suspect> <weapon> <room> [<refuter|none> [<card|none|unknown>]]",
                    ));
                }
                Command::Suggest {
                    suggester: args[0].to_string(),
                    suspect: parse_card(args[1])?,
                    weapon: parse_card(args[2])?,
                    room: parse_card(args[3])?,
                    refuter: args.get(4).map(|s| s.to_string()),
                    shown: args.get(5).map(|s| s.to_string()),
                }
            }
            "show" => Command::Show {
                json: args.iter().any(|a| a.eq_ignore_ascii_case("--json")),
            },
            "history" => Command::History,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::InvalidNumber(value.to_string()))
}

fn parse_card(value: &str) -> Result<Card, CommandError> {
    Card::lookup(value).ok_or_else(|| CommandError::UnknownCard(value.to_string()))
}

/// Resolves a 1-based seat number or a case-insensitive name.
fn resolve_player(roster: &Roster, value: &str) -> Result<usize, CommandError> {
    if let Ok(number) = value.parse::<usize>() {
        return if (1..=roster.player_count()).contains(&number) {
            Ok(number - 1)
        } else {
            Err(CommandError::UnknownPlayer(value.to_string()))
        };
    }
    roster
        .names()
        .iter()
        .position(|name| name.eq_ignore_ascii_case(value))
        .ok_or_else(|| CommandError::UnknownPlayer(value.to_string()))
}

fn resolve_owner(roster: &Roster, value: &str) -> Result<OwnerChoice, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "solution" | "casefile" | "case" => Ok(OwnerChoice::CaseFile),
        "none" | "nobody" => Ok(OwnerChoice::Nobody),
        _ => resolve_player(roster, value).map(OwnerChoice::Player),
    }
}

fn resolve_refuting_card(value: &str) -> Result<RefutingCard, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Ok(RefutingCard::None),
        "unknown" | "?" => Ok(RefutingCard::Unknown),
        _ => parse_card(value).map(RefutingCard::Shown),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShellOptions {
    /// Answer yes to every confirmation prompt.
    pub assume_yes: bool,
}

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<T: Transport> {
    controller: SyncController,
    transport: T,
    options: ShellOptions,
}

impl<T: Transport> Shell<T> {
    pub fn new(roster: Roster, transport: T, options: ShellOptions) -> Self {
        Self {
            controller: SyncController::new(roster),
            transport,
            options,
        }
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    /// Starts the first game, then reads commands until `quit` or end of
    /// input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        let first = self.controller.begin_new_game(true);
        self.submit(first, out)?;

        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let Some(line) = lines.next().transpose()? else {
                writeln!(out)?;
                break;
            };
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    if let Flow::Quit = self.execute(command, &mut lines, out)? {
                        break;
                    }
                }
                Err(err) => writeln!(out, "{err}")?,
            }
        }
        Ok(())
    }

    fn execute<I, W>(&mut self, command: Command, lines: &mut I, out: &mut W) -> io::Result<Flow>
    where
        I: Iterator<Item = io::Result<String>>,
        W: Write,
    {
        debug!(target: "clue_app::shell", ?command, "executing");
        match command {
            Command::Players(count) => {
                let begun = self.controller.resize_roster(count);
                self.submit(begun, out)?;
            }
            Command::Name { player, name } => {
                let result = resolve_player(self.controller.roster(), &player)
                    .map_err(|err| err.to_string())
                    .and_then(|index| {
                        self.controller
                            .rename_player(index, &name)
                            .map_err(|err| err.to_string())
                    });
                match result {
                    Ok(()) => writeln!(out, "Renamed.")?,
                    Err(message) => writeln!(out, "error: {message}")?,
                }
            }
            Command::Cards { player, count } => {
                match resolve_player(self.controller.roster(), &player) {
                    Ok(index) => {
                        let begun = self.controller.set_card_count(index, count);
                        self.submit(begun, out)?;
                    }
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            Command::New => {
                let begun = match self.controller.begin_new_game(false) {
                    Err(SyncError::ConfirmationRequired) => {
                        if self.confirm(
                            "Discard the recorded clues and start a new game? [y/N] ",
                            lines,
                            out,
                        )? {
                            self.controller.begin_new_game(true)
                        } else {
                            writeln!(out, "Kept the current game.")?;
                            return Ok(Flow::Continue);
                        }
                    }
                    other => other,
                };
                self.submit(begun, out)?;
            }
            Command::Owns { card, owner } => {
                match resolve_owner(self.controller.roster(), &owner) {
                    Ok(owner) => {
                        let begun = self.controller.begin_ownership(card, owner);
                        self.submit(begun, out)?;
                    }
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            Command::Suggest {
                suggester,
                suspect,
                weapon,
                room,
                refuter,
                shown,
            } => match self.build_suggestion(
                &suggester,
                [suspect, weapon, room],
                refuter.as_deref(),
                shown.as_deref(),
            ) {
                Ok(suggestion) => {
                    let begun = self.controller.begin_suggestion(suggestion);
                    self.submit(begun, out)?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::Show { json } => {
                if json {
                    match KnowledgeSnapshot::to_json(
                        self.controller.store(),
                        self.controller.roster(),
                    ) {
                        Ok(text) => writeln!(out, "{text}")?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                } else {
                    for line in self.controller.view().lines() {
                        writeln!(out, "{line}")?;
                    }
                }
            }
            Command::History => self.print_history(out)?,
            Command::Status => self.print_status(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn build_suggestion(
        &self,
        suggester: &str,
        [suspect, weapon, room]: [Card; 3],
        refuter: Option<&str>,
        shown: Option<&str>,
    ) -> Result<Suggestion, CommandError> {
        let roster = self.controller.roster();
        let refuter = match refuter {
            None => None,
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(resolve_player(roster, value)?),
        };
        // A refuter named without a card means the card was not seen.
        let refuting_card = match (shown, refuter) {
            (Some(value), _) => resolve_refuting_card(value)?,
            (None, Some(_)) => RefutingCard::Unknown,
            (None, None) => RefutingCard::None,
        };
        Ok(Suggestion {
            suggester: resolve_player(roster, suggester)?,
            suspect,
            weapon,
            room,
            refuter,
            refuting_card,
        })
    }

    fn confirm<I, W>(&self, question: &str, lines: &mut I, out: &mut W) -> io::Result<bool>
    where
        I: Iterator<Item = io::Result<String>>,
        W: Write,
    {
        if self.options.assume_yes {
            return Ok(true);
        }
        write!(out, "{question}")?;
        out.flush()?;
        let answer = lines.next().transpose()?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    /// Sends a freshly issued request and reports the outcome.
    fn submit<W: Write>(
        &mut self,
        begun: Result<PendingRequest, SyncError>,
        out: &mut W,
    ) -> io::Result<()> {
        let outcome = begun.and_then(|pending| self.controller.dispatch(&mut self.transport, pending));
        match outcome {
            Ok(ReplyOutcome::SessionStarted) => {
                let roster = self.controller.roster();
                writeln!(
                    out,
                    "New game started for {} players (cards: {}).",
                    roster.player_count(),
                    join_counts(roster.card_counts())
                )?;
            }
            Ok(ReplyOutcome::CluesApplied {
                updated,
                roster_locked,
            }) => {
                if updated.is_empty() {
                    writeln!(out, "Recorded. Nothing new was deduced.")?;
                } else {
                    writeln!(out, "Recorded. Updated {} card(s):", updated.len())?;
                    let view = self.controller.view();
                    for card in updated {
                        writeln!(out, "  {card}: {}", view.card_caption(card))?;
                    }
                }
                if roster_locked {
                    writeln!(
                        out,
                        "Player count and card counts are locked until the next new game."
                    )?;
                }
            }
            Ok(ReplyOutcome::Superseded { .. }) => {}
            Err(err) => {
                let label = match err.kind() {
                    ErrorKind::Transport => "connection error",
                    ErrorKind::Backend => "backend error",
                    ErrorKind::Protocol => "bad reply",
                    ErrorKind::Precondition => "error",
                };
                writeln!(out, "{label}: {err}")?;
                if self.controller.state() == SyncState::Error {
                    self.controller.acknowledge_error();
                }
            }
        }
        Ok(())
    }

    fn print_history<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let history = self.controller.history();
        if history.is_empty() {
            return writeln!(out, "No clues recorded this game.");
        }
        let roster = self.controller.roster();
        for (number, entry) in history.entries().iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {} ({} card(s) updated)",
                number + 1,
                entry.clue.describe(roster),
                entry.updated.len()
            )?;
        }
        Ok(())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let roster = self.controller.roster();
        for (index, (name, count)) in roster
            .names()
            .iter()
            .zip(roster.card_counts())
            .enumerate()
        {
            writeln!(out, "  {}. {name} ({count} cards)", index + 1)?;
        }
        let session = if self.controller.session().has_session() {
            "active"
        } else {
            "none"
        };
        writeln!(
            out,
            "Session: {session}. State: {:?}. Roster {}. {} of {} cards resolved.",
            self.controller.state(),
            if self.controller.is_roster_locked() {
                "locked"
            } else {
                "editable"
            },
            self.controller.store().known_count(),
            Card::ALL.len()
        )?;
        for category in Category::ALL {
            let solved: Vec<String> = Card::in_category(category)
                .filter(|card| {
                    self.controller.store().belief(*card).state() == BeliefState::OwnedByCaseFile
                })
                .map(|card| card.to_string())
                .collect();
            if !solved.is_empty() {
                writeln!(out, "  Solution {}: {}", category, solved.join(", "))?;
            }
        }
        Ok(())
    }
}

fn join_counts(counts: &[u8]) -> String {
    counts
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
