//! Radio command grammar.
//!
//! The command set is deliberately tiny and typed verbatim on small radio keypads, so
//! matching is exact and case-sensitive, except `HELP`, which is accepted in any case.
//! [CommandParser::parse] never fails: anything it does not recognize comes back as
//! [Command::Unrecognized] carrying the trimmed text.
use log::trace;

use crate::logutil::escape_log;

pub const SENDEMAIL_KEYWORD: &str = "SENDEMAIL";
const FIELD_DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendEmail {
        to: String,
        subject: String,
        body: String,
    },
    ListEmails,
    NextPage,
    ShowDetail,
    Exit,
    Help,
    Unrecognized(String),
}

/// Stateless parser for inbound radio text
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> Command {
        let trimmed = raw.trim();
        let command = match trimmed {
            "GETMAILS" => Command::ListEmails,
            "NEXT" => Command::NextPage,
            "CONTINUE" => Command::ShowDetail,
            "EXIT" => Command::Exit,
            t if t.eq_ignore_ascii_case("HELP") => Command::Help,
            t => parse_send_email(t).unwrap_or_else(|| Command::Unrecognized(t.to_string())),
        };
        trace!("Parsed {:?} from '{}'", command, escape_log(raw));
        command
    }
}

/// `SENDEMAIL:<to>:<subject>:<body>`; only the first three colons delimit, the body
/// keeps the rest verbatim.
fn parse_send_email(text: &str) -> Option<Command> {
    let mut fields = text.splitn(4, FIELD_DELIMITER);
    if fields.next()? != SENDEMAIL_KEYWORD {
        return None;
    }
    let to = fields.next()?;
    let subject = fields.next()?;
    let body = fields.next()?;
    Some(Command::SendEmail {
        to: to.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
    })
}
