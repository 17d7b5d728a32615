/// Command recognition from raw radio text.
use meshmail::gateway::{Command, CommandParser};

fn parse(text: &str) -> Command {
    CommandParser::new().parse(text)
}

#[test]
fn keywords_are_exact_and_case_sensitive() {
    assert_eq!(parse("GETMAILS"), Command::ListEmails);
    assert_eq!(parse("NEXT"), Command::NextPage);
    assert_eq!(parse("CONTINUE"), Command::ShowDetail);
    assert_eq!(parse("EXIT"), Command::Exit);

    assert_eq!(parse("GETMAILs"), Command::Unrecognized("GETMAILs".into()));
    assert_eq!(parse("next"), Command::Unrecognized("next".into()));
    assert_eq!(
        parse("GETMAILS please"),
        Command::Unrecognized("GETMAILS please".into())
    );
}

#[test]
fn help_matches_any_case() {
    for text in ["HELP", "help", "Help", "hElP", "  help \n"] {
        assert_eq!(parse(text), Command::Help, "input {:?}", text);
    }
}

#[test]
fn surrounding_whitespace_is_ignored() {
    assert_eq!(parse("  GETMAILS\r\n"), Command::ListEmails);
    assert_eq!(parse("\tNEXT "), Command::NextPage);
    assert_eq!(parse("  hello  "), Command::Unrecognized("hello".into()));
}

#[test]
fn sendemail_body_keeps_its_colons() {
    assert_eq!(
        parse("SENDEMAIL:bob@example.com:Meeting:Starts at 10:30, room B:2"),
        Command::SendEmail {
            to: "bob@example.com".into(),
            subject: "Meeting".into(),
            body: "Starts at 10:30, room B:2".into(),
        }
    );
}

#[test]
fn sendemail_subject_ends_at_third_colon() {
    // A colon inside the intended subject moves the rest into the body
    assert_eq!(
        parse("SENDEMAIL:x@y.com:Re: hi:body:with:colons"),
        Command::SendEmail {
            to: "x@y.com".into(),
            subject: "Re".into(),
            body: " hi:body:with:colons".into(),
        }
    );
}

#[test]
fn sendemail_allows_empty_fields() {
    assert_eq!(
        parse("SENDEMAIL:a@b.c::"),
        Command::SendEmail {
            to: "a@b.c".into(),
            subject: String::new(),
            body: String::new(),
        }
    );
}

#[test]
fn malformed_sendemail_is_unrecognized() {
    assert_eq!(
        parse("SENDEMAIL:a@b.c"),
        Command::Unrecognized("SENDEMAIL:a@b.c".into())
    );
    assert_eq!(parse("SENDEMAIL"), Command::Unrecognized("SENDEMAIL".into()));
    assert_eq!(
        parse("sendemail:a@b.c:s:b"),
        Command::Unrecognized("sendemail:a@b.c:s:b".into())
    );
}
