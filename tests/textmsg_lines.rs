/// Lines printed by a Meshtastic node in TEXTMSG mode, through to parsed commands.
use meshmail::gateway::{Command, CommandParser};
use meshmail::transport::lines::{strip_sender_prefix, LineAssembler};

fn commands_from(bytes: &[u8]) -> Vec<Command> {
    let parser = CommandParser::new();
    let mut assembler = LineAssembler::new();
    assembler
        .push(bytes)
        .iter()
        .map(|line| parser.parse(strip_sender_prefix(line)))
        .collect()
}

#[test]
fn labelled_getmails_is_recognized() {
    assert_eq!(commands_from(b"\r\nGW1: GETMAILS\r\n"), vec![Command::ListEmails]);
}

#[test]
fn consecutive_messages_from_the_firmware() {
    let stream = b"\r\nab12: HELP\r\n\r\nab12: NEXT\r\n\r\n!9e7f01c2: CONTINUE\r\n";
    assert_eq!(
        commands_from(stream),
        vec![Command::Help, Command::NextPage, Command::ShowDetail]
    );
}

#[test]
fn labelled_sendemail_keeps_body_colons() {
    assert_eq!(
        commands_from(b"\r\nK7QX: SENDEMAIL:ops@example.com:Check-in:All clear at 09:15\r\n"),
        vec![Command::SendEmail {
            to: "ops@example.com".into(),
            subject: "Check-in".into(),
            body: "All clear at 09:15".into(),
        }]
    );
}
