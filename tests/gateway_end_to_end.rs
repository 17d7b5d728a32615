/// Radio text in, radio frames out, through the full gateway.
use meshmail::config::{BackendKind, Config};
use meshmail::email::LoopbackMailbox;
use meshmail::gateway::dispatcher::{EMAIL_SENT, UNRECOGNIZED_PREFIX};
use meshmail::gateway::MailGateway;
use meshmail::transport::memory::{MemoryLink, MemoryTransport};
use std::sync::Arc;

fn test_config(max_frame_len: usize) -> Config {
    let mut config = Config::default();
    config.gateway.max_frame_len = max_frame_len;
    config.gateway.startup_delay_ms = 0;
    config.email.backend = BackendKind::Loopback;
    config.email.address = "gw@example.com".into();
    config
}

fn gateway_with(
    mailbox: Arc<LoopbackMailbox>,
    max_frame_len: usize,
) -> (MailGateway, MemoryLink) {
    let (transport, link, inbound) = MemoryTransport::pair();
    let gateway = MailGateway::new(test_config(max_frame_len), Box::new(transport), inbound, mailbox);
    (gateway, link)
}

fn three_message_mailbox() -> Arc<LoopbackMailbox> {
    let mailbox = Arc::new(LoopbackMailbox::new("gw@example.com"));
    mailbox.deliver("carol@example.com", "Third", "c");
    mailbox.deliver("bob@example.com", "Second", "b");
    mailbox.deliver("alice@example.com", "First", "a");
    mailbox
}

#[tokio::test]
async fn getmails_fits_in_one_frame() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 500);
    gateway.handle_text("GETMAILS").await;

    let frames = link.take_sent();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert!(frame.contains("[1] First | alice@example.com"));
    assert!(frame.contains("[2] Second | bob@example.com"));
    assert!(frame.contains("[3] Third | carol@example.com"));
    assert!(frame.ends_with("[N]ext Page"));
}

#[tokio::test]
async fn startup_self_check_sends_help() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 500);
    gateway.start().await;

    let frames = link.take_sent();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].starts_with("Available Commands:"));
}

#[tokio::test]
async fn long_reply_is_sent_in_order() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 40);
    gateway.handle_text("HELP").await;

    let frames = link.take_sent();
    assert!(frames.len() > 1);
    for frame in &frames[..frames.len() - 1] {
        assert_eq!(frame.chars().count(), 40);
    }
    let joined = frames.concat();
    assert!(joined.starts_with("Available Commands:\n- SENDEMAIL:"));
    assert!(joined.ends_with("Display this help message"));
}

#[tokio::test]
async fn unrecognized_text_gets_the_help_reply() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 500);
    gateway.handle_text("GETMAILs").await;

    let joined = link.take_sent().concat();
    assert!(joined.starts_with(UNRECOGNIZED_PREFIX));
    assert!(joined.contains("Available Commands:"));
    assert!(gateway.session().messages().is_empty());
}

#[tokio::test]
async fn sent_mail_can_be_read_back() {
    let mailbox = Arc::new(LoopbackMailbox::new("gw@example.com"));
    let (mut gateway, link) = gateway_with(mailbox.clone(), 500);

    gateway
        .handle_text("SENDEMAIL:gw@example.com:Field report:All quiet at 14:00")
        .await;
    assert_eq!(link.take_sent(), vec![EMAIL_SENT.to_string()]);

    gateway.handle_text("GETMAILS").await;
    assert!(link.take_sent()[0].starts_with("[1] Field report | gw@example.com"));

    gateway.handle_text("CONTINUE").await;
    let detail = link.take_sent().concat();
    assert!(detail.contains("Subject: Field report\nAll quiet at 14:00"));
}

#[tokio::test]
async fn failed_frame_does_not_stop_the_gateway() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 500);
    link.set_failing(true);
    gateway.handle_text("GETMAILS").await;
    assert!(link.sent_frames().is_empty());
    assert_eq!(gateway.session().messages().len(), 3);

    link.set_failing(false);
    gateway.handle_text("NEXT").await;
    assert_eq!(link.take_sent(), vec!["No more emails.".to_string()]);
}

#[tokio::test]
async fn run_drains_inbound_then_closes_transport() {
    let (mut gateway, link) = gateway_with(three_message_mailbox(), 500);
    assert!(link.inject("GETMAILS"));
    assert!(link.inject("  CONTINUE  "));
    link.hang_up();
    assert!(!link.inject("NEXT"));

    gateway.run().await.unwrap();

    let frames = link.sent_frames();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].starts_with("Available Commands:"));
    assert!(frames[1].starts_with("[1] First | alice@example.com"));
    assert!(frames[2].starts_with("From: alice@example.com\nSubject: First\na"));
    assert!(link.is_closed());
}
