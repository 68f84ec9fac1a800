//! End-to-end command tests: message in, reply and store state out.

use bathtub_core::{
    config::BotConfig,
    dispatch::InboundMessage,
    entity::{Item, Player},
    error::BotError,
    event::BotEvent,
    router::{CommandRouter, IgnoreReason, Outcome, ITEM_ADDED_REPLY, PONG_REPLY},
    store::BotStore,
};
use std::sync::Arc;

fn build() -> CommandRouter {
    let store = BotStore::in_memory_migrated().expect("in-memory store");
    CommandRouter::build(BotConfig::default_test(), Arc::new(store))
}

fn from_admin(content: &str) -> InboundMessage {
    InboundMessage::new("admin", "general", content)
}

fn from_guest(content: &str) -> InboundMessage {
    InboundMessage::new("guest", "general", content)
}

/// Split a roll reply into (rolls, total).
fn parse_roll_reply(reply: &str) -> (Vec<u64>, u64) {
    let (rolls_line, total_line) = reply.split_once('\n').expect("two lines");
    let rolls = rolls_line
        .strip_prefix("Rolls: ")
        .expect("Rolls: prefix")
        .split_whitespace()
        .map(|r| r.parse().expect("numeric roll"))
        .collect();
    let total = total_line
        .strip_prefix("Total: ")
        .expect("Total: prefix")
        .parse()
        .expect("numeric total");
    (rolls, total)
}

#[test]
fn ping_replies_pong() {
    let router = build();
    let outcome = router.handle(&from_guest("!ping"));
    assert_eq!(outcome.reply(), Some(PONG_REPLY));
}

#[test]
fn roll_replies_with_rolls_and_total() {
    let router = build();
    for _ in 0..50 {
        let outcome = router.handle(&from_guest("!roll 3d6"));
        let reply = outcome.reply().expect("roll should reply");
        assert!(reply.starts_with("Rolls: "), "Unexpected reply: {reply:?}");

        let (rolls, total) = parse_roll_reply(reply);
        assert_eq!(rolls.len(), 3, "Expected three rolls in {reply:?}");
        assert!(rolls.iter().all(|r| (1..=6).contains(r)), "Roll out of range in {reply:?}");
        assert_eq!(rolls.iter().sum::<u64>(), total);
    }
}

#[test]
fn malformed_roll_is_rejected_without_reply() {
    let router = build();
    for content in ["!roll 3x6", "!roll d6", "!roll 3d6d6", "!roll three", "!roll 3d0", "!roll -2d6"] {
        let outcome = router.handle(&from_guest(content));
        assert!(
            matches!(outcome, Outcome::Rejected(BotError::Parse(_))),
            "{content:?} should be a parse rejection, got {outcome:?}"
        );
        assert!(outcome.reply().is_none());
    }
    assert_eq!(router.store().command_count("rejected").unwrap(), 6);
}

#[test]
fn roll_over_the_dice_limit_is_rejected() {
    let router = build();
    let limit = router.config().max_dice;
    let outcome = router.handle(&from_guest(&format!("!roll {}d6", limit + 1)));
    assert!(outcome.is_rejected());

    let outcome = router.handle(&from_guest(&format!("!roll {limit}d6")));
    let (rolls, _) = parse_roll_reply(outcome.reply().expect("reply at the limit"));
    assert_eq!(rolls.len(), limit as usize);
}

#[test]
fn newplayer_creates_default_player() {
    let router = build();
    let outcome = router.handle(&from_admin("!newplayer 1234 Aria"));
    assert!(matches!(outcome, Outcome::Completed), "Got {outcome:?}");

    let player = router.store().find::<Player>("1234").unwrap().expect("player stored");
    assert_eq!(player, Player { id: "1234".into(), charname: "Aria".into(), gold: 100, items: vec![] });
}

#[test]
fn newplayer_twice_resets_without_duplicating() {
    let router = build();
    router.handle(&from_admin("!newplayer 1234 Aria"));
    router.handle(&from_admin("!newplayer <@1234> Brina"));

    assert_eq!(router.store().count::<Player>().unwrap(), 1);
    let player = router.store().find::<Player>("1234").unwrap().expect("player stored");
    assert_eq!(player.charname, "Brina");
    assert_eq!(player.gold, 100);
}

#[test]
fn newitem_creates_first_item_and_acknowledges() {
    let router = build();
    let outcome = router.handle(&from_admin("!newitem <Stick><Just a stick><10><20>"));
    assert_eq!(outcome.reply(), Some(ITEM_ADDED_REPLY));

    let item = router.store().find::<Item>("1").unwrap().expect("item stored");
    assert_eq!(
        item,
        Item { id: 1, name: "Stick".into(), desc: "Just a stick".into(), cost: 10, sell: 20 }
    );

    router.handle(&from_admin("!newitem <Rock><Heavier than a stick><1><0>"));
    assert_eq!(router.store().find::<Item>("2").unwrap().unwrap().name, "Rock");
}

#[test]
fn entity_commands_require_privilege() {
    let router = build();
    for content in ["!newplayer 99 Mallory", "!newitem <Gold><Free gold><0><9999>"] {
        let outcome = router.handle(&from_guest(content));
        assert!(
            matches!(outcome, Outcome::Rejected(BotError::Unauthorized { .. })),
            "{content:?} from a guest should be unauthorized, got {outcome:?}"
        );
        assert!(outcome.reply().is_none());
    }
    assert_eq!(router.store().count::<Player>().unwrap(), 0);
    assert_eq!(router.store().count::<Item>().unwrap(), 0);
}

#[test]
fn open_policy_lets_anyone_create() {
    let config = BotConfig { privileged_users: vec![], ..BotConfig::default_test() };
    let store = Arc::new(BotStore::in_memory_migrated().unwrap());
    let router = CommandRouter::build(config, store);

    let outcome = router.handle(&from_guest("!newplayer 7 Guest"));
    assert!(matches!(outcome, Outcome::Completed), "Got {outcome:?}");
}

#[test]
fn bad_entity_arguments_are_rejected() {
    let router = build();
    for content in [
        "!newplayer 1234",
        "!newplayer 1234 Aria Extra",
        "!newitem <Stick><Just a stick><10>",
        "!newitem <Stick><Just a stick><ten><20>",
        "!newitem Stick",
    ] {
        let outcome = router.handle(&from_admin(content));
        assert!(
            matches!(outcome, Outcome::Rejected(BotError::Parse(_))),
            "{content:?} should be a parse rejection, got {outcome:?}"
        );
    }
    assert_eq!(router.store().count::<Player>().unwrap(), 0);
    assert_eq!(router.store().count::<Item>().unwrap(), 0);
}

#[test]
fn non_commands_are_ignored_without_store_writes() {
    let router = build();
    let cases = [
        (from_admin("ping"), IgnoreReason::NotACommand),
        (from_admin("hello !newplayer 1 A"), IgnoreReason::NotACommand),
        (from_admin("!dance"), IgnoreReason::UnknownCommand),
        (from_admin("!roll"), IgnoreReason::UnknownCommand),
        (InboundMessage::new("bot", "general", "!ping"), IgnoreReason::OwnMessage),
    ];
    for (msg, reason) in cases {
        let outcome = router.handle(&msg);
        assert!(
            matches!(outcome, Outcome::Ignored(r) if r == reason),
            "{:?} should be ignored as {reason:?}, got {outcome:?}",
            msg.content
        );
    }
    assert_eq!(router.store().command_count("handled").unwrap(), 0);
    assert_eq!(router.store().command_count("rejected").unwrap(), 0);
    assert!(router.store().recent_commands(10).unwrap().is_empty());
}

#[test]
fn custom_prefix_is_honoured() {
    let config = BotConfig { prefix: "bath ".into(), ..BotConfig::default_test() };
    let router = CommandRouter::build(config, Arc::new(BotStore::in_memory_migrated().unwrap()));
    assert_eq!(router.handle(&from_guest("bath ping")).reply(), Some(PONG_REPLY));
    assert!(router.handle(&from_guest("!ping")).reply().is_none());
}

#[test]
fn every_recognized_command_is_logged_once() {
    let router = build();
    router.handle(&from_admin("!ping"));
    router.handle(&from_admin("!newplayer 1234 Aria"));
    router.handle(&from_admin("!newitem <Stick><Just a stick><10><20>"));
    router.handle(&from_admin("!roll 1d0"));

    let log = router.store().commands_for_author("admin").unwrap();
    let names: Vec<&str> = log.iter().map(|e| e.command.as_str()).collect();
    assert_eq!(names, ["ping", "newplayer", "newitem", "roll"]);

    let outcomes: Vec<&str> = log.iter().map(|e| e.outcome.as_str()).collect();
    assert_eq!(outcomes, ["handled", "handled", "handled", "rejected"]);

    assert_eq!(
        log[2].event().unwrap(),
        BotEvent::ItemCreated { item_id: 1, name: "Stick".into() }
    );
    assert!(matches!(
        log[3].event().unwrap(),
        BotEvent::CommandRejected { ref kind, .. } if kind == "parse"
    ));
}

#[test]
fn store_failure_rejects_without_reply_and_bot_keeps_running() {
    // Schema never applied: every document write fails.
    let store = BotStore::in_memory().expect("in-memory store");
    let router = CommandRouter::build(BotConfig::default_test(), Arc::new(store));

    let outcome = router.handle(&from_admin("!newitem <Stick><Just a stick><10><20>"));
    assert!(
        matches!(outcome, Outcome::Rejected(BotError::Database(_))),
        "Expected a database rejection, got {outcome:?}"
    );
    assert_eq!(outcome.reply(), None);

    let outcome = router.handle(&from_admin("!newplayer 1234 Aria"));
    assert!(matches!(outcome, Outcome::Rejected(BotError::Database(_))));

    assert_eq!(router.handle(&from_guest("!ping")).reply(), Some(PONG_REPLY));
}

#[test]
fn roll_event_records_expression_and_stream() {
    let router = build();
    router.handle(&from_guest("!roll 2d4"));
    router.handle(&from_guest("!roll 1d20"));

    let log = router.store().recent_commands(10).unwrap();
    let streams: Vec<u64> = log
        .iter()
        .map(|entry| match entry.event().unwrap() {
            BotEvent::DiceRolled { stream, .. } => stream,
            other => panic!("Unexpected event {other:?}"),
        })
        .collect();
    let mut sorted = streams.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1]);

    let payloads: Vec<&str> = log.iter().map(|entry| entry.payload.as_str()).collect();
    assert!(
        payloads.iter().any(|p| p.contains(r#""expression":"2d4""#)),
        "Expression should be stored in notation form: {payloads:?}"
    );
}
