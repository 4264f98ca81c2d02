//! Router integration tests: shell frames through to editor handlers

use pagecraft::bus::client::decode_shell_frame;
use pagecraft::bus::{CommandPorts, CommandRouter, DispatchOutcome, UnroutablePolicy};
use pagecraft::FrontEvent;
use pagecraft_protocol::{Channel, Command, CommandKind, FrontCommand, Frame};
use serde_json::{json, Value};

#[derive(Default)]
struct Editor {
    log: Vec<(CommandKind, String)>,
}

impl CommandPorts for Editor {
    fn on_page_add(&mut self) {
        self.log.push((CommandKind::PageAdd, String::new()));
    }
    fn on_page_delete(&mut self, page_id: &str) {
        self.log.push((CommandKind::PageDelete, page_id.to_string()));
    }
    fn on_insert_node(&mut self, label: &str) {
        self.log.push((CommandKind::InsertNode, label.to_string()));
    }
    fn on_undo(&mut self) {
        self.log.push((CommandKind::UnDo, String::new()));
    }
    fn on_redo(&mut self) {
        self.log.push((CommandKind::ReDo, String::new()));
    }
    fn on_insert_image(&mut self, paths: &[String]) {
        self.log.push((CommandKind::InsertImage, paths.join("|")));
    }
}

fn command_from_frame(frame: &[u8]) -> Command {
    match decode_shell_frame(frame).unwrap() {
        Some(FrontEvent::Command(command)) => command,
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_shell_frames_reach_matching_handlers() {
    let sent = [
        FrontCommand::PageAdd,
        FrontCommand::PageDelete {
            page_id: "page-4".into(),
        },
        FrontCommand::InsertNode { label: "Row".into() },
        FrontCommand::UnDo,
        FrontCommand::ReDo,
        FrontCommand::InsertImage {
            paths: vec!["/img/a.png".into(), "/img/b.svg".into()],
        },
    ];

    let mut router = CommandRouter::new(Editor::default(), UnroutablePolicy::Log);
    for (seq, command) in sent.iter().enumerate() {
        let frame = Frame::encode(Channel::Command, seq as u16, &command.to_wire()).unwrap();
        let outcome = router.dispatch(&command_from_frame(&frame));
        assert_eq!(outcome, DispatchOutcome::Routed(command.kind()));
    }

    let log = &router.ports().log;
    assert_eq!(log.len(), 6);
    assert_eq!(log[0], (CommandKind::PageAdd, String::new()));
    assert_eq!(log[1], (CommandKind::PageDelete, "page-4".to_string()));
    assert_eq!(log[2], (CommandKind::InsertNode, "Row".to_string()));
    assert_eq!(log[3].0, CommandKind::UnDo);
    assert_eq!(log[4].0, CommandKind::ReDo);
    assert_eq!(log[5], (CommandKind::InsertImage, "/img/a.png|/img/b.svg".to_string()));
    assert_eq!(router.stats().routed, 6);
}

#[test]
fn test_numeric_page_id_is_accepted() {
    let mut router = CommandRouter::new(Editor::default(), UnroutablePolicy::Log);
    let frame = Frame::encode(Channel::Command, 0, &Command::new("PageDelete", json!(17))).unwrap();
    router.dispatch(&command_from_frame(&frame));
    assert_eq!(router.ports().log, vec![(CommandKind::PageDelete, "17".to_string())]);
}

#[test]
fn test_unroutable_between_valid_commands() {
    let mut router = CommandRouter::new(Editor::default(), UnroutablePolicy::Log);

    let frames = [
        Frame::encode(Channel::Command, 0, &Command::new("UnDo", Value::Null)).unwrap(),
        Frame::encode(Channel::Command, 1, &Command::new("ZoomIn", Value::Null)).unwrap(),
        Frame::encode(Channel::Command, 2, &Command::new("ReDo", Value::Null)).unwrap(),
    ];

    let outcomes: Vec<_> = frames
        .iter()
        .map(|f| router.dispatch(&command_from_frame(f)))
        .collect();

    assert_eq!(
        outcomes[1],
        DispatchOutcome::Unroutable {
            name: "ZoomIn".into()
        }
    );
    let kinds: Vec<_> = router.ports().log.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![CommandKind::UnDo, CommandKind::ReDo]);

    let stats = router.stats();
    assert_eq!((stats.routed, stats.unroutable, stats.invalid), (2, 1, 0));
}

#[test]
fn test_handler_names_are_case_sensitive() {
    let mut router = CommandRouter::new(Editor::default(), UnroutablePolicy::Silent);
    for name in ["pageadd", "PAGEADD", "onPageAdd", ""] {
        let outcome = router.dispatch(&Command::new(name, Value::Null));
        assert!(matches!(outcome, DispatchOutcome::Unroutable { .. }));
    }
    assert!(router.ports().log.is_empty());
}
