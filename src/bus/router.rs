//! Command router: shell → front command dispatch
//!
//! Each command kind maps to exactly one [`CommandPorts`] method; the match
//! in [`CommandRouter::dispatch`] is exhaustive, so adding a kind without a
//! handler does not compile. Unknown names and bad payloads never reach a
//! handler.

use pagecraft_protocol::{Command, CommandError, CommandKind, FrontCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Handlers for every command the shell can send
pub trait CommandPorts {
    fn on_page_add(&mut self);
    fn on_page_delete(&mut self, page_id: &str);
    fn on_insert_node(&mut self, label: &str);
    fn on_undo(&mut self);
    fn on_redo(&mut self);
    fn on_insert_image(&mut self, paths: &[String]);
}

/// Reporting of commands that cannot be routed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnroutablePolicy {
    /// Structured warning, then continue
    #[default]
    Log,
    /// Drop without a warning (still counted)
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Routed(CommandKind),
    Unroutable { name: String },
    InvalidPayload { name: String },
}

/// Per-outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub routed: u64,
    pub unroutable: u64,
    pub invalid: u64,
}

pub struct CommandRouter<P> {
    ports: P,
    policy: UnroutablePolicy,
    stats: DispatchStats,
}

impl<P: CommandPorts> CommandRouter<P> {
    pub fn new(ports: P, policy: UnroutablePolicy) -> Self {
        Self {
            ports,
            policy,
            stats: DispatchStats::default(),
        }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Route one wire command to its handler
    pub fn dispatch(&mut self, command: &Command) -> DispatchOutcome {
        match FrontCommand::from_wire(command) {
            Ok(typed) => {
                let kind = typed.kind();
                debug!(handler = %kind.handler_key(), "Dispatching command");
                self.invoke(typed);
                self.stats.routed += 1;
                DispatchOutcome::Routed(kind)
            }
            Err(CommandError::Unroutable { name }) => {
                self.stats.unroutable += 1;
                if self.policy == UnroutablePolicy::Log {
                    warn!(command = %name, handler = %format!("on{}", name), "No handler for command, dropped");
                }
                DispatchOutcome::Unroutable { name }
            }
            Err(CommandError::InvalidPayload { name, reason }) => {
                self.stats.invalid += 1;
                warn!(command = %name, payload = %command.payload, "Invalid command payload, dropped: {}", reason);
                DispatchOutcome::InvalidPayload { name }
            }
        }
    }

    fn invoke(&mut self, command: FrontCommand) {
        match command {
            FrontCommand::PageAdd => self.ports.on_page_add(),
            FrontCommand::PageDelete { page_id } => self.ports.on_page_delete(&page_id),
            FrontCommand::InsertNode { label } => self.ports.on_insert_node(&label),
            FrontCommand::UnDo => self.ports.on_undo(),
            FrontCommand::ReDo => self.ports.on_redo(),
            FrontCommand::InsertImage { paths } => self.ports.on_insert_image(&paths),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl CommandPorts for Recorder {
        fn on_page_add(&mut self) {
            self.calls.push("onPageAdd".into());
        }
        fn on_page_delete(&mut self, page_id: &str) {
            self.calls.push(format!("onPageDelete:{}", page_id));
        }
        fn on_insert_node(&mut self, label: &str) {
            self.calls.push(format!("onInsertNode:{}", label));
        }
        fn on_undo(&mut self) {
            self.calls.push("onUnDo".into());
        }
        fn on_redo(&mut self) {
            self.calls.push("onReDo".into());
        }
        fn on_insert_image(&mut self, paths: &[String]) {
            self.calls.push(format!("onInsertImage:{}", paths.join(",")));
        }
    }

    fn router() -> CommandRouter<Recorder> {
        CommandRouter::new(Recorder::default(), UnroutablePolicy::Log)
    }

    #[test]
    fn test_each_command_reaches_its_handler_only() {
        let cases = [
            (Command::new("PageAdd", Value::Null), "onPageAdd"),
            (Command::new("PageDelete", json!("p1")), "onPageDelete:p1"),
            (Command::new("InsertNode", json!("Row")), "onInsertNode:Row"),
            (Command::new("UnDo", Value::Null), "onUnDo"),
            (Command::new("ReDo", Value::Null), "onReDo"),
        ];

        for (command, expected) in cases {
            let mut router = router();
            let outcome = router.dispatch(&command);
            assert!(matches!(outcome, DispatchOutcome::Routed(_)));
            assert_eq!(router.ports().calls, vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_handler_key_matches_invoked_port() {
        let mut router = router();
        for kind in [
            CommandKind::PageAdd,
            CommandKind::UnDo,
            CommandKind::ReDo,
        ] {
            router.ports_mut().calls.clear();
            router.dispatch(&Command::new(kind.name(), Value::Null));
            assert_eq!(router.ports().calls, vec![kind.handler_key()]);
        }
    }

    #[test]
    fn test_unroutable_invokes_nothing() {
        let mut router = router();
        let outcome = router.dispatch(&Command::new("Frobnicate", json!({"x": 1})));
        assert_eq!(
            outcome,
            DispatchOutcome::Unroutable {
                name: "Frobnicate".into()
            }
        );
        assert!(router.ports().calls.is_empty());
        assert_eq!(router.stats().unroutable, 1);
    }

    #[test]
    fn test_silent_policy_still_counts() {
        let mut router = CommandRouter::new(Recorder::default(), UnroutablePolicy::Silent);
        router.dispatch(&Command::new("onPageAdd", Value::Null));
        assert!(router.ports().calls.is_empty());
        assert_eq!(
            router.stats(),
            DispatchStats {
                routed: 0,
                unroutable: 1,
                invalid: 0
            }
        );
    }

    #[test]
    fn test_invalid_payload_invokes_nothing() {
        let mut router = router();
        let outcome = router.dispatch(&Command::new("InsertNode", json!(42)));
        assert_eq!(
            outcome,
            DispatchOutcome::InvalidPayload {
                name: "InsertNode".into()
            }
        );
        assert!(router.ports().calls.is_empty());
        assert_eq!(router.stats().invalid, 1);
    }

    #[test]
    fn test_insert_image_paths() {
        let mut router = router();
        router.dispatch(&Command::new("InsertImage", json!(["/a.png", "/b.gif"])));
        assert_eq!(router.ports().calls, vec!["onInsertImage:/a.png,/b.gif".to_string()]);
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: UnroutablePolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"silent\"").unwrap();
        assert_eq!(parsed.policy, UnroutablePolicy::Silent);
    }
}
