//! Dialog sink delivering restart notices to the avatars of a region.
//!
//! There is no viewer connection in this host, so every root agent has an
//! inbox that collects what its viewer would have shown. Each delivery is
//! also logged.

use dashmap::DashMap;
use region_event_system::{AgentId, DialogModule};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Modal alert box
    Alert,
    /// Region notification ("blue box") with its attribution
    Notification { initiator: AgentId, source: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub kind: MessageKind,
    pub text: String,
}

/// A root agent present in a region.
#[derive(Debug, Clone, Default)]
pub struct AgentPresence {
    pub name: String,
    pub inbox: Vec<DeliveredMessage>,
}

/// Root agents of one scene, shared between the scene and its dialog sink.
pub type AgentTable = Arc<DashMap<AgentId, AgentPresence>>;

/// [`DialogModule`] that fans every message out to all root agents.
#[derive(Debug)]
pub struct BroadcastDialog {
    region_name: String,
    agents: AgentTable,
}

impl BroadcastDialog {
    pub fn new(region_name: impl Into<String>, agents: AgentTable) -> Self {
        Self {
            region_name: region_name.into(),
            agents,
        }
    }

    fn deliver(&self, kind: MessageKind, text: &str) -> usize {
        let mut recipients = 0;
        for mut agent in self.agents.iter_mut() {
            agent.inbox.push(DeliveredMessage {
                kind: kind.clone(),
                text: text.to_string(),
            });
            recipients += 1;
        }
        recipients
    }
}

impl DialogModule for BroadcastDialog {
    fn send_general_alert(&self, message: &str) {
        let recipients = self.deliver(MessageKind::Alert, message);
        info!(
            "📢 [{}] Alert to {} agent(s): {}",
            self.region_name, recipients, message
        );
    }

    fn send_notification_to_users_in_region(
        &self,
        initiator: AgentId,
        source: &str,
        message: &str,
    ) {
        let kind = MessageKind::Notification {
            initiator,
            source: source.to_string(),
        };
        let recipients = self.deliver(kind, message);
        info!(
            "🔵 [{}] Notification from {} to {} agent(s): {}",
            self.region_name, source, recipients, message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(names: &[&str]) -> (AgentTable, Vec<AgentId>) {
        let table: AgentTable = Arc::new(DashMap::new());
        let ids = names
            .iter()
            .map(|name| {
                let id = AgentId::new();
                table.insert(
                    id,
                    AgentPresence {
                        name: name.to_string(),
                        inbox: Vec::new(),
                    },
                );
                id
            })
            .collect();
        (table, ids)
    }

    #[test]
    fn test_alert_reaches_every_agent() {
        let (agents, ids) = table_with(&["Ada", "Bob"]);
        let dialog = BroadcastDialog::new("Alpha", agents.clone());

        dialog.send_general_alert("Region restarting in 1 minute");

        for id in ids {
            let inbox = agents.get(&id).unwrap().inbox.clone();
            assert_eq!(
                inbox,
                vec![DeliveredMessage {
                    kind: MessageKind::Alert,
                    text: "Region restarting in 1 minute".to_string(),
                }]
            );
        }
    }

    #[test]
    fn test_notification_keeps_attribution() {
        let (agents, ids) = table_with(&["Ada"]);
        let dialog = BroadcastDialog::new("Alpha", agents.clone());

        dialog.send_notification_to_users_in_region(AgentId::SYSTEM, "System", "Going down");

        let inbox = agents.get(&ids[0]).unwrap().inbox.clone();
        assert_eq!(
            inbox[0].kind,
            MessageKind::Notification {
                initiator: AgentId::SYSTEM,
                source: "System".to_string(),
            }
        );
        assert_eq!(inbox[0].text, "Going down");
    }

    #[test]
    fn test_empty_region_is_fine() {
        let (agents, _) = table_with(&[]);
        let dialog = BroadcastDialog::new("Empty", agents.clone());
        dialog.send_general_alert("nobody hears this");
        assert!(agents.is_empty());
    }
}
