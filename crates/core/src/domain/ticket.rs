use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub body: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// In-memory ticket store. Appends take a short-lived mutex; the lock is
/// never held across an await point.
#[derive(Clone, Default)]
pub struct TicketStore {
    tickets: Arc<Mutex<Vec<Ticket>>>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        priority: TicketPriority,
    ) -> Ticket {
        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            priority,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };

        let mut tickets = match self.tickets.lock() {
            Ok(tickets) => tickets,
            Err(poisoned) => poisoned.into_inner(),
        };
        tickets.push(ticket.clone());
        ticket
    }

    /// All tickets, newest first.
    pub fn all(&self) -> Vec<Ticket> {
        let tickets = match self.tickets.lock() {
            Ok(tickets) => tickets,
            Err(poisoned) => poisoned.into_inner(),
        };
        tickets.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        match self.tickets.lock() {
            Ok(tickets) => tickets.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{TicketPriority, TicketStatus, TicketStore};

    #[test]
    fn created_tickets_open_with_distinct_ids() {
        let store = TicketStore::new();
        let first = store.create("Login issue", "Cannot log in", TicketPriority::High);
        let second = store.create("Login issue", "Cannot log in", TicketPriority::High);

        assert_eq!(first.status, TicketStatus::Open);
        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn listing_is_newest_first() {
        let store = TicketStore::new();
        store.create("first", "body", TicketPriority::Medium);
        store.create("second", "body", TicketPriority::Medium);

        let titles: Vec<String> = store.all().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }
}
