//! Support ticket creation tool.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use capstan_core::capability::CapabilityHandler;
use capstan_core::contracts::{CreateTicketInput, CreateTicketOutput};
use capstan_core::domain::TicketStore;

pub struct CreateTicketHandler {
    tickets: TicketStore,
}

impl CreateTicketHandler {
    pub fn new(tickets: TicketStore) -> Self {
        Self { tickets }
    }
}

#[async_trait]
impl CapabilityHandler for CreateTicketHandler {
    async fn execute(&self, input: Value) -> Result<Value> {
        let input: CreateTicketInput = serde_json::from_value(input)?;
        let ticket = self.tickets.create(input.title, input.body, input.priority);
        Ok(serde_json::to_value(CreateTicketOutput { ticket })?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::CreateTicketHandler;
    use capstan_core::capability::CapabilityHandler;
    use capstan_core::contracts::CreateTicketOutput;
    use capstan_core::domain::{TicketStatus, TicketStore};

    #[tokio::test]
    async fn creates_an_open_ticket_in_the_store() {
        let store = TicketStore::new();
        let handler = CreateTicketHandler::new(store.clone());

        let result = handler
            .execute(json!({
                "title": "Login issue",
                "body": "Cannot log in since Tuesday",
                "priority": "high"
            }))
            .await
            .expect("create succeeds");

        let output: CreateTicketOutput = serde_json::from_value(result).expect("typed output");
        assert_eq!(output.ticket.status, TicketStatus::Open);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id, output.ticket.id);
    }
}
