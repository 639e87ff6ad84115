//! Built-in capability handlers and their registration.

mod query;
mod rag;
mod search;
mod ticket;

use std::sync::Arc;

use capstan_core::capability::CapabilityRegistry;
use capstan_core::contracts;
use capstan_core::domain::{ChunkStore, ProductStore, TicketStore};
use capstan_retrieval::RetrievalScorer;

pub use query::RunQueryHandler;
pub use rag::RagQueryHandler;
pub use search::SearchDbHandler;
pub use ticket::CreateTicketHandler;

/// Register the full built-in tool set, in listing order.
pub fn register_builtin(
    registry: &mut CapabilityRegistry,
    products: ProductStore,
    tickets: TicketStore,
    chunks: ChunkStore,
    scorer: RetrievalScorer,
) {
    registry.register(contracts::search_db_descriptor(Arc::new(SearchDbHandler::new(products))));
    registry.register(contracts::create_ticket_descriptor(Arc::new(CreateTicketHandler::new(
        tickets,
    ))));
    registry.register(contracts::run_query_descriptor(Arc::new(RunQueryHandler)));
    registry
        .register(contracts::rag_query_descriptor(Arc::new(RagQueryHandler::new(chunks, scorer))));
}
