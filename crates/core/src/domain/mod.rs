//! In-memory domain stores backing the built-in tools. Persistent storage
//! is an external collaborator; these stores stand in for it.

pub mod chunk;
pub mod product;
pub mod ticket;

pub use chunk::{ChunkStore, DocChunk, ScoredChunk};
pub use product::{Product, ProductCategory, ProductStore};
pub use ticket::{Ticket, TicketPriority, TicketStatus, TicketStore};
