//! Startup seed data: the demo product catalog lives in
//! `capstan_core::domain`; this module seeds the sample ticket and the
//! knowledge corpus, embedding each chunk once so retrieval only scores at
//! request time.

use capstan_core::domain::{ChunkStore, DocChunk, TicketPriority, TicketStore};
use capstan_retrieval::Embedder;

/// Knowledge-base corpus: (source, content) pairs.
const KNOWLEDGE_BASE: &[(&str, &str)] = &[
    (
        "policies/returns.md",
        "Our return policy allows returns within 30 days of purchase with a valid receipt. \
         Refunds are issued to the original payment method within 5 business days.",
    ),
    (
        "policies/warranty.md",
        "All electronics carry a 12-month limited warranty covering manufacturing defects. \
         The warranty does not cover accidental damage or normal wear.",
    ),
    (
        "specs/laptop-pro.md",
        "The Laptop Pro has a 72Wh lithium-polymer battery rated for about 10 hours of \
         mixed use and 1000 charge cycles. Battery replacement is recommended below 80% \
         of original capacity.",
    ),
    (
        "specs/wireless-mouse.md",
        "The Wireless Mouse runs on a single AA battery with an expected battery life of \
         six months of typical use. The power switch is on the underside.",
    ),
    (
        "manuals/office-chair.md",
        "Office Chair assembly: attach the five casters to the base, insert the gas lift, \
         and fasten the seat plate with the four bolts provided. Seat height adjusts with \
         the right-hand lever.",
    ),
    (
        "manuals/desk-lamp.md",
        "The Desk Lamp supports three brightness levels. Touch the base ring to cycle \
         levels; hold for two seconds to switch off.",
    ),
];

/// Embed and store the knowledge corpus.
pub async fn seed_chunks(embedder: &Embedder) -> ChunkStore {
    let mut chunks = Vec::with_capacity(KNOWLEDGE_BASE.len());
    for (index, (source, content)) in KNOWLEDGE_BASE.iter().enumerate() {
        let embedding = embedder.embed(content).await;
        chunks.push(DocChunk {
            id: format!("chunk-{:03}", index + 1),
            content: (*content).to_owned(),
            source: (*source).to_owned(),
            embedding,
        });
    }
    ChunkStore::new(chunks)
}

/// Create the demo ticket every fresh instance starts with.
pub fn seed_tickets() -> TicketStore {
    let tickets = TicketStore::new();
    tickets.create("Sample ticket 1", "This is a demo ticket", TicketPriority::Medium);
    tickets
}

#[cfg(test)]
mod tests {
    use capstan_retrieval::Embedder;

    use super::{seed_chunks, seed_tickets};

    #[tokio::test]
    async fn corpus_chunks_are_embedded_at_seed_time() {
        let chunks = seed_chunks(&Embedder::hashing(128)).await;
        assert_eq!(chunks.len(), 6);
        for chunk in chunks.all() {
            assert_eq!(chunk.embedding.len(), 128);
            assert!(chunk.embedding.iter().any(|v| *v != 0.0));
        }
    }

    #[test]
    fn a_sample_ticket_is_seeded() {
        let tickets = seed_tickets();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets.all()[0].title, "Sample ticket 1");
    }
}
