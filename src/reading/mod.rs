// Tarot/oracle reading pipeline
// Identifies card names in the query, retrieves the closest indexed card
// text for each, and asks the model for a grounded interpretation

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::{debug, info};

use crate::index::VectorStore;
use crate::mistral::{ChatMessage, MistralClient};
use crate::{AugurError, Result};

const IDENTIFY_CARDS_INSTRUCTION: &str = "Identify all the cards in the message below. They may be tarot or oracle cards, including non-standard card names.\nList the cards only, in comma-separated format, with no notes or other commentary.\n\nMessage: ";

fn identification_prompt(query: &str) -> String {
    format!("{IDENTIFY_CARDS_INSTRUCTION}{query}")
}

fn interpretation_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Answer the query by interpreting the cards, drawing on:\n\
         - the context information above\n\
         - notable synchronicities among the objects depicted on the card images\n\
         - notable synchronicities among the colors of the card images\n\
         - notable synchronicities among the numbers of the cards\n\
         - any other notable features of these cards\n\n\
         The final interpretation should weave together all individual cards' interpretations.\n\n\
         Query: {query}\n\
         Answer:\n"
    )
}

/// Split the model's comma-separated reply into trimmed card names.
/// Names are not validated against any deck; the nearest indexed card
/// wins regardless of relevance.
#[inline]
pub fn parse_card_list(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts card names from free-text queries via the chat model
pub struct CardIdentifier {
    llm: Arc<MistralClient>,
}

impl CardIdentifier {
    #[inline]
    pub fn new(llm: Arc<MistralClient>) -> Self {
        Self { llm }
    }

    #[inline]
    pub fn identify(&self, query: &str) -> Result<Vec<String>> {
        let prompt = identification_prompt(query);
        let response = self.llm.complete(&[ChatMessage::user(prompt)])?;

        let cards = parse_card_list(&response);
        debug!("Identified {} cards: {:?}", cards.len(), cards);
        Ok(cards)
    }
}

/// A completed reading: the identified cards, the retrieved card texts,
/// and the model's interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub cards: Vec<String>,
    pub context: Vec<String>,
    pub interpretation: String,
}

pub struct ReadingPipeline {
    identifier: CardIdentifier,
    llm: Arc<MistralClient>,
    store: Arc<VectorStore>,
    neighbors: usize,
}

impl ReadingPipeline {
    #[inline]
    pub fn new(llm: Arc<MistralClient>, store: Arc<VectorStore>, neighbors: usize) -> Self {
        Self {
            identifier: CardIdentifier::new(Arc::clone(&llm)),
            llm,
            store,
            neighbors,
        }
    }

    /// Run the full reading: identify, retrieve, interpret.
    ///
    /// Each identified name is embedded and looked up in the card index;
    /// only the closest match per name is kept, the remaining requested
    /// neighbors being a margin rather than context. Zero identified
    /// cards aborts before any retrieval or interpretation request.
    #[inline]
    pub async fn interpret(&self, query: &str) -> Result<Reading> {
        let cards = self.identifier.identify(query)?;
        if cards.is_empty() {
            return Err(AugurError::NoCardsIdentified);
        }

        let mut context = Vec::with_capacity(cards.len());
        for card in &cards {
            let vectors = self.llm.embed_batch(std::slice::from_ref(card))?;
            let vector = vectors.into_iter().next().ok_or_else(|| {
                AugurError::Provider(format!("no embedding returned for card {card:?}"))
            })?;

            let matches = self.store.search(&vector, self.neighbors).await?;
            let nearest = matches.into_iter().next().ok_or_else(|| {
                AugurError::Index(format!("search returned no match for card {card:?}"))
            })?;

            debug!(
                "Retrieved card text for {:?} at distance {}",
                card, nearest.distance
            );
            context.push(nearest.text);
        }

        let prompt = interpretation_prompt(&context.join("\n"), query);
        let interpretation = self.llm.complete(&[ChatMessage::user(prompt)])?;

        info!("Completed reading for {} cards", cards.len());
        Ok(Reading {
            cards,
            context,
            interpretation,
        })
    }
}
