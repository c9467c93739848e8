//! Listing Grounding
//!
//! Renders a fresh snapshot of active listings for the real-estate agent.
//! The store is queried on every call so sold or withdrawn listings never
//! reach the prompt.

use std::fmt::Display;
use std::sync::Arc;

use agent_core::{GroundingSnapshot, GroundingSource, Result as CoreResult};
use async_trait::async_trait;

use crate::model::{Listing, format_price};
use crate::store::{ListingFilter, ListingStore};

/// Maximum listings injected into one prompt
pub const DEFAULT_LIMIT: usize = 50;

pub const NO_LISTINGS: &str = "No active property listings are currently available.";

const HEADER: &str = "CURRENT ACTIVE PROPERTY LISTINGS";

const SCOPE_INSTRUCTION: &str = "Only reference the properties listed above when discussing \
specific homes. Do not invent listings, prices, or addresses. If none of the listed properties \
match the question, say so and offer general guidance instead.";

/// Grounding source backed by a [`ListingStore`]
pub struct ListingGrounding {
    store: Arc<dyn ListingStore>,
    limit: usize,
}

impl ListingGrounding {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Render listings into the context block
    pub fn render(listings: &[Listing]) -> String {
        let mut block = format!("{HEADER} ({}):\n", listings.len());
        for (i, listing) in listings.iter().enumerate() {
            block.push('\n');
            render_listing(&mut block, i + 1, listing);
        }
        block
    }
}

fn render_listing(out: &mut String, number: usize, listing: &Listing) {
    out.push_str(&format!("PROPERTY #{number}: {}\n", listing.title));
    field(out, "Price", format_price(listing.price));
    field(out, "Location", &listing.location);
    field(out, "Address", &listing.address);
    field(
        out,
        "Bedrooms/Bathrooms",
        format!("{} bed / {} bath", listing.bedrooms, listing.bathrooms),
    );
    field(out, "Size", format!("{} sqft", listing.sqft));
    field(out, "Type", listing.property_type);
    if let Some(year) = listing.year_built {
        field(out, "Year built", year);
    }
    if let Some(garage) = listing.garage {
        field(out, "Garage", format!("{garage} spaces"));
    }
    if let Some(lot) = listing.lot_size {
        field(out, "Lot size", format!("{lot} acres"));
    }
    if let Some(mls) = &listing.mls_number {
        field(out, "MLS", mls);
    }
    if !listing.amenities.is_empty() {
        field(out, "Amenities", listing.amenities.join(", "));
    }
    if !listing.description.is_empty() {
        field(out, "Description", &listing.description);
    }
    field(out, "Listing ID", &listing.id);
}

fn field(out: &mut String, label: &str, value: impl Display) {
    out.push_str(&format!("- {label}: {value}\n"));
}

#[async_trait]
impl GroundingSource for ListingGrounding {
    async fn snapshot(&self) -> CoreResult<GroundingSnapshot> {
        let listings = self.store.query(&ListingFilter::active(), self.limit).await?;
        tracing::debug!(
            store = self.store.name(),
            listings = listings.len(),
            "Fetched listings for grounding"
        );

        if listings.is_empty() {
            return Ok(self.placeholder());
        }
        Ok(GroundingSnapshot::new(Self::render(&listings), listings.len()))
    }

    fn placeholder(&self) -> GroundingSnapshot {
        GroundingSnapshot::placeholder(format!("{HEADER}: {NO_LISTINGS}"))
    }

    fn scope_instruction(&self) -> &str {
        SCOPE_INSTRUCTION
    }
}
