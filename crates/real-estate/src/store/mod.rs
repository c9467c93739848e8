//! Listing Stores
//!
//! Abstraction over wherever listings live.

mod memory;

pub use memory::MemoryListingStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{Listing, ListingStatus, PropertyType};

/// Query filter; `None` fields match everything
#[derive(Clone, Debug, Default)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub bedrooms: Option<u32>,
}

impl ListingFilter {
    /// Active listings only
    pub fn active() -> Self {
        Self {
            status: Some(ListingStatus::Active),
            ..Self::default()
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.status.is_none_or(|s| listing.status == s)
            && self.property_type.is_none_or(|t| listing.property_type == t)
            && self.min_price.is_none_or(|p| listing.price >= p)
            && self.max_price.is_none_or(|p| listing.price <= p)
            && self.bedrooms.is_none_or(|b| listing.bedrooms == b)
    }
}

/// Listing store (Strategy pattern)
///
/// Implement this for each backing database.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Listings matching `filter`, in store order, at most `limit`
    async fn query(&self, filter: &ListingFilter, limit: usize) -> Result<Vec<Listing>>;

    /// Store name
    fn name(&self) -> &str;
}
