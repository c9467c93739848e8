//! In-Memory Listing Store
//!
//! For development and tests. `sample()` carries a handful of demo listings.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use super::{ListingFilter, ListingStore};
use crate::error::{ListingError, Result};
use crate::model::{Listing, ListingUpdate, PropertyType};

/// Listings held in memory, in insertion order
#[derive(Default)]
pub struct MemoryListingStore {
    listings: RwLock<Vec<Listing>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: RwLock::new(listings),
        }
    }

    /// Store pre-filled with demo listings
    pub fn sample() -> Self {
        Self::with_listings(sample_listings())
    }

    /// Add a listing
    pub async fn insert(&self, listing: Listing) -> Result<()> {
        validate(&listing)?;
        self.listings.write().await.push(listing);
        Ok(())
    }

    /// Apply a partial update, e.g. marking a listing sold
    pub async fn update(&self, id: &str, update: ListingUpdate) -> Result<Listing> {
        let mut listings = self.listings.write().await;
        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ListingError::NotFound(id.to_string()))?;

        let mut updated = listing.clone();
        update.apply(&mut updated);
        validate(&updated)?;
        *listing = updated.clone();
        Ok(updated)
    }

    /// Listing by id, whatever its status
    pub async fn get(&self, id: &str) -> Result<Listing> {
        self.listings
            .read()
            .await
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| ListingError::NotFound(id.to_string()))
    }

    /// Remove a listing, returning it
    pub async fn remove(&self, id: &str) -> Result<Listing> {
        let mut listings = self.listings.write().await;
        let index = listings
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| ListingError::NotFound(id.to_string()))?;
        Ok(listings.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

fn validate(listing: &Listing) -> Result<()> {
    if listing.title.trim().is_empty() {
        return Err(ListingError::Invalid("title is required".into()));
    }
    if listing.price.is_sign_negative() {
        return Err(ListingError::Invalid(format!(
            "negative price for {}",
            listing.title
        )));
    }
    Ok(())
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn query(&self, filter: &ListingFilter, limit: usize) -> Result<Vec<Listing>> {
        let listings = self.listings.read().await;
        Ok(listings
            .iter()
            .filter(|l| filter.matches(l))
            .take(limit)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn sample_listings() -> Vec<Listing> {
    let mut villa = Listing::new("Modern Luxury Villa", dec!(2850000), PropertyType::House)
        .located("Beverly Hills, CA", "1234 Beverly Drive, Beverly Hills, CA 90210")
        .rooms(5, 4, 4200)
        .described("Stunning modern villa with breathtaking views, premium finishes, and state-of-the-art amenities. Features an open-concept design with floor-to-ceiling windows, gourmet kitchen, and expansive outdoor living space.")
        .with_amenities(["Pool", "Spa", "Wine Cellar", "Home Theater", "Gym", "Smart Home"]);
    villa.year_built = Some(2021);
    villa.garage = Some(3);
    villa.lot_size = Some(dec!(0.75));
    villa.mls_number = Some("BH2024001".into());

    let mut penthouse = Listing::new("Downtown Penthouse", dec!(1200000), PropertyType::Condo)
        .located("Manhattan, NY", "567 Park Avenue, New York, NY 10022")
        .rooms(3, 2, 2100)
        .described("Luxurious penthouse in the heart of Manhattan with panoramic city views. Features premium finishes, floor-to-ceiling windows, and access to building's exclusive amenities including rooftop terrace and concierge services.")
        .with_amenities(["Doorman", "Rooftop Deck", "Gym", "Storage", "Laundry"]);
    penthouse.year_built = Some(2018);
    penthouse.garage = Some(1);
    penthouse.mls_number = Some("NY2024002".into());

    let mut retreat = Listing::new("Seaside Retreat", dec!(950000), PropertyType::House)
        .located("Malibu, CA", "789 Pacific Coast Highway, Malibu, CA 90265")
        .rooms(4, 3, 3200)
        .described("Charming coastal home with direct beach access and stunning ocean views. Perfect for those seeking a peaceful retreat with modern comforts and beachside living at its finest.")
        .with_amenities(["Beach Access", "Ocean View", "Deck", "Fireplace", "Updated Kitchen"]);
    retreat.year_built = Some(2015);
    retreat.garage = Some(2);
    retreat.lot_size = Some(dec!(0.5));
    retreat.mls_number = Some("ML2024003".into());

    let mut brownstone = Listing::new("Historic Brownstone", dec!(875000), PropertyType::Townhouse)
        .located("Brooklyn, NY", "123 Brooklyn Heights Promenade, Brooklyn, NY 11201")
        .rooms(3, 2, 2800)
        .described("Beautifully restored historic brownstone in prime Brooklyn location. Combines original architectural details with modern updates. Perfect blend of character and contemporary living.")
        .with_amenities(["Original Details", "Garden", "Updated Kitchen", "Hardwood Floors"]);
    brownstone.year_built = Some(1920);
    brownstone.garage = Some(0);
    brownstone.lot_size = Some(dec!(0.15));
    brownstone.mls_number = Some("BK2024004".into());

    let mut estate = Listing::new("Mountain View Estate", dec!(1650000), PropertyType::House)
        .located("Aspen, CO", "456 Alpine Drive, Aspen, CO 81611")
        .rooms(6, 5, 5500)
        .described("Spectacular estate home with panoramic mountain views and luxurious amenities. Situated on a private lot with extensive outdoor living spaces and premium finishes throughout.")
        .with_amenities([
            "Mountain Views",
            "Hot Tub",
            "Fireplace",
            "Ski Storage",
            "Wine Cellar",
            "Guest House",
        ]);
    estate.year_built = Some(2019);
    estate.garage = Some(4);
    estate.lot_size = Some(dec!(2.0));
    estate.mls_number = Some("AS2024005".into());

    let mut loft = Listing::new("Urban Loft", dec!(625000), PropertyType::Condo)
        .located("Austin, TX", "789 Industrial Blvd, Austin, TX 78701")
        .rooms(2, 2, 1800)
        .described("Contemporary loft in converted warehouse with exposed brick, high ceilings, and industrial charm. Located in trendy arts district with walkable access to galleries, restaurants, and nightlife.")
        .with_amenities(["Exposed Brick", "High Ceilings", "Modern Appliances", "Rooftop Access"]);
    loft.year_built = Some(2017);
    loft.garage = Some(1);
    loft.mls_number = Some("AU2024006".into());

    vec![villa, penthouse, retreat, brownstone, estate, loft]
}
