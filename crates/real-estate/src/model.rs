//! Domain Models
//!
//! Property listings as served to the grounded agent.
//! Prices use `rust_decimal` - never f64 for money.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Pending,
    Sold,
}

/// Kind of property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Condo,
    Apartment,
    Townhouse,
}

impl PropertyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Condo => "condo",
            Self::Apartment => "apartment",
            Self::Townhouse => "townhouse",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property listing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Asking price in whole US dollars
    pub price: Decimal,

    /// City/region, e.g. "Austin, TX"
    pub location: String,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: ListingStatus,
    pub image_url: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub year_built: Option<u32>,

    /// Garage spaces
    pub garage: Option<u32>,

    /// Lot size in acres
    pub lot_size: Option<Decimal>,
    pub mls_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(title: impl Into<String>, price: Decimal, property_type: PropertyType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            price,
            location: String::new(),
            address: String::new(),
            bedrooms: 0,
            bathrooms: 0,
            sqft: 0,
            property_type,
            status: ListingStatus::Active,
            image_url: String::new(),
            amenities: Vec::new(),
            year_built: None,
            garage: None,
            lot_size: None,
            mls_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn located(mut self, location: impl Into<String>, address: impl Into<String>) -> Self {
        self.location = location.into();
        self.address = address.into();
        self
    }

    #[must_use]
    pub const fn rooms(mut self, bedrooms: u32, bathrooms: u32, sqft: u32) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self.sqft = sqft;
        self
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = status;
        self
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.status, ListingStatus::Active)
    }
}

/// Partial listing update; `None` fields are left unchanged
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub sqft: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub status: Option<ListingStatus>,
    pub image_url: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub year_built: Option<u32>,
    pub garage: Option<u32>,
    pub lot_size: Option<Decimal>,
    pub mls_number: Option<String>,
}

impl ListingUpdate {
    pub fn status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply the set fields and bump `updated_at`
    pub fn apply(self, listing: &mut Listing) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut listing.title, self.title);
        set(&mut listing.description, self.description);
        set(&mut listing.price, self.price);
        set(&mut listing.location, self.location);
        set(&mut listing.address, self.address);
        set(&mut listing.bedrooms, self.bedrooms);
        set(&mut listing.bathrooms, self.bathrooms);
        set(&mut listing.sqft, self.sqft);
        set(&mut listing.property_type, self.property_type);
        set(&mut listing.status, self.status);
        set(&mut listing.image_url, self.image_url);
        set(&mut listing.amenities, self.amenities);
        if self.year_built.is_some() {
            listing.year_built = self.year_built;
        }
        if self.garage.is_some() {
            listing.garage = self.garage;
        }
        if self.lot_size.is_some() {
            listing.lot_size = self.lot_size;
        }
        if self.mls_number.is_some() {
            listing.mls_number = self.mls_number;
        }
        listing.updated_at = Utc::now();
    }
}

/// Format a dollar amount as `$1,200,000`
pub fn format_price(price: Decimal) -> String {
    let whole = price.round().abs().to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if price.is_sign_negative() && !price.round().is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
