//! Home page route handler.
//!
//! The landing page is static. Product data lives on `/products`.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;

// =============================================================================
// Static content
// =============================================================================

/// Hero banner copy.
#[derive(Clone)]
pub struct Hero {
    pub eyebrow: &'static str,
    pub title: &'static str,
    pub headline: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            eyebrow: "we are expanding",
            title: "Visit our Premium outlet",
            headline: "in Liberty Plaza",
            button_text: "SHOP NOW",
            button_url: "/products",
        }
    }
}

/// A collection tile linking into a pre-searched catalog.
#[derive(Clone)]
pub struct CollectionTile {
    pub title: &'static str,
    pub url: String,
}

impl CollectionTile {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            url: format!("/products?q={}", title.to_lowercase()),
        }
    }
}

const COLLECTIONS: [&str; 7] = [
    "DRESSES",
    "TOPS",
    "SKIRTS",
    "JUMPSUIT",
    "PANTS",
    "ACCESSORIES",
    "LUVESENSE",
];

fn collection_tiles() -> Vec<CollectionTile> {
    COLLECTIONS.into_iter().map(CollectionTile::new).collect()
}

/// A featured product in the new arrivals strip.
#[derive(Clone)]
pub struct ArrivalView {
    pub name: &'static str,
    pub price: &'static str,
    pub on_sale: bool,
}

/// Static new arrivals (can be replaced with catalog data later).
fn new_arrivals() -> Vec<ArrivalView> {
    ["V Neck Dress", "Slim Fit Jeans", "Floral Maxi Dress", "Bodycon Dress"]
        .into_iter()
        .map(|name| ArrivalView {
            name,
            price: "LKR 3,590",
            on_sale: true,
        })
        .collect()
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub hero: Hero,
    pub collections: Vec<CollectionTile>,
    pub new_arrivals: Vec<ArrivalView>,
}

impl Default for HomeTemplate {
    fn default() -> Self {
        Self {
            hero: Hero::default(),
            collections: collection_tiles(),
            new_arrivals: new_arrivals(),
        }
    }
}

/// Display the home page.
#[instrument]
pub async fn home() -> impl IntoResponse {
    HomeTemplate::default()
}
