//! Offline catalog of five kitchen-gadget listings for development runs
//! without an Apify token.

use async_trait::async_trait;
use rust_decimal::Decimal;
use trendhunt_core::{FetchError, ProductSource, RawProduct};

struct SampleListing {
    id: &'static str,
    title: &'static str,
    price_cents: i64,
    original_price_cents: i64,
    sales_count: u64,
    rating: f64,
    review_count: u64,
    shop: &'static str,
    image: &'static str,
    reviews: [&'static str; 5],
}

static LISTINGS: [SampleListing; 5] = [
    SampleListing {
        id: "mock_001",
        title: "Portable Blender USB Rechargeable",
        price_cents: 2499,
        original_price_cents: 3999,
        sales_count: 15_420,
        rating: 4.7,
        review_count: 2341,
        shop: "KitchenGadgetsPro",
        image: "https://example.com/blender.jpg",
        reviews: [
            "Perfect for my morning smoothies! So convenient for the office.",
            "Battery lasts all week, amazing quality for the price!",
            "Bought this for my gym bag, absolute game changer!",
            "My kids love making their own fruit drinks now.",
            "Wish I bought this sooner, makes healthy eating so easy!",
        ],
    },
    SampleListing {
        id: "mock_002",
        title: "Electric Vegetable Chopper 3-in-1",
        price_cents: 3499,
        original_price_cents: 4999,
        sales_count: 8932,
        rating: 4.5,
        review_count: 1256,
        shop: "HomeChefTools",
        image: "https://example.com/chopper.jpg",
        reviews: [
            "Saves me so much time meal prepping!",
            "Finally, no more crying while cutting onions!",
            "The cleanup is super easy, dishwasher safe.",
            "Bought for my mom and she absolutely loves it.",
            "Great for making salsa and guacamole quickly.",
        ],
    },
    SampleListing {
        id: "mock_003",
        title: "Silicone Stretch Lids Set of 12",
        price_cents: 1299,
        original_price_cents: 1999,
        sales_count: 25_678,
        rating: 4.8,
        review_count: 4521,
        shop: "EcoKitchenStore",
        image: "https://example.com/lids.jpg",
        reviews: [
            "No more plastic wrap! These are incredible.",
            "Fit perfectly on all my bowls and containers.",
            "Such a simple solution, why didn't I buy these sooner?",
            "Great for keeping food fresh, very stretchy.",
            "Eco-friendly and actually works great!",
        ],
    },
    SampleListing {
        id: "mock_004",
        title: "Magnetic Spice Rack Organizer",
        price_cents: 2899,
        original_price_cents: 4499,
        sales_count: 6234,
        rating: 4.6,
        review_count: 892,
        shop: "OrganizeMyHome",
        image: "https://example.com/spicerack.jpg",
        reviews: [
            "Finally organized my tiny kitchen!",
            "The magnets are super strong, no falling jars.",
            "Looks so aesthetic on my fridge.",
            "Space saver for small apartments!",
            "Great gift idea for home cooks.",
        ],
    },
    SampleListing {
        id: "mock_005",
        title: "Air Fryer Liners Disposable 100pcs",
        price_cents: 999,
        original_price_cents: 1499,
        sales_count: 42_156,
        rating: 4.9,
        review_count: 7823,
        shop: "AirFryerEssentials",
        image: "https://example.com/liners.jpg",
        reviews: [
            "Makes cleanup a breeze, love these!",
            "No more scrubbing my air fryer basket.",
            "Great quality and perfect fit for my Ninja.",
            "Reordering for the third time, can't live without them.",
            "Food doesn't stick anymore, highly recommend!",
        ],
    },
];

impl SampleListing {
    fn to_product(&self, category: &str) -> RawProduct {
        RawProduct {
            product_id: self.id.to_owned(),
            title: self.title.to_owned(),
            price: Decimal::new(self.price_cents, 2),
            original_price: Some(Decimal::new(self.original_price_cents, 2)),
            sales_count: self.sales_count,
            rating_average: Some(self.rating),
            review_count: self.review_count,
            review_excerpts: self.reviews.iter().map(|r| (*r).to_owned()).collect(),
            category: category.to_owned(),
            source_url: format!("https://tiktokshop.com/product/{}", self.id),
            shop_name: Some(self.shop.to_owned()),
            image_url: Some(self.image.to_owned()),
        }
    }
}

/// [`ProductSource`] that serves the fixed sample listings under whatever
/// category is requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleCatalog;

#[async_trait]
impl ProductSource for SampleCatalog {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn fetch_trending(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawProduct>, FetchError> {
        tracing::info!(category, limit, "serving sample product catalog");
        Ok(LISTINGS
            .iter()
            .take(limit)
            .map(|listing| listing.to_product(category))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_all_listings_under_requested_category() {
        let products = SampleCatalog.fetch_trending("Kitchen Gadgets", 50).await.unwrap();
        assert_eq!(products.len(), 5);
        assert!(products.iter().all(|p| p.category == "Kitchen Gadgets"));

        let blender = &products[0];
        assert_eq!(blender.title, "Portable Blender USB Rechargeable");
        assert_eq!(blender.price, Decimal::new(2499, 2));
        assert_eq!(blender.original_price, Some(Decimal::new(3999, 2)));
        assert_eq!(blender.sales_count, 15_420);
        assert_eq!(blender.review_excerpts.len(), 5);
        assert_eq!(blender.source_url, "https://tiktokshop.com/product/mock_001");
    }

    #[tokio::test]
    async fn respects_limit() {
        let products = SampleCatalog.fetch_trending("Kitchen", 2).await.unwrap();
        let ids: Vec<&str> = products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["mock_001", "mock_002"]);
    }

    #[tokio::test]
    async fn zero_limit_yields_nothing() {
        assert!(SampleCatalog.fetch_trending("Kitchen", 0).await.unwrap().is_empty());
    }
}
