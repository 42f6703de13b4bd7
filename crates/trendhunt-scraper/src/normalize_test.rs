use super::*;
use serde_json::json;

fn full_item() -> Value {
    json!({
        "id": 7_301_224_118_u64,
        "title": "Portable Blender USB Rechargeable",
        "desc": "ignored when a title exists",
        "webVideoUrl": "https://www.tiktok.com/@kgp/video/7301224118",
        "url": "https://fallback.example/p",
        "price": "$24.99",
        "originalPrice": 39.99,
        "playCount": "15.4K",
        "rating": 4.7,
        "commentCount": 2341,
        "authorMeta": { "name": "KitchenGadgetsPro" },
        "covers": ["https://cdn.example/blender.jpg", "https://cdn.example/alt.jpg"],
        "comments": [
            "Perfect for my morning smoothies!",
            { "text": "Battery lasts all week" },
            "   ",
            42
        ]
    })
}

#[test]
fn full_item_maps_every_field() {
    let product = normalize_item(&full_item(), "Kitchen Gadgets").unwrap();

    assert_eq!(product.product_id, "7301224118");
    assert_eq!(product.title, "Portable Blender USB Rechargeable");
    assert_eq!(
        product.source_url,
        "https://www.tiktok.com/@kgp/video/7301224118"
    );
    assert_eq!(product.price, Decimal::new(2499, 2));
    assert_eq!(product.original_price, Some(Decimal::new(3999, 2)));
    assert_eq!(product.sales_count, 15_400);
    assert_eq!(product.rating_average, Some(4.7));
    assert_eq!(product.review_count, 2341);
    assert_eq!(product.shop_name.as_deref(), Some("KitchenGadgetsPro"));
    assert_eq!(
        product.image_url.as_deref(),
        Some("https://cdn.example/blender.jpg")
    );
    assert_eq!(product.category, "Kitchen Gadgets");
    assert_eq!(
        product.review_excerpts,
        vec![
            "Perfect for my morning smoothies!".to_owned(),
            "Battery lasts all week".to_owned()
        ]
    );
}

#[test]
fn description_and_url_fallbacks() {
    let item = json!({
        "id": "abc",
        "desc": "  Silicone Stretch Lids  ",
        "url": "https://shop.example/lids",
        "salesCount": 25678
    });
    let product = normalize_item(&item, "Kitchen").unwrap();
    assert_eq!(product.title, "Silicone Stretch Lids");
    assert_eq!(product.source_url, "https://shop.example/lids");
    assert_eq!(product.sales_count, 25_678);
}

#[test]
fn minimal_item_defaults_missing_fields() {
    let product = normalize_item(&json!({ "title": "Spice Rack" }), "Kitchen").unwrap();
    assert_eq!(product.product_id, "");
    assert_eq!(product.price, Decimal::ZERO);
    assert_eq!(product.sales_count, 0);
    assert_eq!(product.rating_average, None);
    assert_eq!(product.review_count, 0);
    assert!(product.review_excerpts.is_empty());
    assert_eq!(product.source_url, "");
    assert_eq!(product.shop_name, None);
    assert_eq!(product.image_url, None);
}

#[test]
fn comments_are_capped() {
    let comments: Vec<String> = (0..25).map(|i| format!("comment {i}")).collect();
    let item = json!({ "title": "Liners", "comments": comments });
    let product = normalize_item(&item, "Kitchen").unwrap();
    assert_eq!(product.review_excerpts.len(), MAX_ITEM_COMMENTS);
    assert_eq!(product.review_excerpts[0], "comment 0");
}

#[test]
fn out_of_range_rating_is_dropped_not_fatal() {
    let item = json!({ "title": "Chopper", "rating": 9.5 });
    let product = normalize_item(&item, "Kitchen").unwrap();
    assert_eq!(product.rating_average, None);
}

#[test]
fn missing_title_is_rejected() {
    let err = normalize_item(&json!({ "id": "x1", "desc": "   " }), "Kitchen").unwrap_err();
    match err {
        ApifyError::Normalization { item_id, .. } => assert_eq!(item_id, "x1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_price_is_rejected() {
    let item = json!({ "title": "Blender", "price": "call for price" });
    assert!(matches!(
        normalize_item(&item, "Kitchen"),
        Err(ApifyError::Normalization { .. })
    ));
}

#[test]
fn unreadable_sales_count_is_rejected() {
    let item = json!({ "title": "Blender", "playCount": { "total": 5 } });
    assert!(normalize_item(&item, "Kitchen").is_err());
}

#[test]
fn non_object_is_rejected() {
    assert!(normalize_item(&json!("just a string"), "Kitchen").is_err());
    assert!(normalize_item(&json!(null), "Kitchen").is_err());
}
