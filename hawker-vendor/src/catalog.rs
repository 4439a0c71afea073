//! Keyword catalog for base prices.

use hawker_protocol::stable_hash;

/// Base prices in cents, matched by substring against the lowercased
/// product id. First match wins.
const CATALOG: &[(&str, i64)] = &[
    // Electronics
    ("laptop", 89_900),
    ("macbook", 129_900),
    ("iphone", 79_900),
    ("ipad", 59_900),
    ("airpods", 19_900),
    ("watch", 39_900),
    ("monitor", 34_900),
    ("keyboard", 12_900),
    ("mouse", 7_900),
    ("webcam", 8_900),
    ("speaker", 14_900),
    ("headphones", 24_900),
    ("camera", 89_900),
    ("drone", 119_900),
    ("tablet", 49_900),
    // Home & kitchen
    ("blender", 7_900),
    ("toaster-oven", 8_900),
    ("toaster", 4_900),
    ("microwave", 12_900),
    ("vacuum", 24_900),
    ("coffee", 9_900),
    ("airfryer", 14_900),
    ("mixer", 6_900),
    ("kettle", 5_900),
    // Sports & outdoors
    ("bike", 39_900),
    ("yoga-mat", 2_900),
    ("dumbbell", 4_900),
    ("treadmill", 59_900),
    ("tent", 12_900),
    ("backpack", 7_900),
    ("sleeping-bag", 8_900),
    ("hiking-boots", 14_900),
    // Books & media
    ("textbook", 4_999),
    ("ebook", 999),
    ("book", 1_999),
    // Clothing
    ("jacket", 12_900),
    ("shoes", 8_900),
    ("jeans", 5_900),
    ("shirt", 2_900),
    ("hoodie", 4_900),
    // Toys & games
    ("lego", 5_900),
    ("puzzle", 1_999),
    ("boardgame", 3_999),
    ("controller", 5_900),
    // Office
    ("desk", 19_900),
    ("chair", 24_900),
    ("lamp", 4_900),
    ("organizer", 2_900),
    // Beauty & personal care
    ("perfume", 7_900),
    ("shampoo", 1_499),
    ("razor", 2_999),
    ("trimmer", 4_900),
    // Fallback keyword
    ("default", 4_999),
];

/// Base price for a product id: catalog keyword hit, or a deterministic
/// hash-derived price in `[$10, $300]` for unknown products.
pub fn base_price_cents(product_id: &str) -> i64 {
    let normalized = product_id.to_lowercase();
    for (keyword, cents) in CATALOG {
        if normalized.contains(keyword) {
            return *cents;
        }
    }
    1_000 + (stable_hash(product_id) % 29_000) as i64
}
