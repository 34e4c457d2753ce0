//! Conversions from wire types to domain types.

use storefront_sync_core::{LineId, OrderId, ProductId, ReviewId, UserId};

use super::wire::{
    ProductsPayload, WireCart, WireCartItem, WireCartProduct, WireImage, WireOrder, WireProduct,
    WireReview, WireUser,
};
use crate::backend::types::{CartLine, Image, Product, Review, UserProfile};
use crate::catalog::ProductPage;

const DEFAULT_ROLE: &str = "user";

fn convert_image(image: WireImage) -> Image {
    Image { url: image.url }
}

pub fn convert_user(user: WireUser) -> UserProfile {
    UserProfile {
        id: UserId::new(user.id),
        name: user.name,
        email: user.email,
        avatar: user.avatar.map(convert_image),
        role: user.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        created_at: user.created_at,
    }
}

fn convert_review(review: WireReview) -> Review {
    Review {
        id: review.id.map(ReviewId::new),
        user_id: review.user.map(UserId::new),
        name: review.name,
        rating: review.rating,
        comment: review.comment,
    }
}

pub fn convert_product(product: WireProduct) -> Product {
    Product {
        id: ProductId::new(product.id),
        name: product.name,
        description: product.description,
        price: product.price,
        stock: product.stock,
        rating_average: product.ratings,
        review_count: product.num_of_reviews,
        category: product.category.filter(|c| !c.is_empty()),
        images: product.images.into_iter().map(convert_image).collect(),
        reviews: product.reviews.into_iter().map(convert_review).collect(),
    }
}

pub fn convert_products(products: Vec<WireProduct>) -> Vec<Product> {
    products.into_iter().map(convert_product).collect()
}

/// Listing counts fall back to the page itself when the backend omits them.
pub fn convert_product_page(payload: ProductsPayload) -> ProductPage {
    let returned = payload.products.len();
    let total_count = payload
        .filtered_products_count
        .or(payload.products_count)
        .or(payload.product_count)
        .unwrap_or_else(|| u64::try_from(returned).unwrap_or(u64::MAX));
    let page_size = payload
        .result_per_page
        .or(payload.results_per_page)
        .unwrap_or_else(|| u32::try_from(returned).unwrap_or(u32::MAX));

    ProductPage {
        products: convert_products(payload.products),
        total_count,
        page_size,
    }
}

fn convert_cart_item(item: WireCartItem) -> CartLine {
    let (product_id, name, stock, image) = match item.product {
        WireCartProduct::Populated(doc) => (
            doc.id,
            doc.name,
            doc.stock,
            doc.image.into_iter().next().map(convert_image),
        ),
        WireCartProduct::Id(id) => (id, String::new(), 0, None),
    };

    CartLine {
        line_id: LineId::new(item.id),
        product_id: ProductId::new(product_id),
        name,
        unit_price: item.price,
        quantity: item.quantity,
        stock,
        image,
    }
}

/// A missing cart (`cart: null`) is an empty cart.
pub fn convert_cart(cart: Option<WireCart>) -> Vec<CartLine> {
    cart.map(|c| c.items.into_iter().map(convert_cart_item).collect())
        .unwrap_or_default()
}

pub fn convert_order_id(order: Option<WireOrder>) -> Option<OrderId> {
    order.map(|o| OrderId::new(o.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::backend::client::wire::{CartPayload, Envelope};

    #[test]
    fn test_convert_cart_scenario() {
        let env: Envelope<CartPayload> = serde_json::from_str(
            r#"{"success":true,"cart":{"items":[{"_id":"a","product":{"_id":"p1","name":"Shoe","image":[],"stock":3},"quantity":2,"price":50}]}}"#,
        )
        .unwrap();

        let lines = convert_cart(env.data.cart);
        assert_eq!(lines.len(), 1);
        let line = lines.first().unwrap();
        assert_eq!(line.line_id.as_str(), "a");
        assert_eq!(line.product_id.as_str(), "p1");
        assert_eq!(line.name, "Shoe");
        assert_eq!(line.stock, 3);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Decimal::new(50, 0));
        assert!(line.image.is_none());
    }

    #[test]
    fn test_convert_null_cart() {
        let env: Envelope<CartPayload> =
            serde_json::from_str(r#"{"success":true,"cart":null}"#).unwrap();
        assert!(convert_cart(env.data.cart).is_empty());
    }

    #[test]
    fn test_convert_product_page_counts() {
        let payload: ProductsPayload = serde_json::from_str(
            r#"{"products":[{"_id":"p1","name":"Shoe","price":50,"Stock":4,"ratings":4.5,"numOfReviews":2,"images":[{"url":"https://img/1.png"}]}],
                "productsCount":23,"filteredProductsCount":9,"resultPerPage":8}"#,
        )
        .unwrap();

        let page = convert_product_page(payload);
        assert_eq!(page.total_count, 9);
        assert_eq!(page.page_size, 8);
        let product = page.products.first().unwrap();
        assert_eq!(product.stock, 4);
        assert_eq!(product.review_count, 2);
        assert_eq!(product.primary_image().unwrap().url, "https://img/1.png");
    }

    #[test]
    fn test_convert_product_page_without_counts() {
        let payload: ProductsPayload = serde_json::from_str(
            r#"{"products":[{"_id":"p1","name":"A","price":1},{"_id":"p2","name":"B","price":2}]}"#,
        )
        .unwrap();

        let page = convert_product_page(payload);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.page_size, 2);
    }

    #[test]
    fn test_convert_user_defaults_role() {
        let user: WireUser =
            serde_json::from_str(r#"{"_id":"u1","name":"Ada","email":"ada@example.com"}"#)
                .unwrap();
        let profile = convert_user(user);
        assert_eq!(profile.role, "user");
        assert!(!profile.is_admin());
    }
}
