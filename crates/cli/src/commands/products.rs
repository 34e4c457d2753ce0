//! Catalog commands.

use storefront_sync_client::backend::Product;
use storefront_sync_client::catalog::CatalogQuery;
use storefront_sync_client::pagination::{PageControl, page_controls};
use storefront_sync_client::{DispatchScope, Dispatcher};
use storefront_sync_core::{CurrencyCode, Price, ProductId};

use super::{CliError, settle};

/// Print one page of products and the pagination controls.
pub async fn list(
    dispatcher: &Dispatcher,
    scope: &DispatchScope,
    keyword: Option<&str>,
    category: Option<&str>,
    page: u32,
) -> Result<(), CliError> {
    let mut query = CatalogQuery::new().with_page(page);
    if let Some(keyword) = keyword {
        query = query.keyword(keyword);
    }
    if let Some(category) = category {
        query = query.category(category);
    }

    settle(dispatcher.list_products(&query, scope.token()).await)?;

    let currency = dispatcher.currency();
    dispatcher.store().read(|state| {
        let catalog = &state.catalog;
        let controls = page_controls(catalog.current_page, catalog.total_pages());
        print_listing(&catalog.products, currency);
        print_footer(
            catalog.current_page,
            catalog.total_pages(),
            catalog.total_count,
            &controls,
        );
    });
    Ok(())
}

/// Print a product's details and reviews.
pub async fn show(
    dispatcher: &Dispatcher,
    scope: &DispatchScope,
    id: &str,
) -> Result<(), CliError> {
    settle(
        dispatcher
            .get_product_detail(&ProductId::new(id), scope.token())
            .await,
    )?;

    let currency = dispatcher.currency();
    dispatcher.store().read(|state| {
        if let Some(product) = &state.catalog.product {
            print_detail(product, currency);
        }
    });
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_listing(products: &[Product], currency: CurrencyCode) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        println!(
            "{:<26} {:<40} {:>10}  {}",
            product.id,
            product.name,
            Price::new(product.price, currency).display(),
            stock_label(product.stock),
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_footer(current: u32, total_pages: u32, total_count: u64, controls: &[PageControl]) {
    println!();
    println!("Page {current} of {total_pages} ({total_count} products)");
    if !controls.is_empty() {
        println!("{}", render_controls(controls));
    }
}

#[allow(clippy::print_stdout)]
fn print_detail(product: &Product, currency: CurrencyCode) {
    println!("{}", product.name);
    println!("  id:       {}", product.id);
    println!("  price:    {}", Price::new(product.price, currency).display());
    println!("  stock:    {}", stock_label(product.stock));
    if let Some(category) = &product.category {
        println!("  category: {category}");
    }
    println!(
        "  rating:   {:.1} ({} reviews)",
        product.rating_average, product.review_count
    );
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    if !product.reviews.is_empty() {
        println!();
        println!("Reviews:");
        for review in &product.reviews {
            println!("  {:.1}  {}: {}", review.rating, review.name, review.comment);
        }
    }
}

fn stock_label(stock: u32) -> String {
    if stock == 0 {
        "out of stock".to_string()
    } else {
        format!("{stock} in stock")
    }
}

/// Render controls as e.g. `< 2 | [3] | 4 >`.
fn render_controls(controls: &[PageControl]) -> String {
    controls
        .iter()
        .map(|control| match *control {
            PageControl::Prev { target } => format!("< {target}"),
            PageControl::Page {
                number,
                active: true,
            } => format!("[{number}]"),
            PageControl::Page { number, .. } => number.to_string(),
            PageControl::Next { target } => format!("{target} >"),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
