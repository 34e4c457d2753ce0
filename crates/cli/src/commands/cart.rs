//! Cart commands. Each one assumes the session is already signed in.

use storefront_sync_client::{Cart, DispatchScope, Dispatcher};
use storefront_sync_core::{CurrencyCode, LineId, Price, ProductId};

use super::{CliError, settle};

pub async fn show(dispatcher: &Dispatcher, scope: &DispatchScope) -> Result<(), CliError> {
    settle(dispatcher.fetch_cart(scope.token()).await)?;
    print(dispatcher);
    Ok(())
}

pub async fn add(
    dispatcher: &Dispatcher,
    scope: &DispatchScope,
    product: &str,
    quantity: u32,
) -> Result<(), CliError> {
    settle(
        dispatcher
            .add_to_cart(&ProductId::new(product), quantity, scope.token())
            .await,
    )?;
    print(dispatcher);
    Ok(())
}

pub async fn update(
    dispatcher: &Dispatcher,
    scope: &DispatchScope,
    line: &str,
    quantity: u32,
) -> Result<(), CliError> {
    settle(
        dispatcher
            .update_cart_item(&LineId::new(line), quantity, scope.token())
            .await,
    )?;
    print(dispatcher);
    Ok(())
}

pub async fn remove(
    dispatcher: &Dispatcher,
    scope: &DispatchScope,
    line: &str,
) -> Result<(), CliError> {
    settle(
        dispatcher
            .remove_from_cart(&LineId::new(line), scope.token())
            .await,
    )?;
    print(dispatcher);
    Ok(())
}

pub async fn clear(dispatcher: &Dispatcher, scope: &DispatchScope) -> Result<(), CliError> {
    settle(dispatcher.clear_cart(scope.token()).await)?;
    print(dispatcher);
    Ok(())
}

fn print(dispatcher: &Dispatcher) {
    let currency = dispatcher.currency();
    dispatcher.store().read(|state| {
        print_cart(&state.cart.cart, currency, state.cart.notice.message.as_deref());
    });
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart, currency: CurrencyCode, message: Option<&str>) {
    if let Some(message) = message {
        println!("{message}");
    }
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<26} {:<40} {:>3} x {:>10} = {:>10}",
            line.line_id,
            line.name,
            line.quantity,
            Price::new(line.unit_price, currency).display(),
            Price::new(line.line_total(), currency).display(),
        );
    }
    println!();
    println!(
        "Items: {}  Total: {}",
        cart.item_count(),
        cart.total_price(currency).display()
    );
}
