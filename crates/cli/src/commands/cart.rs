//! Cart rendering.

use std::fmt::Write;

use rocketshoes_core::Cart;

/// Print the cart to stdout.
#[allow(clippy::print_stdout)]
pub fn print(cart: &Cart) {
    print!("{}", render(cart));
}

/// Render one line per item followed by the badge count and subtotal.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{:>6}  {:<40}  {:>3} x {:>10} = {:>10}",
            item.id,
            item.title,
            item.amount,
            item.price,
            item.line_total(),
        );
    }
    let _ = writeln!(out, "Items: {}", cart.total_amount());
    let _ = writeln!(out, "Subtotal: {}", cart.subtotal());
    out
}
