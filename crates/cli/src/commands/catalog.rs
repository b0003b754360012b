//! Catalog commands.

use reuse_storefront::shopify::{ShopifyError, StorefrontClient};

/// List the first `first` products.
#[allow(clippy::print_stdout)]
pub async fn list(client: &StorefrontClient, first: i64) -> Result<(), ShopifyError> {
    let products = client.get_products(first).await?;
    for product in &products {
        let availability = if product.available_for_sale() {
            ""
        } else {
            "  (sold out)"
        };
        println!(
            "{:<32} {:<40} from {}{availability}",
            product.handle,
            product.title,
            product.price_range.min_variant_price.display()
        );
    }
    Ok(())
}

/// Show a product with its variant IDs, ready for `add`.
#[allow(clippy::print_stdout)]
pub async fn show(client: &StorefrontClient, handle: &str) -> Result<(), ShopifyError> {
    let product = client.get_product_by_handle(handle).await?;

    println!("{} ({})", product.title, product.handle);
    if !product.description.is_empty() {
        println!("{}", product.description);
    }
    for option in &product.options {
        println!("  {}: {}", option.name, option.values.join(", "));
    }
    println!();
    for variant in &product.variants {
        let availability = if variant.available_for_sale {
            ""
        } else {
            "  (sold out)"
        };
        println!(
            "  {:<24} {:>10}  {}{availability}",
            variant.title,
            variant.price.display(),
            variant.id
        );
    }
    Ok(())
}
