//! Product type conversion functions.

use reuse_core::{MerchandiseId, ProductId};

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Image, PriceRange, Product, ProductOption, ProductVariant, SelectedOption,
};

use super::super::queries::{ImageFields, ProductFields, ProductVariantFields};
use super::cart::convert_money;

fn convert_image(image: ImageFields) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

fn convert_variant(variant: ProductVariantFields) -> Result<ProductVariant, ShopifyError> {
    Ok(ProductVariant {
        id: MerchandiseId::new(variant.id),
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        price: convert_money(variant.price)?,
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: variant.image.map(convert_image),
    })
}

/// Convert the `ProductFields` selection into a product.
pub fn convert_product(product: ProductFields) -> Result<Product, ShopifyError> {
    Ok(Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        description: product.description,
        kind: product.product_type,
        tags: product.tags,
        price_range: PriceRange {
            min_variant_price: convert_money(product.price_range.min_variant_price)?,
            max_variant_price: convert_money(product.price_range.max_variant_price)?,
        },
        images: product.images.into_nodes().map(convert_image).collect(),
        options: product
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
        variants: product
            .variants
            .into_nodes()
            .map(convert_variant)
            .collect::<Result<_, _>>()?,
    })
}
