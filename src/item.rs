use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A single catalog record as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub rating: f64,
    pub stock: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    // Not every catalog category carries a brand.
    #[serde(default)]
    pub brand: String,
}

// Envelope of `GET /products`. Paging fields (total, skip, limit) are ignored.
#[derive(Debug, Deserialize)]
pub struct ItemPage {
    pub products: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Id,
    Title,
    Description,
    Category,
    Price,
    DiscountPercentage,
    Rating,
    Stock,
    Tags,
    Brand,
}

impl ItemField {
    /// Field name as it appears on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            ItemField::Id => "id",
            ItemField::Title => "title",
            ItemField::Description => "description",
            ItemField::Category => "category",
            ItemField::Price => "price",
            ItemField::DiscountPercentage => "discountPercentage",
            ItemField::Rating => "rating",
            ItemField::Stock => "stock",
            ItemField::Tags => "tags",
            ItemField::Brand => "brand",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ItemField::Id
                | ItemField::Price
                | ItemField::DiscountPercentage
                | ItemField::Rating
                | ItemField::Stock
        )
    }

    /// Render the field of `item` as display text. Multi line values are
    /// flattened so a table cell stays on one line.
    pub fn display(&self, item: &Item) -> String {
        let text = match self {
            ItemField::Id => item.id.to_string(),
            ItemField::Title => item.title.clone(),
            ItemField::Description => item.description.clone(),
            ItemField::Category => item.category.clone(),
            ItemField::Price => item.price.to_string(),
            ItemField::DiscountPercentage => item.discount_percentage.to_string(),
            ItemField::Rating => item.rating.to_string(),
            ItemField::Stock => item.stock.to_string(),
            ItemField::Tags => item.tags.join(", "),
            ItemField::Brand => item.brand.clone(),
        };
        text.replace("\r\n", " ↵ ").replace('\n', " ↵ ")
    }

    fn numeric(&self, item: &Item) -> Option<f64> {
        match self {
            ItemField::Id => Some(item.id as f64),
            ItemField::Price => Some(item.price),
            ItemField::DiscountPercentage => Some(item.discount_percentage),
            ItemField::Rating => Some(item.rating),
            ItemField::Stock => Some(item.stock as f64),
            _ => None,
        }
    }

    /// Ascending order of two items by this field.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match (self.numeric(a), self.numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => self.display(a).cmp(&self.display(b)),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(id: u64) -> Item {
    Item {
        id,
        title: format!("Product {id}"),
        description: format!("Description of product {id}"),
        category: "beauty".to_string(),
        price: 9.99 + id as f64,
        discount_percentage: 7.17,
        rating: 4.94,
        stock: 5 * id as i64,
        tags: vec!["beauty".to_string(), "mascara".to_string()],
        brand: "Essence".to_string(),
    }
}
