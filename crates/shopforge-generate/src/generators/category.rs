use shopforge_core::Category;
use tracing::info;

use crate::config::GenerationConfig;

/// Fixed root category catalog, truncated to the configured count.
pub const CATALOG: &[(&str, &str)] = &[
    ("Phones & Accessories", "Mobile phones and accessories"),
    ("Laptops & Computers", "Laptops, desktops and components"),
    ("Home Appliances", "Fridges, washing machines, air conditioners"),
    ("Men's Fashion", "Men's clothing and footwear"),
    ("Women's Fashion", "Women's clothing and footwear"),
    ("Mother & Baby", "Products for mothers and babies"),
    ("Health & Beauty", "Cosmetics and personal care"),
    ("Home & Living", "Furniture and home decor"),
    ("Sports & Travel", "Sportswear and outdoor gear"),
    ("Auto & Moto", "Vehicle accessories"),
    ("Books & Stationery", "Books and office supplies"),
    ("Toys", "Toys for children"),
    ("Food & Beverages", "Groceries and drinks"),
    ("Cameras & Camcorders", "Cameras and photo accessories"),
    ("Watches", "Wrist watches"),
    ("Jewelry", "Jewelry and accessories"),
    ("Digital Devices", "Tablets, drives and USB storage"),
    ("Gaming", "Gaming hardware"),
    ("Audio", "Speakers, headphones and microphones"),
    ("Vouchers & Services", "Vouchers and gift cards"),
];

pub struct CategoryGenerator<'a> {
    config: &'a GenerationConfig,
}

impl<'a> CategoryGenerator<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self) -> Vec<Category> {
        let categories: Vec<Category> = CATALOG
            .iter()
            .take(self.config.num_categories)
            .map(|(name, description)| Category {
                name: (*name).to_string(),
                description: (*description).to_string(),
                parent_id: None,
                is_active: true,
                created_at: self.config.as_of,
                updated_at: self.config.as_of,
            })
            .collect();
        info!(table = "categories", rows = categories.len(), "generated table");
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_catalog_to_configured_count() {
        let config = GenerationConfig {
            num_categories: 5,
            ..GenerationConfig::default()
        };
        let categories = CategoryGenerator::new(&config).generate();
        assert_eq!(categories.len(), 5);
        assert!(categories.iter().all(|c| c.parent_id.is_none() && !c.name.is_empty()));
    }
}
