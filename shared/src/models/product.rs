//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub spec: String,
    pub model: String,
    pub color: String,
    pub sku: String,
    /// External product code (69 码)
    #[serde(rename = "code69")]
    pub barcode: String,
    /// Exact number of serials that make one sealed box
    #[serde(rename = "quantity")]
    pub case_quantity: i64,
    pub weight: f64,
    /// Label template name
    pub template: String,
}

impl Product {
    /// Value written to a label variable mapped to `field`
    pub fn field_value(&self, field: ProductField) -> String {
        match field {
            ProductField::Name => self.name.clone(),
            ProductField::Spec => self.spec.clone(),
            ProductField::Model => self.model.clone(),
            ProductField::Color => self.color.clone(),
            ProductField::Sku => self.sku.clone(),
            ProductField::Code69 => self.barcode.clone(),
            ProductField::Quantity => self.case_quantity.to_string(),
            // 7.0 stays "7.0" on the label
            ProductField::Weight => format!("{:?}", self.weight),
        }
    }
}

/// Create / upsert product payload
///
/// Key names follow the config file and spreadsheet columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: String,
    pub spec: String,
    pub model: String,
    pub color: String,
    pub sku: String,
    #[serde(rename = "code69")]
    pub barcode: String,
    #[serde(rename = "quantity")]
    pub case_quantity: i64,
    pub weight: f64,
    pub template: String,
}

impl From<Product> for ProductInput {
    fn from(p: Product) -> Self {
        Self {
            name: p.name,
            spec: p.spec,
            model: p.model,
            color: p.color,
            sku: p.sku,
            barcode: p.barcode,
            case_quantity: p.case_quantity,
            weight: p.weight,
            template: p.template,
        }
    }
}

/// Product attribute keys a label variable can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductField {
    Name,
    Spec,
    Model,
    Color,
    Sku,
    Code69,
    Quantity,
    Weight,
}

impl ProductField {
    pub const ALL: [ProductField; 8] = [
        ProductField::Name,
        ProductField::Spec,
        ProductField::Model,
        ProductField::Color,
        ProductField::Sku,
        ProductField::Code69,
        ProductField::Quantity,
        ProductField::Weight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Spec => "spec",
            ProductField::Model => "model",
            ProductField::Color => "color",
            ProductField::Sku => "sku",
            ProductField::Code69 => "code69",
            ProductField::Quantity => "quantity",
            ProductField::Weight => "weight",
        }
    }
}

impl std::fmt::Display for ProductField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
