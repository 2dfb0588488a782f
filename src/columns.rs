use crate::domain::Message;
use crate::item::{Item, ItemField};

/// Key of the synthetic column holding the per row control.
pub const ACTIONS_KEY: &str = "actions";

pub enum Column {
    Field {
        field: ItemField,
        label: &'static str,
        width: usize,
    },
    Action {
        label: &'static str,
        control: &'static str,
        width: usize,
        on_invoke: fn(u64) -> Message,
    },
}

/// What a table cell shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Control(&'static str),
}

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Control(label) => format!("[ {label} ]"),
        }
    }
}

impl Column {
    pub fn key(&self) -> &'static str {
        match self {
            Column::Field { field, .. } => field.key(),
            Column::Action { .. } => ACTIONS_KEY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::Field { label, .. } | Column::Action { label, .. } => *label,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Column::Field { width, .. } | Column::Action { width, .. } => *width,
        }
    }

    pub fn field(&self) -> Option<ItemField> {
        match self {
            Column::Field { field, .. } => Some(*field),
            Column::Action { .. } => None,
        }
    }

    pub fn cell(&self, item: &Item) -> Cell {
        match self {
            Column::Field { field, .. } => Cell::Text(field.display(item)),
            Column::Action { control, .. } => Cell::Control(*control),
        }
    }

    /// Activate the cell of `item` in this column. Plain fields have no effect.
    pub fn invoke(&self, item: &Item) -> Option<Message> {
        match self {
            Column::Field { .. } => None,
            Column::Action { on_invoke, .. } => Some(on_invoke(item.id)),
        }
    }
}

fn field(field: ItemField, label: &'static str, width: usize) -> Column {
    Column::Field {
        field,
        label,
        width,
    }
}

/// Column layout of the product table: ten data columns followed by the
/// actions column opening the review dialog of a row.
pub fn product_columns() -> Vec<Column> {
    vec![
        field(ItemField::Id, "ID", 5),
        field(ItemField::Title, "Title", 24),
        field(ItemField::Description, "Description", 40),
        field(ItemField::Category, "Category", 16),
        field(ItemField::Price, "Price", 9),
        field(ItemField::DiscountPercentage, "Discount %", 11),
        field(ItemField::Rating, "Rating", 7),
        field(ItemField::Stock, "Stock", 6),
        field(ItemField::Tags, "Tags", 24),
        field(ItemField::Brand, "Brand", 16),
        Column::Action {
            label: "Actions",
            control: "View Reviews",
            width: 18,
            on_invoke: Message::ViewDetails,
        },
    ]
}
