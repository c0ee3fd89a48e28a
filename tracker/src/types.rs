use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column values keyed by column id, in the order they were added.
pub type ColumnValues = IndexMap<String, ColumnValue>;

/// A record created on the tracking service.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// The value written to one column, in the shape the service expects for its column type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(String),
    Label {
        label: String,
    },
    Phone {
        phone: String,
        #[serde(rename = "countryShortName")]
        country_short_name: String,
    },
    Email {
        email: String,
        text: String,
    },
    DateTime {
        date: String,
        time: String,
    },
}
