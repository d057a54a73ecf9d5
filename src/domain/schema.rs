//! Output schema and the positional column map that feeds it.
//!
//! Input files are read by column index, not header text, so the indices live
//! here as configuration data. A layout change in the master files is a
//! `[schema]` change in the config, not a code change.

use crate::utils::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const OUTPUT_HEADERS: [&str; 36] = [
    "First Name",
    "Last Name",
    "Company",
    "Title",
    "Phone1",
    "Phone2",
    "Other Phones",
    "Email1",
    "Other Emails",
    "Address1",
    "City",
    "State",
    "Country",
    "Pincode",
    "Address2",
    "Assignee",
    "Contact Type",
    "Location",
    "Feedbacks",
    "Property Type",
    "Property Available For",
    "Property Sell Address",
    "Property Meet Address",
    "Lead Source",
    "Ops-Sale-Lead-Given-By",
    "Meeting-Date",
    "Meeting-Time",
    "Call-Time",
    "Area",
    "Price",
    "BHK",
    "Sq.Ft.-Sq.Yd.",
    "Relationship-Manager",
    "Total No. of property",
    "Property Area",
    "Priority-lead",
];

pub fn header_index(field: &str) -> Option<usize> {
    OUTPUT_HEADERS.iter().position(|h| *h == field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalizer {
    Phone,
    Trim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source: usize,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<Normalizer>,
}

impl FieldMapping {
    fn plain(source: usize, target: &str) -> Self {
        Self {
            source,
            target: target.to_string(),
            prefix: None,
            normalize: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub version: String,
    pub record_type_column: usize,
    pub record_type_value: String,
    pub location_column: usize,
    pub mappings: Vec<FieldMapping>,
    pub constants: BTreeMap<String, String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            record_type_column: 1,
            record_type_value: "res_resale".to_string(),
            location_column: 5,
            mappings: vec![
                FieldMapping::plain(3, "First Name"),
                FieldMapping {
                    normalize: Some(Normalizer::Phone),
                    ..FieldMapping::plain(4, "Phone1")
                },
                FieldMapping {
                    prefix: Some("P-".to_string()),
                    ..FieldMapping::plain(5, "Location")
                },
                FieldMapping::plain(5, "Area"),
                FieldMapping::plain(6, "Property Sell Address"),
                FieldMapping::plain(7, "BHK"),
                FieldMapping::plain(8, "Sq.Ft.-Sq.Yd."),
                FieldMapping::plain(15, "Price"),
            ],
            constants: BTreeMap::from([
                ("Company".to_string(), "NEW".to_string()),
                ("Property Type".to_string(), "Residential".to_string()),
                ("Property Available For".to_string(), "Sell".to_string()),
            ]),
        }
    }
}

impl ColumnMap {
    /// Narrowest row the transformer can read.
    pub fn min_width(&self) -> usize {
        self.mappings
            .iter()
            .map(|m| m.source + 1)
            .max()
            .unwrap_or(0)
    }

    /// Resolve target names to schema positions, rejecting unknown or
    /// doubly-assigned fields.
    pub fn compile(&self) -> Result<CompiledColumnMap> {
        let mut seen = HashSet::new();
        let mut claim = |target: &str| -> Result<usize> {
            let index = header_index(target).ok_or_else(|| RouterError::InvalidConfigValueError {
                field: "schema.mappings.target".to_string(),
                value: target.to_string(),
                reason: "not an output schema field".to_string(),
            })?;
            if !seen.insert(index) {
                return Err(RouterError::InvalidConfigValueError {
                    field: "schema".to_string(),
                    value: target.to_string(),
                    reason: "field is assigned more than once".to_string(),
                });
            }
            Ok(index)
        };

        let mut fields = Vec::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            fields.push(CompiledField {
                source: mapping.source,
                target: claim(&mapping.target)?,
                prefix: mapping.prefix.clone(),
                normalize: mapping.normalize,
            });
        }

        let mut constants = Vec::with_capacity(self.constants.len());
        for (field, value) in &self.constants {
            constants.push((claim(field)?, value.clone()));
        }

        if self.record_type_value.trim().is_empty() {
            return Err(RouterError::InvalidConfigValueError {
                field: "schema.record_type_value".to_string(),
                value: self.record_type_value.clone(),
                reason: "record type literal cannot be empty".to_string(),
            });
        }

        Ok(CompiledColumnMap {
            fields,
            constants,
            min_width: self.min_width(),
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) prefix: Option<String>,
    pub(crate) normalize: Option<Normalizer>,
}

#[derive(Debug, Clone)]
pub struct CompiledColumnMap {
    pub(crate) fields: Vec<CompiledField>,
    pub(crate) constants: Vec<(usize, String)>,
    pub(crate) min_width: usize,
}

impl CompiledColumnMap {
    pub fn min_width(&self) -> usize {
        self.min_width
    }
}
