//! Static download catalog
//!
//! The catalog is plain data: an ordered list of CelesTrak groups and the
//! category each one is filed under. Order only affects pacing. A config file
//! may replace the list wholesale, so every catalog, built-in or not, goes
//! through [`validate_catalog`] before any I/O happens.

use std::collections::HashMap;

use crate::app::models::{Category, DownloadUnit};
use crate::errors::{ConfigError, ConfigResult};

use Category::*;

/// Built-in CelesTrak groups with their categories
const DEFAULT_GROUPS: &[(&str, Category)] = &[
    // special interest
    ("stations", SpecialInterest),
    ("analyst", SpecialInterest),
    ("russian-asat-debris", SpecialInterest),
    ("chinese-asat-debris", SpecialInterest),
    ("iridium-33-debris", SpecialInterest),
    ("cosmos-2251-debris", SpecialInterest),
    // weather and earth observation
    ("noaa", Weather),
    ("goes", Weather),
    ("earth-resources", Weather),
    ("sarsat", Weather),
    ("disaster-monitoring", Weather),
    ("tdrss", Weather),
    ("argos", Weather),
    ("planet", Weather),
    ("spire", Weather),
    // communications
    ("starlink", Communications),
    ("oneweb", Communications),
    ("qianfan", Communications),
    ("hulianwang-digui", Communications),
    ("kuiper", Communications),
    ("iridium-next", Communications),
    ("globalstar", Communications),
    ("orbcomm", Communications),
    ("intelsat", Communications),
    ("ses", Communications),
    ("eutelsat", Communications),
    ("telesat", Communications),
    ("active-geosynchronous", Communications),
    ("movers", Communications),
    ("geo-protected-zone-plus", Communications),
    ("amateur", Communications),
    ("satnogs", Communications),
    ("experimental-comm", Communications),
    ("other-comm", Communications),
    // navigation
    ("gps-ops", Navigation),
    ("glonass-ops", Navigation),
    ("galileo", Navigation),
    ("beidou", Navigation),
    ("sbas", Navigation),
    ("nnss", Navigation),
    ("russian-leo-navigation", Navigation),
    // scientific
    ("space-earth-science", Scientific),
    ("geodetic", Scientific),
    ("engineering", Scientific),
    ("education", Scientific),
    // miscellaneous
    ("military", Miscellaneous),
    ("radar-calibration", Miscellaneous),
    ("cubesats", Miscellaneous),
    ("other", Miscellaneous),
];

/// The built-in catalog, in fetch order
pub fn default_catalog() -> Vec<DownloadUnit> {
    DEFAULT_GROUPS
        .iter()
        .map(|&(group, category)| DownloadUnit::categorized(group, category))
        .collect()
}

/// Units of `catalog` filed under `category`
pub fn units_in_category(catalog: &[DownloadUnit], category: Category) -> Vec<&DownloadUnit> {
    catalog
        .iter()
        .filter(|unit| unit.category == Some(category))
        .collect()
}

/// Reject malformed entries and entries whose output paths would collide
pub fn validate_catalog(catalog: &[DownloadUnit]) -> ConfigResult<()> {
    let mut outputs: HashMap<(Option<Category>, &str), usize> = HashMap::new();

    for (index, unit) in catalog.iter().enumerate() {
        let invalid = |reason: &str| ConfigError::InvalidUnit {
            index,
            group_id: unit.group_id.clone(),
            reason: reason.to_string(),
        };

        if unit.group_id.trim().is_empty() {
            return Err(invalid("group id is empty"));
        }
        if unit.output_base_name.trim().is_empty() {
            return Err(invalid("output base name is empty"));
        }
        if !is_path_safe(&unit.output_base_name) {
            return Err(invalid(
                "output base name must be a single path segment",
            ));
        }

        if let Some(first) = outputs.insert((unit.category, &unit.output_base_name), index) {
            return Err(ConfigError::DuplicateOutput {
                first,
                second: index,
                path: match unit.category {
                    Some(category) => format!("{}/{}", category, unit.output_base_name),
                    None => unit.output_base_name.clone(),
                },
            });
        }
    }

    Ok(())
}

fn is_path_safe(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\']) && !name.contains('\0')
}
