//! Search over a list of countries.

use crate::types::Country;

/// Countries whose name or capital contains `search`, ignoring case.
///
/// An empty search returns the whole list. Order is preserved.
pub fn filter_countries(countries: &[Country], search: &str) -> Vec<Country> {
    if search.is_empty() {
        return countries.to_vec();
    }
    let needle = search.to_lowercase();
    countries
        .iter()
        .filter(|country| matches(country, &needle))
        .cloned()
        .collect()
}

fn matches(country: &Country, needle: &str) -> bool {
    country.name.to_lowercase().contains(needle) || country.capital.to_lowercase().contains(needle)
}
