use crate::models::ParsedLocation;

/// Splits a free-text location into city / state / country.
///
/// This is a heuristic over comma-separated segments, not a geocoder:
/// three or more segments keep the first two and the last, dropping any
/// intermediate administrative levels. A lone "Remote" leaves every
/// structured field empty; input without any segment yields empty `text`.
pub fn normalize_location(text: &str) -> ParsedLocation {
    let mut parsed = ParsedLocation {
        text: text.to_string(),
        ..Default::default()
    };

    let parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [] => parsed.text.clear(),
        [single] => {
            if !single.eq_ignore_ascii_case("remote") {
                parsed.city = Some(single.to_string());
            }
        }
        [city, state] => {
            parsed.city = Some(city.to_string());
            parsed.state = Some(state.to_string());
        }
        [city, state, .., country] => {
            parsed.city = Some(city.to_string());
            parsed.state = Some(state.to_string());
            parsed.country = Some(country.to_string());
        }
    }

    parsed
}
