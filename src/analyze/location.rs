// src/analyze/location.rs
//! Best-effort US location guess from free text.
//!
//! Resolvers run in order and the first hit wins:
//! city-comma-state → bare state → known city. This is a regex heuristic, not a
//! gazetteer: "in" reads as Indiana, and no check ties the city to the state.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    /// Never populated by text extraction.
    pub zip: Option<String>,
}

impl Location {
    fn city_state(city: &str, state: &str) -> Self {
        Self {
            city: Some(city.trim().to_string()),
            state: Some(state.to_ascii_uppercase()),
            zip: None,
        }
    }

    /// `"City, ST"`, `"City"`, `"ST"` or empty.
    pub fn query(&self) -> String {
        [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// 50 states + DC.
pub const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("DC", "District of Columbia"),
];

/// List order is the tie-break, not position in the text.
pub const MAJOR_CITIES: &[&str] = &[
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "San Jose",
    "Austin",
    "Jacksonville",
    "San Francisco",
    "Columbus",
    "Fort Worth",
    "Charlotte",
    "Seattle",
    "Denver",
    "El Paso",
    "Detroit",
    "Boston",
    "Memphis",
    "Portland",
    "Miami",
    "Atlanta",
];

fn state_code_alternation() -> String {
    US_STATES
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join("|")
}

static RE_CITY_STATE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+)?)(?:,\s*|\s+)((?i:{}))\b",
        state_code_alternation()
    );
    Regex::new(&pattern).expect("city-state regex")
});

static RE_BARE_STATE: Lazy<Regex> = Lazy::new(|| {
    // Longer names first so "West Virginia" is not read as "Virginia".
    let mut names: Vec<&str> = US_STATES.iter().map(|(_, name)| *name).collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let pattern = format!(r"\b({}|{})\b", names.join("|"), state_code_alternation());
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("bare state regex")
});

static RE_CITIES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    MAJOR_CITIES
        .iter()
        .map(|city| {
            let re = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(city)))
                .case_insensitive(true)
                .build()
                .expect("city regex");
            (*city, re)
        })
        .collect()
});

/// Full state name or code (any case) → canonical two-letter code.
pub fn state_code(token: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|(code, name)| code.eq_ignore_ascii_case(token) || name.eq_ignore_ascii_case(token))
        .map(|(code, _)| *code)
}

/// Tier 1: "Chicago, IL", "Los Angeles CA".
pub fn match_city_state(text: &str) -> Option<Location> {
    let caps = RE_CITY_STATE.captures(text)?;
    Some(Location::city_state(&caps[1], &caps[2]))
}

/// Tier 2: first standalone state code or state name.
pub fn match_bare_state(text: &str) -> Option<Location> {
    let m = RE_BARE_STATE.find(text)?;
    let code = state_code(m.as_str())?;
    Some(Location {
        city: None,
        state: Some(code.to_string()),
        zip: None,
    })
}

/// Tier 3: first entry of the major-city list found in the text.
pub fn match_known_city(text: &str) -> Option<Location> {
    RE_CITIES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(city, _)| Location {
            city: Some((*city).to_string()),
            state: None,
            zip: None,
        })
}

type Resolver = fn(&str) -> Option<Location>;

const RESOLVERS: &[Resolver] = &[match_city_state, match_bare_state, match_known_city];

/// `None` when no tier matches (distinct from a location with blank fields).
pub fn extract_location(title: &str, content: Option<&str>) -> Option<Location> {
    let text = format!("{} {}", title, content.unwrap_or_default());
    RESOLVERS.iter().find_map(|resolve| resolve(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(city: Option<&str>, state: Option<&str>) -> Option<Location> {
        Some(Location {
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            zip: None,
        })
    }

    #[test]
    fn reference_tables_are_complete() {
        assert_eq!(US_STATES.len(), 51);
        assert_eq!(MAJOR_CITIES.len(), 25);
    }

    #[test]
    fn city_comma_state() {
        assert_eq!(
            extract_location("Protest held in Chicago, IL yesterday", None),
            loc(Some("Chicago"), Some("IL"))
        );
    }

    #[test]
    fn two_word_city_without_comma_and_lowercase_code() {
        assert_eq!(
            match_city_state("Los Angeles ca residents"),
            loc(Some("Los Angeles"), Some("CA"))
        );
    }

    #[test]
    fn bare_state_name_maps_to_code() {
        assert_eq!(
            extract_location("Deportations rise across Texas", None),
            loc(None, Some("TX"))
        );
        assert_eq!(
            match_bare_state("Flooding in West Virginia"),
            // "in" comes first in the text and is a valid code
            loc(None, Some("IN"))
        );
        assert_eq!(match_bare_state("Storms hit West Virginia"), loc(None, Some("WV")));
    }

    #[test]
    fn bare_code_needs_word_boundary() {
        assert_eq!(match_bare_state("Mayor spoke"), None);
        assert_eq!(match_bare_state("Rally held, NY"), loc(None, Some("NY")));
    }

    #[test]
    fn known_city_uses_list_order() {
        // Boston appears first in the text but Chicago is earlier in the list.
        assert_eq!(
            match_known_city("boston and chicago volunteers"),
            loc(Some("Chicago"), None)
        );
    }

    #[test]
    fn city_tier_reached_when_no_state_token() {
        assert_eq!(
            extract_location("Heat records broken: Phoenix swelters", None),
            loc(Some("Phoenix"), None)
        );
    }

    #[test]
    fn content_is_searched_too() {
        assert_eq!(
            extract_location("Raids continue", Some("Agents seen near Denver, CO")),
            loc(Some("Denver"), Some("CO"))
        );
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(extract_location("A quiet afternoon downtown", None), None);
    }

    #[test]
    fn query_formats() {
        let l = Location::city_state(" Austin ", "tx");
        assert_eq!(l.query(), "Austin, TX");
        assert_eq!(Location::default().query(), "");
    }
}
