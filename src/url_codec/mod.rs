//! Mapping between a [`SearchQuery`] and the query string of a shareable URL.
//!
//! Decoding never fails: anything malformed falls back to its default.
//! Encoding omits every parameter that still holds its default value.

use tracing::debug;
use url::form_urlencoded;

use crate::query::{
    DEFAULT_PAGE_SIZE, FIRST_PAGE, LogicExpression, SearchQuery, from_logic_expression, rison,
    to_logic_expression,
};
use crate::schema::SearchMode;


pub const TERM_PARAM: &str = "s";
pub const FILTERS_PARAM: &str = "f";
pub const PAGE_PARAM: &str = "p";
pub const PAGE_SIZE_PARAM: &str = "ps";
pub const MODE_PARAM: &str = "sm";

/// Characters left unescaped in encoded URLs so RISON filters stay readable.
const READABLE: [(&str, &str); 10] = [
    ("%28", "("),
    ("%29", ")"),
    ("%27", "'"),
    ("%22", "\""),
    ("%3A", ":"),
    ("%3D", "="),
    ("%21", "!"),
    ("%2C", ","),
    ("%3C", "<"),
    ("%3E", ">"),
];

#[derive(Default)]
struct RawParams {
    term: Option<String>,
    filters: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
    mode: Option<String>,
}

impl RawParams {
    fn parse(query_string: &str) -> Self {
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
        let mut raw = RawParams::default();

        for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
            let slot = match key.as_ref() {
                TERM_PARAM => &mut raw.term,
                FILTERS_PARAM => &mut raw.filters,
                PAGE_PARAM => &mut raw.page,
                PAGE_SIZE_PARAM => &mut raw.page_size,
                MODE_PARAM => &mut raw.mode,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        raw
    }
}

/// Extracts the query string from a full or relative URL. Input that is
/// already a bare query string is returned unchanged.
pub fn query_string(url: &str) -> &str {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    match url.split_once('?') {
        Some((_, query)) => query,
        None if url.contains('=') => url,
        None => "",
    }
}

pub fn decode(query_string: &str) -> SearchQuery {
    let raw = RawParams::parse(query_string);

    let search_mode = raw
        .mode
        .as_deref()
        .and_then(SearchMode::from_key)
        .unwrap_or_default();

    SearchQuery {
        search_mode,
        search_term: raw.term.unwrap_or_default(),
        advanced_filters: raw
            .filters
            .as_deref()
            .and_then(|f| decode_filters(f, search_mode)),
        page_number: parse_at_least(raw.page.as_deref(), FIRST_PAGE),
        page_size: parse_at_least(raw.page_size.as_deref(), DEFAULT_PAGE_SIZE),
    }
}

/// Decodes the `f` parameter and normalizes it against the mode's schema,
/// so clauses on fields the mode no longer has are dropped one by one.
pub fn decode_filters(raw: &str, mode: SearchMode) -> Option<LogicExpression> {
    let value = match rison::decode(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "ignoring unparsable filters");
            return None;
        }
    };

    let expr = match LogicExpression::from_value(&value) {
        Ok(expr) => expr,
        Err(e) => {
            debug!(error = %e, "ignoring unsupported filters");
            return None;
        }
    };

    to_logic_expression(&from_logic_expression(Some(&expr), mode))
}

fn parse_at_least(raw: Option<&str>, floor: u32) -> u32 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|&n| n >= i64::from(floor))
        .map_or(floor, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

pub fn encode_filters(filters: &LogicExpression) -> String {
    rison::encode(&filters.to_value())
}

pub fn encode(query: &SearchQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !query.search_term.is_empty() {
        serializer.append_pair(TERM_PARAM, &query.search_term);
    }
    // An expression with no clause filters nothing, same as `None`.
    if let Some(filters) = query.advanced_filters.as_ref().filter(|f| f.has_clauses()) {
        serializer.append_pair(FILTERS_PARAM, &encode_filters(filters));
    }
    if query.page_number > FIRST_PAGE {
        serializer.append_pair(PAGE_PARAM, &query.page_number.to_string());
    }
    if query.page_size != DEFAULT_PAGE_SIZE {
        serializer.append_pair(PAGE_SIZE_PARAM, &query.page_size.to_string());
    }
    if !query.search_mode.is_default() {
        serializer.append_pair(MODE_PARAM, query.search_mode.key());
    }

    restore_readable(serializer.finish())
}

fn restore_readable(mut encoded: String) -> String {
    for (escape, literal) in READABLE {
        if encoded.contains(escape) {
            encoded = encoded.replace(escape, literal);
        }
    }
    encoded
}
