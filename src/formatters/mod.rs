use colored::Colorize;

use crate::query::{Combinator, FilterNode, Group, SearchQuery, SearchResult};
use crate::schema::FieldSchema;

pub fn format_search_result(result: &SearchResult, use_color: bool, details_limit: usize) -> String {
    let details = result
        .details
        .as_deref()
        .map(|d| truncate(d, details_limit))
        .unwrap_or_default();
    let thumbnails = result.thumbnails.as_ref().map_or(0, Vec::len);

    let mut line = if use_color {
        format!(
            "{} {} {}",
            format!("[{}]", result.page).bright_blue(),
            format!("#{}", result.id).dimmed(),
            result.title.bright_yellow()
        )
    } else {
        format!("[{}] #{} {}", result.page, result.id, result.title)
    };

    if thumbnails > 0 {
        line.push_str(&format!(" ({thumbnails} media)"));
    }
    if !details.is_empty() {
        line.push_str("\n  ");
        line.push_str(&details);
    }
    line
}

pub fn format_query(query: &SearchQuery, use_color: bool) -> String {
    let term = if query.search_term.is_empty() {
        "(any)".to_string()
    } else {
        format!("\"{}\"", query.search_term)
    };
    let filters = match &query.advanced_filters {
        Some(filters) => filters.to_value().to_string(),
        None => "none".to_string(),
    };

    if use_color {
        format!(
            "{} {} {} {} {} {} {} {}/{}",
            "mode:".dimmed(),
            query.search_mode.key().bright_green(),
            "term:".dimmed(),
            term.bright_yellow(),
            "filters:".dimmed(),
            filters,
            "page:".dimmed(),
            query.page_number,
            query.page_size
        )
    } else {
        format!(
            "mode: {} term: {} filters: {} page: {}/{}",
            query.search_mode.key(),
            term,
            filters,
            query.page_number,
            query.page_size
        )
    }
}

/// Renders a filter tree as an indented outline.
pub fn format_filter_tree(tree: &Group) -> String {
    let mut out = String::new();
    write_group(tree, 0, &mut out);
    out
}

fn write_group(group: &Group, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let combinator = match group.combinator {
        Combinator::And => "AND",
        Combinator::Or => "OR",
    };
    out.push_str(&format!("{indent}{combinator}\n"));

    for child in &group.children {
        match child {
            FilterNode::Group(inner) => write_group(inner, depth + 1, out),
            FilterNode::Rule(rule) => {
                let operator = rule.operator.map_or("(no operator)", |op| op.key());
                let value = rule
                    .value
                    .iter()
                    .map(|v| format!("{v:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("{indent}  {} {operator} {value}\n", rule.field));
            }
        }
    }
}

pub fn format_schema(schema: &FieldSchema, use_color: bool) -> String {
    let mut out = String::new();
    let header = format!("{} ({})", schema.mode().label(), schema.mode().key());
    if use_color {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(&header);
    }
    out.push('\n');

    for field in schema.fields() {
        let operators = field
            .allowed_operators
            .iter()
            .map(|op| op.key())
            .collect::<Vec<_>>()
            .join(", ");
        let value_type = format!("{:?}", field.value_type).to_lowercase();
        if use_color {
            out.push_str(&format!(
                "  {:<20} {:<36} {:<5} {}\n",
                field.key.bright_green(),
                field.label,
                value_type,
                operators.dimmed()
            ));
        } else {
            out.push_str(&format!(
                "  {:<20} {:<36} {:<5} {}\n",
                field.key, field.label, value_type, operators
            ));
        }
    }
    out
}

fn truncate(text: &str, limit: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= limit {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(limit).collect();
    cut.push_str("...");
    cut
}
