use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::{Result, ScrapeError};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::config(format!("invalid selector {css:?}: {e}")))
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*[-–]\s*(\d+)").expect("score pattern is valid")
    })
}

/// Parses a `home-away` result such as `3-1`. Anything after the pair (set
/// partials, notes) is ignored.
pub fn parse_score(score: &str) -> Result<(i32, i32)> {
    let captures = score_pattern()
        .captures(score)
        .ok_or_else(|| ScrapeError::invalid_record(format!("Invalid score format: {score:?}")))?;

    let home_score = captures[1]
        .parse::<i32>()
        .map_err(|_| ScrapeError::invalid_record(format!("Invalid home score: {score:?}")))?;
    let away_score = captures[2]
        .parse::<i32>()
        .map_err(|_| ScrapeError::invalid_record(format!("Invalid away score: {score:?}")))?;

    Ok((home_score, away_score))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element, whitespace collapsed.
pub fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of an element, leaving out every descendant matched by `excluded`
/// (set counters nested inside a team-name cell, for instance).
pub fn element_text_excluding(element: &ElementRef, excluded: &Selector) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let inside_excluded = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != element.id())
            .filter_map(ElementRef::wrap)
            .any(|ancestor| excluded.matches(&ancestor));
        if !inside_excluded {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    collapse_whitespace(&text)
}

/// First match of `selector` under `element`, as collapsed text.
pub fn first_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}
