//! Terminal rendering of the location picker and stdin pick parsing.

use client_core::{Navigator, RegionStatus, SelectionState, SubRegionStatus};
use shared::domain::{HandoffPayload, ScreenId};

/// Accepts a 1-based index or an exact (case-insensitive) entry.
pub fn resolve_pick<'a, T: AsRef<str>>(input: &str, options: &'a [T]) -> Option<&'a T> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(index) = input.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| options.get(i));
    }
    options
        .iter()
        .find(|option| option.as_ref().eq_ignore_ascii_case(input))
        .or_else(|| {
            let lower = input.to_lowercase();
            options
                .iter()
                .find(|option| option.as_ref().to_lowercase() == lower)
        })
}

pub fn render_options<T: AsRef<str>>(options: &[T]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{:>4}. {}", i + 1, option.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn describe(state: &SelectionState) -> String {
    let regions = match state.regions() {
        RegionStatus::Loading => "loading".to_string(),
        RegionStatus::Ready(list) => format!("{} available", list.len()),
        RegionStatus::Failed(err) => format!("unavailable ({err})"),
    };
    let sub_regions = match state.sub_regions() {
        SubRegionStatus::NoRegionSelected => "select a region first".to_string(),
        SubRegionStatus::Loading => "loading".to_string(),
        SubRegionStatus::Ready(list) => format!("{} available", list.len()),
        SubRegionStatus::Failed(err) => format!("unavailable ({err})"),
    };
    let region = state
        .selected_region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".into());
    let sub_region = state
        .selected_sub_region()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".into());
    format!("regions: {regions} | sub-regions: {sub_regions} | picked: {region} / {sub_region}")
}

/// One line per handoff: the target screen followed by `key=value` pairs.
pub fn format_handoff(screen: &ScreenId, payload: &HandoffPayload) -> String {
    let mut line = format!("-> {screen}");
    for (key, value) in payload.text_pairs() {
        line.push(' ');
        line.push_str(&key);
        line.push('=');
        line.push_str(&value);
    }
    line
}

/// Prints the handoff payload instead of switching screens.
pub struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn navigate(&self, screen: &ScreenId, payload: HandoffPayload) {
        println!("{}", format_handoff(screen, &payload));
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
