//! Event list narrowing shared by the public listing and the admin dashboard.
//!
//! Every active predicate must hold for an event to be kept, and the
//! result keeps the order of the input. Callers fetch events sorted by
//! date ascending, so listings stay chronological.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::event::Event;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl EventFilters {
    /// Search text that actually filters: trimmed, lowercased, non-empty.
    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn active_tags(&self) -> Option<&BTreeSet<String>> {
        self.tags.as_ref().filter(|tags| !tags.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.search_needle().is_none()
            && self.category.is_none()
            && self.active_tags().is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.matches_with(event, self.search_needle().as_deref())
    }

    fn matches_with(&self, event: &Event, needle: Option<&str>) -> bool {
        if let Some(category) = &self.category {
            if event.category.as_ref() != Some(category) {
                return false;
            }
        }

        if let Some(tags) = self.active_tags() {
            if event.tags.is_disjoint(tags) {
                return false;
            }
        }

        // Whole calendar days: `date_from` from 00:00, `date_to` through 23:59:59.
        let day = event.date.date_naive();
        if self.date_from.is_some_and(|from| day < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| day > to) {
            return false;
        }

        match needle {
            Some(needle) => searchable_text(event).contains(needle),
            None => true,
        }
    }
}

fn searchable_text(event: &Event) -> String {
    let mut parts = vec![
        event.title.as_str(),
        event.description.as_str(),
        event.location.as_str(),
    ];
    if let Some(category) = &event.category {
        parts.push(category.as_str());
    }
    parts.extend(event.tags.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

/// Keeps the events matching `filters`, in their original order.
pub fn filter_events<I>(events: I, filters: &EventFilters) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    let needle = filters.search_needle();
    events
        .into_iter()
        .filter(|event| filters.matches_with(event, needle.as_deref()))
        .collect()
}
