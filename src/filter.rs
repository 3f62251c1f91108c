//! Search, list filters and pagination over the in-memory collections.

use serde::Deserialize;

use crate::models::{Bot, BotUser, Pagination, UserRole, UserStatus};

/// Page sizes offered by the documents table.
pub const PAGE_SIZES: [usize; 4] = [5, 10, 20, 50];

/// Upper bound for `limit` on the REST list endpoints.
pub const MAX_API_LIMIT: usize = 100;

/// Case-insensitive substring match of `query` against any of `fields`.
/// An empty query matches everything.
pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_bots<'a>(bots: &'a [Bot], query: &str) -> Vec<&'a Bot> {
    bots.iter()
        .filter(|bot| matches_query(query, &[&bot.name, &bot.description]))
        .collect()
}

/// Combined filters of the users screen. Every criterion must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: String,
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
    pub bot: Option<String>,
}

/// Raw query-string form where `all` (or empty) disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserFilterQuery {
    pub search: String,
    pub status: String,
    pub role: String,
    pub bot: String,
}

fn selected(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value)
    }
}

impl UserFilter {
    pub fn from_query(query: &UserFilterQuery) -> Self {
        Self {
            search: query.search.clone(),
            status: selected(&query.status).and_then(|s| match s.to_lowercase().as_str() {
                "active" => Some(UserStatus::Active),
                "inactive" => Some(UserStatus::Inactive),
                _ => None,
            }),
            role: selected(&query.role).and_then(UserRole::parse),
            bot: selected(&query.bot).map(str::to_string),
        }
    }

    pub fn matches(&self, user: &BotUser) -> bool {
        matches_query(&self.search, &[&user.name, &user.email])
            && self.status.map_or(true, |status| user.status == status)
            && self.role.map_or(true, |role| user.role == role)
            && self
                .bot
                .as_ref()
                .map_or(true, |bot| user.assigned_bots.iter().any(|id| id == bot))
    }

    pub fn apply<'a>(&self, users: &'a [BotUser]) -> Vec<&'a BotUser> {
        users.iter().filter(|user| self.matches(user)).collect()
    }
}

// ── Pagination ───────────────────────────────────────────────────────

/// `ceil(total / per_page)`; zero items means zero pages.
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Clamp a requested page into `[1, total_pages]`. An empty list stays on page 1.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.min(total_pages).max(1)
}

/// Only the sizes in [`PAGE_SIZES`] are accepted; anything else is `None`.
pub fn page_size(value: usize) -> Option<usize> {
    PAGE_SIZES.contains(&value).then_some(value)
}

pub fn api_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(10).clamp(1, MAX_API_LIMIT)
}

/// One page of a list plus the metadata the tables and envelopes show.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.pagination.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.pagination.current_page < self.pagination.total_pages
    }

    pub fn previous_page(&self) -> usize {
        self.pagination.current_page.saturating_sub(1).max(1)
    }

    pub fn next_page(&self) -> usize {
        clamp_page(
            self.pagination.current_page + 1,
            self.pagination.total_pages,
        )
    }

    /// 1-based index of the first item shown, 0 when empty.
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.pagination.current_page - 1) * self.pagination.items_per_page + 1
        }
    }

    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = page_count(items.len(), per_page);
    let current_page = clamp_page(page, total_pages);
    let start = (current_page - 1) * per_page;
    let slice = items
        .iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();

    Page {
        items: slice,
        pagination: Pagination {
            current_page,
            total_pages,
            total_items: items.len(),
            items_per_page: per_page,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(name: &str, email: &str, role: UserRole, status: UserStatus, bots: &[&str]) -> BotUser {
        BotUser {
            id: name.to_lowercase(),
            name: name.to_string(),
            username: name.to_lowercase(),
            email: email.to_string(),
            role,
            status,
            joined_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            assigned_bots: bots.iter().map(|b| b.to_string()).collect(),
            last_active: None,
            total_interactions: 0,
        }
    }

    fn sample_users() -> Vec<BotUser> {
        vec![
            user("John Doe", "john.doe@example.com", UserRole::Administrator, UserStatus::Active, &["virtual-assistant", "customer-support"]),
            user("Jane Smith", "jane.smith@example.com", UserRole::Editor, UserStatus::Active, &["sales-assistant", "coding-bot-01"]),
            user("Mike Johnson", "mike.j@example.com", UserRole::Viewer, UserStatus::Inactive, &["virtual-assistant"]),
        ]
    }

    #[test]
    fn test_matches_query_case_insensitive() {
        assert!(matches_query("CODING", &["CodingBot 01"]));
        assert!(matches_query("bot 0", &["CodingBot 01"]));
        assert!(!matches_query("sales", &["CodingBot 01", "A coding assistant"]));
        assert!(matches_query("  ", &["anything"]));
    }

    #[test]
    fn test_user_filter_all_disables() {
        let query = UserFilterQuery {
            search: String::new(),
            status: "all".into(),
            role: "ALL".into(),
            bot: "all".into(),
        };
        assert_eq!(UserFilter::from_query(&query), UserFilter::default());
    }

    #[test]
    fn test_user_filter_combines_with_and() {
        let users = sample_users();
        let filter = UserFilter {
            search: "j".into(),
            status: Some(UserStatus::Active),
            role: None,
            bot: Some("virtual-assistant".into()),
        };
        let names: Vec<_> = filter.apply(&users).iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe"]);
    }

    #[test]
    fn test_user_filters_commute() {
        let users = sample_users();
        let by_status = UserFilter { status: Some(UserStatus::Active), ..Default::default() };
        let by_bot = UserFilter { bot: Some("virtual-assistant".into()), ..Default::default() };

        let status_then_bot: Vec<BotUser> = by_status.apply(&users).into_iter().cloned().collect();
        let status_then_bot: Vec<_> = by_bot.apply(&status_then_bot).iter().map(|u| u.id.clone()).collect();

        let bot_then_status: Vec<BotUser> = by_bot.apply(&users).into_iter().cloned().collect();
        let bot_then_status: Vec<_> = by_status.apply(&bot_then_status).iter().map(|u| u.id.clone()).collect();

        assert_eq!(status_then_bot, bot_then_status);
        assert_eq!(status_then_bot, vec!["john doe".to_string()]);
    }

    #[test]
    fn test_role_filter_matches_label_case() {
        let users = sample_users();
        let query = UserFilterQuery { role: "Editor".into(), ..Default::default() };
        let filtered = UserFilter::from_query(&query).apply(&users);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Jane Smith");
    }

    #[test]
    fn test_page_count_is_ceiling() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(51, 50), 2);
    }

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn test_page_size_whitelist() {
        assert_eq!(page_size(20), Some(20));
        assert_eq!(page_size(15), None);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate(&items, 3, 5);
        assert_eq!(page.items, vec![11, 12]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(page.next_page(), 3);
        assert_eq!(page.first_index(), 11);
        assert_eq!(page.last_index(), 12);
    }

    #[test]
    fn test_paginate_out_of_range_is_clamped() {
        let items: Vec<u32> = (1..=7).collect();
        let page = paginate(&items, 99, 5);
        assert_eq!(page.pagination.current_page, 2);
        assert_eq!(page.items, vec![6, 7]);

        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, 3, 10);
        assert_eq!(page.pagination.current_page, 1);
        assert_eq!(page.pagination.total_pages, 0);
        assert!(page.items.is_empty());
        assert_eq!(page.first_index(), 0);
    }

    #[test]
    fn test_api_limit_clamped() {
        assert_eq!(api_limit(None), 10);
        assert_eq!(api_limit(Some(0)), 1);
        assert_eq!(api_limit(Some(500)), MAX_API_LIMIT);
    }
}
