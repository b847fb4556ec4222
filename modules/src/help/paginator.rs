//! Sorted, paged command listings

use super::visibility::{collect_visible, filter_permitted};
use super::{HelpOptions, RenderContext};
use foxhelp_core::{Command, Params, PermissionCache, Session};
use tracing::debug;

/// The slice of a listing shown on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    /// `page` is 1-based; a page past the end yields an empty window
    pub fn new(total: usize, page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_pages = total.div_ceil(page_size).max(1);
        let start = (page - 1).saturating_mul(page_size).min(total);
        let end = start.saturating_add(page_size).min(total);
        Self {
            total,
            page,
            total_pages,
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_paged(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_prev(&self) -> bool {
        self.is_paged() && self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.is_paged() && self.page < self.total_pages
    }
}

/// Stable sort by display name
pub fn sort_commands(commands: &mut [&Command]) {
    commands.sort_by_key(|c| c.display_name());
}

/// Render one page of `commands` under the given prolog.
///
/// `invocation` is what a user would type to reach this listing
/// (e.g. `/foxhelp` or `/foxhelp admin`) and is used for navigation hints.
/// Returns no lines at all when nothing is visible.
pub async fn format_commands(
    ctx: &RenderContext<'_>,
    prolog: &str,
    session: &Session,
    commands: Vec<&Command>,
    options: &HelpOptions,
    invocation: &str,
) -> Vec<String> {
    let mut cache = PermissionCache::new();
    let visible = collect_visible(&ctx.host.registry, session, commands, options.show_hidden);
    let mut children = filter_permitted(ctx.host, session, visible, &mut cache).await;
    sort_commands(&mut children);
    if children.is_empty() {
        return Vec::new();
    }

    let window = PageWindow::new(children.len(), options.page, options.page_size);
    debug!(
        "Listing {} commands, page {}/{} ({}..{})",
        window.total, window.page, window.total_pages, window.start, window.end
    );

    let prefix = ctx.host.display_prefix();
    let mut output: Vec<String> = children[window.start..window.end]
        .iter()
        .map(|command| {
            let description_key = format!("commands.{}.description", command.name);
            let description = ctx.text_or_empty(session, &[&description_key], &command.params);
            format!("    {}{}  {}", prefix, command.display_path(), description)
        })
        .collect();

    let hint = if window.is_paged() {
        let info = ctx.message(
            session,
            "pagination-info",
            &Params::positional([window.page, window.total_pages, window.total]),
        );
        ctx.text_or_empty(session, &["general.paren"], &Params::positional([info]))
    } else {
        String::new()
    };
    output.insert(0, ctx.message(session, prolog, &Params::positional([hint])));

    if window.is_paged() {
        let mut navigation = Vec::new();
        if window.has_prev() {
            let params = Params::positional([(window.page - 1).to_string(), invocation.to_string()]);
            navigation.push(ctx.message(session, "prev-page", &params));
        }
        if window.has_next() {
            let params = Params::positional([(window.page + 1).to_string(), invocation.to_string()]);
            navigation.push(ctx.message(session, "next-page", &params));
        }
        if !navigation.is_empty() {
            let joined = navigation.join(" | ");
            output.push(ctx.message(session, "navigation", &Params::positional([joined])));
        }
    }

    output
}
