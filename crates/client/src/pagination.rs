//! Pagination controls for product listings.
//!
//! A pure function of `(current_page, total_pages)`. The window of numbered
//! buttons always contains the current page and grows by one neighbour on
//! whichever side has no Prev/Next button, so at least two or three controls
//! remain visible at either end of the range.

use serde::Serialize;

/// One rendered pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageControl {
    /// Go to the previous page (the target page).
    Prev { target: u32 },
    /// A numbered page button.
    Page { number: u32, active: bool },
    /// Go to the next page (the target page).
    Next { target: u32 },
}

/// Controls to render for `current` (1-based) out of `total_pages`.
///
/// Empty when there is at most one page. A `current` outside `1..=total_pages`
/// is clamped into range.
#[must_use]
pub fn page_controls(current: u32, total_pages: u32) -> Vec<PageControl> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let has_prev = current > 1;
    let has_next = current < total_pages;

    let first = if has_next { current } else { current - 1 };
    let last = if has_prev { current } else { current + 1 };

    let mut controls = Vec::with_capacity(4);
    if has_prev {
        controls.push(PageControl::Prev {
            target: current - 1,
        });
    }
    controls.extend((first..=last).map(|number| PageControl::Page {
        number,
        active: number == current,
    }));
    if has_next {
        controls.push(PageControl::Next {
            target: current + 1,
        });
    }
    controls
}
