//! Page state for paged embeds lives in the footer text (`"<page+1>/<total>"`)
//! and in which buttons are enabled. Nothing is kept server-side.

use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMarker {
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTurn {
    pub marker: PageMarker,
    pub previous_disabled: bool,
    pub next_disabled: bool,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("malformed page marker {0:?}")]
    Malformed(String),
    #[error("page {page} is outside 1..={total_pages}")]
    OutOfRange { page: usize, total_pages: usize },
}

pub fn total_pages(page_size: usize, total_items: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

fn has_next(page: usize, page_size: usize, total_items: usize) -> bool {
    page * page_size + page_size < total_items
}

impl PageMarker {
    pub fn first(page_size: usize, total_items: usize) -> Self {
        Self {
            page: 0,
            total_pages: total_pages(page_size, total_items).max(1),
        }
    }

    /// Button state for a freshly rendered page.
    pub fn turn_state(self, page_size: usize, total_items: usize) -> PageTurn {
        PageTurn {
            marker: self,
            previous_disabled: self.page == 0,
            next_disabled: !has_next(self.page, page_size, total_items),
        }
    }

    /// Index range of the items shown on this page.
    pub fn window(
        self,
        page_size: usize,
        total_items: usize,
    ) -> std::ops::Range<usize> {
        let start = (self.page * page_size).min(total_items);
        start..(start + page_size).min(total_items)
    }
}

impl FromStr for PageMarker {
    type Err = PaginationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || PaginationError::Malformed(text.to_owned());
        let (left, right) = text.trim().split_once('/').ok_or_else(malformed)?;
        let shown: usize = left.trim().parse().map_err(|_| malformed())?;
        let total_pages: usize = right.trim().parse().map_err(|_| malformed())?;

        if shown == 0 || shown > total_pages {
            return Err(PaginationError::OutOfRange {
                page: shown,
                total_pages,
            });
        }
        Ok(Self {
            page: shown - 1,
            total_pages,
        })
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page + 1, self.total_pages)
    }
}

/// Moves one page in the direction of `action`. The page count is taken from
/// `total_items` rather than the marker, so a list that grew or shrank since
/// the marker was rendered still yields a footer that agrees with the buttons.
pub fn turn(
    marker: PageMarker,
    action: PageAction,
    page_size: usize,
    total_items: usize,
) -> Result<PageTurn, PaginationError> {
    let total_pages = total_pages(page_size, total_items).max(1);
    let page = match action {
        PageAction::Next => marker.page + 1,
        PageAction::Previous => marker
            .page
            .checked_sub(1)
            .ok_or(PaginationError::OutOfRange {
                page: 0,
                total_pages,
            })?
            .min(total_pages - 1),
    };
    if page >= total_pages {
        return Err(PaginationError::OutOfRange {
            page: page + 1,
            total_pages,
        });
    }

    Ok(PageMarker { page, total_pages }.turn_state(page_size, total_items))
}
