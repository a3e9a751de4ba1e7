use std::convert::Infallible;

use rocket::request::{FromRequest, Outcome, Request};

pub const DEFAULT_PAGE_LENGTH: u32 = 20;
pub const MAX_PAGE_LENGTH: u32 = 100;

/// Page requested through the `page`/`p` and `len`/`l` query values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PageState {
    pub page_length: u32,
    pub page: u32,
}

impl Default for PageState {
    fn default() -> Self {
        PageState {
            page_length: DEFAULT_PAGE_LENGTH,
            page: 0,
        }
    }
}

impl PageState {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_length)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PageState {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let length: Option<u32> = request
            .query_value("len")
            .and_then(|it| it.ok())
            .or_else(|| request.query_value("l").and_then(|it| it.ok()));

        let page: Option<u32> = request
            .query_value("page")
            .and_then(|it| it.ok())
            .or_else(|| request.query_value("p").and_then(|it| it.ok()));

        Outcome::Success(PageState {
            page_length: length
                .unwrap_or(DEFAULT_PAGE_LENGTH)
                .clamp(1, MAX_PAGE_LENGTH),
            page: page.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_skips_whole_pages() {
        let page = PageState {
            page_length: 15,
            page: 3,
        };
        assert_eq!(page.offset(), 45);
        assert_eq!(PageState::default().offset(), 0);
    }
}
