use serde::Serialize;
use utoipa::ToSchema;

/// Uniform envelope for every list endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(total_items: i64, page: i64, limit: i64, items: Vec<T>) -> Self {
        let total_pages = if limit > 0 {
            (total_items + limit - 1) / limit
        } else {
            0
        };
        Self {
            total_items,
            total_pages,
            current_page: page,
            items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::<i32>::new(21, 1, 10, vec![]);
        assert_eq!(page.total_pages, 3);

        let exact = Paginated::<i32>::new(20, 2, 10, vec![]);
        assert_eq!(exact.total_pages, 2);

        let empty = Paginated::<i32>::new(0, 1, 10, vec![]);
        assert_eq!(empty.total_pages, 0);
    }
}
