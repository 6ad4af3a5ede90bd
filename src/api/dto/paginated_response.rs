use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T: Clone> PaginatedResponse<T> {
    /// Slice `all` to one page; an offset past the end yields no items.
    pub fn from_slice(all: &[T], limit: usize, offset: usize) -> Self {
        let items = all.iter().skip(offset).take(limit).cloned().collect();
        Self {
            items,
            total: all.len(),
            limit,
            offset,
        }
    }
}
