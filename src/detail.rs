use tracing::{trace, warn};

use crate::item::Item;

/// Identifies one detail fetch. The generation grows with every request so a
/// late answer to an older request can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequest {
    pub id: u64,
    pub generation: u64,
}

/// State of the product detail dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetailView {
    #[default]
    Closed,
    Opening(DetailRequest),
    Loaded(Item),
    Failed(u64),
}

impl DetailView {
    pub fn is_open(&self) -> bool {
        !matches!(self, DetailView::Closed)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DetailView::Opening(_))
    }

    pub fn selected(&self) -> Option<&Item> {
        match self {
            DetailView::Loaded(item) => Some(item),
            _ => None,
        }
    }

    /// Open the dialog in loading state. Replaces whatever was shown before.
    pub fn open(&mut self, request: DetailRequest) {
        trace!("Detail dialog opening for {:?}", request);
        *self = DetailView::Opening(request);
    }

    /// Apply the answer for `request`. Returns false if the answer is stale,
    /// i.e. the dialog was closed or reopened for a newer request meanwhile.
    pub fn resolve<E>(&mut self, request: DetailRequest, result: Result<Item, E>) -> bool {
        match self {
            DetailView::Opening(pending) if *pending == request => {}
            _ => {
                warn!("Dropping stale detail answer for {:?}", request);
                return false;
            }
        }

        *self = match result {
            Ok(item) if item.id == request.id => DetailView::Loaded(item),
            Ok(item) => {
                warn!(
                    "Detail answer for product {} carried product {}",
                    request.id, item.id
                );
                DetailView::Failed(request.id)
            }
            Err(_) => DetailView::Failed(request.id),
        };
        true
    }

    pub fn close(&mut self) {
        *self = DetailView::Closed;
    }
}
