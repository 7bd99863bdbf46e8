//! Catalog item types and the startup-loaded catalog cache

use serde::{Deserialize, Serialize};

/// Which side of the catalog an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Product,
    Service,
}

/// One sellable catalog entry
///
/// Products and services share this shape; `secondary_metric` is the
/// per-item quality score used as the clustering feature and is absent
/// on rows that were never scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub kind: CatalogKind,
    pub quantity: i64,
    pub price: f64,
    pub secondary_metric: Option<f64>,
}

/// In-memory catalog snapshot, loaded once at startup
///
/// The pipeline only reads it, so the cache is shared as an `Arc` with
/// no interior locking.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    pub products: Vec<CatalogItem>,
    pub services: Vec<CatalogItem>,
}

impl CatalogCache {
    pub fn new(products: Vec<CatalogItem>, services: Vec<CatalogItem>) -> Self {
        Self { products, services }
    }

    /// Products whose ids appear in `refs`, in catalog order
    pub fn products_matching(&self, refs: &[Option<i64>; 3]) -> Vec<&CatalogItem> {
        Self::matching(&self.products, refs)
    }

    /// Services whose ids appear in `refs`, in catalog order
    pub fn services_matching(&self, refs: &[Option<i64>; 3]) -> Vec<&CatalogItem> {
        Self::matching(&self.services, refs)
    }

    fn matching<'a>(items: &'a [CatalogItem], refs: &[Option<i64>; 3]) -> Vec<&'a CatalogItem> {
        items
            .iter()
            .filter(|item| refs.iter().flatten().any(|id| *id == item.id))
            .collect()
    }

    /// All items, products first, in catalog order
    ///
    /// The baseline fit derives its positional one-hot encoding from this
    /// ordering, so it must be stable across calls.
    pub fn all_items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.products.iter().chain(self.services.iter())
    }

    pub fn total_len(&self) -> usize {
        self.products.len() + self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, kind: CatalogKind, metric: Option<f64>) -> CatalogItem {
        CatalogItem {
            id,
            name: format!("item-{}", id),
            kind,
            quantity: 1,
            price: 100.0 * id as f64,
            secondary_metric: metric,
        }
    }

    #[test]
    fn test_matching_filters_by_referenced_ids() {
        let cache = CatalogCache::new(
            vec![
                item(1, CatalogKind::Product, Some(4.0)),
                item(2, CatalogKind::Product, Some(8.0)),
                item(3, CatalogKind::Product, None),
            ],
            vec![item(10, CatalogKind::Service, None)],
        );

        let matched = cache.products_matching(&[Some(1), Some(3), None]);
        let ids: Vec<i64> = matched.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);

        // Unknown ids match nothing
        let matched = cache.products_matching(&[Some(99), None, None]);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_all_items_keeps_products_before_services() {
        let cache = CatalogCache::new(
            vec![item(1, CatalogKind::Product, None)],
            vec![item(10, CatalogKind::Service, None)],
        );

        let kinds: Vec<CatalogKind> = cache.all_items().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![CatalogKind::Product, CatalogKind::Service]);
        assert_eq!(cache.total_len(), 2);
        assert!(!cache.is_empty());
    }
}
