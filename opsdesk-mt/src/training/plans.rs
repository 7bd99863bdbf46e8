//! Fixed hyper-parameters and training-row builders
//!
//! Every stage fits with the same epoch budget and learning rate; only
//! the rows differ. The branch and finalize stages use three synthetic
//! rows each, the bootstrap stage derives one row per catalog item.

use crate::models::CatalogCache;
use crate::numeric::regression::{FitPlan, TrainingRow};

pub const EPOCHS: usize = 100;
pub const LEARNING_RATE: f32 = 1e-4;
pub const CONVERGENCE_DELTA: f32 = 1e-6;
pub const CONVERGENCE_PATIENCE: usize = 5;

/// Branch and finalize fits see prices in thousandths
pub const PRICE_SCALE: f32 = 1e-3;

pub const KMEANS_CLUSTERS: usize = 3;
pub const KMEANS_MAX_ITERATIONS: usize = 100;

pub const PRODUCTS_BRANCH_PRICES: [f32; 3] = [100.0, 200.0, 300.0];
pub const SERVICES_BRANCH_PRICES: [f32; 3] = [150.0, 250.0, 350.0];
pub const FINAL_FIT_PRICES: [f32; 3] = [175.0, 275.0, 375.0];

/// One-hot rotation per stage, applied modulo 3. The finalize offset
/// wraps onto the same encoding as the products branch.
pub const PRODUCTS_ONE_HOT_OFFSET: usize = 0;
pub const SERVICES_ONE_HOT_OFFSET: usize = 1;
pub const FINAL_ONE_HOT_OFFSET: usize = 3;

pub fn default_plan() -> FitPlan {
    FitPlan {
        epochs: EPOCHS,
        learning_rate: LEARNING_RATE,
        convergence_delta: CONVERGENCE_DELTA,
        convergence_patience: CONVERGENCE_PATIENCE,
    }
}

/// Three synthetic rows: scaled price plus a rotated positional one-hot,
/// fitting the scaled price back as the target.
pub fn fixed_rows(prices: &[f32; 3], one_hot_offset: usize) -> Vec<TrainingRow> {
    prices
        .iter()
        .enumerate()
        .map(|(row_idx, price)| {
            let mut features = vec![0.0f32; 4];
            features[0] = price * PRICE_SCALE;
            features[1 + (row_idx + one_hot_offset) % 3] = 1.0;
            TrainingRow {
                features,
                target: price * PRICE_SCALE,
            }
        })
        .collect()
}

/// One row per catalog item: raw price plus a positional one-hot across
/// the whole catalog, fitting the raw price back as the target.
pub fn bootstrap_rows(catalog: &CatalogCache) -> Vec<TrainingRow> {
    let width = 1 + catalog.total_len();
    catalog
        .all_items()
        .enumerate()
        .map(|(item_idx, item)| {
            let mut features = vec![0.0f32; width];
            features[0] = item.price as f32;
            features[1 + item_idx] = 1.0;
            TrainingRow {
                features,
                target: item.price as f32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogItem, CatalogKind};

    fn one_hot_positions(rows: &[TrainingRow]) -> Vec<usize> {
        rows.iter()
            .map(|row| {
                row.features
                    .iter()
                    .skip(1)
                    .position(|f| *f == 1.0)
                    .expect("one-hot present")
            })
            .collect()
    }

    #[test]
    fn test_fixed_rows_scale_prices_and_rotate_one_hot() {
        let rows = fixed_rows(&PRODUCTS_BRANCH_PRICES, PRODUCTS_ONE_HOT_OFFSET);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].features, vec![0.1, 1.0, 0.0, 0.0]);
        assert_eq!(rows[0].target, 0.1);
        assert_eq!(rows[2].features, vec![0.3, 0.0, 0.0, 1.0]);

        let shifted = fixed_rows(&SERVICES_BRANCH_PRICES, SERVICES_ONE_HOT_OFFSET);
        assert_eq!(one_hot_positions(&shifted), vec![1, 2, 0]);
    }

    #[test]
    fn test_finalize_offset_wraps_onto_products_encoding() {
        let products = fixed_rows(&PRODUCTS_BRANCH_PRICES, PRODUCTS_ONE_HOT_OFFSET);
        let finalize = fixed_rows(&FINAL_FIT_PRICES, FINAL_ONE_HOT_OFFSET);
        assert_eq!(one_hot_positions(&products), one_hot_positions(&finalize));
    }

    #[test]
    fn test_bootstrap_rows_span_products_then_services() {
        let item = |id: i64, kind, price: f64| CatalogItem {
            id,
            name: format!("item-{}", id),
            kind,
            quantity: 1,
            price,
            secondary_metric: None,
        };
        let catalog = CatalogCache::new(
            vec![
                item(1, CatalogKind::Product, 100.0),
                item(2, CatalogKind::Product, 200.0),
            ],
            vec![item(10, CatalogKind::Service, 150.0)],
        );

        let rows = bootstrap_rows(&catalog);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.features.len() == 4));

        // Prices stay unscaled and the one-hot walks the catalog order
        assert_eq!(rows[0].features, vec![100.0, 1.0, 0.0, 0.0]);
        assert_eq!(rows[1].features, vec![200.0, 0.0, 1.0, 0.0]);
        assert_eq!(rows[2].features, vec![150.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[2].target, 150.0);
    }

    #[test]
    fn test_bootstrap_rows_empty_catalog_yields_no_rows() {
        assert!(bootstrap_rows(&CatalogCache::default()).is_empty());
    }
}
