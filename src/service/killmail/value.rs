//! Item pricing, value totals and duplicate merging.

use std::collections::HashMap;

use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt};

use crate::{
    esi::killmail::EsiItem,
    model::killmail::{ItemFate, KillmailValues, MergedItem, PricedItem},
    service::market::PriceService,
    util::eve::{is_fitted_flag, PRICE_FLOOR, SINGLETON_BLUEPRINT_COPY},
};

/// Unit price of an item, pricing failures fall back to the floor.
pub async fn unit_price(
    prices: &PriceService<'_>,
    type_id: i64,
    singleton: i64,
    date: NaiveDate,
) -> f64 {
    // Blueprint copies have no market
    if singleton == SINGLETON_BLUEPRINT_COPY {
        return PRICE_FLOOR;
    }

    match prices.fetch_type_price(type_id, date).await {
        Ok(price) => price,
        Err(e) => {
            tracing::warn!(type_id, "failed to price type, using floor: {}", e);
            PRICE_FLOOR
        }
    }
}

/// Prices an ESI item tree including container contents
pub fn price_items<'s>(
    prices: &'s PriceService<'s>,
    items: &'s [EsiItem],
    date: NaiveDate,
) -> BoxFuture<'s, Vec<PricedItem>> {
    async move {
        let mut priced = Vec::with_capacity(items.len());

        for item in items {
            let item_value = unit_price(prices, item.item_type_id, item.singleton, date).await;
            let quantity_destroyed = item.quantity_destroyed.unwrap_or(0);
            let quantity_dropped = item.quantity_dropped.unwrap_or(0);
            let contents = price_items(prices, &item.items, date).await;

            priced.push(PricedItem {
                flag: item.flag,
                item_type_id: item.item_type_id,
                quantity_destroyed,
                quantity_dropped,
                singleton: item.singleton,
                item_value,
                total_value: item_value * (quantity_destroyed + quantity_dropped) as f64,
                items: contents,
            });
        }

        priced
    }
    .boxed()
}

/// Totals for a killmail given its ship value and priced item tree.
///
/// Destroyed and dropped values walk the whole tree, the fitted value only counts top level
/// items in fitted slots.
pub fn aggregate_values(ship_value: f64, items: &[PricedItem]) -> KillmailValues {
    let (destroyed_items, dropped) = fate_totals(items);
    let destroyed = ship_value + destroyed_items;

    let fitted = ship_value
        + items
            .iter()
            .filter(|item| is_fitted_flag(item.flag))
            .map(|item| item.total_value)
            .sum::<f64>();

    KillmailValues {
        ship_value,
        destroyed,
        dropped,
        fitted,
        total: destroyed + dropped,
    }
}

fn fate_totals(items: &[PricedItem]) -> (f64, f64) {
    items.iter().fold((0.0, 0.0), |(destroyed, dropped), item| {
        let (nested_destroyed, nested_dropped) = fate_totals(&item.items);

        (
            destroyed + item.item_value * item.quantity_destroyed as f64 + nested_destroyed,
            dropped + item.item_value * item.quantity_dropped as f64 + nested_dropped,
        )
    })
}

/// Rebuilds the item tree of stored rows using their parent links, rows must be ordered by id.
pub fn item_tree(rows: &[entity::killmail_item::Model]) -> Vec<PricedItem> {
    let mut levels: HashMap<Option<i64>, Vec<&entity::killmail_item::Model>> = HashMap::new();
    for row in rows {
        levels.entry(row.parent_id).or_default().push(row);
    }

    build_level(&levels, None)
}

fn build_level(
    levels: &HashMap<Option<i64>, Vec<&entity::killmail_item::Model>>,
    parent_id: Option<i64>,
) -> Vec<PricedItem> {
    let Some(rows) = levels.get(&parent_id) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| PricedItem {
            flag: row.flag,
            item_type_id: row.item_type_id,
            quantity_destroyed: row.quantity_destroyed,
            quantity_dropped: row.quantity_dropped,
            singleton: row.singleton,
            item_value: row.item_value,
            total_value: row.total_value,
            items: build_level(levels, Some(row.id)),
        })
        .collect()
}

/// Collapses stacks of the same type in the same slot with the same fate and singleton state.
///
/// A stack with both destroyed and dropped units is split into one entry per fate, container
/// contents follow the first. Order of first appearance is kept.
pub fn merge_items(items: &[PricedItem]) -> Vec<MergedItem> {
    let mut merged = Vec::new();

    for item in items {
        let mut contents = Some(merge_items(&item.items));

        for (fate, quantity) in fates(item) {
            absorb(
                &mut merged,
                MergedItem {
                    item_type_id: item.item_type_id,
                    flag: item.flag,
                    fate,
                    singleton: item.singleton,
                    quantity,
                    item_value: item.item_value,
                    total_value: item.item_value * quantity as f64,
                    items: contents.take().unwrap_or_default(),
                },
            );
        }
    }

    merged
}

fn fates(item: &PricedItem) -> Vec<(ItemFate, i64)> {
    let mut fates = Vec::with_capacity(2);
    if item.quantity_destroyed > 0 {
        fates.push((ItemFate::Destroyed, item.quantity_destroyed));
    }
    if item.quantity_dropped > 0 {
        fates.push((ItemFate::Dropped, item.quantity_dropped));
    }
    if fates.is_empty() {
        fates.push((ItemFate::Destroyed, 0));
    }
    fates
}

fn absorb(merged: &mut Vec<MergedItem>, entry: MergedItem) {
    let existing = merged.iter_mut().find(|existing| {
        existing.item_type_id == entry.item_type_id
            && existing.flag == entry.flag
            && existing.fate == entry.fate
            && existing.singleton == entry.singleton
    });

    match existing {
        Some(existing) => {
            existing.quantity += entry.quantity;
            existing.total_value += entry.total_value;
            for child in entry.items {
                absorb(&mut existing.items, child);
            }
        }
        None => merged.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(flag: i64, type_id: i64, destroyed: i64, dropped: i64, value: f64) -> PricedItem {
        PricedItem {
            flag,
            item_type_id: type_id,
            quantity_destroyed: destroyed,
            quantity_dropped: dropped,
            singleton: 0,
            item_value: value,
            total_value: value * (destroyed + dropped) as f64,
            items: Vec::new(),
        }
    }

    mod aggregate_values {
        use super::*;

        #[test]
        fn ship_counts_as_destroyed_and_fitted() {
            let values = aggregate_values(1_000.0, &[]);

            assert_eq!(values.destroyed, 1_000.0);
            assert_eq!(values.dropped, 0.0);
            assert_eq!(values.fitted, 1_000.0);
            assert_eq!(values.total, 1_000.0);
        }

        #[test]
        fn splits_destroyed_and_dropped_quantities() {
            let items = [
                // High slot module, one destroyed one dropped
                item(27, 3001, 1, 1, 100.0),
                // Cargo
                item(5, 3002, 0, 10, 5.0),
            ];

            let values = aggregate_values(1_000.0, &items);

            assert_eq!(values.destroyed, 1_100.0);
            assert_eq!(values.dropped, 150.0);
            assert_eq!(values.fitted, 1_200.0);
            assert_eq!(values.total, 1_250.0);
        }

        #[test]
        fn container_contents_count_towards_totals_but_not_fitted() {
            let mut container = item(5, 3003, 1, 0, 10.0);
            container.items.push(item(0, 3004, 2, 3, 20.0));

            let values = aggregate_values(0.0, &[container]);

            assert_eq!(values.destroyed, 50.0);
            assert_eq!(values.dropped, 60.0);
            assert_eq!(values.fitted, 0.0);
            assert_eq!(values.total, 110.0);
        }
    }

    mod merge_items {
        use super::*;

        #[test]
        fn merges_same_type_slot_and_fate() {
            let items = [
                item(5, 3001, 10, 0, 2.0),
                item(5, 3001, 5, 0, 2.0),
                item(27, 3001, 1, 0, 2.0),
            ];

            let merged = merge_items(&items);

            assert_eq!(merged.len(), 2);
            assert_eq!(merged[0].flag, 5);
            assert_eq!(merged[0].quantity, 15);
            assert_eq!(merged[0].total_value, 30.0);
            assert_eq!(merged[1].flag, 27);
            assert_eq!(merged[1].quantity, 1);
        }

        #[test]
        fn splits_stack_by_fate() {
            let merged = merge_items(&[item(5, 3001, 3, 4, 1.0)]);

            assert_eq!(merged.len(), 2);
            assert_eq!(
                (merged[0].fate, merged[0].quantity),
                (ItemFate::Destroyed, 3)
            );
            assert_eq!((merged[1].fate, merged[1].quantity), (ItemFate::Dropped, 4));
        }

        #[test]
        fn singleton_state_keeps_stacks_apart() {
            let mut copy = item(5, 3001, 1, 0, 0.01);
            copy.singleton = SINGLETON_BLUEPRINT_COPY;

            let merged = merge_items(&[item(5, 3001, 1, 0, 50.0), copy]);

            assert_eq!(merged.len(), 2);
        }

        #[test]
        fn merges_container_contents() {
            let mut first = item(5, 3003, 1, 0, 10.0);
            first.items.push(item(0, 3004, 2, 0, 1.0));
            let mut second = item(5, 3003, 1, 0, 10.0);
            second.items.push(item(0, 3004, 3, 0, 1.0));

            let merged = merge_items(&[first, second]);

            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].quantity, 2);
            assert_eq!(merged[0].items.len(), 1);
            assert_eq!(merged[0].items[0].quantity, 5);
        }
    }

    #[test]
    fn item_tree_follows_parent_links() {
        let row = |id: i64, parent_id: Option<i64>, type_id: i64| entity::killmail_item::Model {
            id,
            killmail_id: 1,
            parent_id,
            flag: 5,
            item_type_id: type_id,
            quantity_dropped: 0,
            quantity_destroyed: 1,
            singleton: 0,
            item_value: 1.0,
            total_value: 1.0,
            is_parent: parent_id.is_none() && id == 1,
        };

        let tree = item_tree(&[row(1, None, 10), row(2, Some(1), 20), row(3, None, 30)]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].item_type_id, 10);
        assert_eq!(tree[0].items.len(), 1);
        assert_eq!(tree[0].items[0].item_type_id, 20);
        assert_eq!(tree[1].item_type_id, 30);
    }
}
