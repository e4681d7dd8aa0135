use crate::ItemSpec;

/// Supplies the initial item list.  Read once when a ledger is built.
pub trait CatalogSource {
    fn inventory_items(&self) -> Vec<ItemSpec>;
}

impl CatalogSource for Vec<ItemSpec> {
    fn inventory_items(&self) -> Vec<ItemSpec> {
        self.clone()
    }
}

impl CatalogSource for [ItemSpec] {
    fn inventory_items(&self) -> Vec<ItemSpec> {
        self.to_vec()
    }
}
