use super::cart::CartEntry;
use super::catalog::Catalog;
use super::money::Cents;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// A biomarker that was already claimed by an earlier package in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub biomarker: String,
    pub name: String,
    pub amount: Cents,
    /// SKU of the package that claimed the biomarker first.
    pub claimed_by: String,
}

/// Priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceLine {
    pub sku: String,
    pub name: String,
    /// Base price of the package.
    pub original: Cents,
    /// Base price minus deductions. May be zero or negative.
    #[serde(rename = "final")]
    pub final_price: Cents,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deductions: Vec<Deduction>,
}

impl PriceLine {
    pub fn deducted(&self) -> Cents {
        self.deductions.iter().map(|d| d.amount).sum()
    }
}

/// Result of pricing a cart. Built fresh on every call.
///
/// For carts made only of resolvable entries, `total + deductions == original`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CartCalculation {
    pub total: Cents,
    pub deductions: Cents,
    pub prices: Vec<PriceLine>,
    /// Sum of base prices over the resolved entries.
    pub original: Cents,
}

impl CartCalculation {
    pub fn line(&self, sku: &str) -> Option<&PriceLine> {
        self.prices.iter().find(|p| p.sku == sku)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// A cart entry the engine could not price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntry {
    /// Index in the input sequence.
    pub position: usize,
    /// `None` when the entry had no usable SKU at all.
    pub sku: Option<String>,
}

/// Prices carts so that a biomarker shared by several packages is paid once.
///
/// Entries are walked in cart order and each package's biomarkers in declared
/// order. The first package to include a biomarker claims it; every later
/// package containing the same biomarker is discounted by that biomarker's
/// price. The engine is a pure function of its input and the catalog.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<Catalog>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn calculate(&self, items: &[CartEntry]) -> CartCalculation {
        // biomarker key -> SKU (not display name) of the claiming package
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        let mut result = CartCalculation::default();

        for (position, item) in items.iter().enumerate() {
            let Some(package) = item.sku().and_then(|sku| self.catalog.get_package(sku)) else {
                tracing::warn!(
                    position,
                    sku = item.sku.as_deref().unwrap_or_default(),
                    "skipping unresolvable cart entry"
                );
                continue;
            };

            let mut final_price = package.base_price;
            let mut deductions = Vec::new();
            for biomarker in &package.biomarkers {
                match claimed.get(biomarker.key.as_str()) {
                    Some(&owner) => {
                        final_price -= biomarker.price;
                        result.deductions += biomarker.price;
                        deductions.push(Deduction {
                            biomarker: biomarker.key.clone(),
                            name: biomarker.name.clone(),
                            amount: biomarker.price,
                            claimed_by: owner.to_string(),
                        });
                    }
                    None => {
                        claimed.insert(&biomarker.key, &package.sku);
                    }
                }
            }

            tracing::debug!(
                sku = %package.sku,
                original = package.base_price.value(),
                final_price = final_price.value(),
                "priced cart entry"
            );

            result.original += package.base_price;
            result.total += final_price;
            result.prices.push(PriceLine {
                sku: package.sku.clone(),
                name: package.name.clone(),
                original: package.base_price,
                final_price,
                deductions,
            });
        }

        result
    }

    /// Entries `calculate` would skip, without pricing anything.
    pub fn unresolved(&self, items: &[CartEntry]) -> Vec<UnresolvedEntry> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.sku()
                    .is_none_or(|sku| self.catalog.get_package(sku).is_none())
            })
            .map(|(position, item)| UnresolvedEntry {
                position,
                sku: item.sku().map(str::to_string),
            })
            .collect()
    }

    /// How much adding `sku` at the end of the cart would save thanks to
    /// biomarkers the cart already contains.
    pub fn savings_if_added(&self, items: &[CartEntry], sku: &str) -> Cents {
        let mut extended = items.to_vec();
        extended.push(CartEntry::new(sku));
        self.calculate(&extended).deductions - self.calculate(items).deductions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Biomarker, Package};

    fn reference_engine() -> PricingEngine {
        PricingEngine::new(Arc::new(Catalog::reference().unwrap()))
    }

    fn cart(skus: &[&str]) -> Vec<CartEntry> {
        skus.iter().map(|sku| CartEntry::new(*sku)).collect()
    }

    fn package(sku: &str, base_price: i64, biomarkers: &[(&str, i64)]) -> Package {
        Package {
            sku: sku.to_string(),
            name: sku.to_uppercase(),
            base_price: Cents::new(base_price),
            image: None,
            slug: None,
            product_id: None,
            biomarkers: biomarkers
                .iter()
                .map(|(key, price)| Biomarker {
                    key: key.to_string(),
                    name: key.to_string(),
                    price: Cents::new(*price),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_cart() {
        let engine = reference_engine();
        assert_eq!(engine.calculate(&[]), CartCalculation::default());
    }

    #[test]
    fn test_single_package() {
        let engine = reference_engine();
        let calc = engine.calculate(&cart(&["vitamin_d"]));
        assert_eq!(calc.total, Cents::new(1865));
        assert_eq!(calc.deductions, Cents::ZERO);
        assert_eq!(calc.original, Cents::new(1865));
        assert_eq!(calc.prices.len(), 1);
        assert_eq!(calc.prices[0].name, "Vitamin D");
        assert_eq!(calc.prices[0].final_price, Cents::new(1865));
    }

    #[test]
    fn test_first_package_claims_shared_biomarkers() {
        let engine = reference_engine();
        let calc = engine.calculate(&cart(&["mens_health", "womens_health"]));

        let mens = calc.line("mens_health").unwrap();
        assert_eq!(mens.final_price, Cents::new(8743));
        assert!(mens.deductions.is_empty());

        // estradiol, fsh, lh, dheas, shbg, testosterone, free testosterone index
        let womens = calc.line("womens_health").unwrap();
        assert_eq!(womens.deducted(), Cents::new(9743));
        assert_eq!(womens.final_price, Cents::new(2400));
        assert_eq!(womens.deductions.len(), 7);
        assert!(womens.deductions.iter().all(|d| d.claimed_by == "mens_health"));
        assert_eq!(womens.deductions[0].biomarker, "estradiol");

        assert_eq!(calc.total, Cents::new(11143));
        assert_eq!(calc.deductions, Cents::new(9743));
        assert_eq!(calc.original, Cents::new(20886));
    }

    #[test]
    fn test_final_price_can_go_negative() {
        let engine = reference_engine();
        let calc = engine.calculate(&cart(&["womens_health", "mens_health"]));

        assert_eq!(calc.prices[0].final_price, Cents::new(12143));
        // only prolactin is left unclaimed in mens_health
        assert_eq!(calc.prices[1].final_price, Cents::new(-1000));
        assert_eq!(calc.total, Cents::new(11143));
        assert_eq!(calc.deductions, Cents::new(9743));
    }

    #[test]
    fn test_order_sensitivity() {
        let catalog = Catalog::new(vec![
            package("a", 5000, &[("x", 1000), ("a1", 2000)]),
            package("b", 3000, &[("b1", 500), ("x", 1000)]),
        ])
        .unwrap();
        let engine = PricingEngine::new(Arc::new(catalog));

        let ab = engine.calculate(&cart(&["a", "b"]));
        assert_eq!(ab.prices[0].final_price, Cents::new(5000));
        assert_eq!(ab.prices[1].final_price, Cents::new(2000));

        let ba = engine.calculate(&cart(&["b", "a"]));
        assert_eq!(ba.prices[0].final_price, Cents::new(3000));
        assert_eq!(ba.prices[1].final_price, Cents::new(4000));

        assert_ne!(ab.prices, ba.prices);
        assert_eq!(ab.total, ba.total);
    }

    #[test]
    fn test_unknown_sku_skipped() {
        let engine = reference_engine();
        assert_eq!(
            engine.calculate(&cart(&["does_not_exist"])),
            CartCalculation::default()
        );
    }

    #[test]
    fn test_unknown_sku_does_not_affect_others() {
        let engine = reference_engine();
        let with_unknown = engine.calculate(&cart(&["iron_metabolism", "nope", "womens_health"]));
        let without = engine.calculate(&cart(&["iron_metabolism", "womens_health"]));
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let engine = reference_engine();
        let items = vec![
            CartEntry::default(),
            CartEntry::new(""),
            CartEntry::new("vitamin_d"),
        ];
        let calc = engine.calculate(&items);
        assert_eq!(calc.prices.len(), 1);
        assert_eq!(calc.total, Cents::new(1865));
    }

    #[test]
    fn test_padded_sku_is_not_resolved() {
        let engine = reference_engine();
        let items = vec![CartEntry::new(" vitamin_d "), CartEntry::new("heart_health")];

        let calc = engine.calculate(&items);
        assert_eq!(calc.prices.len(), 1);
        assert_eq!(calc.prices[0].sku, "heart_health");
        assert_eq!(calc.original, Cents::new(4498));

        assert_eq!(
            engine.unresolved(&items),
            vec![UnresolvedEntry {
                position: 0,
                sku: Some(" vitamin_d ".to_string()),
            }]
        );
    }

    #[test]
    fn test_maximum_prices_do_not_overflow() {
        use crate::domain::catalog::MAX_PRICE;

        let max = MAX_PRICE.value();
        let catalog = Catalog::new(vec![
            package("a", max, &[("x", max)]),
            package("b", max, &[("x", max)]),
        ])
        .unwrap();
        let engine = PricingEngine::new(Arc::new(catalog));
        let items: Vec<CartEntry> = ["a", "b"]
            .iter()
            .cycle()
            .take(1000)
            .map(|sku| CartEntry::new(*sku))
            .collect();

        let calc = engine.calculate(&items);
        assert_eq!(calc.original, Cents::new(max * 1000));
        assert_eq!(calc.total + calc.deductions, calc.original);
    }

    #[test]
    fn test_duplicate_sku_fully_deducted() {
        let engine = reference_engine();
        let calc = engine.calculate(&cart(&["iron_metabolism", "iron_metabolism"]));
        assert_eq!(calc.prices.len(), 2);
        assert_eq!(calc.prices[0].final_price, Cents::new(2873));
        // biomarkers sum to 2873 as well
        assert_eq!(calc.prices[1].final_price, Cents::ZERO);
        assert_eq!(calc.original, Cents::new(5746));
        assert!(
            calc.prices[1]
                .deductions
                .iter()
                .all(|d| d.claimed_by == "iron_metabolism")
        );
    }

    #[test]
    fn test_deduction_uses_current_package_price() {
        let catalog = Catalog::new(vec![
            package("a", 1000, &[("x", 100)]),
            package("b", 1000, &[("x", 300)]),
        ])
        .unwrap();
        let engine = PricingEngine::new(Arc::new(catalog));
        let calc = engine.calculate(&cart(&["a", "b"]));
        assert_eq!(calc.prices[1].final_price, Cents::new(700));
        assert_eq!(calc.deductions, Cents::new(300));
    }

    #[test]
    fn test_calculate_is_deterministic() {
        let engine = reference_engine();
        let items = cart(&["heart_health", "chronic_inflammation", "longterm_health"]);
        let snapshot = items.clone();
        let first = engine.calculate(&items);
        let second = engine.calculate(&items);
        assert_eq!(first, second);
        assert_eq!(items, snapshot);
        // hscrp is shared between heart_health and chronic_inflammation
        assert_eq!(first.deductions, Cents::new(1166));
    }

    #[test]
    fn test_unresolved_report() {
        let engine = reference_engine();
        let items = vec![
            CartEntry::new("vitamin_d"),
            CartEntry::new("typo_health"),
            CartEntry::default(),
        ];
        let unresolved = engine.unresolved(&items);
        assert_eq!(
            unresolved,
            vec![
                UnresolvedEntry {
                    position: 1,
                    sku: Some("typo_health".to_string()),
                },
                UnresolvedEntry {
                    position: 2,
                    sku: None,
                },
            ]
        );
        assert!(engine.unresolved(&cart(&["vitamin_d"])).is_empty());
    }

    #[test]
    fn test_savings_if_added() {
        let engine = reference_engine();
        let items = cart(&["womens_health"]);
        // ferritin and transferrin are already in the cart
        assert_eq!(
            engine.savings_if_added(&items, "iron_metabolism"),
            Cents::new(2040)
        );
        assert_eq!(engine.savings_if_added(&items, "vitamin_d"), Cents::ZERO);
        assert_eq!(engine.savings_if_added(&[], "iron_metabolism"), Cents::ZERO);
    }

    #[test]
    fn test_serialized_shape() {
        let engine = reference_engine();
        let calc = engine.calculate(&cart(&["vitamin_d"]));
        let json = serde_json::to_string(&calc).unwrap();
        assert_eq!(
            json,
            r#"{"total":1865,"deductions":0,"prices":[{"sku":"vitamin_d","name":"Vitamin D","original":1865,"final":1865}],"original":1865}"#
        );
    }
}
