use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::cart::{checked_krw_add, product_total, CartLineItem};
use super::errors::DomainError;
use super::pricing::{round_up_to_10, CurrencyConverter, RateTable};

/// Fee rates, defaults and flat charges applied by [`EstimateCalculator`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    /// Weight assumed for items without a measurement, in grams.
    pub default_weight_g: f64,
    /// Volume assumed for items without a measurement, in cm³.
    pub default_volume_cm3: f64,
    /// Carrier convention for dimensional weight, grams per cm³.
    pub volumetric_g_per_cm3: f64,
    pub service_fee_rate: f64,
    pub payment_fee_rate: f64,
    pub domestic_shipping_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            default_weight_g: 26.0,
            default_volume_cm3: 40.3,
            volumetric_g_per_cm3: 0.2,
            service_fee_rate: 0.05,
            payment_fee_rate: 0.034,
            domestic_shipping_krw: 3000,
            extra_packaging_fee_krw: 2000,
            insurance_fee_krw: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimateOptions {
    pub extra_packaging: bool,
    pub insurance: bool,
}

/// Full cost breakdown for a set of cart items. Weights are in grams and
/// volume in cm³; every amount is KRW except `carrier_charge_jpy`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_g: f64,
    pub total_volume_cm3: f64,
    pub volumetric_weight_g: f64,
    pub chargeable_weight_g: f64,
    pub carrier_charge_jpy: i64,
    pub international_shipping_krw: i64,
    pub domestic_shipping_krw: i64,
    pub total_shipping_krw: i64,
    pub payment_fee_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
    pub grand_total_krw: i64,
    pub extra_packaging: bool,
    pub insurance: bool,
}

impl CostBreakdown {
    pub fn chargeable_weight_kg(&self) -> f64 {
        self.chargeable_weight_g / 1000.0
    }
}

/// The live estimate kept for a session, with the cart items it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEstimate {
    pub item_ids: Vec<Uuid>,
    pub breakdown: CostBreakdown,
}

#[derive(Clone)]
pub struct EstimateCalculator {
    policy: PricingPolicy,
    rates: Arc<dyn RateTable>,
    converter: Arc<dyn CurrencyConverter>,
}

impl EstimateCalculator {
    pub fn new(
        policy: PricingPolicy,
        rates: Arc<dyn RateTable>,
        converter: Arc<dyn CurrencyConverter>,
    ) -> Self {
        Self {
            policy,
            rates,
            converter,
        }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn estimate(
        &self,
        items: &[CartLineItem],
        options: EstimateOptions,
    ) -> Result<CostBreakdown, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyCollection("no items to estimate"));
        }
        let policy = &self.policy;

        let product_total_krw = product_total(items)?;
        let service_fee_krw = round_up_to_10(product_total_krw as f64 * policy.service_fee_rate);

        let total_actual_weight_g: f64 = items
            .iter()
            .map(|i| i.weight_g.unwrap_or(policy.default_weight_g))
            .sum();
        let total_volume_cm3: f64 = items
            .iter()
            .map(|i| i.volume_cm3.unwrap_or(policy.default_volume_cm3))
            .sum();
        let volumetric_weight_g = total_volume_cm3 * policy.volumetric_g_per_cm3;
        let chargeable_weight_g = total_actual_weight_g.max(volumetric_weight_g);

        let carrier_charge_jpy = self.rates.lookup(chargeable_weight_g / 1000.0)?;
        let international_shipping_krw = self.converter.to_local(carrier_charge_jpy)?;
        let domestic_shipping_krw = policy.domestic_shipping_krw;
        let total_shipping_krw = checked_krw_add(international_shipping_krw, domestic_shipping_krw)?;

        let payment_base = [service_fee_krw, total_shipping_krw]
            .into_iter()
            .try_fold(product_total_krw, checked_krw_add)?;
        let payment_fee_krw = round_up_to_10(payment_base as f64 * policy.payment_fee_rate);

        let extra_packaging_fee_krw = if options.extra_packaging {
            policy.extra_packaging_fee_krw
        } else {
            0
        };
        let insurance_fee_krw = if options.insurance {
            policy.insurance_fee_krw
        } else {
            0
        };

        let grand_total_krw = [
            payment_fee_krw,
            extra_packaging_fee_krw,
            insurance_fee_krw,
        ]
        .into_iter()
        .try_fold(payment_base, checked_krw_add)?;

        Ok(CostBreakdown {
            product_total_krw,
            service_fee_krw,
            total_actual_weight_g,
            total_volume_cm3,
            volumetric_weight_g,
            chargeable_weight_g,
            carrier_charge_jpy,
            international_shipping_krw,
            domestic_shipping_krw,
            total_shipping_krw,
            payment_fee_krw,
            extra_packaging_fee_krw,
            insurance_fee_krw,
            grand_total_krw,
            extra_packaging: options.extra_packaging,
            insurance: options.insurance,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;

    /// Carrier stub charging a fixed amount and recording the weights it saw.
    pub(crate) struct FixedRate {
        pub amount: i64,
        pub seen_kg: Mutex<Vec<f64>>,
    }

    impl FixedRate {
        pub(crate) fn new(amount: i64) -> Self {
            Self {
                amount,
                seen_kg: Mutex::new(Vec::new()),
            }
        }
    }

    impl RateTable for FixedRate {
        fn lookup(&self, weight_kg: f64) -> Result<i64, DomainError> {
            self.seen_kg.lock().unwrap().push(weight_kg);
            Ok(self.amount)
        }
    }

    pub(crate) struct Multiply(pub i64);

    impl CurrencyConverter for Multiply {
        fn to_local(&self, foreign_amount: i64) -> Result<i64, DomainError> {
            Ok(foreign_amount * self.0)
        }
    }

    pub(crate) fn stub_calculator() -> EstimateCalculator {
        EstimateCalculator::new(
            PricingPolicy::default(),
            Arc::new(FixedRate::new(1000)),
            Arc::new(Multiply(10)),
        )
    }

    pub(crate) fn item(price: Option<i64>, weight_g: Option<f64>, volume_cm3: Option<f64>) -> CartLineItem {
        CartLineItem {
            id: Uuid::new_v4(),
            product_name: "item".to_string(),
            price_krw: price,
            image_url: None,
            source_url: None,
            weight_g,
            volume_cm3,
            created_at: Utc::now(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_unmeasured_items_use_defaults() {
        let rates = Arc::new(FixedRate::new(1000));
        let calculator =
            EstimateCalculator::new(PricingPolicy::default(), rates.clone(), Arc::new(Multiply(10)));
        let items = vec![
            item(Some(10000), None, None),
            item(Some(20000), None, None),
            item(Some(5000), None, None),
        ];

        let b = calculator.estimate(&items, EstimateOptions::default()).unwrap();

        assert_eq!(b.product_total_krw, 35000);
        assert!(approx(b.total_actual_weight_g, 78.0));
        assert!(approx(b.total_volume_cm3, 120.9));
        assert!(approx(b.volumetric_weight_g, 24.18));
        assert!(approx(b.chargeable_weight_g, 78.0));
        assert!(approx(rates.seen_kg.lock().unwrap()[0], 0.078));
        assert_eq!(b.service_fee_krw, 1750);
        assert_eq!(b.carrier_charge_jpy, 1000);
        assert_eq!(b.international_shipping_krw, 10000);
        assert_eq!(b.domestic_shipping_krw, 3000);
        assert_eq!(b.total_shipping_krw, 13000);
        // (35000 + 1750 + 13000) * 0.034 = 1691.5
        assert_eq!(b.payment_fee_krw, 1700);
        assert_eq!(b.extra_packaging_fee_krw, 0);
        assert_eq!(b.insurance_fee_krw, 0);
        assert_eq!(b.grand_total_krw, 51450);
    }

    #[test]
    fn volumetric_weight_wins_for_bulky_items() {
        let items = vec![item(Some(1000), Some(100.0), Some(2000.0))];
        let b = stub_calculator().estimate(&items, EstimateOptions::default()).unwrap();
        assert!(approx(b.volumetric_weight_g, 400.0));
        assert!(approx(b.chargeable_weight_g, 400.0));
    }

    #[test]
    fn missing_price_counts_as_zero() {
        let items = vec![item(None, None, None), item(Some(4000), None, None)];
        let b = stub_calculator().estimate(&items, EstimateOptions::default()).unwrap();
        assert_eq!(b.product_total_krw, 4000);
        assert_eq!(b.service_fee_krw, 200);
    }

    #[test]
    fn options_add_flat_fees() {
        let items = vec![item(Some(10000), None, None)];
        let calculator = stub_calculator();
        let plain = calculator.estimate(&items, EstimateOptions::default()).unwrap();
        let both = calculator
            .estimate(
                &items,
                EstimateOptions {
                    extra_packaging: true,
                    insurance: true,
                },
            )
            .unwrap();

        assert_eq!(both.extra_packaging_fee_krw, 2000);
        assert_eq!(both.insurance_fee_krw, 5000);
        assert!(both.extra_packaging && both.insurance);
        // Option fees are not part of the payment fee base.
        assert_eq!(both.payment_fee_krw, plain.payment_fee_krw);
        assert_eq!(both.grand_total_krw, plain.grand_total_krw + 7000);
    }

    #[test]
    fn empty_items_are_rejected() {
        let result = stub_calculator().estimate(&[], EstimateOptions::default());
        assert!(matches!(result, Err(DomainError::EmptyCollection(_))));
    }

    #[test]
    fn rate_table_errors_reject_the_estimate() {
        struct Overweight;
        impl RateTable for Overweight {
            fn lookup(&self, weight_kg: f64) -> Result<i64, DomainError> {
                Err(DomainError::InvalidWeight(format!("{weight_kg}")))
            }
        }
        let calculator = EstimateCalculator::new(
            PricingPolicy::default(),
            Arc::new(Overweight),
            Arc::new(Multiply(10)),
        );
        let result = calculator.estimate(&[item(Some(1), None, None)], EstimateOptions::default());
        assert!(matches!(result, Err(DomainError::InvalidWeight(_))));
    }

    fn arb_item() -> impl Strategy<Value = CartLineItem> {
        (
            proptest::option::of(0i64..5_000_000),
            proptest::option::of(0.0f64..20_000.0),
            proptest::option::of(0.0f64..50_000.0),
        )
            .prop_map(|(price, weight, volume)| item(price, weight, volume))
    }

    #[test]
    fn totals_beyond_the_supported_range_are_rejected() {
        let items = [
            item(Some(i64::MAX / 2), None, None),
            item(Some(i64::MAX / 2), None, None),
        ];
        assert!(matches!(
            stub_calculator().estimate(&items, EstimateOptions::default()),
            Err(DomainError::InvalidInput(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_chargeable_weight_is_max_of_actual_and_volumetric(
            items in prop::collection::vec(arb_item(), 1..8)
        ) {
            let b = stub_calculator().estimate(&items, EstimateOptions::default()).unwrap();
            let actual: f64 = items.iter().map(|i| i.weight_g.unwrap_or(26.0)).sum();
            let volume: f64 = items.iter().map(|i| i.volume_cm3.unwrap_or(40.3)).sum();
            prop_assert_eq!(b.chargeable_weight_g, actual.max(volume * 0.2));
        }

        #[test]
        fn prop_grand_total_is_sum_of_components(
            items in prop::collection::vec(arb_item(), 1..8),
            extra_packaging in any::<bool>(),
            insurance in any::<bool>(),
        ) {
            let b = stub_calculator()
                .estimate(&items, EstimateOptions { extra_packaging, insurance })
                .unwrap();
            prop_assert_eq!(
                b.grand_total_krw,
                b.product_total_krw
                    + b.service_fee_krw
                    + b.total_shipping_krw
                    + b.payment_fee_krw
                    + b.extra_packaging_fee_krw
                    + b.insurance_fee_krw
            );
            prop_assert!(b.service_fee_krw % 10 == 0 && b.payment_fee_krw % 10 == 0);
        }
    }
}
