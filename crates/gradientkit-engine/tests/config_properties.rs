//! Property tests for flow lookup

use gradientkit_engine::GradientConfig;
use proptest::prelude::*;

fn descending_flows() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.1..10.0f64, n),
            prop::collection::vec(0.0..50.0f64, n),
        )
            .prop_map(|(gaps, drops)| {
                let mut thresholds = Vec::with_capacity(gaps.len());
                let mut t = 0.0;
                for gap in gaps {
                    thresholds.push(t);
                    t += gap;
                }
                let mut flows = Vec::with_capacity(drops.len());
                let mut f = 300.0;
                for drop in drops {
                    flows.push(f);
                    f -= drop;
                }
                (thresholds, flows)
            })
    })
}

proptest! {
    #[test]
    fn test_flow_stays_within_configured_range(
        (thresholds, flows) in descending_flows(),
        distance in -10.0..100.0f64,
    ) {
        let config = GradientConfig::new(thresholds, &flows).unwrap();
        let lowest = config.flows().iter().copied().fold(f64::INFINITY, f64::min);
        let highest = config.flows().iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let flow = config.flow_at(distance);
        prop_assert!(flow >= lowest - 1e-12 && flow <= highest + 1e-12);
    }

    #[test]
    fn test_flow_is_monotone_for_descending_flows(
        (thresholds, flows) in descending_flows(),
        a in 0.0..60.0f64,
        b in 0.0..60.0f64,
    ) {
        let config = GradientConfig::new(thresholds, &flows).unwrap();
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(config.flow_at(near) >= config.flow_at(far) - 1e-12);
    }

    #[test]
    fn test_short_move_flow_is_a_configured_value(
        (thresholds, flows) in descending_flows(),
        distance in 0.0..60.0f64,
    ) {
        let config = GradientConfig::new(thresholds, &flows)
            .unwrap()
            .with_short_move_length(1.0)
            .unwrap();
        let flow = config.flow_for(distance, 0.5);
        prop_assert!(config.flows().contains(&flow));
    }
}
