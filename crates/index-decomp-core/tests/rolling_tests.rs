use index_decomp_core::aggregation::{IndexYearRecord, ValidCounts};
use index_decomp_core::analysis::analyze_rolling;
use index_decomp_core::config::PeExpansionMethod;
use index_decomp_core::pipeline::{run_rolling, IndexSeriesInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixture: 5% trend growth with a repeating three-year valuation cycle
// ===========================================================================

fn cyclical_series() -> Vec<IndexYearRecord> {
    let cycle = [dec!(1.25), dec!(1.0), dec!(0.8)];
    let mut trend = dec!(1000);
    let mut out = Vec::new();
    for (t, year) in (1960..=2020).enumerate() {
        let mc = trend * cycle[t % 3];
        out.push(IndexYearRecord {
            year,
            company_count: 500,
            sector_count: 11,
            earnings: mc / dec!(15),
            prior_earnings: Decimal::ZERO,
            market_cap: mc,
            prior_market_cap: Decimal::ZERO,
            dividends: Decimal::ZERO,
            valid_counts: ValidCounts::default(),
            price_return: None,
            dividend_yield: Some(dec!(0.02)),
            total_return: None,
            earnings_growth: None,
            pe_expansion: None,
            pe: Some(dec!(15)),
            pe_prior: None,
        });
        trend *= dec!(1.05);
    }
    out
}

#[test]
fn test_dispersion_shrinks_as_window_lengthens() {
    let out = analyze_rolling(&cyclical_series(), &[5, 10, 20], PeExpansionMethod::Additive)
        .unwrap();

    let stds: Vec<Decimal> = out
        .summaries
        .iter()
        .map(|s| s.total_return.unwrap().std_dev)
        .collect();
    assert!(stds[0] > stds[1], "5y σ {} vs 10y σ {}", stds[0], stds[1]);
    assert!(stds[1] > stds[2], "10y σ {} vs 20y σ {}", stds[1], stds[2]);

    assert!((stds[0] - dec!(0.0651)).abs() < dec!(0.001), "5y σ {}", stds[0]);
    assert!((stds[2] - dec!(0.0166)).abs() < dec!(0.001), "20y σ {}", stds[2]);
}

#[test]
fn test_every_end_year_is_covered() {
    let out = analyze_rolling(&cyclical_series(), &[5, 10, 20], PeExpansionMethod::Additive)
        .unwrap();
    let samples: Vec<usize> = out
        .summaries
        .iter()
        .map(|s| s.total_return.unwrap().samples)
        .collect();
    // 61 years of data
    assert_eq!(samples, vec![56, 51, 41]);

    let first_10y = out.records.iter().find(|r| r.window == 10).unwrap();
    assert_eq!((first_10y.start_year, first_10y.end_year), (1960, 1970));
}

#[test]
fn test_constant_pe_means_no_expansion() {
    let out = analyze_rolling(&cyclical_series(), &[10], PeExpansionMethod::Additive).unwrap();
    for r in &out.records {
        let pe = r.pe_expansion.unwrap();
        assert!(pe.abs() < dec!(0.0000001), "{}: pe expansion {pe}", r.end_year);
        assert_eq!(r.dividend_yield, Some(dec!(0.02)));
    }
    let mean_div = out.summaries[0].mean_dividend_yield.unwrap();
    assert_eq!(mean_div, dec!(0.02));
}

#[test]
fn test_run_rolling_reports_full_period() {
    let out = run_rolling(&IndexSeriesInput {
        index: cyclical_series(),
        reference: None,
        config: None,
    })
    .unwrap();
    let fp = out.result.full_period.unwrap();
    assert_eq!((fp.start_year, fp.end_year, fp.years), (1960, 2020, 60));
    // both endpoints sit at the same point of the cycle
    assert!((fp.price_return - dec!(0.05)).abs() < dec!(0.000001), "{}", fp.price_return);
    assert!(out.warnings.is_empty());
}
