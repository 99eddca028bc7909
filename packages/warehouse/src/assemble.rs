use std::collections::BTreeMap;

use duckdb::Connection;
use market_map_district_models::{DistrictRecord, Metric, ReportMonth};
use market_map_metrics::catalog::{Catalog, MissingPolicy};

use crate::{WarehouseError, queries};

/// Divisor converting rupee GTV into crore, the unit market size is
/// reported in.
pub const GTV_TO_CRORE: f64 = 1e7;

/// Pulls every metric for one month and merges them into district
/// records keyed by normalized district name.
///
/// The business-review table defines the district universe; aggregate
/// metrics are left-joined onto it, and a district that only appears in
/// an aggregate is logged and dropped. After the merge, metrics whose
/// catalog policy is zero-fill default to `0.0` wherever absent, while
/// the rest stay missing.
///
/// # Errors
///
/// * `WarehouseError::Database` if any warehouse query fails
pub fn fetch_district_records(
    conn: &Connection,
    month: ReportMonth,
    catalog: &Catalog,
) -> Result<Vec<DistrictRecord>, WarehouseError> {
    let review = queries::review_rows(conn, month)?;
    log::info!(
        "fetched {} business review rows for {}",
        review.len(),
        month.label()
    );

    let mut records: BTreeMap<String, DistrictRecord> = BTreeMap::new();
    for row in review {
        let record = records
            .entry(row.district.clone())
            .or_insert_with(|| DistrictRecord {
                district: row.district.clone(),
                state: row.state.clone(),
                values: BTreeMap::new(),
            });

        if let Some(size) = row.aeps_market_size {
            record.values.insert(Metric::AepsMarketSize, size);
        }
        if let Some(share) = market_share(row.aeps_gtv, row.aeps_market_size) {
            record.values.insert(Metric::MarketShare, share);
        }
    }

    for (district, (trans, sp)) in queries::densities(conn, month)? {
        if let Some(record) = records.get_mut(&district) {
            record.values.insert(Metric::TransDensity10k, trans);
            record.values.insert(Metric::SpDensity10k, sp);
        } else {
            log::debug!("district {district} has population data but no review row");
        }
    }

    merge_metric(&mut records, Metric::CmsGtv, queries::cms_gtv_crore(conn, month)?);
    merge_metric(
        &mut records,
        Metric::MonthlyVisitCoverage,
        queries::visit_coverage(conn, month)?,
    );
    merge_metric(
        &mut records,
        Metric::PartnerPresence,
        queries::partner_presence(conn, month)?,
    );
    merge_metric(
        &mut records,
        Metric::FieldPresence,
        queries::field_presence(conn, month)?,
    );
    merge_metric(
        &mut records,
        Metric::SpWinbackRatio,
        queries::sp_winback_ratio(conn, month)?,
    );

    for def in catalog.defs() {
        if def.missing_policy == MissingPolicy::ZeroFill {
            for record in records.values_mut() {
                record.values.entry(def.metric).or_insert(0.0);
            }
        }
    }

    Ok(records.into_values().collect())
}

/// Market share as a fraction: monthly GTV in crore over district market
/// size in crore. Non-finite results (zero or absent market size) are
/// treated as missing.
fn market_share(aeps_gtv: Option<f64>, aeps_market_size: Option<f64>) -> Option<f64> {
    let gtv = aeps_gtv?;
    let size = aeps_market_size?;
    let share = (gtv / GTV_TO_CRORE) / size;

    share.is_finite().then_some(share)
}

fn merge_metric(
    records: &mut BTreeMap<String, DistrictRecord>,
    metric: Metric,
    values: BTreeMap<String, f64>,
) {
    for (district, value) in values {
        if let Some(record) = records.get_mut(&district) {
            record.values.insert(metric, value);
        } else {
            log::debug!("district {district} appears in {metric} but has no review row");
        }
    }
}

#[cfg(test)]
mod tests {
    use market_map_district_models::Bin;
    use market_map_metrics::classify::classify;

    use super::*;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();

        conn.execute_batch(
            "
            CREATE TABLE business_review (
                month_year DATE,
                district_name TEXT,
                state TEXT,
                aeps_gtv DOUBLE,
                aeps_market_size DOUBLE
            );
            CREATE TABLE pincode_population (
                pincode TEXT,
                district TEXT,
                population BIGINT
            );
            CREATE TABLE agent_monthly (
                month_year DATE,
                agent_id TEXT,
                district TEXT,
                total_gtv DOUBLE,
                cms_gtv DOUBLE
            );
            CREATE TABLE agent_visits (
                month_year DATE,
                agent_id TEXT
            );
            CREATE TABLE partner_commission (
                month_year DATE,
                partner_id TEXT,
                district TEXT,
                total_commission DOUBLE
            );
            CREATE TABLE field_staff_log (
                month_year DATE,
                user_id TEXT,
                district TEXT
            );

            INSERT INTO business_review VALUES
                ('2025-06-01', ' Alpha ', 'BIHAR', 60000000, 30),
                ('2025-06-01', 'beta', 'BIHAR', 2000000, 4),
                ('2025-06-01', 'Gamma', 'ASSAM', 5000000, NULL);

            INSERT INTO pincode_population VALUES
                ('800001', 'ALPHA', 50000),
                ('800002', 'ALPHA', 50000),
                ('800003', 'BETA', 200000);

            INSERT INTO agent_monthly VALUES
                ('2025-06-01', 'a1', 'ALPHA', 400000, 20000000),
                ('2025-06-01', 'a2', 'ALPHA', 500000, 0),
                ('2025-06-01', 'a3', 'ALPHA', 1000, 0),
                ('2025-06-01', 'b1', 'BETA', 300000, 0);

            INSERT INTO agent_visits VALUES
                ('2025-06-01', 'a1'),
                ('2025-06-01', 'a2');

            INSERT INTO partner_commission VALUES
                ('2025-06-01', 'p1', 'ALPHA', 1500),
                ('2025-06-01', 'p2', 'ALPHA', 0),
                ('2025-06-01', 'p3', 'BETA', 900);

            INSERT INTO field_staff_log VALUES
                ('2025-06-01', 'u1', 'ALPHA'),
                ('2025-06-01', 'u1', 'ALPHA'),
                ('2025-06-01', 'u2', 'ALPHA');
            ",
        )
        .unwrap();

        conn
    }

    fn month() -> ReportMonth {
        ReportMonth::parse("2025-06-01").unwrap()
    }

    fn record<'a>(records: &'a [DistrictRecord], district: &str) -> &'a DistrictRecord {
        records
            .iter()
            .find(|record| record.district == district)
            .unwrap()
    }

    #[test]
    fn derives_market_share_from_gtv_and_size() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        let alpha = record(&records, "ALPHA");
        // 6 cr GTV over a 30 cr market
        assert_eq!(alpha.value(Metric::MarketShare), Some(0.2));
        assert_eq!(alpha.value(Metric::AepsMarketSize), Some(30.0));
    }

    #[test]
    fn share_is_missing_when_market_size_is_null() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        let gamma = record(&records, "GAMMA");
        assert_eq!(gamma.value(Metric::MarketShare), None);
        assert_eq!(gamma.value(Metric::AepsMarketSize), None);

        let def = catalog.get(Metric::MarketShare);
        assert_eq!(classify(gamma.value(Metric::MarketShare), &def.bins), Bin::Missing);
    }

    #[test]
    fn densities_scale_per_ten_thousand() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        let alpha = record(&records, "ALPHA");
        // 3 transacting agents over 100k people
        assert_eq!(alpha.value(Metric::TransDensity10k), Some(0.3));
        // a2 clears the floor; a1 is CMS-heavy and does not
        assert_eq!(alpha.value(Metric::SpDensity10k), Some(0.1));
    }

    #[test]
    fn zero_fill_applies_only_to_zero_fill_metrics() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        // Gamma has no agent, partner, or staff activity at all.
        let gamma = record(&records, "GAMMA");
        assert_eq!(gamma.value(Metric::CmsGtv), Some(0.0));
        assert_eq!(gamma.value(Metric::PartnerPresence), Some(0.0));
        assert_eq!(gamma.value(Metric::FieldPresence), Some(0.0));
        // Review metrics stay missing rather than zero-filling.
        assert_eq!(gamma.value(Metric::AepsMarketSize), None);
    }

    #[test]
    fn counts_distinct_commission_earning_partners() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        // p2 earned nothing and does not count.
        assert_eq!(
            record(&records, "ALPHA").value(Metric::PartnerPresence),
            Some(1.0)
        );
        assert_eq!(
            record(&records, "BETA").value(Metric::PartnerPresence),
            Some(1.0)
        );
    }

    #[test]
    fn visit_coverage_is_visited_share_of_transacting() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        // 2 of Alpha's 3 transacting agents were visited.
        assert_eq!(
            record(&records, "ALPHA").value(Metric::MonthlyVisitCoverage),
            Some(66.7)
        );
        assert_eq!(
            record(&records, "BETA").value(Metric::MonthlyVisitCoverage),
            Some(0.0)
        );
    }

    #[test]
    fn field_presence_counts_distinct_staff() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        assert_eq!(
            record(&records, "ALPHA").value(Metric::FieldPresence),
            Some(2.0)
        );
    }

    #[test]
    fn district_names_are_normalized_for_the_merge() {
        let catalog = Catalog::load().unwrap();
        let records = fetch_district_records(&seeded_connection(), month(), &catalog).unwrap();

        // ' Alpha ' in the review table merged with 'ALPHA' aggregates.
        let names: Vec<&str> = records.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(names, vec!["ALPHA", "BETA", "GAMMA"]);
    }

    #[test]
    fn winback_requires_lapse_then_recovery() {
        let conn = seeded_connection();
        conn.execute_batch(
            "
            -- w1: cleared the floor in the window, lapsed last month,
            -- cleared it again now.
            INSERT INTO agent_monthly VALUES
                ('2025-03-01', 'w1', 'ALPHA', 400000, 0),
                ('2025-05-01', 'w1', 'ALPHA', 100000, 0),
                ('2025-06-01', 'w1', 'ALPHA', 400000, 0);
            -- w2: used to clear the floor, still transacting below it.
            INSERT INTO agent_monthly VALUES
                ('2025-02-01', 'w2', 'ALPHA', 400000, 0),
                ('2025-06-01', 'w2', 'ALPHA', 50000, 0);
            ",
        )
        .unwrap();

        let values = queries::sp_winback_ratio(&conn, month()).unwrap();
        // 1 winback (w1) over a pool of 1 (w2; a3 never cleared the floor).
        assert_eq!(values.get("ALPHA"), Some(&100.0));
    }
}
