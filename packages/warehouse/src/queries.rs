use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use duckdb::{Connection, params};
use market_map_district_models::{ReportMonth, normalize_name};

use crate::WarehouseError;

/// GTV floor (in rupees) above which an agent counts as a service point.
const SP_GTV_FLOOR: &str = "250000";

/// One district row from the monthly business review table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub district: String,
    pub state: String,
    pub aeps_gtv: Option<f64>,
    pub aeps_market_size: Option<f64>,
}

/// Fetches the base business-review rows for one month. District and
/// state names come back normalized; rows with a blank district are
/// dropped.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn review_rows(
    conn: &Connection,
    month: ReportMonth,
) -> Result<Vec<ReviewRow>, WarehouseError> {
    let mut stmt = conn.prepare(
        "
        SELECT district_name, state, aeps_gtv, aeps_market_size
        FROM business_review
        WHERE month_year = CAST(? AS DATE)
        ",
    )?;

    let rows = stmt.query_map(params![month.iso()], |row| {
        Ok(ReviewRow {
            district: normalize_name(&row.get::<_, String>(0)?),
            state: normalize_name(&row.get::<_, Option<String>>(1)?.unwrap_or_default()),
            aeps_gtv: row.get(2)?,
            aeps_market_size: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        let row = row?;
        if row.district.is_empty() {
            log::warn!("skipping business_review row with blank district");
            continue;
        }
        out.push(row);
    }

    Ok(out)
}

/// Transacting-agent and service-point counts per 10,000 population.
///
/// Population is summed from pincode rolls per district; agents with any
/// GTV in the month count as transacting, agents whose non-CMS GTV clears
/// the service-point floor count as service points.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn densities(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, (f64, f64)>, WarehouseError> {
    let sql = format!(
        "
        WITH pop AS (
            SELECT district, SUM(population) AS population
            FROM pincode_population
            WHERE district IS NOT NULL
            GROUP BY district
        ),
        trans_agents AS (
            SELECT district, COUNT(DISTINCT agent_id) AS num_trxn
            FROM agent_monthly
            WHERE month_year = CAST(? AS DATE)
              AND total_gtv > 0
              AND district IS NOT NULL
            GROUP BY district
        ),
        sp_agents AS (
            SELECT district, COUNT(DISTINCT agent_id) AS num_sp
            FROM agent_monthly
            WHERE month_year = CAST(? AS DATE)
              AND (total_gtv - cms_gtv) > {SP_GTV_FLOOR}
              AND district IS NOT NULL
            GROUP BY district
        )
        SELECT p.district,
               COALESCE(ROUND(t.num_trxn * 10000.0 / NULLIF(p.population, 0), 2), 0) AS trans_density,
               COALESCE(ROUND(s.num_sp * 10000.0 / NULLIF(p.population, 0), 2), 0) AS sp_density
        FROM pop p
        LEFT JOIN trans_agents t USING (district)
        LEFT JOIN sp_agents s USING (district)
        "
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![month.iso(), month.iso()], |row| {
        Ok((
            normalize_name(&row.get::<_, String>(0)?),
            (row.get::<_, f64>(1)?, row.get::<_, f64>(2)?),
        ))
    })?;

    collect_pairs(rows)
}

/// CMS GTV per district, in crore.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn cms_gtv_crore(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    district_values(
        conn,
        "
        SELECT district, SUM(cms_gtv) / 1e7 AS cms_gtv_cr
        FROM agent_monthly
        WHERE month_year = CAST(? AS DATE)
          AND district IS NOT NULL
        GROUP BY district
        ",
        &[&month.iso()],
    )
}

/// Share of transacting agents that field staff visited during the month,
/// as a percentage.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn visit_coverage(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    district_values(
        conn,
        "
        WITH transacting AS (
            SELECT district, COUNT(DISTINCT agent_id) AS trxn_agents
            FROM agent_monthly
            WHERE month_year = CAST(? AS DATE)
              AND total_gtv > 0
              AND district IS NOT NULL
            GROUP BY district
        ),
        visited AS (
            SELECT a.district, COUNT(DISTINCT v.agent_id) AS visited_agents
            FROM agent_visits v
            JOIN agent_monthly a
              ON a.agent_id = v.agent_id
             AND a.month_year = v.month_year
            WHERE v.month_year = CAST(? AS DATE)
              AND a.district IS NOT NULL
            GROUP BY a.district
        )
        SELECT t.district,
               ROUND(COALESCE(v.visited_agents, 0) * 100.0 / NULLIF(t.trxn_agents, 0), 1)
        FROM transacting t
        LEFT JOIN visited v USING (district)
        ",
        &[&month.iso(), &month.iso()],
    )
}

/// Distinct distributors that earned any commission in the month.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn partner_presence(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    district_values(
        conn,
        "
        SELECT district, COUNT(DISTINCT partner_id)
        FROM partner_commission
        WHERE month_year = CAST(? AS DATE)
          AND total_commission > 0
          AND district IS NOT NULL
        GROUP BY district
        ",
        &[&month.iso()],
    )
}

/// Distinct field staff active in the month.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn field_presence(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    district_values(
        conn,
        "
        SELECT district, COUNT(DISTINCT user_id)
        FROM field_staff_log
        WHERE month_year = CAST(? AS DATE)
          AND district IS NOT NULL
        GROUP BY district
        ",
        &[&month.iso()],
    )
}

/// Won-back service points as a percentage of the winnable pool.
///
/// A winback is an agent that cleared the service-point floor at some
/// point in the 14-to-2-months-back window, fell below it in the previous
/// month, and cleared it again in the focus month. The pool is agents
/// that cleared the floor in the trailing half year but transacted below
/// it in the focus month.
///
/// # Errors
///
/// * `WarehouseError::Database` if the query fails
pub fn sp_winback_ratio(
    conn: &Connection,
    month: ReportMonth,
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    let focus = month.iso();
    let prev = month_iso(back(month.date(), 1));
    let prev2 = month_iso(back(month.date(), 2));
    let half_year = month_iso(back(month.date(), 6));
    let hist_start = month_iso(back(month.date(), 14));

    let sql = format!(
        "
        WITH history AS (
            SELECT agent_id, month_year, total_gtv - cms_gtv AS gtv
            FROM agent_monthly
            WHERE month_year <= CAST(? AS DATE)
        ),
        winback AS (
            SELECT agent_id
            FROM history
            GROUP BY agent_id
            HAVING COUNT(CASE WHEN month_year BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)
                                   AND gtv > {SP_GTV_FLOOR} THEN 1 END) > 0
               AND COUNT(CASE WHEN month_year = CAST(? AS DATE)
                                   AND gtv > {SP_GTV_FLOOR} THEN 1 END) = 0
               AND COUNT(CASE WHEN month_year = CAST(? AS DATE)
                                   AND gtv > {SP_GTV_FLOOR} THEN 1 END) > 0
        ),
        pool AS (
            SELECT agent_id
            FROM history
            GROUP BY agent_id
            HAVING COUNT(CASE WHEN month_year BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)
                                   AND gtv > {SP_GTV_FLOOR} THEN 1 END) > 0
               AND COUNT(CASE WHEN month_year = CAST(? AS DATE)
                                   AND gtv > 0
                                   AND gtv <= {SP_GTV_FLOOR} THEN 1 END) > 0
        ),
        focus_rows AS (
            SELECT agent_id, district
            FROM agent_monthly
            WHERE month_year = CAST(? AS DATE)
              AND district IS NOT NULL
        ),
        winback_by_district AS (
            SELECT f.district, COUNT(DISTINCT w.agent_id) AS winbacks
            FROM winback w
            JOIN focus_rows f USING (agent_id)
            GROUP BY f.district
        ),
        pool_by_district AS (
            SELECT f.district, COUNT(DISTINCT p.agent_id) AS pool_size
            FROM pool p
            JOIN focus_rows f USING (agent_id)
            GROUP BY f.district
        )
        SELECT p.district,
               ROUND(COALESCE(w.winbacks, 0) * 100.0 / NULLIF(p.pool_size, 0), 1)
        FROM pool_by_district p
        LEFT JOIN winback_by_district w USING (district)
        "
    );

    district_values(
        conn,
        &sql,
        &[
            &focus, &hist_start, &prev2, &prev, &focus, &half_year, &prev, &focus, &focus,
        ],
    )
}

/// Runs a `(district, value)` aggregate and collects it into a map keyed
/// by normalized district name. Rows with a NULL value are skipped.
fn district_values(
    conn: &Connection,
    sql: &str,
    params: &[&dyn duckdb::ToSql],
) -> Result<BTreeMap<String, f64>, WarehouseError> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt.query_map(params, |row| {
        Ok((
            normalize_name(&row.get::<_, String>(0)?),
            row.get::<_, Option<f64>>(1)?,
        ))
    })?;

    let mut out = BTreeMap::new();
    for row in rows {
        let (district, value) = row?;
        if let Some(value) = value {
            out.insert(district, value);
        }
    }

    Ok(out)
}

fn collect_pairs<I>(rows: I) -> Result<BTreeMap<String, (f64, f64)>, WarehouseError>
where
    I: Iterator<Item = Result<(String, (f64, f64)), duckdb::Error>>,
{
    let mut out = BTreeMap::new();
    for row in rows {
        let (district, values) = row?;
        out.insert(district, values);
    }
    Ok(out)
}

fn back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

fn month_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
