//! Dissolved inorganic nitrogen derived from its measured components.
//!
//! DIN is not always published directly; where it is not, it can be
//! computed as the sum of ammonium, nitrate and nitrite measured on the
//! same sample. Computed rows are appended to whatever the server
//! already publishes under the DIN parameter code.

use crate::client::NwdmClient;
use crate::error::Result;
use crate::query::WfsQuery;
use crate::record::{SampleKey, WqRecord};
use log::info;
use std::collections::HashMap;

/// Ammonium parameter code
pub const P35_AMMONIUM: &str = "EPC00009";
/// Nitrate parameter code
pub const P35_NITRATE: &str = "EPC00004";
/// Nitrite parameter code
pub const P35_NITRITE: &str = "EPC00006";
/// Dissolved inorganic nitrogen parameter code
pub const P35_DIN: &str = "EPC00198";
/// Parameter label attached to derived DIN rows
pub const DIN_LABEL: &str = "Water body DIN";

/// Query for one parameter code at one depth label.
pub fn component_query(layer: &str, p35code: &str, depth: &str, columns: &[&str]) -> WfsQuery {
    WfsQuery::new(layer)
        .cql("p35code", p35code)
        .cql("vertical_reference_preflabel", depth)
        .columns(columns.iter().copied())
}

/// Inner-joins the three component tables and sums their values.
///
/// Only samples present in all three tables produce a derived row;
/// unmatched rows are dropped. Row metadata is carried over from the
/// ammonium table, with the parameter code and label replaced by the
/// DIN identifiers. An empty result is not an error.
pub fn derive_din(
    ammonium: Vec<WqRecord>,
    nitrate: Vec<WqRecord>,
    nitrite: Vec<WqRecord>,
) -> Vec<WqRecord> {
    let nitrate: HashMap<SampleKey, WqRecord> = nitrate
        .into_iter()
        .map(|r| (r.sample_key(), r))
        .collect();
    let nitrite: HashMap<SampleKey, WqRecord> = nitrite
        .into_iter()
        .map(|r| (r.sample_key(), r))
        .collect();

    ammonium
        .into_iter()
        .filter_map(|nh4| {
            let key = nh4.sample_key();
            let no3 = nitrate.get(&key)?;
            let no2 = nitrite.get(&key)?;
            let mut din = nh4.clone();
            din.value = nh4.value + no3.value + no2.value;
            din.p35code = P35_DIN.to_string();
            din.p35preflabel = DIN_LABEL.to_string();
            Some(din)
        })
        .collect()
}

/// Concatenates computed rows after the rows the server already
/// publishes. Order is preserved on both sides; overlapping samples are
/// deliberately not deduplicated.
pub fn merge_with_published(
    published: Vec<WqRecord>,
    computed: Vec<WqRecord>,
) -> Vec<WqRecord> {
    let mut merged = published;
    merged.extend(computed);
    merged
}

/// Fetches the three components of DIN at the given depth, derives DIN
/// for every fully-paired sample, and returns the published DIN rows
/// with the computed rows appended.
///
/// Any component fetch failing aborts the whole operation.
pub async fn calculate_din(
    client: &NwdmClient,
    layer: &str,
    depth: &str,
    columns: &[&str],
) -> Result<Vec<WqRecord>> {
    let nh4_url = component_query(layer, P35_AMMONIUM, depth, columns).to_url()?;
    let no3_url = component_query(layer, P35_NITRATE, depth, columns).to_url()?;
    let no2_url = component_query(layer, P35_NITRITE, depth, columns).to_url()?;

    // The three component downloads are independent of each other.
    let (ammonium, nitrate, nitrite) = futures::try_join!(
        client.fetch_records(&nh4_url),
        client.fetch_records(&no3_url),
        client.fetch_records(&no2_url),
    )?;
    info!(
        "fetched DIN components from {layer}: {} NH4, {} NO3, {} NO2 rows",
        ammonium.len(),
        nitrate.len(),
        nitrite.len()
    );

    let computed = derive_din(ammonium, nitrate, nitrite);

    let din_url = component_query(layer, P35_DIN, depth, columns).to_url()?;
    let published = client.fetch_records(&din_url).await?;
    info!(
        "{} published DIN rows, {} computed from components",
        published.len(),
        computed.len()
    );

    Ok(merge_with_published(published, computed))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn record(location: &str, day: u32, p35code: &str, value: f64) -> WqRecord {
        WqRecord {
            fid: None,
            location_code: location.to_string(),
            geom: None,
            date: NaiveDate::from_ymd_opt(2016, 3, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            depth: "-1".to_string(),
            vertical_reference_code: None,
            vertical_reference_preflabel: Some("sea level".to_string()),
            unit_preflabel: Some("mg/l".to_string()),
            value,
            quality_code: None,
            p35code: p35code.to_string(),
            p35preflabel: String::new(),
            station: None,
        }
    }

    #[test]
    fn test_join_sums_fully_paired_samples() {
        let ammonium = vec![
            record("NOORDWK2", 7, P35_AMMONIUM, 0.1),
            record("NOORDWK2", 8, P35_AMMONIUM, 0.9),
        ];
        let nitrate = vec![record("NOORDWK2", 7, P35_NITRATE, 0.2)];
        let nitrite = vec![
            record("NOORDWK2", 7, P35_NITRITE, 0.05),
            record("TERSLG10", 7, P35_NITRITE, 0.4),
        ];

        let derived = derive_din(ammonium, nitrate, nitrite);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].location_code, "NOORDWK2");
        assert!((derived[0].value - 0.35).abs() < 1e-12);
        assert_eq!(derived[0].p35code, P35_DIN);
        assert_eq!(derived[0].p35preflabel, DIN_LABEL);
    }

    #[test]
    fn test_join_without_common_samples_is_empty() {
        let ammonium = vec![record("NOORDWK2", 7, P35_AMMONIUM, 0.1)];
        let nitrate = vec![record("NOORDWK2", 8, P35_NITRATE, 0.2)];
        let nitrite = vec![record("NOORDWK2", 9, P35_NITRITE, 0.05)];
        assert!(derive_din(ammonium, nitrate, nitrite).is_empty());
    }

    #[test]
    fn test_published_rows_come_first() {
        let published = vec![record("NOORDWK2", 7, P35_DIN, 0.5)];
        let computed = vec![record("NOORDWK2", 7, P35_DIN, 0.35)];
        let merged = merge_with_published(published, computed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].value, 0.5);
        assert_eq!(merged[1].value, 0.35);
    }

    #[test]
    fn test_component_query_filters() {
        let query = component_query(
            "NWDM:measurement_p35_all",
            P35_AMMONIUM,
            "sea level",
            &["location_code", "value"],
        );
        assert_eq!(
            query.cql_clause().unwrap(),
            "(p35code='EPC00009' and vertical_reference_preflabel='sea level')"
        );
        assert_eq!(
            query.property_name().unwrap(),
            "NWDM:location_code,NWDM:value"
        );
    }
}
