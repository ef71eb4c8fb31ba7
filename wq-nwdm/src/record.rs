//! Observation records returned by the NWDM measurement layers.

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Date formats seen in NWDM CSV exports, most common first.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

/// A single water-quality observation row.
///
/// The `depth` column is kept as the raw published string so that it can
/// serve as an exact join key; observations are only comparable when the
/// server published them against the same depth label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WqRecord {
    /// Feature identifier assigned by the geoserver
    #[serde(rename = "FID", default)]
    pub fid: Option<String>,
    /// Station identifier, e.g. "NOORDWK2"
    pub location_code: String,
    /// WKT geometry of the station
    #[serde(default)]
    pub geom: Option<String>,
    /// Moment the sample was taken
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDateTime,
    /// Sampling depth as published
    pub depth: String,
    #[serde(default)]
    pub vertical_reference_code: Option<String>,
    /// Depth label, e.g. "sea level"
    #[serde(default)]
    pub vertical_reference_preflabel: Option<String>,
    /// Unit label of the value
    #[serde(default)]
    pub unit_preflabel: Option<String>,
    /// Measured or derived quantity
    pub value: f64,
    #[serde(default)]
    pub quality_code: Option<String>,
    /// Parameter vocabulary code, e.g. "EPC00004"
    pub p35code: String,
    /// Human-readable parameter label
    pub p35preflabel: String,
    /// Station display name
    #[serde(default)]
    pub station: Option<String>,
}

/// Join key shared by observations of the same sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey {
    pub location_code: String,
    pub depth: String,
    pub date: NaiveDateTime,
}

impl WqRecord {
    /// The `(location, depth, date)` triple identifying the sample.
    pub fn sample_key(&self) -> SampleKey {
        SampleKey {
            location_code: self.location_code.clone(),
            depth: self.depth.clone(),
            date: self.date,
        }
    }

    /// Groups records by station identifier.
    pub fn group_by_location(records: Vec<WqRecord>) -> HashMap<String, Vec<WqRecord>> {
        let mut result: HashMap<String, Vec<WqRecord>> = HashMap::new();
        for (location_code, group) in &records.iter().chunk_by(|r| r.location_code.clone()) {
            result
                .entry(location_code)
                .or_default()
                .extend(group.cloned());
        }
        result
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(parsed);
        }
        if let Ok(parsed) = chrono::NaiveDate::parse_from_str(&raw, format) {
            return Ok(parsed.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    Err(serde::de::Error::custom(format!(
        "unrecognized observation date: {raw}"
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::client::parse_csv;
    use chrono::NaiveDate;

    const CSV_FIXTURE: &str = "\
FID,location_code,geom,date,depth,vertical_reference_code,vertical_reference_preflabel,unit_preflabel,value,quality_code,p35code,p35preflabel,station
measurement.1,NOORDWK2,POINT (4.3 52.2),2016-03-07T10:00:00,-1,MSL,sea level,mg/l,0.42,1,EPC00004,Water body nitrate,Noordwijk 2
measurement.2,NOORDWK2,POINT (4.3 52.2),2016-03-07T10:00:00,-1,MSL,sea level,mg/l,0.05,1,EPC00006,Water body nitrite,Noordwijk 2
";

    #[test]
    fn test_parse_records_from_csv() {
        let records = parse_csv(CSV_FIXTURE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location_code, "NOORDWK2");
        assert_eq!(records[0].value, 0.42);
        assert_eq!(records[0].p35code, "EPC00004");
        assert_eq!(
            records[0].date,
            NaiveDate::from_ymd_opt(2016, 3, 7)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_sample_key_shared_across_parameters() {
        let records = parse_csv(CSV_FIXTURE).unwrap();
        assert_eq!(records[0].sample_key(), records[1].sample_key());
    }

    #[test]
    fn test_date_only_rows_parse_at_midnight() {
        let csv = "\
location_code,date,depth,value,p35code,p35preflabel
NOORDWK2,2016-03-07,-1,0.1,EPC00004,Water body nitrate
";
        let records = parse_csv(csv).unwrap();
        assert_eq!(
            records[0].date,
            NaiveDate::from_ymd_opt(2016, 3, 7)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_group_by_location() {
        let csv = "\
location_code,date,depth,value,p35code,p35preflabel
NOORDWK2,2016-03-07,-1,0.1,EPC00004,Water body nitrate
TERSLG10,2016-03-08,-1,0.2,EPC00004,Water body nitrate
NOORDWK2,2016-04-07,-1,0.3,EPC00004,Water body nitrate
";
        let groups = WqRecord::group_by_location(parse_csv(csv).unwrap());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["NOORDWK2"].len(), 2);
        assert_eq!(groups["TERSLG10"].len(), 1);
    }
}
