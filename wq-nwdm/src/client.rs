//! Authenticated retrieval and CSV parsing for NWDM responses.

use crate::error::{NwdmError, Result};
use crate::record::WqRecord;
use csv::ReaderBuilder;
use log::debug;
use reqwest::Url;
use std::time::Duration;

/// Timeout applied when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client holding the NWDM basic-auth credentials.
pub struct NwdmClient {
    http: reqwest::Client,
    user: String,
    password: String,
}

impl NwdmClient {
    /// Creates a client with the default request timeout.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_timeout(user, password, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    pub fn with_timeout(
        user: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(NwdmClient {
            http,
            user: user.into(),
            password: password.into(),
        })
    }

    /// Downloads the response body for a built query URL.
    ///
    /// Transport failure, a non-success status, and an unreadable body
    /// each surface as their own error variant.
    pub async fn fetch_raw(&self, url: &Url) -> Result<String> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(NwdmError::HttpRequest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NwdmError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| NwdmError::ResponseBody(e.to_string()))
    }

    /// Downloads a query URL and parses the body as observation records.
    pub async fn fetch_records(&self, url: &Url) -> Result<Vec<WqRecord>> {
        let body = self.fetch_raw(url).await?;
        parse_csv(&body)
    }
}

/// Parses a headered CSV body into observation records.
pub fn parse_csv(body: &str) -> Result<Vec<WqRecord>> {
    ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes())
        .deserialize()
        .map(|r| r.map_err(NwdmError::from))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_csv_rejects_malformed_value() {
        let csv = "\
location_code,date,depth,value,p35code,p35preflabel
NOORDWK2,2016-03-07,-1,not-a-number,EPC00004,Water body nitrate
";
        let result = parse_csv(csv);
        assert!(matches!(result, Err(NwdmError::CsvParse(_))));
    }

    #[test]
    fn test_parse_csv_empty_body_yields_no_records() {
        let csv = "location_code,date,depth,value,p35code,p35preflabel\n";
        assert!(parse_csv(csv).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_its_own_variant() {
        // .invalid never resolves, so this fails before any response
        let client = NwdmClient::with_timeout("user", "password", Duration::from_secs(2)).unwrap();
        let url = Url::parse("https://nwdm.host.invalid/geoserver/NWDM/ows").unwrap();
        let result = client.fetch_raw(&url).await;
        assert!(matches!(result, Err(NwdmError::HttpRequest(_))));
    }
}
