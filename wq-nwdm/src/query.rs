//! WFS `GetFeature` query construction.
//!
//! Pure string/URL assembly, no network I/O. A query is built from an
//! ordered set of equality filters plus optional geometry filters, and
//! rendered as a single CQL clause on the request URL.

use crate::error::{NwdmError, Result};
use reqwest::Url;
use std::fmt;

/// WFS endpoint of the NWDM geoserver.
pub const BASE_URL: &str = "https://nwdm.openearth.eu/geoserver/NWDM/ows";

/// Namespace prefix used to qualify projected column names.
pub const NAMESPACE: &str = "NWDM";

/// WFS protocol version spoken by the server.
const WFS_VERSION: &str = "1.0.0";

/// Spatial predicate on the `geom` column of a layer.
///
/// The set of predicates is closed; there is no way to emit an
/// unrecognized filter keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum GeomFilter {
    /// Rows whose geometry intersects the given WKT geometry
    Intersects { geom: String },
    /// Rows within `distance` (in `unit`) of the given WKT geometry
    DWithin {
        geom: String,
        distance: f64,
        unit: String,
    },
    /// Rows inside a coordinate bounding box
    BoundingBox {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
}

impl fmt::Display for GeomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeomFilter::Intersects { geom } => write!(f, "intersect(geom,{geom})"),
            GeomFilter::DWithin {
                geom,
                distance,
                unit,
            } => write!(f, "dwithin(geom, {geom}, {distance}, {unit})"),
            GeomFilter::BoundingBox {
                xmin,
                ymin,
                xmax,
                ymax,
            } => write!(f, "bbox(geom, {xmin}, {ymin}, {xmax}, {ymax})"),
        }
    }
}

/// Builder for a single `GetFeature` request against an NWDM layer.
///
/// Equality filters keep their insertion order; geometry fragments are
/// rendered ahead of equality fragments in the CQL clause. Optional
/// parameters left unset are omitted from the URL entirely.
#[derive(Debug, Clone)]
pub struct WfsQuery {
    typename: String,
    cql: Vec<(String, String)>,
    geom: Vec<GeomFilter>,
    output_format: String,
    max_features: Option<u32>,
    columns: Vec<String>,
}

impl WfsQuery {
    /// Start a query against the given layer, e.g. `"NWDM:location"`.
    pub fn new(typename: impl Into<String>) -> Self {
        WfsQuery {
            typename: typename.into(),
            cql: Vec::new(),
            geom: Vec::new(),
            output_format: "csv".to_string(),
            max_features: None,
            columns: Vec::new(),
        }
    }

    /// Require `column` to equal `value`.
    pub fn cql(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cql.push((column.into(), value.into()));
        self
    }

    /// Add a spatial predicate.
    pub fn geometry(mut self, filter: GeomFilter) -> Self {
        self.geom.push(filter);
        self
    }

    /// Response encoding requested from the server. Defaults to `"csv"`.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    /// Cap the number of returned features.
    pub fn max_features(mut self, cap: u32) -> Self {
        self.max_features = Some(cap);
        self
    }

    /// Restrict the response to the named columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// The CQL filter clause, or `None` when no filter was supplied.
    pub fn cql_clause(&self) -> Option<String> {
        if self.cql.is_empty() && self.geom.is_empty() {
            return None;
        }
        let fragments: Vec<String> = self
            .geom
            .iter()
            .map(GeomFilter::to_string)
            .chain(
                self.cql
                    .iter()
                    .map(|(column, value)| format!("{column}='{value}'")),
            )
            .collect();
        Some(format!("({})", fragments.join(" and ")))
    }

    /// The `propertyName` projection, or `None` when no columns were given.
    pub fn property_name(&self) -> Option<String> {
        if self.columns.is_empty() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| format!("{NAMESPACE}:{c}"))
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Render the query as a request URL against the fixed base endpoint.
    pub fn to_url(&self) -> Result<Url> {
        let mut url = Url::parse(BASE_URL).map_err(|e| NwdmError::UrlBuild(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("service", "WFS");
            pairs.append_pair("version", WFS_VERSION);
            pairs.append_pair("request", "GetFeature");
            pairs.append_pair("typeName", &self.typename);
            if let Some(clause) = self.cql_clause() {
                pairs.append_pair("cql_filter", &clause);
            }
            pairs.append_pair("outputFormat", &self.output_format);
            if let Some(cap) = self.max_features {
                pairs.append_pair("maxFeatures", &cap.to_string());
            }
            if let Some(projection) = self.property_name() {
                pairs.append_pair("propertyName", &projection);
            }
        }
        Ok(url)
    }
}
