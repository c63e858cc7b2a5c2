use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, instrument};

use crate::datasets::DatasetSpec;
use crate::fetch_error::FetchError;

/// Default NT water data portal export endpoint
pub const DEFAULT_BASE_URL: &str = "https://water.nt.gov.au/Export/DataSet";

/// Metadata lines the portal prepends before the CSV header row
const METADATA_LINES: usize = 4;

/// Fixed export parameters: entire period of record, ACST offset,
/// calendar-year alignment, points as recorded, CSV output, and all
/// grade/approval/qualifier/interpolation metadata disabled.
const FIXED_QUERY: &str = "DateRange=EntirePeriodOfRecord&TimeZone=9.5&Calendar=CALENDARYEAR\
&Interval=PointsAsRecorded&Step=1&ExportFormat=csv&Compressed=false&RoundData=False\
&GradeCodes=False&ApprovalLevels=False&Qualifiers=False&InterpolationTypes=False";

/// One data row of an export response: the leading timestamp plus the
/// remaining cells, aligned with [`RawSeries::columns`].
#[derive(Debug, Clone)]
pub struct RawRow {
    pub timestamp: NaiveDateTime,
    pub cells: Vec<String>,
}

/// Parsed export response, indexed by timestamp. `columns` holds the header
/// names after the timestamp column.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Clone)]
pub struct TimeseriesFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl TimeseriesFetcher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a fetcher against a custom export endpoint (also used by tests)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
        }
    }

    /// Build the export URL for one (bore, dataset) combination.
    ///
    /// The portal addresses a series as `<remote_name>@<bore>`; the `@` must
    /// be percent-encoded in the query string.
    pub fn export_url(&self, bore: &str, spec: &DatasetSpec) -> String {
        format!(
            "{}?{}&DataSet={}%40{}&Calculation=Instantaneous&UnitId={}",
            self.base_url, FIXED_QUERY, spec.remote_name, bore, spec.unit_id
        )
    }

    /// Fetch and parse one dataset export for one bore.
    #[instrument(skip(self, spec), fields(bore = %bore, dataset = %spec.remote_name))]
    pub async fn fetch_series(
        &self,
        bore: &str,
        spec: &DatasetSpec,
    ) -> Result<RawSeries, FetchError> {
        let url = self.export_url(bore, spec);
        debug!("Requesting export: {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {status}");

        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        debug!("Retrieved export body, size: {} bytes", body.len());

        parse_export_body(&body)
    }
}

impl Default for TimeseriesFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an export response body.
///
/// The portal emits four metadata lines, then a CSV header row whose first
/// column is the timestamp, then data rows.
pub fn parse_export_body(body: &str) -> Result<RawSeries, FetchError> {
    let mut lines = body.lines();
    for _ in 0..METADATA_LINES {
        lines.next().ok_or(FetchError::Truncated)?;
    }
    let data = lines.collect::<Vec<_>>().join("\n");
    if data.trim().is_empty() {
        return Err(FetchError::Truncated);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw_ts = record.get(0).ok_or(FetchError::MissingTimestamp)?;
        let timestamp = parse_timestamp(raw_ts)?;
        let cells = record.iter().skip(1).map(str::to_string).collect();
        rows.push(RawRow { timestamp, cells });
    }

    debug!(
        "Parsed export body: {} columns, {} rows",
        columns.len(),
        rows.len()
    );
    Ok(RawSeries { columns, rows })
}

/// Parse a portal timestamp. Exports carry either RFC 3339 with the portal
/// offset or a naive local time; the offset is dropped after parsing so the
/// persisted DateTime stays in portal-local clock time.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, FetchError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    Err(FetchError::DateTimeError(value.to_string()))
}
