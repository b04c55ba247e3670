//! Synthetic customer records written as Parquet.

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, ListBuilder, StringArray, StringBuilder, StructArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Duration as ChronoDuration, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];
const CITIES: &[&str] = &[
    "New York", "Los Angeles", "Chicago", "Houston", "Phoenix", "Philadelphia", "San Antonio",
    "San Diego",
];
const STATES: &[&str] = &["NY", "CA", "IL", "TX", "AZ", "PA", "FL", "OH", "GA", "NC"];
const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Washington St", "Park Ave", "Lake Dr", "River Rd",
];
const COUNTRIES: &[&str] = &[
    "USA", "Canada", "UK", "Australia", "Germany", "France", "Japan", "Brazil",
];
const LANGUAGES: &[&str] = &["en", "es", "fr", "de", "it", "pt", "ja", "zh"];
const ACCOUNT_TYPES: &[&str] = &["free", "basic", "premium", "enterprise"];
const ACCOUNT_STATUSES: &[&str] = &["active", "suspended", "pending", "closed"];
const COMM_PREFS: &[&str] = &["email", "sms", "phone", "mail"];
const TAGS: &[&str] = &[
    "vip", "new", "returning", "priority", "special_offer", "seasonal", "promotional",
];
const EMAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"];
const BODY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";

/// When to stop writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAt {
    /// After exactly this many rows
    Rows(u64),
    /// After the first flush that brings the file to at least this size
    Bytes(u64),
}

/// Generation settings.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub stop_at: StopAt,
    pub flush_rows: u64,
    pub body_length: usize,
    pub seed: Option<u64>,
}

/// What was written.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub rows: u64,
    pub row_groups: usize,
    pub bytes: u64,
    pub duration: Duration,
}

fn address_fields() -> Fields {
    Fields::from(vec![
        Field::new("street", DataType::Utf8, false),
        Field::new("city", DataType::Utf8, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("postal_code", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
    ])
}

fn string_list() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

fn timestamp() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// Schema of the generated customer records.
pub fn customer_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("created_at", timestamp(), false),
        Field::new("updated_at", timestamp(), false),
        Field::new("first_name", DataType::Utf8, false),
        Field::new("last_name", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, false),
        Field::new("phone_number", DataType::Utf8, false),
        Field::new("date_of_birth", DataType::Utf8, false),
        Field::new("address", DataType::Struct(address_fields()), false),
        Field::new("account_type", DataType::Utf8, false),
        Field::new("account_status", DataType::Utf8, false),
        Field::new("last_login_date", timestamp(), false),
        Field::new("account_balance", DataType::Float64, false),
        Field::new("language", DataType::Utf8, false),
        Field::new("communication_preferences", string_list(), false),
        Field::new("newsletter_subscribed", DataType::Boolean, false),
        Field::new("tags", string_list(), false),
        Field::new("body", DataType::Utf8, false),
    ]))
}

/// Produces record batches of random customers.
pub struct CustomerGenerator {
    rng: StdRng,
    schema: SchemaRef,
    body_length: usize,
}

impl CustomerGenerator {
    pub fn new(seed: Option<u64>, body_length: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            schema: customer_schema(),
            body_length,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn pick(&mut self, values: &[&'static str]) -> &'static str {
        values.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn pick_many(&mut self, values: &[&'static str], count: usize) -> Vec<&'static str> {
        (0..count).map(|_| self.pick(values)).collect()
    }

    fn body(&mut self) -> String {
        (0..self.body_length)
            .map(|_| BODY_CHARSET[self.rng.gen_range(0..BODY_CHARSET.len())] as char)
            .collect()
    }

    /// Build one batch of `rows` customers.
    pub fn next_batch(&mut self, rows: usize) -> Result<RecordBatch> {
        let now = Utc::now();
        let now_micros = now.timestamp_micros();

        let mut ids = Vec::with_capacity(rows);
        let mut created_at = Vec::with_capacity(rows);
        let mut first_names = Vec::with_capacity(rows);
        let mut last_names = Vec::with_capacity(rows);
        let mut emails = Vec::with_capacity(rows);
        let mut phones = Vec::with_capacity(rows);
        let mut birth_dates = Vec::with_capacity(rows);
        let mut streets = Vec::with_capacity(rows);
        let mut cities = Vec::with_capacity(rows);
        let mut states = Vec::with_capacity(rows);
        let mut postal_codes = Vec::with_capacity(rows);
        let mut countries = Vec::with_capacity(rows);
        let mut account_types = Vec::with_capacity(rows);
        let mut account_statuses = Vec::with_capacity(rows);
        let mut last_logins = Vec::with_capacity(rows);
        let mut balances = Vec::with_capacity(rows);
        let mut languages = Vec::with_capacity(rows);
        let mut newsletter = Vec::with_capacity(rows);
        let mut bodies = Vec::with_capacity(rows);
        let mut prefs = ListBuilder::new(StringBuilder::new());
        let mut tags = ListBuilder::new(StringBuilder::new());

        for _ in 0..rows {
            ids.push(uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string());

            let age_days = self.rng.gen_range(0..365);
            created_at.push((now - ChronoDuration::days(age_days)).timestamp_micros());

            first_names.push(self.pick(FIRST_NAMES));
            last_names.push(self.pick(LAST_NAMES));
            emails.push(format!(
                "{}.{}@{}",
                self.pick(FIRST_NAMES).to_lowercase(),
                self.pick(LAST_NAMES).to_lowercase(),
                self.pick(EMAIL_DOMAINS)
            ));
            phones.push(format!(
                "+1-{:03}-{:03}-{:04}",
                self.rng.gen_range(200..1000),
                self.rng.gen_range(100..1000),
                self.rng.gen_range(1000..10000)
            ));
            birth_dates.push(format!(
                "{:04}-{:02}-{:02}",
                self.rng.gen_range(1950..2000),
                self.rng.gen_range(1..=12),
                self.rng.gen_range(1..=28)
            ));

            streets.push(format!(
                "{} {}",
                self.rng.gen_range(0..9999),
                self.pick(STREETS)
            ));
            cities.push(self.pick(CITIES));
            states.push(self.pick(STATES));
            postal_codes.push(format!("{:05}", self.rng.gen_range(0..99999)));
            countries.push(self.pick(COUNTRIES));

            account_types.push(self.pick(ACCOUNT_TYPES));
            account_statuses.push(self.pick(ACCOUNT_STATUSES));
            let login_days = self.rng.gen_range(0..30);
            last_logins.push((now - ChronoDuration::days(login_days)).timestamp_micros());
            balances.push(self.rng.gen_range(0..10_000) as f64 + self.rng.gen::<f64>());

            languages.push(self.pick(LANGUAGES));
            newsletter.push(self.rng.gen_bool(0.5));

            let pref_count = self.rng.gen_range(1..=COMM_PREFS.len());
            for pref in self.pick_many(COMM_PREFS, pref_count) {
                prefs.values().append_value(pref);
            }
            prefs.append(true);

            let tag_count = self.rng.gen_range(0..4);
            for tag in self.pick_many(TAGS, tag_count) {
                tags.values().append_value(tag);
            }
            tags.append(true);

            bodies.push(self.body());
        }

        let address_columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(streets)),
            Arc::new(StringArray::from(cities)),
            Arc::new(StringArray::from(states)),
            Arc::new(StringArray::from(postal_codes)),
            Arc::new(StringArray::from(countries)),
        ];
        let address: Vec<(FieldRef, ArrayRef)> = address_fields()
            .iter()
            .cloned()
            .zip(address_columns)
            .collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(TimestampMicrosecondArray::from(created_at).with_timezone("UTC")),
            Arc::new(TimestampMicrosecondArray::from(vec![now_micros; rows]).with_timezone("UTC")),
            Arc::new(StringArray::from(first_names)),
            Arc::new(StringArray::from(last_names)),
            Arc::new(StringArray::from(emails)),
            Arc::new(StringArray::from(phones)),
            Arc::new(StringArray::from(birth_dates)),
            Arc::new(StructArray::from(address)),
            Arc::new(StringArray::from(account_types)),
            Arc::new(StringArray::from(account_statuses)),
            Arc::new(TimestampMicrosecondArray::from(last_logins).with_timezone("UTC")),
            Arc::new(Float64Array::from(balances)),
            Arc::new(StringArray::from(languages)),
            Arc::new(prefs.finish()),
            Arc::new(BooleanArray::from(newsletter)),
            Arc::new(tags.finish()),
            Arc::new(StringArray::from(bodies)),
        ];

        RecordBatch::try_new(self.schema(), columns).context("Failed to build record batch")
    }
}

/// Write customers to `path` until `options.stop_at` is reached.
///
/// `progress` is called after every flush with the rows and bytes written so far.
pub fn write_file(
    path: &Path,
    options: &GenerateOptions,
    mut progress: impl FnMut(u64, u64),
) -> Result<Summary> {
    let start = Instant::now();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    let mut generator = CustomerGenerator::new(options.seed, options.body_length);
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, generator.schema(), Some(props))
        .context("Failed to create Parquet writer")?;

    info!(output = %path.display(), stop_at = ?options.stop_at, "Generating test data");

    let mut rows = 0u64;
    loop {
        let chunk = match options.stop_at {
            StopAt::Rows(target) => options.flush_rows.min(target - rows),
            StopAt::Bytes(_) => options.flush_rows,
        };

        let batch = generator.next_batch(chunk as usize)?;
        writer.write(&batch).context("Failed to write batch")?;
        writer.flush().context("Failed to flush row group")?;
        rows += chunk;

        let bytes = writer.bytes_written() as u64;
        debug!(rows = rows, bytes = bytes, "Flushed row group");
        progress(rows, bytes);

        let done = match options.stop_at {
            StopAt::Rows(target) => rows >= target,
            StopAt::Bytes(target) => bytes >= target,
        };
        if done {
            break;
        }
    }

    let metadata = writer.close().context("Failed to close Parquet writer")?;
    let bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    Ok(Summary {
        rows,
        row_groups: metadata.row_groups.len(),
        bytes,
        duration: start.elapsed(),
    })
}
