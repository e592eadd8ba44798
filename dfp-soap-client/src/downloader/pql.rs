//! PQL paging.
//!
//! [`pql_records`] turns one query into a stream of records: the column
//! labels once, then every row in server order. Pages are fetched with
//! `LIMIT 500` and an offset advanced by the number of rows actually
//! returned. Paging stops at an empty page or a page shorter than the limit.

use std::io::Write;

use async_stream::try_stream;
use async_trait::async_trait;
use dfp_soap_core::{BindVariable, Cell, FilterStatement, ResultSet, Row, Statement, convert_row};
use futures::{Stream, StreamExt};

use crate::error::ClientError;
use crate::service::PublisherQueryLanguageService;

/// Anything that can run one page of a PQL query.
#[async_trait]
pub trait PqlSelect: Send + Sync {
    async fn select(&self, statement: &Statement) -> Result<ResultSet, ClientError>;
}

#[async_trait]
impl PqlSelect for PublisherQueryLanguageService {
    async fn select(&self, statement: &Statement) -> Result<ResultSet, ClientError> {
        PublisherQueryLanguageService::select(self, statement).await
    }
}

/// One item of a paged result.
#[derive(Debug, Clone, PartialEq)]
pub enum PqlRecord {
    /// Column labels; emitted once, before the first row.
    Header(Vec<String>),
    Row(Row),
}

/// Page through `query` (a where clause without `LIMIT`/`OFFSET`).
///
/// `values` are sent with every page. A query matching nothing yields no
/// records at all, not even a header.
pub fn pql_records<'a, S>(
    service: &'a S,
    query: &str,
    values: &[BindVariable],
) -> impl Stream<Item = Result<PqlRecord, ClientError>> + Send + use<'a, S>
where
    S: PqlSelect + ?Sized,
{
    let mut statement = FilterStatement::new(query.trim()).with_values(values.to_vec());
    try_stream! {
        let mut header_sent = false;
        loop {
            let page = service.select(&statement.to_statement()).await?;
            let page_rows = page.rows.len();

            #[cfg(feature = "tracing")]
            tracing::debug!(offset = statement.offset, rows = page_rows, "fetched PQL page");

            if page_rows == 0 {
                break;
            }
            if !header_sent {
                header_sent = true;
                yield PqlRecord::Header(page.labels());
            }
            for row in page.rows {
                yield PqlRecord::Row(row);
            }
            if page_rows < statement.limit as usize {
                break;
            }
            statement.offset += page_rows as u64;
        }
    }
}

/// Collect every record as converted cells; the header becomes text cells.
pub async fn collect_pql_rows<S>(
    service: &S,
    query: &str,
    values: &[BindVariable],
) -> Result<Vec<Vec<Cell>>, ClientError>
where
    S: PqlSelect + ?Sized,
{
    let mut records = std::pin::pin!(pql_records(service, query, values));
    let mut rows = Vec::new();
    while let Some(record) = records.next().await {
        rows.push(match record? {
            PqlRecord::Header(labels) => labels.into_iter().map(Cell::Text).collect(),
            PqlRecord::Row(row) => convert_row(&row)?,
        });
    }
    Ok(rows)
}

/// Write every record to `sink` as CSV with all fields quoted.
///
/// Returns the number of data rows written.
pub async fn write_pql_csv<S, W>(
    service: &S,
    query: &str,
    sink: W,
    values: &[BindVariable],
) -> Result<u64, ClientError>
where
    S: PqlSelect + ?Sized,
    W: Write,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(sink);
    let mut records = std::pin::pin!(pql_records(service, query, values));
    let mut written = 0u64;
    while let Some(record) = records.next().await {
        match record? {
            PqlRecord::Header(labels) => writer.write_record(&labels)?,
            PqlRecord::Row(row) => {
                let cells = convert_row(&row)?;
                writer.write_record(cells.iter().map(ToString::to_string))?;
                written += 1;
            }
        }
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfp_soap_core::{ColumnType, Date, DateTime, Value, ValueError};
    use std::sync::Mutex;

    /// Serves pages of the given sizes and records every statement.
    struct PagedService {
        pages: Vec<usize>,
        statements: Mutex<Vec<Statement>>,
    }

    impl PagedService {
        fn new(pages: Vec<usize>) -> Self {
            Self {
                pages,
                statements: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.statements
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.query.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PqlSelect for PagedService {
        async fn select(&self, statement: &Statement) -> Result<ResultSet, ClientError> {
            let mut statements = self.statements.lock().unwrap();
            let page = statements.len();
            statements.push(statement.clone());
            let size = self.pages.get(page).copied().unwrap_or(0);
            let first_id = self.pages.iter().take(page).sum::<usize>();
            Ok(ResultSet {
                column_types: vec![
                    ColumnType { label_name: "Id".into() },
                    ColumnType { label_name: "Name".into() },
                ],
                rows: (first_id..first_id + size)
                    .map(|id| vec![Some(Value::from(id as i64)), Some(Value::from(format!("line {id}")))])
                    .collect(),
            })
        }
    }

    async fn collect(service: &PagedService) -> Vec<PqlRecord> {
        pql_records(service, "WHERE status = :s", &[BindVariable::new("s", "READY")])
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_short_page_ends_paging() {
        let service = PagedService::new(vec![500, 500, 237]);
        let records = collect(&service).await;

        assert_eq!(records.len(), 1 + 1237);
        assert_eq!(records[0], PqlRecord::Header(vec!["Id".into(), "Name".into()]));
        let headers = records.iter().filter(|r| matches!(r, PqlRecord::Header(_))).count();
        assert_eq!(headers, 1);
        assert_eq!(
            service.queries(),
            vec![
                "WHERE status = :s LIMIT 500 OFFSET 0",
                "WHERE status = :s LIMIT 500 OFFSET 500",
                "WHERE status = :s LIMIT 500 OFFSET 1000",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_page_ends_paging() {
        let service = PagedService::new(vec![500, 500, 0]);
        let records = collect(&service).await;
        assert_eq!(records.len(), 1 + 1000);
        assert_eq!(service.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_rows_keep_server_order() {
        let service = PagedService::new(vec![500, 3]);
        let ids: Vec<i64> = collect(&service)
            .await
            .into_iter()
            .filter_map(|record| match record {
                PqlRecord::Row(row) => match &row[0] {
                    Some(Value::Number(n)) => n.parse().ok(),
                    _ => None,
                },
                PqlRecord::Header(_) => None,
            })
            .collect();
        assert_eq!(ids, (0..503).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_no_rows_no_header() {
        let service = PagedService::new(vec![0]);
        assert!(collect(&service).await.is_empty());
        assert_eq!(service.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_bind_values_sent_with_every_page() {
        let service = PagedService::new(vec![500, 1]);
        collect(&service).await;
        for statement in service.statements.lock().unwrap().iter() {
            assert_eq!(statement.values, vec![BindVariable::new("s", "READY")]);
        }
    }

    #[tokio::test]
    async fn test_collect_rows_converts_cells() {
        let service = PagedService::new(vec![2]);
        let rows = collect_pql_rows(&service, "WHERE 1 = 1", &[]).await.unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Cell::from("Id"), Cell::from("Name")],
                vec![Cell::Integer(0), Cell::from("line 0")],
                vec![Cell::Integer(1), Cell::from("line 1")],
            ]
        );
    }

    struct OnePage(ResultSet);

    #[async_trait]
    impl PqlSelect for OnePage {
        async fn select(&self, _: &Statement) -> Result<ResultSet, ClientError> {
            Ok(self.0.clone())
        }
    }

    fn one_row(values: Vec<Option<Value>>) -> OnePage {
        OnePage(ResultSet {
            column_types: (0..values.len())
                .map(|i| ColumnType { label_name: format!("c{i}") })
                .collect(),
            rows: vec![values],
        })
    }

    #[tokio::test]
    async fn test_csv_quotes_every_field() {
        let service = one_row(vec![
            Some(Value::from("say \"hi\"")),
            Some(Value::from(2.5)),
            Some(Value::from(false)),
            Some(Value::Date(Date::new(2017, 1, 15))),
            Some(Value::DateTime(DateTime::new(Date::new(2017, 1, 15), 10, 30, 0, "UTC"))),
            None,
            Some(Value::set(vec![Value::from("a"), Value::from("b")]).unwrap()),
        ]);
        let mut out = Vec::new();
        let written = write_pql_csv(&service, "WHERE 1 = 1", &mut out, &[]).await.unwrap();
        assert_eq!(written, 1);
        let csv = String::from_utf8(out).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(r#""c0","c1","c2","c3","c4","c5","c6""#));
        assert_eq!(
            lines.next(),
            Some(r#""say """"hi""""","2.5","false","2017-01-15","2017-01-15T10:30:00Z","-","""a"",""b""""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_mixed_set_fails() {
        let service = one_row(vec![Some(Value::Set(vec![Value::from("a"), Value::from(1)]))]);
        let mut out = Vec::new();
        let err = write_pql_csv(&service, "WHERE 1 = 1", &mut out, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Value(ValueError::HeterogeneousSetValue { .. })
        ));
    }

    struct FailingService;

    #[async_trait]
    impl PqlSelect for FailingService {
        async fn select(&self, _: &Statement) -> Result<ResultSet, ClientError> {
            Err(ClientError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_select_errors_propagate() {
        let err = collect_pql_rows(&FailingService, "WHERE 1 = 1", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
