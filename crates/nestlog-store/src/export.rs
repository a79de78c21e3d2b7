//! Arrow and Parquet export of stored records.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, ListBuilder, StringArray, StringBuilder, TimestampSecondArray,
};
use arrow::record_batch::RecordBatch;
use nestlog_core::activity::activity_schema;

use crate::{StoreError, StoredRecord};

/// Convert stored records into one RecordBatch using the shared activity schema.
pub fn to_record_batch(records: &[StoredRecord]) -> Result<RecordBatch, StoreError> {
    let occurred_at = TimestampSecondArray::from(
        records
            .iter()
            .map(|r| r.record.occurred_at.and_utc().timestamp())
            .collect::<Vec<i64>>(),
    );
    let quantity_value = Float64Array::from(
        records
            .iter()
            .map(|r| r.record.quantity().map(|q| q.value))
            .collect::<Vec<Option<f64>>>(),
    );

    let mut tags = ListBuilder::new(StringBuilder::new());
    for r in records {
        for tag in &r.record.tags {
            tags.values().append_value(tag);
        }
        tags.append(true);
    }

    let columns: Vec<ArrayRef> = vec![
        string_column(records.iter().map(|r| r.id.as_str())),
        string_column(records.iter().map(|r| r.record.subject_id.as_str())),
        Arc::new(occurred_at),
        string_column(records.iter().map(|r| r.record.sender.as_str())),
        string_column(records.iter().map(|r| r.record.category().as_str())),
        string_column(records.iter().map(|r| r.record.subtype())),
        optional_column(
            records
                .iter()
                .map(|r| r.record.quantity().map(|q| q.kind.as_str())),
        ),
        Arc::new(quantity_value),
        optional_column(
            records
                .iter()
                .map(|r| r.record.quantity().map(|q| q.unit.as_str())),
        ),
        optional_column(
            records
                .iter()
                .map(|r| r.record.quantity().map(|q| q.raw_span.as_str())),
        ),
        string_column(records.iter().map(|r| r.record.note.as_str())),
        Arc::new(tags.finish()),
        string_column(records.iter().map(|r| r.record.source.as_str())),
    ];

    Ok(RecordBatch::try_new(Arc::new(activity_schema()), columns)?)
}

fn string_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<&str>>()))
}

fn optional_column<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<Option<&str>>>()))
}

/// Write stored records to a Parquet file, replacing it if present.
#[cfg(feature = "parquet")]
pub fn write_parquet(path: &std::path::Path, records: &[StoredRecord]) -> Result<usize, StoreError> {
    use parquet::arrow::ArrowWriter;

    let batch = to_record_batch(records)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    tracing::info!(rows = batch.num_rows(), path = %path.display(), "wrote parquet export");
    Ok(batch.num_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordId;
    use crate::test_support::*;
    use arrow::array::{Array, ListArray};
    use nestlog_core::{ActivityDetail, ExtractedQuantity, QuantityKind, Unit};

    fn stored(record: nestlog_core::ActivityRecord) -> StoredRecord {
        StoredRecord {
            id: RecordId::new(),
            record,
        }
    }

    #[test]
    fn batch_has_one_row_per_record() {
        let mut feed = nap("b1", at(21, 14, 0));
        feed.detail = ActivityDetail::Feeding {
            subtype: "bottle".into(),
            amount: Some(ExtractedQuantity {
                kind: QuantityKind::Volume,
                value: 150.0,
                unit: Unit::Milliliters,
                raw_span: "150ml".into(),
                start: 0,
                end: 5,
            }),
        };
        feed.tags = vec!["first".into(), "positive".into()];

        let batch =
            to_record_batch(&[stored(diaper("b1", at(21, 9, 0))), stored(feed)]).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 13);

        let category = batch
            .column_by_name("category")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(category.value(0), "diaper");
        assert_eq!(category.value(1), "feeding");

        let value = batch
            .column_by_name("quantity_value")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(value.is_null(0));
        assert_eq!(value.value(1), 150.0);

        let tags = batch
            .column_by_name("tags")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        assert_eq!(tags.value(0).len(), 0);
        assert_eq!(tags.value(1).len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_batch() {
        let batch = to_record_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn parquet_round_trip_row_count() {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        let rows = write_parquet(&path, &[stored(diaper("b1", at(21, 9, 0)))]).unwrap();
        assert_eq!(rows, 1);

        let file = std::fs::File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let total: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total, 1);
    }
}
