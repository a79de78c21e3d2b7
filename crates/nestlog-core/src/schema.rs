/// Arrow schema definitions for stored activity records.
pub mod activity {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use std::sync::Arc;

    /// Schema for exported activity records, one row per stored record.
    ///
    /// The category-specific quantity slot is flattened into four nullable
    /// `quantity_*` columns.
    pub fn activity_schema() -> Schema {
        Schema::new(vec![
            Field::new("record_id", DataType::Utf8, false),
            Field::new("subject_id", DataType::Utf8, false),
            Field::new(
                "occurred_at",
                DataType::Timestamp(TimeUnit::Second, None),
                false,
            ),
            Field::new("sender", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("subtype", DataType::Utf8, false),
            Field::new("quantity_kind", DataType::Utf8, true),
            Field::new("quantity_value", DataType::Float64, true),
            Field::new("quantity_unit", DataType::Utf8, true),
            Field::new("quantity_raw", DataType::Utf8, true),
            Field::new("note", DataType::Utf8, false),
            Field::new(
                "tags",
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                false,
            ),
            Field::new("source", DataType::Utf8, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::activity;

    #[test]
    fn activity_schema_has_expected_fields() {
        let schema = activity::activity_schema();
        assert_eq!(schema.fields().len(), 13);
        assert!(schema.field_with_name("occurred_at").is_ok());
        assert!(schema.field_with_name("quantity_value").unwrap().is_nullable());
        assert!(!schema.field_with_name("category").unwrap().is_nullable());
    }
}
