/// Arrow schema definitions for persisted cluster label tables.
pub mod runs {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Schema for a label run table (`clusters/<run_id>.parquet`).
    ///
    /// Cluster index is implicit in row order. `label` and `label_raw` are
    /// null until the cluster is labeled.
    pub fn label_run_schema() -> Schema {
        Schema::new(vec![
            Field::new(
                "indices",
                DataType::List(Arc::new(Field::new("item", DataType::UInt64, true))),
                false,
            ),
            Field::new("label", DataType::Utf8, true),
            Field::new("label_raw", DataType::Utf8, true),
            Field::new("labeled", DataType::Boolean, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::runs;

    #[test]
    fn label_run_schema_has_expected_fields() {
        let schema = runs::label_run_schema();
        assert_eq!(schema.fields().len(), 4);
        assert!(schema.field_with_name("indices").is_ok());
        assert!(schema.field_with_name("labeled").is_ok());
        assert!(!schema.field_with_name("labeled").unwrap().is_nullable());
    }
}
