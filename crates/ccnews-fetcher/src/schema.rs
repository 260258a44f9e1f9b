//! Arrow schema for the articles dataset

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

/// articles_NNNN.parquet: one row per accepted article
pub fn articles() -> &'static Arc<Schema> {
    static SCHEMA: LazyLock<Arc<Schema>> = LazyLock::new(|| {
        Arc::new(Schema::new(vec![
            Field::new("uuid", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("source_domain", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("maintext", DataType::Utf8, false),
            Field::new("author", DataType::Utf8, true),
            Field::new("language", DataType::Utf8, true),
            Field::new("date_publish", DataType::Utf8, true),
            Field::new("date_download", DataType::Utf8, true),
            Field::new("date_collected", DataType::Utf8, false),
        ]))
    });
    &SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn articles_schema_has_expected_fields() {
        let schema = articles();
        assert!(schema.field_with_name("uuid").is_ok());
        assert!(schema.field_with_name("url").is_ok());
        assert!(schema.field_with_name("source_domain").is_ok());
        assert!(schema.field_with_name("maintext").is_ok());
        assert!(schema.field_with_name("date_publish").is_ok());
    }

    #[test]
    fn optional_fields_are_nullable() {
        let schema = articles();
        assert!(schema.field_with_name("language").unwrap().is_nullable());
        assert!(schema.field_with_name("date_publish").unwrap().is_nullable());
        assert!(!schema.field_with_name("url").unwrap().is_nullable());
    }
}
