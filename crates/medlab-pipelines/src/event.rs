//! S3 upload notifications

use aws_lambda_events::event::s3::S3Event;
use std::borrow::Cow;

use crate::error::{PipelineError, PipelineResult};

/// One uploaded object named by a notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    /// Decoded object key
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Final path segment of the key; the local scratch file takes this name.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(self.key.as_str())
    }

    /// Text after the last `.` of the file name, if there is one.
    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Decode a notification key: `+` stands for a space, the rest is percent-encoded.
pub fn decode_key(raw: &str) -> PipelineResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| PipelineError::Event(format!("Object key {:?} is not valid UTF-8: {}", raw, e)))
}

/// Every object named by `event`, in record order.
pub fn object_refs(event: &S3Event) -> PipelineResult<Vec<ObjectRef>> {
    if event.records.is_empty() {
        return Err(PipelineError::Event("Notification carries no records".to_string()));
    }

    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let bucket = record
                .s3
                .bucket
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    PipelineError::Event(format!("Record {} has no bucket name", index))
                })?;

            let raw_key = record
                .s3
                .object
                .key
                .as_deref()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| PipelineError::Event(format!("Record {} has no object key", index)))?;

            let object = ObjectRef::new(bucket, decode_key(raw_key)?);
            if object.file_name().is_empty() {
                return Err(PipelineError::Event(format!(
                    "Object key {:?} does not name a file",
                    object.key
                )));
            }

            Ok(object)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(records: &[(&str, &str)]) -> S3Event {
        let records: Vec<_> = records
            .iter()
            .map(|(bucket, key)| {
                json!({
                    "eventVersion": "2.1",
                    "eventSource": "aws:s3",
                    "awsRegion": "us-east-1",
                    "eventTime": "2024-03-01T10:00:00.000Z",
                    "eventName": "ObjectCreated:Put",
                    "userIdentity": { "principalId": "EXAMPLE" },
                    "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                    "responseElements": {
                        "x-amz-request-id": "EXAMPLE123456789",
                        "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
                    },
                    "s3": {
                        "s3SchemaVersion": "1.0",
                        "configurationId": "testConfigRule",
                        "bucket": {
                            "name": bucket,
                            "ownerIdentity": { "principalId": "EXAMPLE" },
                            "arn": format!("arn:aws:s3:::{}", bucket)
                        },
                        "object": {
                            "key": key,
                            "size": 1024,
                            "eTag": "0123456789abcdef0123456789abcdef",
                            "sequencer": "0A1B2C3D4E5F678901"
                        }
                    }
                })
            })
            .collect();

        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    #[test]
    fn test_object_refs_decodes_keys() {
        let event = notification(&[("lab-uploads", "olympus/run+1%2F2.log")]);
        let objects = object_refs(&event).unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bucket, "lab-uploads");
        assert_eq!(objects[0].key, "olympus/run 1/2.log");
        assert_eq!(objects[0].file_name(), "2.log");
        assert_eq!(objects[0].extension(), Some("log"));
    }

    #[test]
    fn test_object_refs_keeps_record_order() {
        let event = notification(&[("a", "first.csv"), ("b", "second.txt")]);
        let keys: Vec<_> = object_refs(&event)
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["first.csv", "second.txt"]);
    }

    #[test]
    fn test_empty_notification_rejected() {
        let event: S3Event = serde_json::from_value(json!({ "Records": [] })).unwrap();
        assert!(matches!(object_refs(&event), Err(PipelineError::Event(_))));
    }

    #[test]
    fn test_directory_key_rejected() {
        let event = notification(&[("lab-uploads", "olympus/")]);
        assert!(matches!(object_refs(&event), Err(PipelineError::Event(_))));
    }

    #[test]
    fn test_extension() {
        assert_eq!(ObjectRef::new("b", "a/b/results.CSV").extension(), Some("CSV"));
        assert_eq!(ObjectRef::new("b", "archive.tar.gz").extension(), Some("gz"));
        assert_eq!(ObjectRef::new("b", "README").extension(), None);
        assert_eq!(ObjectRef::new("b", "trailing.").extension(), None);
    }
}
