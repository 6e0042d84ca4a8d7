fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    //! Pins the JSON wire format so protocol changes that would break
    //! existing upload clients fail loudly.

    use chunkport_protocol::{
        ErrorKind, ErrorResponse, MergeRequest, MergeResponse, UploadChunkResponse, VerifyRequest,
        VerifyResponse,
    };

    /// Serializes `value` and compares against the exact expected JSON.
    fn assert_wire<T: serde::Serialize>(value: &T, expected: serde_json::Value) {
        let actual = serde_json::to_value(value).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn verify_request_wire_format() {
        let req: VerifyRequest =
            serde_json::from_str(r#"{"hash": "abc123", "filename": "video.mp4"}"#).unwrap();
        assert_eq!(req.hash, "abc123");
        assert_eq!(req.filename, "video.mp4");
    }

    #[test]
    fn verify_response_wire_format() {
        assert_wire(
            &VerifyResponse {
                complete: false,
                present_chunk_ids: vec!["part-0".into(), "part-1".into()],
            },
            serde_json::json!({
                "complete": false,
                "presentChunkIds": ["part-0", "part-1"],
            }),
        );
    }

    #[test]
    fn merge_request_accepts_extra_client_fields() {
        // Existing clients also send the total file size; unknown fields
        // must not break parsing.
        let req: MergeRequest = serde_json::from_str(
            r#"{"hash": "abc123", "filename": "video.mp4", "size": 10485760}"#,
        )
        .unwrap();
        assert_eq!(req.hash, "abc123");
    }

    #[test]
    fn merge_response_wire_format() {
        assert_wire(
            &MergeResponse {
                path: "/data/complete/abc123/video.mp4".into(),
            },
            serde_json::json!({"path": "/data/complete/abc123/video.mp4"}),
        );
    }

    #[test]
    fn upload_chunk_response_wire_format() {
        assert_wire(
            &UploadChunkResponse {
                path: "/data/chunks/abc123/part-0".into(),
            },
            serde_json::json!({"path": "/data/chunks/abc123/part-0"}),
        );
    }

    #[test]
    fn error_envelope_wire_format() {
        assert_wire(
            &ErrorResponse {
                error: ErrorKind::MergeInProgress,
                message: "merge already in progress for upload abc123".into(),
            },
            serde_json::json!({
                "error": "mergeInProgress",
                "message": "merge already in progress for upload abc123",
            }),
        );
    }

    #[test]
    fn every_error_kind_has_a_stable_name() {
        let kinds = [
            (ErrorKind::MissingParameter, "missingParameter"),
            (ErrorKind::InvalidIdentifier, "invalidIdentifier"),
            (ErrorKind::ChunkTooLarge, "chunkTooLarge"),
            (ErrorKind::StorageUnavailable, "storageUnavailable"),
            (ErrorKind::ChunkDirectoryNotFound, "chunkDirectoryNotFound"),
            (ErrorKind::MergeInProgress, "mergeInProgress"),
            (ErrorKind::MergeTimeout, "mergeTimeout"),
            (ErrorKind::MalformedChunkIdentifier, "malformedChunkIdentifier"),
            (ErrorKind::Io, "io"),
        ];
        for (kind, name) in kinds {
            assert_eq!(serde_json::to_value(kind).unwrap(), name);
        }
    }
}
