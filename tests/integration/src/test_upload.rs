//! Presigned upload integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::Utc;
    use r2drop_auth::SigningRequest;
    use r2drop_client::{ClientError, ProgressPlan, ProgressTick};
    use tokio::sync::mpsc;

    use crate::start_stack;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressTick>) -> Vec<ProgressTick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    #[tokio::test]
    async fn test_should_upload_through_presigned_url() {
        let stack = start_stack().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let data = Bytes::from(vec![7u8; 10_000]);
        let outcome = stack
            .client
            .upload("test.txt", "text/plain", data, 4096, Some(tx))
            .await
            .expect("upload");

        assert_eq!(outcome.key, "test.txt");
        assert_eq!(outcome.size, 10_000);
        assert_eq!(outcome.status, 200);
        assert_eq!(
            outcome.object_url,
            format!("{}/examplebucket/test.txt", stack.bucket_endpoint)
        );
        assert!(stack.storage.contains("test.txt"));

        let sent: Vec<u64> = drain(&mut rx).iter().map(|t| t.sent).collect();
        assert_eq!(sent, vec![4096, 8192, 10_000]);

        let received = stack.received.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(received[0].content_length, Some(10_000));
    }

    #[tokio::test]
    async fn test_should_upload_keys_that_need_encoding() {
        let stack = start_stack().await;

        for key in ["my file ☺.png", "photos/2024/a+b.jpg", "semi;colon&amp=.txt"] {
            stack
                .client
                .upload(key, "application/octet-stream", Bytes::from_static(b"abc"), 2, None)
                .await
                .unwrap_or_else(|e| panic!("upload of {key:?} failed: {e}"));
            assert!(stack.storage.contains(key), "{key:?} not stored");
        }
    }

    #[tokio::test]
    async fn test_should_upload_empty_file_with_single_tick() {
        let stack = start_stack().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        stack
            .client
            .upload("empty.bin", "application/octet-stream", Bytes::new(), 1024, Some(tx))
            .await
            .expect("upload");

        assert_eq!(drain(&mut rx), vec![ProgressTick { sent: 0, total: 0 }]);
        let received = stack.received.lock().unwrap().clone();
        assert_eq!(received[0].size, 0);
        assert_eq!(received[0].content_length, Some(0));
    }

    #[tokio::test]
    async fn test_should_surface_bucket_rejection_verbatim() {
        let stack = start_stack().await;
        let url = stack
            .client
            .request_upload_url("original.txt")
            .await
            .expect("url");
        let tampered = url.replace("/original.txt?", "/other.txt?");

        let data = Bytes::from_static(b"data");
        let err = stack
            .client
            .put_object(&tampered, "text/plain", data, ProgressPlan::new(4, 4), None)
            .await
            .unwrap_err();

        match err {
            ClientError::Transport { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"), "{body}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(stack.storage.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_expired_url_at_bucket() {
        let stack = start_stack().await;
        let issued = Utc::now() - chrono::Duration::hours(2);
        let url = stack
            .engine
            .presign_at(&SigningRequest::put("late.txt"), issued)
            .expect("presign");

        let err = stack
            .client
            .put_object(
                url.as_str(),
                "text/plain",
                Bytes::from_static(b"x"),
                ProgressPlan::new(1, 1),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_should_reject_missing_name_before_signing() {
        let stack = start_stack().await;
        let err = stack.client.request_upload_url("").await.unwrap_err();

        match err {
            ClientError::Transport { status, body } => {
                assert_eq!(status, 400);
                let json: serde_json::Value = serde_json::from_str(&body).unwrap();
                assert_eq!(json["error"], "Missing file name parameter.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_should_refuse_keys_with_dot_segments() {
        let stack = start_stack().await;

        for key in ["a/../b.txt", "./c.txt", ".."] {
            let err = stack
                .client
                .upload(key, "text/plain", Bytes::from_static(b"abc"), 2, None)
                .await
                .unwrap_err();
            match err {
                ClientError::Transport { status, body } => {
                    assert_eq!(status, 400, "key {key:?}");
                    assert!(body.contains("path segments"), "key {key:?}: {body}");
                }
                other => panic!("unexpected error for {key:?}: {other}"),
            }
        }

        assert!(stack.storage.is_empty());
        assert!(stack.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_issue_distinct_urls_concurrently() {
        let stack = start_stack().await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = stack.client.clone();
                tokio::spawn(async move { client.request_upload_url(&format!("f{i}.txt")).await })
            })
            .collect();

        let mut urls = Vec::new();
        for handle in handles {
            urls.push(handle.await.unwrap().expect("url"));
        }
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 8);
    }
}
