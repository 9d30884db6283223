//! List and delete integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use r2drop_client::ClientError;

    use crate::start_stack;

    #[tokio::test]
    async fn test_should_list_uploaded_files_sorted() {
        let stack = start_stack().await;
        for (key, size) in [("b.txt", 20), ("a.txt", 10)] {
            stack
                .client
                .upload(key, "text/plain", Bytes::from(vec![0u8; size]), 8, None)
                .await
                .expect("upload");
        }

        let entries = stack.client.list_files().await.expect("list");
        let listed: Vec<(&str, u64)> = entries.iter().map(|e| (e.key.as_str(), e.size)).collect();
        assert_eq!(listed, vec![("a.txt", 10), ("b.txt", 20)]);
    }

    #[tokio::test]
    async fn test_should_delete_uploaded_file() {
        let stack = start_stack().await;
        stack
            .client
            .upload("photos/a b.png", "image/png", Bytes::from_static(b"png"), 64, None)
            .await
            .expect("upload");

        stack
            .client
            .delete_file("photos/a b.png")
            .await
            .expect("delete");
        assert!(stack.client.list_files().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_delete_without_key() {
        let stack = start_stack().await;
        let resp = reqwest::Client::new()
            .delete(format!("{}/deleteFile", stack.gateway_url))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status().as_u16(), 400);

        let err = stack.client.delete_file("").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_should_answer_cors_preflight() {
        let stack = start_stack().await;
        let resp = reqwest::Client::new()
            .request(
                reqwest::Method::OPTIONS,
                format!("{}/generateUploadUrl", stack.gateway_url),
            )
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status().as_u16(), 204);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
