//! Tests against a real R2 bucket.
//!
//! They read the usual `R2_*` variables and upload, list, and delete one
//! uniquely named object.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use r2drop_auth::SigningEngine;
    use r2drop_client::DropClient;
    use r2drop_core::R2Config;
    use r2drop_http::{DropHttpService, DropState};
    use r2drop_storage::S3StorageGateway;
    use tokio::net::TcpListener;

    #[tokio::test]
    #[ignore = "requires R2 credentials"]
    async fn test_should_round_trip_against_real_bucket() {
        let config = R2Config::from_env().expect("R2_* variables");
        let state = DropState::new(
            SigningEngine::new(&config),
            Arc::new(S3StorageGateway::new(&config)),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(r2drop_http::serve(
            listener,
            DropHttpService::new(state),
            std::future::pending(),
        ));

        let client = DropClient::new(format!("http://{addr}"));
        let key = format!("r2drop-it/{} file ☺.txt", uuid::Uuid::new_v4());

        client
            .upload(&key, "text/plain", Bytes::from_static(b"hello r2"), 4, None)
            .await
            .expect("upload");

        let entries = client.list_files().await.expect("list");
        let entry = entries.iter().find(|e| e.key == key).expect("uploaded entry");
        assert_eq!(entry.size, 8);

        client.delete_file(&key).await.expect("delete");
        let entries = client.list_files().await.expect("list");
        assert!(entries.iter().all(|e| e.key != key));
    }
}
