//! Core contract runs.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use polystore_conformance::check_storager;
    use polystore_types::Pairs;

    use crate::{fixtures, store};

    #[tokio::test]
    async fn test_should_pass_core_contract() {
        let store = store();
        let fx = fixtures();
        check_storager(store.as_ref(), &fx)
            .await
            .unwrap_or_else(|e| panic!("core contract check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_serve_concurrent_writers_on_distinct_paths() {
        let store = store();
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let path = format!("concurrent/{i}");
                let payload = Bytes::from(vec![i as u8; 1024]);
                store
                    .write(&path, Some(payload.clone()), 1024, Pairs::new())
                    .await
                    .unwrap_or_else(|e| panic!("write {path} failed: {e}"));
                let data = store
                    .read(&path, Pairs::new())
                    .await
                    .unwrap_or_else(|e| panic!("read {path} failed: {e}"));
                assert_eq!(data, payload);
            }));
        }
        for handle in handles {
            handle.await.unwrap_or_else(|e| panic!("task failed: {e}"));
        }
    }
}
