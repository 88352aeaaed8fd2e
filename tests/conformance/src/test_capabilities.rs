//! Per-capability runs, each detecting support through the `as_*` probes.

#[cfg(test)]
mod tests {
    use polystore_conformance::{
        check_appender, check_dir_lister, check_direr, check_linker, check_mover,
        check_multipart_signer, check_multiparter, check_storage_signer,
    };

    use crate::{fixtures, store};

    #[tokio::test]
    async fn test_should_pass_append_checks() {
        let store = store();
        let fx = fixtures();
        let appender = store.as_appender().expect("memory backend appends");
        check_appender(store.as_ref(), appender, &fx)
            .await
            .unwrap_or_else(|e| panic!("append check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_dir_checks() {
        let store = store();
        let fx = fixtures();
        let direr = store.as_direr().expect("memory backend has directories");
        check_direr(store.as_ref(), direr, &fx)
            .await
            .unwrap_or_else(|e| panic!("dir check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_dir_list_checks() {
        let store = store();
        let fx = fixtures();
        let lister = store.as_dir_lister().expect("memory backend lists dirs");
        check_dir_lister(store.as_ref(), lister, &fx)
            .await
            .unwrap_or_else(|e| panic!("dir-list check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_link_checks() {
        let store = store();
        let fx = fixtures();
        let linker = store.as_linker().expect("memory backend links");
        check_linker(store.as_ref(), linker, &fx)
            .await
            .unwrap_or_else(|e| panic!("link check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_move_checks() {
        let store = store();
        let fx = fixtures();
        let mover = store.as_mover().expect("memory backend moves");
        check_mover(store.as_ref(), mover, &fx)
            .await
            .unwrap_or_else(|e| panic!("move check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_multipart_checks() {
        let store = store();
        let fx = fixtures();
        let multiparter = store.as_multiparter().expect("memory backend multiparts");
        check_multiparter(store.as_ref(), multiparter, &fx)
            .await
            .unwrap_or_else(|e| panic!("multipart check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_signing_checks() {
        let store = store();
        let fx = fixtures();
        let signer = store.as_storage_signer().expect("memory backend signs");
        check_storage_signer(store.as_ref(), signer, &fx)
            .await
            .unwrap_or_else(|e| panic!("sign check failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_multipart_signing_checks() {
        let store = store();
        let fx = fixtures();
        let multiparter = store.as_multiparter().expect("memory backend multiparts");
        let signer = store
            .as_multipart_signer()
            .expect("memory backend signs multipart");
        check_multipart_signer(store.as_ref(), multiparter, signer, &fx)
            .await
            .unwrap_or_else(|e| panic!("multipart-sign check failed: {e}"));
    }
}
